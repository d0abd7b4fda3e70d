pub mod oauth_state;
pub mod password;
