pub mod settings;
pub mod jwt;
pub mod gemini;
pub mod minio;
pub mod fitbit;
