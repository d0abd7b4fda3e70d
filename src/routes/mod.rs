use actix_web::web;

pub mod analytics;
pub mod auth;
pub mod backend_health;
pub mod chat;
pub mod files;
pub mod followups;
pub mod profile;
pub mod wearables;

use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    // Register and login are public; status checks its own token
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::status)
    );
    cfg.service(
        web::scope("/profile")
            .wrap(AuthMiddleware)
            .service(profile::get_user_profile)
            .service(profile::update_user_profile)
    );
    cfg.service(
        web::scope("/chat")
            .wrap(AuthMiddleware)
            .service(chat::send_chat_message)
            .service(chat::get_chat_history)
    );
    cfg.service(
        web::scope("/followups")
            .wrap(AuthMiddleware)
            .service(followups::get_followups)
            .service(followups::post_followup)
            .service(followups::complete)
            .service(followups::history)
            .service(followups::remove_followup)
    );
    cfg.service(
        web::scope("/files")
            .wrap(AuthMiddleware)
            .service(files::upload)
            .service(files::get_files)
            .service(files::remove_file)
            .service(files::analyze)
    );
    cfg.service(
        web::scope("/wearables")
            .wrap(AuthMiddleware)
            .service(wearables::status)
            .service(wearables::connect)
            .service(wearables::fitbit_callback)
            .service(wearables::disconnect)
            .service(wearables::demo_data)
            .service(wearables::ingest_metric)
            .service(wearables::sync)
            .service(wearables::summary)
            .service(wearables::timeseries)
            .service(wearables::recommendations)
    );
    cfg.service(
        web::scope("/analytics")
            .wrap(AuthMiddleware)
            .service(analytics::dashboard)
            .service(analytics::trends)
            .service(analytics::insights)
    );
}
