pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::auth::AuthGuard;
use crate::error::AppError;

/// Registers every route. `/me` and `/tasks` sit behind the [`AuthGuard`].
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(query_config())
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::resource("/me")
                .wrap(AuthGuard)
                .route(web::get().to(auth::me)),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthGuard)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// JSON extractor settings: malformed or incomplete bodies become a 400 with the
/// usual `{"error": ...}` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

/// Query-string settings for the same purpose, e.g. `?page=abc`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
