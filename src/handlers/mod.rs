use actix_web::{middleware::from_fn, web};

use crate::auth::middleware::require_auth;
use crate::errors::see_other;
use crate::store::PollStore;

pub mod auth_handlers;
pub mod poll_handlers;

/// Register every route of the app for the given store type.
pub fn routes<S: PollStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { see_other("/polls") }))
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit::<S>))
        .route("/logout", web::post().to(auth_handlers::logout))
        .route("/polls", web::get().to(poll_handlers::index::<S>))
        // Detail and vote need a logged-in user; results stay public.
        .service(
            web::resource("/polls/{id}")
                .wrap(from_fn(require_auth))
                .route(web::get().to(poll_handlers::detail::<S>)),
        )
        .service(
            web::resource("/polls/{id}/vote")
                .wrap(from_fn(require_auth))
                .route(web::post().to(poll_handlers::vote::<S>)),
        )
        .route("/polls/{id}/results", web::get().to(poll_handlers::results::<S>));
}

/// Fallback for unmatched paths.
pub async fn not_found() -> actix_web::HttpResponse {
    actix_web::HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../../templates/errors/404.html"))
}
