use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::auth::session::get_user_id;

/// Redirects anonymous requests to `/login?next=<path>`.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();

    if get_user_id(&session).is_none() {
        let location = login_location(req.path());
        let response = HttpResponse::SeeOther()
            .insert_header(("Location", location))
            .finish();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

fn login_location(path: &str) -> String {
    let next: String = serde_urlencoded::to_string([("next", path)]).unwrap_or_default();
    if next.is_empty() {
        "/login".to_string()
    } else {
        format!("/login?{next}")
    }
}
