use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

use crate::auth::{csrf, password, rate_limit::RateLimiter, session, validate};
use crate::errors::{AppError, render, see_other};
use crate::models::AuthenticatedUser;
use crate::store::PollStore;
use crate::templates_structs::{LoginTemplate, PageContext};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn login_form(session: &Session, error: Option<&str>, next: &str) -> Result<HttpResponse, AppError> {
    let tmpl = LoginTemplate {
        ctx: PageContext::build(session),
        error: error.map(str::to_string),
        next: next.to_string(),
    };
    render(tmpl)
}

pub async fn login_page(
    session: Session,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    let next = validate::safe_next(query.next.as_deref());

    if session::get_user_id(&session).is_some() {
        return Ok(see_other(next));
    }

    login_form(&session, None, next)
}

pub async fn login_submit<S: PollStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let next = validate::safe_next(form.next.as_deref());

    // Rate-limit check BEFORE any store access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {}: too many failures", ip);
        return login_form(
            &session,
            Some("Too many failed login attempts. Please try again later."),
            next,
        );
    }

    let found = store.find_user_by_username(&form.username).await?;
    let verified = match &found {
        Some(user) => password::verify_password(&form.password, &user.password_hash),
        None => {
            password::verify_against_dummy(&form.password);
            false
        }
    };

    match found.filter(|_| verified) {
        Some(user) => {
            limiter.clear(ip);
            session::log_in(&session, &AuthenticatedUser::from(&user))?;
            log::info!("User '{}' logged in", user.username);
            Ok(see_other(next))
        }
        None => {
            limiter.record_failure(ip);
            log::warn!("Failed login for '{}' from {}", form.username.trim(), ip);
            login_form(&session, Some("Invalid username or password"), next)
        }
    }
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session::log_out(&session);
    Ok(see_other("/polls"))
}
