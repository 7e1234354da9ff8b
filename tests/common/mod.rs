//! Shared test infrastructure.
//!
//! - Store fixtures: `store_with_voter()`, `create_question()`, `question_with_choices()`
//! - HTTP: `test_app!` builds the full route table over a `MemoryStore`,
//!   `Browser` carries the session cookie and CSRF token between requests,
//!   `log_in!` runs the login form round trip.

#![allow(dead_code, unused_macros)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test::TestRequest;
use chrono::{Duration, Utc};
use serde::Serialize;

use polls::auth::password;
use polls::models::{AuthenticatedUser, Choice, NewQuestion, Question};
use polls::store::{MemoryStore, PollStore};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const VOTER: &str = "vader";
pub const VOTER_PASS: &str = "Iamyourfather!";

// ============================================================================
// STORE SETUP
// ============================================================================

/// Empty store plus one user. The password hash is a placeholder, so this
/// user can vote through `cast_vote` but cannot log in over HTTP.
pub async fn store_with_voter() -> (MemoryStore, AuthenticatedUser) {
    let store = MemoryStore::new();
    let user = add_user(&store, VOTER, "not-a-real-hash").await;
    (store, user)
}

/// Store with a user whose password really verifies, for login tests.
pub async fn store_with_login() -> MemoryStore {
    let store = MemoryStore::new();
    let hash = password::hash_password(VOTER_PASS).expect("hash");
    store.create_user(VOTER, &hash).await.expect("create user");
    store
}

pub async fn add_user(store: &MemoryStore, username: &str, hash: &str) -> AuthenticatedUser {
    store.create_user(username, hash).await.expect("create user");
    let user = store
        .find_user_by_username(username)
        .await
        .expect("query")
        .expect("user exists");
    AuthenticatedUser::from(&user)
}

/// Question published `days` from now (negative for the past).
pub async fn create_question(store: &MemoryStore, text: &str, days: i64) -> Question {
    let new = NewQuestion::new(text, Utc::now() + Duration::days(days));
    let id = store.create_question(&new).await.expect("create question");
    store.find_question(id).await.expect("query").expect("question exists")
}

pub async fn question_with_choices(
    store: &MemoryStore,
    new: NewQuestion,
    choices: &[&str],
) -> (Question, Vec<Choice>) {
    let id = store.create_question(&new).await.expect("create question");
    for text in choices {
        store.create_choice(id, text).await.expect("create choice");
    }
    let question = store.find_question(id).await.expect("query").expect("question exists");
    let choices = store.choices_for(id).await.expect("choices");
    (question, choices)
}

// ============================================================================
// HTTP HELPERS
// ============================================================================

/// Full application over `$store` (a `MemoryStore`), ready for `call_service`.
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(polls::auth::session::middleware(actix_web::cookie::Key::generate(), false))
                .app_data(actix_web::web::Data::new($store.clone()))
                .app_data(actix_web::web::Data::new(polls::auth::rate_limit::RateLimiter::default()))
                .app_data(actix_web::web::Data::new(polls::config::PollSettings::default()))
                .configure(polls::handlers::routes::<polls::store::MemoryStore>)
                .default_service(actix_web::web::to(polls::handlers::not_found)),
        )
        .await
    };
}

/// GET /login for a token, then POST the credentials. Yields the POST response.
macro_rules! log_in {
    ($app:expr, $browser:expr, $username:expr, $password:expr) => {{
        let resp = actix_web::test::call_service(&$app, $browser.get("/login").to_request()).await;
        $browser.absorb(&resp);
        let body = actix_web::test::read_body(resp).await;
        $browser.csrf = common::csrf_token(&body);
        let form = [
            ("username", $username),
            ("password", $password),
            ("csrf_token", $browser.csrf.as_str()),
        ];
        let resp = actix_web::test::call_service(&$app, $browser.post("/login", &form).to_request()).await;
        $browser.absorb(&resp);
        resp
    }};
}

/// Client-side state a real browser would keep between requests.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
    pub csrf: String,
}

impl Browser {
    pub fn get(&self, path: &str) -> TestRequest {
        self.with_cookie(TestRequest::get().uri(path))
    }

    pub fn post(&self, path: &str, form: &impl Serialize) -> TestRequest {
        self.with_cookie(TestRequest::post().uri(path).set_form(form))
    }

    fn with_cookie(&self, req: TestRequest) -> TestRequest {
        match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    /// Keep the session cookie if the response replaced it.
    pub fn absorb<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(cookie) = resp.response().cookies().find(|c| c.name() == "id") {
            self.cookie = Some(cookie.into_owned());
        }
    }
}

pub fn csrf_token(body: &[u8]) -> String {
    let html = std::str::from_utf8(body).expect("utf-8 body");
    let re = regex::Regex::new(r#"name="csrf_token" value="([0-9a-f]{64})""#).expect("regex");
    re.captures(html)
        .map(|c| c[1].to_string())
        .expect("page carries a CSRF token")
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
