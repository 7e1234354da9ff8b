use actix_web::cookie::Key;
use std::{env, fmt::Display, str::FromStr};

/// Runtime settings, read once from the environment at startup.
pub struct Config {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub session_key: Key,
    pub cookie_secure: bool,
    pub index_limit: i64,
    pub admin: Option<AdminAccount>,
    pub seed_demo: bool,
}

/// Settings the poll pages read per request.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub index_limit: i64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { index_limit: 5 }
    }
}

/// Account created at startup when it does not exist yet.
pub struct AdminAccount {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: try_load("POLLS_BIND", "127.0.0.1:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", "8"),
            session_key: session_key(),
            cookie_secure: try_load("COOKIE_SECURE", "false"),
            index_limit: try_load::<i64>("POLLS_INDEX_LIMIT", "5").max(1),
            admin: admin_account(),
            seed_demo: try_load("POLLS_SEED_DEMO", "false"),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings { index_limit: self.index_limit }
    }
}

/// Parse `key`, falling back to `default` when unset or malformed.
fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse() {
            Ok(value) => return value,
            Err(e) => log::warn!("Invalid {key} value '{raw}': {e}; using default {default}"),
        }
    }
    match default.parse() {
        Ok(value) => value,
        Err(e) => panic!("built-in default for {key} does not parse: {e}"),
    }
}

/// Load SESSION_KEY for sessions that survive restarts.
fn session_key() -> Key {
    match env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

fn admin_account() -> Option<AdminAccount> {
    let username = env::var("POLLS_ADMIN_USERNAME").ok()?;
    match env::var("POLLS_ADMIN_PASSWORD") {
        Ok(password) => Some(AdminAccount { username, password }),
        Err(_) => {
            log::warn!("POLLS_ADMIN_USERNAME set without POLLS_ADMIN_PASSWORD, skipping admin account");
            None
        }
    }
}
