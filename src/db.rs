use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{password, validate};
use crate::config::AdminAccount;
use crate::errors::AppError;
use crate::models::NewQuestion;
use crate::store::{PollStore, StoreError};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the configured account unless the username is already taken.
pub async fn seed_admin<S: PollStore>(store: &S, admin: &AdminAccount) -> Result<(), AppError> {
    if let Some(err) = validate::validate_username(&admin.username)
        .or_else(|| validate::validate_password(&admin.password))
    {
        log::warn!("Skipping admin account: {}", err);
        return Ok(());
    }

    if store.find_user_by_username(&admin.username).await?.is_some() {
        log::info!("Admin account '{}' already present", admin.username.trim());
        return Ok(());
    }

    let hash = password::hash_password(&admin.password)?;
    match store.create_user(&admin.username, &hash).await {
        Ok(id) => {
            log::info!("Created admin account '{}' (id {})", admin.username.trim(), id);
            Ok(())
        }
        // Another worker won the race.
        Err(StoreError::Duplicate(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Sample polls for a fresh install. Skipped when any question exists.
pub async fn seed_demo<S: PollStore>(store: &S) -> Result<(), StoreError> {
    let count = store.count_questions().await?;
    if count > 0 {
        log::info!("Database already has {} questions, skipping demo seed", count);
        return Ok(());
    }

    let now = Utc::now();
    let demo: [(NewQuestion, &[&str]); 3] = [
        (
            NewQuestion::new("What's your favourite language for systems work?", now - Duration::days(5)),
            &["Rust", "C", "C++", "Zig"],
        ),
        (
            NewQuestion::new("Tabs or spaces?", now - Duration::hours(2)).ending(now + Duration::days(7)),
            &["Tabs", "Spaces"],
        ),
        (
            NewQuestion::new("Best time for the team retro?", now - Duration::days(10)).ending(now - Duration::days(3)),
            &["Monday morning", "Friday afternoon"],
        ),
    ];

    for (question, choices) in &demo {
        let question_id = store.create_question(question).await?;
        for text in choices.iter() {
            store.create_choice(question_id, text).await?;
        }
    }

    log::info!("Seeded {} demo questions", demo.len());
    Ok(())
}
