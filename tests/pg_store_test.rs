/// `PgStore` against a real Postgres. `#[sqlx::test]` creates a fresh
/// database per test and applies `migrations/`.
///
/// Run with: DATABASE_URL=postgres://... cargo test --test pg_store_test -- --ignored

use chrono::{Duration, Utc};
use polls::models::{NewQuestion, VoteWrite};
use polls::store::{PgStore, PollStore, StoreError};
use sqlx::PgPool;

async fn seeded(pool: PgPool) -> Result<(PgStore, i64, i64, Vec<i64>), StoreError> {
    let store = PgStore::new(pool);
    let user_id = store.create_user("vader", "hash").await?;
    let question_id = store
        .create_question(&NewQuestion::new("Favourite?", Utc::now() - Duration::days(5)))
        .await?;
    let mut choice_ids = Vec::new();
    for text in ["A", "B", "C"] {
        choice_ids.push(store.create_choice(question_id, text).await?);
    }
    Ok((store, user_id, question_id, choice_ids))
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_upsert_creates_then_updates(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let (store, user_id, question_id, choices) = seeded(pool.clone()).await?;

    let first = store.upsert_vote(user_id, question_id, choices[0]).await?;
    let second = store.upsert_vote(user_id, question_id, choices[1]).await?;

    assert!(matches!(first, VoteWrite::Created { .. }));
    assert!(matches!(second, VoteWrite::Updated { .. }));
    assert_eq!(first.vote_id(), second.vote_id());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes").fetch_one(&pool).await?;
    assert_eq!(rows, 1);

    let vote = store.find_vote(user_id, question_id).await?.expect("vote");
    assert_eq!(vote.choice_id, choices[1]);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_upserts_leave_one_row(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let (store, user_id, question_id, choices) = seeded(pool.clone()).await?;

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        let choice = choices[i % choices.len()];
        handles.push(tokio::spawn(async move {
            store.upsert_vote(user_id, question_id, choice).await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_choice_must_belong_to_question(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let (store, user_id, question_id, _) = seeded(pool).await?;
    let other = store
        .create_question(&NewQuestion::new("Other", Utc::now() - Duration::days(1)))
        .await?;
    let foreign_choice = store.create_choice(other, "X").await?;

    assert!(store.find_choice(question_id, foreign_choice).await?.is_none());
    let result = store.upsert_vote(user_id, question_id, foreign_choice).await;
    assert!(matches!(result, Err(StoreError::Db(_))));
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_tallies_and_listing(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let (store, user_id, question_id, choices) = seeded(pool).await?;
    let luke = store.create_user("luke", "hash").await?;
    store.upsert_vote(user_id, question_id, choices[2]).await?;
    store.upsert_vote(luke, question_id, choices[2]).await?;

    let tallies = store.count_votes_by_choice(question_id).await?;
    assert_eq!(tallies.iter().map(|t| t.votes).collect::<Vec<_>>(), vec![0, 0, 2]);

    store
        .create_question(&NewQuestion::new("Future", Utc::now() + Duration::days(3)))
        .await?;
    let listed = store.published_questions(Utc::now(), 5).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, question_id);
    Ok(())
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_window_and_duplicate_constraints(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let store = PgStore::new(pool);
    let now = Utc::now();

    let backwards = NewQuestion::new("Backwards", now).ending(now - Duration::hours(1));
    assert!(matches!(store.create_question(&backwards).await, Err(StoreError::Invalid(_))));

    store.create_user("admin", "hash").await?;
    assert!(matches!(store.create_user("admin", "hash").await, Err(StoreError::Duplicate(_))));
    Ok(())
}
