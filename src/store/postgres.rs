use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{PollStore, StoreError, check_choice_text, check_question};
use crate::models::{Choice, ChoiceTally, NewQuestion, Question, User, Vote, VoteWrite};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: i64,
    inserted: bool,
}

impl PollStore for PgStore {
    async fn published_questions(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Question>, StoreError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, question_text, pub_date, end_date FROM questions \
             WHERE pub_date <= $1 \
             ORDER BY pub_date DESC, id DESC \
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, question_text, pub_date, end_date FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn count_questions(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_question(&self, new: &NewQuestion) -> Result<i64, StoreError> {
        check_question(new)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO questions (question_text, pub_date, end_date) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.question_text.trim())
        .bind(new.pub_date)
        .bind(new.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn choices_for(&self, question_id: i64) -> Result<Vec<Choice>, StoreError> {
        let choices = sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, choice_text FROM choices WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(choices)
    }

    async fn find_choice(&self, question_id: i64, choice_id: i64) -> Result<Option<Choice>, StoreError> {
        let choice = sqlx::query_as::<_, Choice>(
            "SELECT id, question_id, choice_text FROM choices WHERE id = $1 AND question_id = $2",
        )
        .bind(choice_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(choice)
    }

    async fn create_choice(&self, question_id: i64, choice_text: &str) -> Result<i64, StoreError> {
        check_choice_text(choice_text)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO choices (question_id, choice_text) VALUES ($1, $2) RETURNING id",
        )
        .bind(question_id)
        .bind(choice_text.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_vote(&self, user_id: i64, question_id: i64) -> Result<Option<Vote>, StoreError> {
        let vote = sqlx::query_as::<_, Vote>(
            "SELECT id, user_id, question_id, choice_id FROM votes WHERE user_id = $1 AND question_id = $2",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn upsert_vote(&self, user_id: i64, question_id: i64, choice_id: i64) -> Result<VoteWrite, StoreError> {
        // xmax is 0 only for a row this statement inserted.
        let row = sqlx::query_as::<_, UpsertRow>(
            "INSERT INTO votes (user_id, question_id, choice_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, question_id) \
             DO UPDATE SET choice_id = EXCLUDED.choice_id, updated_at = now() \
             RETURNING id, (xmax = 0) AS inserted",
        )
        .bind(user_id)
        .bind(question_id)
        .bind(choice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(if row.inserted {
            VoteWrite::Created { vote_id: row.id }
        } else {
            VoteWrite::Updated { vote_id: row.id }
        })
    }

    async fn count_votes_by_choice(&self, question_id: i64) -> Result<Vec<ChoiceTally>, StoreError> {
        let tallies = sqlx::query_as::<_, ChoiceTally>(
            "SELECT c.id AS choice_id, c.choice_text, COUNT(v.id) AS votes \
             FROM choices c \
             LEFT JOIN votes v ON v.choice_id = c.id \
             WHERE c.question_id = $1 \
             GROUP BY c.id, c.choice_text \
             ORDER BY c.id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tallies)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(username.trim())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(format!("user '{}'", username.trim())))
            }
            Err(e) => Err(e.into()),
        }
    }
}
