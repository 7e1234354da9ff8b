use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{PollStore, StoreError, check_choice_text, check_question};
use crate::models::{Choice, ChoiceTally, NewQuestion, Question, User, Vote, VoteWrite};

#[derive(Default)]
struct Tables {
    next_id: i64,
    questions: Vec<Question>,
    choices: Vec<Choice>,
    votes: Vec<Vote>,
    users: Vec<User>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Clones share the same tables.
///
/// Every operation holds the lock for its whole duration, which makes
/// `upsert_vote` atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every vote row currently stored.
    pub fn votes(&self) -> Vec<Vote> {
        self.lock().votes.clone()
    }
}

impl PollStore for MemoryStore {
    async fn published_questions(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Question>, StoreError> {
        let tables = self.lock();
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.pub_date <= now)
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        questions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(questions)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        Ok(self.lock().questions.iter().find(|q| q.id == id).cloned())
    }

    async fn count_questions(&self) -> Result<i64, StoreError> {
        Ok(self.lock().questions.len() as i64)
    }

    async fn create_question(&self, new: &NewQuestion) -> Result<i64, StoreError> {
        check_question(new)?;
        let mut tables = self.lock();
        let id = tables.allocate_id();
        tables.questions.push(Question {
            id,
            question_text: new.question_text.trim().to_string(),
            pub_date: new.pub_date,
            end_date: new.end_date,
        });
        Ok(id)
    }

    async fn choices_for(&self, question_id: i64) -> Result<Vec<Choice>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn find_choice(&self, question_id: i64, choice_id: i64) -> Result<Option<Choice>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .choices
            .iter()
            .find(|c| c.id == choice_id && c.question_id == question_id)
            .cloned())
    }

    async fn create_choice(&self, question_id: i64, choice_text: &str) -> Result<i64, StoreError> {
        check_choice_text(choice_text)?;
        let mut tables = self.lock();
        if !tables.questions.iter().any(|q| q.id == question_id) {
            return Err(StoreError::Invalid(format!("question {question_id} does not exist")));
        }
        let id = tables.allocate_id();
        tables.choices.push(Choice {
            id,
            question_id,
            choice_text: choice_text.trim().to_string(),
        });
        Ok(id)
    }

    async fn find_vote(&self, user_id: i64, question_id: i64) -> Result<Option<Vote>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .votes
            .iter()
            .find(|v| v.user_id == user_id && v.question_id == question_id)
            .cloned())
    }

    async fn upsert_vote(&self, user_id: i64, question_id: i64, choice_id: i64) -> Result<VoteWrite, StoreError> {
        let mut tables = self.lock();
        if !tables
            .choices
            .iter()
            .any(|c| c.id == choice_id && c.question_id == question_id)
        {
            return Err(StoreError::Invalid(format!(
                "choice {choice_id} does not belong to question {question_id}"
            )));
        }

        if let Some(vote) = tables
            .votes
            .iter_mut()
            .find(|v| v.user_id == user_id && v.question_id == question_id)
        {
            vote.choice_id = choice_id;
            return Ok(VoteWrite::Updated { vote_id: vote.id });
        }

        let vote_id = tables.allocate_id();
        tables.votes.push(Vote {
            id: vote_id,
            user_id,
            question_id,
            choice_id,
        });
        Ok(VoteWrite::Created { vote_id })
    }

    async fn count_votes_by_choice(&self, question_id: i64) -> Result<Vec<ChoiceTally>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .map(|c| ChoiceTally {
                choice_id: c.id,
                choice_text: c.choice_text.clone(),
                votes: tables.votes.iter().filter(|v| v.choice_id == c.id).count() as i64,
            })
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = username.trim();
        Ok(self.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let username = username.trim();
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate(format!("user '{username}'")));
        }
        let id = tables.allocate_id();
        tables.users.push(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }
}
