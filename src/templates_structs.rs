// Template context structures for Askama templates.

use actix_session::Session;
use askama::Template;
use chrono::{DateTime, Utc};

use crate::auth::csrf;
use crate::auth::session::{Flash, get_username, take_flash};
use crate::models::{Choice, ChoiceTally, Question};

pub const APP_NAME: &str = "Polls";

/// Common context shared by every page.
/// Templates access these as `ctx.username`, `ctx.flash`, etc.
pub struct PageContext {
    pub app_name: &'static str,
    pub username: Option<String>,
    pub flash: Option<Flash>,
    pub csrf_token: String,
}

impl PageContext {
    /// Consumes any pending flash message.
    pub fn build(session: &Session) -> Self {
        Self {
            app_name: APP_NAME,
            username: get_username(session).ok(),
            flash: take_flash(session),
            csrf_token: csrf::get_or_create_token(session),
        }
    }
}

fn display_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// One row of the index listing.
pub struct QuestionRow {
    pub id: i64,
    pub question_text: String,
    pub published: String,
    pub recent: bool,
}

impl QuestionRow {
    pub fn new(question: &Question, now: DateTime<Utc>) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text.clone(),
            published: display_time(question.pub_date),
            recent: question.was_published_recently(now),
        }
    }
}

/// A choice on the detail form, flagged when it is the user's current vote.
pub struct ChoiceOption {
    pub id: i64,
    pub choice_text: String,
    pub selected: bool,
}

impl ChoiceOption {
    pub fn list(choices: Vec<Choice>, voted_for: Option<i64>) -> Vec<Self> {
        choices
            .into_iter()
            .map(|c| ChoiceOption {
                selected: voted_for == Some(c.id),
                id: c.id,
                choice_text: c.choice_text,
            })
            .collect()
    }
}

/// Result bar for one choice.
pub struct TallyRow {
    pub choice_text: String,
    pub votes: i64,
    pub percent: i64,
}

impl TallyRow {
    pub fn list(tallies: Vec<ChoiceTally>) -> (Vec<Self>, i64) {
        let total: i64 = tallies.iter().map(|t| t.votes).sum();
        let rows = tallies
            .into_iter()
            .map(|t| TallyRow {
                percent: if total > 0 { (t.votes * 100 + total / 2) / total } else { 0 },
                choice_text: t.choice_text,
                votes: t.votes,
            })
            .collect();
        (rows, total)
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub next: String,
}

#[derive(Template)]
#[template(path = "polls/index.html")]
pub struct IndexTemplate {
    pub ctx: PageContext,
    pub questions: Vec<QuestionRow>,
}

#[derive(Template)]
#[template(path = "polls/detail.html")]
pub struct DetailTemplate {
    pub ctx: PageContext,
    pub question_id: i64,
    pub question_text: String,
    pub closes: Option<String>,
    pub choices: Vec<ChoiceOption>,
    pub has_voted: bool,
    pub error_message: Option<String>,
}

impl DetailTemplate {
    pub fn new(ctx: PageContext, question: &Question, choices: Vec<ChoiceOption>) -> Self {
        Self {
            ctx,
            question_id: question.id,
            question_text: question.question_text.clone(),
            closes: question.end_date.map(display_time),
            has_voted: choices.iter().any(|c| c.selected),
            choices,
            error_message: None,
        }
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }
}

#[derive(Template)]
#[template(path = "polls/results.html")]
pub struct ResultsTemplate {
    pub ctx: PageContext,
    pub question_id: i64,
    pub question_text: String,
    pub tallies: Vec<TallyRow>,
    pub total_votes: i64,
}
