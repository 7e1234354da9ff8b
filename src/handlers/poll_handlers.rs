use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{FlashLevel, set_flash};
use crate::config::PollSettings;
use crate::errors::{AppError, render, see_other};
use crate::models::{AuthenticatedUser, Question};
use crate::store::PollStore;
use crate::templates_structs::{
    ChoiceOption, DetailTemplate, IndexTemplate, PageContext, QuestionRow, ResultsTemplate, TallyRow,
};
use crate::voting::{self, VoteError, VoteRejection};

#[derive(Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    pub choice: Option<String>,
    pub csrf_token: String,
}

pub async fn index<S: PollStore + 'static>(
    store: web::Data<S>,
    settings: web::Data<PollSettings>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let questions = store
        .published_questions(now, settings.index_limit)
        .await?
        .iter()
        .map(|q| QuestionRow::new(q, now))
        .collect();

    let tmpl = IndexTemplate { ctx: PageContext::build(&session), questions };
    render(tmpl)
}

/// Detail form for `question`, with the user's current vote preselected.
async fn detail_page<S: PollStore>(
    store: &S,
    session: &Session,
    user: &AuthenticatedUser,
    question: &Question,
) -> Result<DetailTemplate, AppError> {
    let voted_for = store
        .find_vote(user.id(), question.id)
        .await?
        .map(|v| v.choice_id);
    let choices = ChoiceOption::list(store.choices_for(question.id).await?, voted_for);
    Ok(DetailTemplate::new(PageContext::build(session), question, choices))
}

pub async fn detail<S: PollStore + 'static>(
    store: web::Data<S>,
    session: Session,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let question = store
        .find_question(path.into_inner())
        .await?
        .filter(|q| q.is_visible(Utc::now()))
        .ok_or(AppError::NotFound)?;

    render(detail_page(store.get_ref(), &session, &user, &question).await?)
}

pub async fn vote<S: PollStore + 'static>(
    store: web::Data<S>,
    session: Session,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    form: web::Form<VoteForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let question = store
        .find_question(path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;

    let choice_id = voting::parse_choice(form.choice.as_deref());
    match voting::cast_vote(store.get_ref(), &user, &question, choice_id, Utc::now()).await {
        Ok(_) => {
            set_flash(
                &session,
                FlashLevel::Success,
                format!("Your vote for '{}' has been recorded successfully.", question.question_text),
            );
            Ok(see_other(&format!("/polls/{}/results", question.id)))
        }
        Err(VoteError::Rejected(rejection @ VoteRejection::NoChoiceSelected)) => {
            let page = detail_page(store.get_ref(), &session, &user, &question).await?;
            render(page.with_error(rejection.message()))
        }
        Err(VoteError::Rejected(rejection)) => {
            log::info!(
                "Vote by '{}' on question {} refused: {}",
                user.username(), question.id, rejection
            );
            set_flash(&session, FlashLevel::Error, rejection.message());
            Ok(see_other("/polls"))
        }
        Err(VoteError::Store(e)) => Err(e.into()),
    }
}

pub async fn results<S: PollStore + 'static>(
    store: web::Data<S>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let question = store
        .find_question(path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;

    let (tallies, total_votes) = TallyRow::list(store.count_votes_by_choice(question.id).await?);
    let tmpl = ResultsTemplate {
        ctx: PageContext::build(&session),
        question_id: question.id,
        question_text: question.question_text,
        tallies,
        total_votes,
    };
    render(tmpl)
}
