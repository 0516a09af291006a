//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! POST bodies are decoded here into tagged commands so every rejection is a JSON error.

use std::sync::Arc;

use axum::{
  body::Bytes,
  extract::{Query, State},
  response::{IntoResponse, Response},
  Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::{present_param, trunc_for_log};

const QUIZ_COMMANDS: &[&str] = &["create-quiz", "submit-attempt"];
const COURSE_COMMANDS: &[&str] = &["create-course", "add-lesson", "complete-lesson"];

/// Parse a JSON body and decode it as one of the `known` command types.
fn decode_command<T: DeserializeOwned>(body: &[u8], known: &[&str]) -> ApiResult<T> {
  let raw: Value = serde_json::from_slice(body).map_err(|e| {
    warn!(target: "learnpath", body = %trunc_for_log(&String::from_utf8_lossy(body), 200), "Unparseable request body");
    ApiError::invalid(format!("Malformed JSON body: {e}"))
  })?;
  let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
  if !known.contains(&kind.as_str()) {
    return Err(ApiError::invalid("Invalid request type"));
  }
  serde_json::from_value(raw).map_err(|e| ApiError::invalid(format!("Invalid {kind} request: {e}")))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_quizzes(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuizzesQuery>,
) -> ApiResult<Response> {
  if let Some(quiz_id) = present_param(q.quiz_id.as_deref()) {
    return Ok(Json(get_quiz(&state, quiz_id).await?).into_response());
  }
  let catalog = list_quizzes(&state, present_param(q.user_id.as_deref())).await;
  Ok(Json(catalog).into_response())
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn http_post_quizzes(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Response> {
  match decode_command::<QuizCommand>(&body, QUIZ_COMMANDS)? {
    QuizCommand::CreateQuiz(cmd) => Ok(Json(create_quiz(&state, cmd).await?).into_response()),
    QuizCommand::SubmitAttempt(cmd) => Ok(Json(submit_attempt(&state, cmd).await?).into_response()),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_courses(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CoursesQuery>,
) -> ApiResult<Response> {
  let clerk_id = present_param(q.clerk_id.as_deref());
  // A non-numeric courseId falls through to the catalog.
  let course_id = present_param(q.course_id.as_deref()).and_then(|s| s.parse::<i64>().ok());
  match course_id {
    Some(id) => Ok(Json(get_course(&state, id, clerk_id).await?).into_response()),
    None => Ok(Json(list_courses(&state, clerk_id).await).into_response()),
  }
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn http_post_courses(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Response> {
  match decode_command::<CourseCommand>(&body, COURSE_COMMANDS)? {
    CourseCommand::CreateCourse(cmd) => Ok(Json(create_course(&state, cmd).await?).into_response()),
    CourseCommand::AddLesson(cmd) => Ok(Json(add_lesson(&state, cmd).await?).into_response()),
    CourseCommand::CompleteLesson(cmd) => Ok(Json(complete_lesson(&state, cmd).await?).into_response()),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_rankings(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RankingsQuery>,
) -> impl IntoResponse {
  Json(rankings(&state, present_param(q.clerk_id.as_deref())).await)
}
