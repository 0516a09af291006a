//! Public protocol structs for the HTTP endpoints (serde ready).
//! Field names are camelCase on the wire; POST bodies are tagged by `type`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
  Attempt, Course, Lesson, Level, Question, QuestionOption, Quiz, User, UserCourseProgress,
};
use crate::ranking::RankingEntry;
use crate::scoring::QuestionResult;

//
// Query strings
//

#[derive(Debug, Deserialize)]
pub struct QuizzesQuery {
  #[serde(rename = "userId")]
  pub user_id: Option<String>,
  #[serde(rename = "quizId")]
  pub quiz_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoursesQuery {
  #[serde(rename = "clerkId")]
  pub clerk_id: Option<String>,
  #[serde(rename = "courseId")]
  pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
  #[serde(rename = "clerkId")]
  pub clerk_id: Option<String>,
}

//
// POST bodies
//

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuizCommand {
  CreateQuiz(CreateQuizIn),
  SubmitAttempt(SubmitAttemptIn),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizIn {
  #[serde(default)]
  pub user_email: Option<String>,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  pub duration_minutes: u32,
  pub questions: Vec<QuestionIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionIn {
  pub question_text: String,
  pub options: Vec<QuestionOption>,
  pub correct_option_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptIn {
  pub quiz_id: Uuid,
  pub user_id: String,
  pub user_email: String,
  #[serde(default)]
  pub user_name: Option<String>,
  #[serde(default)]
  pub answers: BTreeMap<String, String>,
  pub started_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CourseCommand {
  CreateCourse(CreateCourseIn),
  AddLesson(AddLessonIn),
  CompleteLesson(CompleteLessonIn),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseIn {
  #[serde(default)]
  pub user_email: Option<String>,
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub level_requirement: Option<Level>,
  #[serde(default)]
  pub points_awarded: Option<u32>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLessonIn {
  #[serde(default)]
  pub user_email: Option<String>,
  pub course_id: i64,
  pub title: String,
  pub content: String,
  #[serde(default)]
  pub xp_reward: Option<u32>,
  #[serde(default)]
  pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonIn {
  pub clerk_id: String,
  pub lesson_id: i64,
  pub course_id: i64,
}

//
// Responses
//

/// Question as shown to a quiz taker: no correct option.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
  pub id: Uuid,
  pub question_text: String,
  pub options: Vec<QuestionOption>,
  pub order: u32,
}

impl From<Question> for QuestionOut {
  fn from(q: Question) -> Self {
    Self { id: q.id, question_text: q.question_text, options: q.options, order: q.order }
  }
}

#[derive(Debug, Serialize)]
pub struct QuizCatalogOut {
  pub quizzes: Vec<Quiz>,
  pub attempts: Vec<Attempt>,
}

#[derive(Debug, Serialize)]
pub struct QuizDetailOut {
  pub quiz: Quiz,
  pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize)]
pub struct CreateQuizOut {
  pub success: bool,
  pub quiz: Quiz,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptOut {
  pub success: bool,
  pub attempt: Attempt,
  pub results: Vec<QuestionResult>,
  pub correct_answers_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCatalogOut {
  pub success: bool,
  pub courses: Vec<Course>,
  pub user: Option<User>,
  pub user_progress: Vec<UserCourseProgress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailOut {
  pub success: bool,
  pub course: Course,
  pub lessons: Vec<Lesson>,
  pub completed_lesson_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateCourseOut {
  pub success: bool,
  pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct AddLessonOut {
  pub success: bool,
  pub lesson: Lesson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonOut {
  pub success: bool,
  pub already_completed: bool,
  pub xp_earned: u32,
  pub total_xp: u64,
  pub level: Level,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course_progress: Option<UserCourseProgress>,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
  pub rank: usize,
  pub points: u64,
  pub xp: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingsOut {
  pub top_rankers: Vec<RankingEntry>,
  pub total_users: usize,
  pub user_stats: Option<UserStats>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
