//! Domain models: users, quizzes and their attempts, courses and lesson progress.
//!
//! All rows serialize in camelCase, which is what the mobile client reads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tier derived from cumulative XP. Ordered lowest to highest.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
  #[default]
  Red,
  Yellow,
  Green,
}

impl Level {
  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Red => "RED",
      Level::Yellow => "YELLOW",
      Level::Green => "GREEN",
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub clerk_id: String,
  pub xp: u64,
  /// Cached copy of `leveling::level_for_xp(xp)`; only `User::credit_xp` writes it.
  pub current_level: Level,
  #[serde(default)] pub streak: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub id: Uuid,
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  pub duration_minutes: u32,
  pub created_by: String,
  pub created_at: DateTime<Utc>,
  pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionOption {
  pub id: String,
  pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: Uuid,
  pub quiz_id: Uuid,
  pub question_text: String,
  pub options: Vec<QuestionOption>,
  pub correct_option_id: String,
  pub order: u32,
}

/// One submission of answers; never updated after insert.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
  pub id: Uuid,
  pub quiz_id: Uuid,
  pub user_id: String,
  pub user_email: String,
  #[serde(default)] pub user_name: Option<String>,
  /// question id -> selected option id, exactly as submitted.
  pub answers: BTreeMap<String, String>,
  pub score: u32,
  pub total_questions: u32,
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
}

/// One correctly answered question inside an attempt. Sole input to rankings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswerRecord {
  pub id: Uuid,
  pub attempt_id: Uuid,
  pub quiz_id: Uuid,
  pub question_id: Uuid,
  pub user_id: String,
  pub user_email: String,
  #[serde(default)] pub user_name: Option<String>,
  pub selected_option_id: String,
  pub correct_option_id: String,
  pub answered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: i64,
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  pub level_requirement: Level,
  pub points_awarded: u32,
  #[serde(default)] pub image_url: Option<String>,
  pub order: i32,
  pub created_by: String,
  pub created_at: DateTime<Utc>,
  pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: i64,
  pub course_id: i64,
  pub title: String,
  pub content: String,
  pub order: i32,
  pub xp_reward: u32,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserLessonProgress {
  pub id: i64,
  pub clerk_id: String,
  pub lesson_id: i64,
  pub course_id: i64,
  pub completed_at: DateTime<Utc>,
  pub xp_earned: u32,
}

/// Cached aggregate over `UserLessonProgress` for one (user, course) pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserCourseProgress {
  pub id: i64,
  pub clerk_id: String,
  pub course_id: i64,
  pub completed_lessons: u32,
  pub total_lessons: u32,
  pub is_completed: bool,
  pub started_at: DateTime<Utc>,
  #[serde(default)] pub completed_at: Option<DateTime<Utc>>,
}
