//! Loading service configuration (admin allow-list, storage, content bank) from TOML.
//!
//! See `AppConfig` for the expected schema. Environment variables layered on top:
//!   ADMIN_EMAILS       : comma-separated, merged into `admins`
//!   DATA_SNAPSHOT_PATH : overrides `snapshot_path`

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Level, QuestionOption};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
  /// Emails allowed to author courses, lessons and quizzes.
  #[serde(default)]
  pub admins: Vec<String>,
  #[serde(default)]
  pub snapshot_path: Option<PathBuf>,
  /// Seed the built-in demo content when the store and this file have none.
  #[serde(default = "default_true")]
  pub seed_builtin: bool,
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
  #[serde(default)]
  pub quizzes: Vec<QuizCfg>,
}

fn default_true() -> bool { true }

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      admins: Vec::new(),
      snapshot_path: None,
      seed_builtin: true,
      courses: Vec::new(),
      quizzes: Vec::new(),
    }
  }
}

/// Course entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub level_requirement: Option<Level>,
  #[serde(default)] pub points_awarded: Option<u32>,
  #[serde(default)] pub image_url: Option<String>,
  #[serde(default)] pub order: Option<i32>,
  #[serde(default)] pub lessons: Vec<LessonCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  pub title: String,
  pub content: String,
  #[serde(default)] pub xp_reward: Option<u32>,
  #[serde(default)] pub order: Option<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  pub duration_minutes: u32,
  pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub question_text: String,
  pub options: Vec<QuestionOption>,
  pub correct_option_id: String,
}

impl AppConfig {
  /// Apply ADMIN_EMAILS / DATA_SNAPSHOT_PATH on top of the file values.
  pub fn with_env_overrides(mut self) -> Self {
    if let Ok(list) = std::env::var("ADMIN_EMAILS") {
      self.admins.extend(parse_email_list(&list));
    }
    if let Ok(path) = std::env::var("DATA_SNAPSHOT_PATH") {
      if !path.trim().is_empty() {
        self.snapshot_path = Some(PathBuf::from(path.trim()));
      }
    }
    self
  }
}

pub fn parse_email_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "learnpath", %path, admins = cfg.admins.len(), courses = cfg.courses.len(), quizzes = cfg.quizzes.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "learnpath", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "learnpath", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_content_bank() {
    let raw = r#"
      admins = ["admin@example.com"]
      snapshot_path = "/tmp/learnpath.json"
      seed_builtin = false

      [[courses]]
      title = "Reading the map"
      level_requirement = "YELLOW"
      points_awarded = 80

      [[courses.lessons]]
      title = "Legend"
      content = "Symbols and what they mean."
      xp_reward = 30

      [[quizzes]]
      title = "Signs"
      duration_minutes = 5

      [[quizzes.questions]]
      question_text = "Red octagon?"
      correct_option_id = "stop"
      options = [{ id = "stop", text = "Stop" }, { id = "yield", text = "Yield" }]
    "#;
    let cfg: AppConfig = toml::from_str(raw).expect("config");
    assert_eq!(cfg.admins, vec!["admin@example.com"]);
    assert!(!cfg.seed_builtin);
    assert_eq!(cfg.courses[0].level_requirement, Some(Level::Yellow));
    assert_eq!(cfg.courses[0].lessons[0].xp_reward, Some(30));
    assert_eq!(cfg.quizzes[0].questions[0].options.len(), 2);
  }

  #[test]
  fn empty_file_keeps_defaults() {
    let cfg: AppConfig = toml::from_str("").expect("config");
    assert!(cfg.seed_builtin);
    assert!(cfg.admins.is_empty() && cfg.snapshot_path.is_none());
  }

  #[test]
  fn email_list_skips_blanks() {
    assert_eq!(parse_email_list(" a@x.io, ,b@x.io,"), vec!["a@x.io", "b@x.io"]);
  }
}
