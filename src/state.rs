//! Application state: the store plus startup seeding.
//!
//! At startup this module:
//!   - opens the store (from a JSON snapshot when configured)
//!   - merges the configured admin allow-list into the `admins` table
//!   - loads the content bank (config or built-in seeds) into an empty store
//!
//! The admin allow-list lives only in the store; `require_admin` is the one
//! authorization check every authoring operation goes through.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::{load_app_config_from_env, AppConfig, CourseCfg, QuizCfg};
use crate::error::{ApiError, ApiResult};
use crate::logic::{assemble_quiz, QuestionDraft};
use crate::seeds::{seed_courses, seed_quizzes};
use crate::store::{NewCourse, NewLesson, Store, Tables};

/// Author recorded on content loaded from config or seeds.
const SYSTEM_AUTHOR: &str = "system";

pub struct AppState {
  pub store: Store,
}

impl AppState {
  /// Build state from env: APP_CONFIG_PATH plus env overrides.
  #[instrument(level = "info", skip_all)]
  pub async fn from_env() -> ApiResult<Self> {
    let cfg = load_app_config_from_env().unwrap_or_default().with_env_overrides();
    Self::with_config(cfg).await
  }

  pub async fn with_config(cfg: AppConfig) -> ApiResult<Self> {
    let store = Store::open(cfg.snapshot_path.clone())?;

    let (courses, quizzes) = if !cfg.courses.is_empty() || !cfg.quizzes.is_empty() {
      (cfg.courses.clone(), cfg.quizzes.clone())
    } else if cfg.seed_builtin {
      (seed_courses(), seed_quizzes())
    } else {
      (Vec::new(), Vec::new())
    };

    store
      .transact(|t| {
        for email in &cfg.admins {
          t.admins.insert(email.trim().to_string());
        }
        if t.is_empty_catalog() {
          load_content(t, &courses, &quizzes)?;
        }
        Ok(())
      })
      .await?;

    let (admins, courses, lessons, quizzes) = store
      .read(|t| (t.admins.len(), t.courses.len(), t.lessons.len(), t.quizzes.len()))
      .await;
    info!(target: "learnpath", admins, courses, lessons, quizzes, "Startup inventory");
    if admins == 0 {
      warn!(target: "learnpath", "No admins configured; authoring endpoints will reject every caller");
    }

    Ok(Self { store })
  }

  /// Fails with Forbidden unless `email` is on the admin allow-list.
  pub async fn require_admin(&self, email: Option<&str>) -> ApiResult<()> {
    let allowed = match email {
      Some(e) => self.store.read(|t| t.is_admin(e)).await,
      None => false,
    };
    if allowed {
      Ok(())
    } else {
      Err(ApiError::forbidden("Unauthorized: Admin only"))
    }
  }
}

fn load_content(t: &mut Tables, courses: &[CourseCfg], quizzes: &[QuizCfg]) -> ApiResult<()> {
  let now = Utc::now();
  for cc in courses {
    let course = t.insert_course(
      NewCourse {
        title: cc.title.clone(),
        description: cc.description.clone(),
        level_requirement: cc.level_requirement,
        points_awarded: cc.points_awarded,
        image_url: cc.image_url.clone(),
        order: cc.order,
        created_by: SYSTEM_AUTHOR.into(),
      },
      now,
    );
    for lc in &cc.lessons {
      t.insert_lesson(
        NewLesson {
          course_id: course.id,
          title: lc.title.clone(),
          content: lc.content.clone(),
          xp_reward: lc.xp_reward,
          order: lc.order,
        },
        now,
      )?;
    }
  }
  for qc in quizzes {
    let drafts = qc
      .questions
      .iter()
      .map(|q| QuestionDraft {
        question_text: q.question_text.clone(),
        options: q.options.clone(),
        correct_option_id: q.correct_option_id.clone(),
      })
      .collect();
    let (quiz, questions) =
      assemble_quiz(&qc.title, qc.description.clone(), qc.duration_minutes, SYSTEM_AUTHOR, drafts, now)?;
    t.insert_quiz(quiz, questions);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn builtin_seeds_load_into_empty_store() {
    let state = AppState::with_config(AppConfig::default()).await.expect("state");
    let (courses, quizzes) = state.store.read(|t| (t.courses.len(), t.quizzes.len())).await;
    assert_eq!(courses, seed_courses().len());
    assert_eq!(quizzes, seed_quizzes().len());
  }

  #[tokio::test]
  async fn seeding_can_be_disabled() {
    let cfg = AppConfig { seed_builtin: false, ..AppConfig::default() };
    let state = AppState::with_config(cfg).await.expect("state");
    assert!(state.store.read(|t| t.is_empty_catalog()).await);
  }

  #[tokio::test]
  async fn admin_check_uses_configured_allow_list() {
    let cfg = AppConfig {
      admins: vec![" admin@example.com ".into()],
      seed_builtin: false,
      ..AppConfig::default()
    };
    let state = AppState::with_config(cfg).await.expect("state");
    assert!(state.require_admin(Some("admin@example.com")).await.is_ok());
    assert!(matches!(state.require_admin(Some("someone@example.com")).await, Err(ApiError::Forbidden(_))));
    assert!(state.require_admin(None).await.is_err());
  }
}
