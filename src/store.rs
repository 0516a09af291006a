//! Relational tables kept in process, with all-or-nothing transactions.
//!
//! `Store::transact` runs a closure against a draft copy of the tables while
//! holding the write lock. The draft replaces the live tables (and the JSON
//! snapshot, if configured) only when the closure returns `Ok`, so a
//! multi-step write either fully lands or leaves no trace, and concurrent
//! writers are serialized.
//!
//! Each write clones every table and rewrites the whole snapshot, so the cost
//! of a write grows with the total data held.

use std::{
  collections::{BTreeMap, BTreeSet},
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{
  Attempt, CorrectAnswerRecord, Course, Lesson, Level, Question, Quiz, User, UserCourseProgress,
  UserLessonProgress,
};
use crate::error::{ApiError, ApiResult};
use crate::progress::apply_counts;

pub const DEFAULT_COURSE_POINTS: u32 = 50;
pub const DEFAULT_LESSON_XP: u32 = 25;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
  pub admins: BTreeSet<String>,
  /// Keyed by identity-provider id.
  pub users: BTreeMap<String, User>,
  pub quizzes: BTreeMap<Uuid, Quiz>,
  pub questions: BTreeMap<Uuid, Question>,
  pub attempts: BTreeMap<Uuid, Attempt>,
  pub correct_answers: Vec<CorrectAnswerRecord>,
  pub courses: BTreeMap<i64, Course>,
  pub lessons: BTreeMap<i64, Lesson>,
  pub lesson_progress: BTreeMap<i64, UserLessonProgress>,
  pub course_progress: BTreeMap<i64, UserCourseProgress>,
  seq: Sequences,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Sequences {
  user: i64,
  course: i64,
  lesson: i64,
  lesson_progress: i64,
  course_progress: i64,
}

fn next(counter: &mut i64) -> i64 {
  *counter += 1;
  *counter
}

/// Course insert; unset fields take the catalog defaults.
#[derive(Clone, Debug, Default)]
pub struct NewCourse {
  pub title: String,
  pub description: Option<String>,
  pub level_requirement: Option<Level>,
  pub points_awarded: Option<u32>,
  pub image_url: Option<String>,
  pub order: Option<i32>,
  pub created_by: String,
}

#[derive(Clone, Debug, Default)]
pub struct NewLesson {
  pub course_id: i64,
  pub title: String,
  pub content: String,
  pub xp_reward: Option<u32>,
  pub order: Option<i32>,
}

impl Tables {
  pub fn is_admin(&self, email: &str) -> bool {
    self.admins.contains(email.trim())
  }

  pub fn is_empty_catalog(&self) -> bool {
    self.courses.is_empty() && self.quizzes.is_empty()
  }

  // ---- users ----

  pub fn user(&self, clerk_id: &str) -> Option<&User> {
    self.users.get(clerk_id)
  }

  /// Create the user on first credit, otherwise add to the existing XP.
  pub fn credit_xp(&mut self, clerk_id: &str, amount: u32) -> User {
    if let Some(user) = self.users.get_mut(clerk_id) {
      user.credit_xp(amount);
      return user.clone();
    }
    let user = User::with_xp(next(&mut self.seq.user), clerk_id, u64::from(amount));
    self.users.insert(clerk_id.to_string(), user.clone());
    user
  }

  // ---- quizzes ----

  pub fn insert_quiz(&mut self, quiz: Quiz, questions: Vec<Question>) {
    for q in questions {
      self.questions.insert(q.id, q);
    }
    self.quizzes.insert(quiz.id, quiz);
  }

  /// Active quizzes, newest first.
  pub fn active_quizzes(&self) -> Vec<Quiz> {
    let mut out: Vec<Quiz> = self.quizzes.values().filter(|q| q.is_active).cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    out
  }

  pub fn quiz_questions(&self, quiz_id: Uuid) -> Vec<Question> {
    let mut out: Vec<Question> =
      self.questions.values().filter(|q| q.quiz_id == quiz_id).cloned().collect();
    out.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
    out
  }

  pub fn insert_attempt(&mut self, attempt: Attempt, correct: Vec<CorrectAnswerRecord>) {
    self.attempts.insert(attempt.id, attempt);
    self.correct_answers.extend(correct);
  }

  /// A user's attempts, most recently completed first.
  pub fn attempts_for(&self, user_id: &str) -> Vec<Attempt> {
    let mut out: Vec<Attempt> =
      self.attempts.values().filter(|a| a.user_id == user_id).cloned().collect();
    out.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(a.id.cmp(&b.id)));
    out
  }

  // ---- courses ----

  pub fn insert_course(&mut self, new: NewCourse, now: DateTime<Utc>) -> Course {
    let course = Course {
      id: next(&mut self.seq.course),
      title: new.title,
      description: new.description,
      level_requirement: new.level_requirement.unwrap_or_default(),
      points_awarded: new.points_awarded.unwrap_or(DEFAULT_COURSE_POINTS),
      image_url: new.image_url,
      order: new.order.unwrap_or(0),
      created_by: new.created_by,
      created_at: now,
      is_active: true,
    };
    self.courses.insert(course.id, course.clone());
    course
  }

  pub fn insert_lesson(&mut self, new: NewLesson, now: DateTime<Utc>) -> ApiResult<Lesson> {
    if !self.courses.contains_key(&new.course_id) {
      return Err(ApiError::not_found("Course not found"));
    }
    let lesson = Lesson {
      id: next(&mut self.seq.lesson),
      course_id: new.course_id,
      title: new.title,
      content: new.content,
      order: new.order.unwrap_or(0),
      xp_reward: new.xp_reward.unwrap_or(DEFAULT_LESSON_XP),
      created_at: now,
    };
    self.lessons.insert(lesson.id, lesson.clone());
    Ok(lesson)
  }

  /// Active courses by their display order.
  pub fn active_courses(&self) -> Vec<Course> {
    let mut out: Vec<Course> = self.courses.values().filter(|c| c.is_active).cloned().collect();
    out.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
    out
  }

  pub fn course_lessons(&self, course_id: i64) -> Vec<Lesson> {
    let mut out: Vec<Lesson> =
      self.lessons.values().filter(|l| l.course_id == course_id).cloned().collect();
    out.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
    out
  }

  // ---- progress ----

  pub fn lesson_progress_for(&self, clerk_id: &str, lesson_id: i64) -> Option<&UserLessonProgress> {
    self
      .lesson_progress
      .values()
      .find(|p| p.clerk_id == clerk_id && p.lesson_id == lesson_id)
  }

  /// Insert a completion row. (user, lesson) is unique.
  pub fn insert_lesson_progress(
    &mut self,
    clerk_id: &str,
    lesson: &Lesson,
    now: DateTime<Utc>,
  ) -> ApiResult<UserLessonProgress> {
    if self.lesson_progress_for(clerk_id, lesson.id).is_some() {
      return Err(ApiError::Conflict(format!(
        "lesson {} already completed by {clerk_id}",
        lesson.id
      )));
    }
    let row = UserLessonProgress {
      id: next(&mut self.seq.lesson_progress),
      clerk_id: clerk_id.to_string(),
      lesson_id: lesson.id,
      course_id: lesson.course_id,
      completed_at: now,
      xp_earned: lesson.xp_reward,
    };
    self.lesson_progress.insert(row.id, row.clone());
    Ok(row)
  }

  pub fn completed_lesson_ids(&self, clerk_id: &str, course_id: i64) -> Vec<i64> {
    self
      .lesson_progress
      .values()
      .filter(|p| p.clerk_id == clerk_id && p.course_id == course_id)
      .map(|p| p.lesson_id)
      .collect()
  }

  pub fn course_progress_for(&self, clerk_id: &str) -> Vec<UserCourseProgress> {
    self.course_progress.values().filter(|p| p.clerk_id == clerk_id).cloned().collect()
  }

  /// Recount a (user, course) aggregate from the lesson tables and upsert it.
  pub fn recount_course_progress(
    &mut self,
    clerk_id: &str,
    course_id: i64,
    now: DateTime<Utc>,
  ) -> UserCourseProgress {
    let total = count(self.lessons.values().filter(|l| l.course_id == course_id));
    let completed = count(
      self
        .lesson_progress
        .values()
        .filter(|p| p.clerk_id == clerk_id && p.course_id == course_id),
    );

    let id = self
      .course_progress
      .values()
      .find(|p| p.clerk_id == clerk_id && p.course_id == course_id)
      .map(|p| p.id)
      .unwrap_or_else(|| next(&mut self.seq.course_progress));
    let row = self.course_progress.entry(id).or_insert_with(|| UserCourseProgress {
      id,
      clerk_id: clerk_id.to_string(),
      course_id,
      completed_lessons: 0,
      total_lessons: 0,
      is_completed: false,
      started_at: now,
      completed_at: None,
    });
    apply_counts(row, completed, total, now);
    debug!(target: "progress", %clerk_id, course_id, completed, total, is_completed = row.is_completed, "Course progress recounted");
    row.clone()
  }
}

fn count<I: Iterator>(it: I) -> u32 {
  u32::try_from(it.count()).unwrap_or(u32::MAX)
}

pub struct Store {
  tables: RwLock<Tables>,
  snapshot_path: Option<PathBuf>,
}

impl Store {
  /// Open a store backed by a JSON snapshot. A missing file starts empty.
  pub fn open(snapshot_path: Option<PathBuf>) -> ApiResult<Self> {
    let tables = match &snapshot_path {
      Some(path) if path.exists() => {
        let raw = std::fs::read_to_string(path)?;
        let tables: Tables = serde_json::from_str(&raw)?;
        info!(target: "learnpath", path = %path.display(), users = tables.users.len(), courses = tables.courses.len(), quizzes = tables.quizzes.len(), "Loaded store snapshot");
        tables
      }
      Some(path) => {
        info!(target: "learnpath", path = %path.display(), "No snapshot yet; starting empty");
        Tables::default()
      }
      None => Tables::default(),
    };
    Ok(Self { tables: RwLock::new(tables), snapshot_path })
  }

  pub async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
    let guard = self.tables.read().await;
    f(&guard)
  }

  #[instrument(level = "debug", skip_all)]
  pub async fn transact<R>(&self, f: impl FnOnce(&mut Tables) -> ApiResult<R>) -> ApiResult<R> {
    let mut guard = self.tables.write().await;
    let mut draft = guard.clone();
    let out = f(&mut draft)?;
    if let Some(path) = &self.snapshot_path {
      write_snapshot(path, &draft).await?;
    }
    *guard = draft;
    Ok(out)
  }
}

/// Sibling of `path` with ".tmp" appended to the full file name.
fn tmp_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(".tmp");
  PathBuf::from(name)
}

async fn write_snapshot(path: &Path, tables: &Tables) -> ApiResult<()> {
  let bytes = serde_json::to_vec(tables)?;
  let tmp = tmp_path(path);
  tokio::fs::write(&tmp, &bytes).await?;
  tokio::fs::rename(&tmp, path).await?;
  debug!(target: "learnpath", path = %path.display(), bytes = bytes.len(), "Snapshot written");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn course(t: &mut Tables, lessons: usize) -> (Course, Vec<Lesson>) {
    let now = Utc::now();
    let c = t.insert_course(NewCourse { title: "Maps 101".into(), created_by: "admin".into(), ..Default::default() }, now);
    let ls = (0..lessons)
      .map(|i| {
        t.insert_lesson(
          NewLesson { course_id: c.id, title: format!("L{i}"), content: "...".into(), order: Some(i as i32), ..Default::default() },
          now,
        )
        .expect("lesson")
      })
      .collect();
    (c, ls)
  }

  #[test]
  fn defaults_apply_on_insert() {
    let mut t = Tables::default();
    let (c, ls) = course(&mut t, 1);
    assert_eq!(c.level_requirement, Level::Red);
    assert_eq!(c.points_awarded, DEFAULT_COURSE_POINTS);
    assert_eq!(ls[0].xp_reward, DEFAULT_LESSON_XP);
  }

  #[test]
  fn explicit_zero_reward_is_kept() {
    let mut t = Tables::default();
    let (c, _) = course(&mut t, 0);
    let lesson = t
      .insert_lesson(NewLesson { course_id: c.id, title: "Free".into(), xp_reward: Some(0), ..Default::default() }, Utc::now())
      .expect("lesson");
    assert_eq!(lesson.xp_reward, 0);
  }

  #[test]
  fn lesson_for_unknown_course_is_not_found() {
    let mut t = Tables::default();
    let err = t
      .insert_lesson(NewLesson { course_id: 99, title: "x".into(), ..Default::default() }, Utc::now())
      .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[test]
  fn lesson_progress_is_unique_per_user_and_lesson() {
    let mut t = Tables::default();
    let (_, ls) = course(&mut t, 2);
    t.insert_lesson_progress("u1", &ls[0], Utc::now()).expect("first");
    let dup = t.insert_lesson_progress("u1", &ls[0], Utc::now());
    assert!(matches!(dup, Err(ApiError::Conflict(_))));
    t.insert_lesson_progress("u2", &ls[0], Utc::now()).expect("other user");
    assert_eq!(t.lesson_progress.len(), 2);
  }

  #[test]
  fn recount_upserts_a_single_row() {
    let mut t = Tables::default();
    let (c, ls) = course(&mut t, 2);
    let now = Utc::now();
    t.insert_lesson_progress("u1", &ls[0], now).expect("p1");
    let first = t.recount_course_progress("u1", c.id, now);
    t.insert_lesson_progress("u1", &ls[1], now).expect("p2");
    let second = t.recount_course_progress("u1", c.id, now);
    assert_eq!(first.id, second.id);
    assert_eq!(t.course_progress.len(), 1);
    assert!(second.is_completed);
    assert_eq!(second.completed_lessons, 2);
  }

  #[test]
  fn read_model_follows_order_and_recency() {
    let mut t = Tables::default();
    let now = Utc::now();
    let new_course = |title: &str, order: i32| NewCourse {
      title: title.into(),
      order: Some(order),
      created_by: "admin".into(),
      ..Default::default()
    };
    let later = t.insert_course(new_course("Later", 5), now);
    let first = t.insert_course(new_course("First", 1), now);
    let ids: Vec<i64> = t.active_courses().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, later.id]);

    for order in [2, 0, 1] {
      t.insert_lesson(
        NewLesson { course_id: later.id, title: format!("L{order}"), order: Some(order), ..Default::default() },
        now,
      )
      .expect("lesson");
    }
    let orders: Vec<i32> = t.course_lessons(later.id).iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let quiz = |title: &str, created_at: DateTime<Utc>| Quiz {
      id: Uuid::new_v4(),
      title: title.into(),
      description: None,
      duration_minutes: 5,
      created_by: "admin".into(),
      created_at,
      is_active: true,
    };
    let old = quiz("Old", now - chrono::Duration::hours(1));
    let new = quiz("New", now);
    t.insert_quiz(old.clone(), Vec::new());
    t.insert_quiz(new.clone(), Vec::new());
    let ids: Vec<Uuid> = t.active_quizzes().iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![new.id, old.id]);
  }

  #[test]
  fn tmp_path_appends_to_the_file_name() {
    assert_eq!(tmp_path(Path::new("/data/store.json")), PathBuf::from("/data/store.json.tmp"));
    assert_eq!(tmp_path(Path::new("/data/store.tmp")), PathBuf::from("/data/store.tmp.tmp"));
  }

  #[test]
  fn credit_creates_then_accumulates() {
    let mut t = Tables::default();
    assert_eq!(t.credit_xp("u1", 300).xp, 300);
    let u = t.credit_xp("u1", 300);
    assert_eq!((u.xp, u.current_level), (600, Level::Yellow));
    assert_eq!(t.users.len(), 1);
  }

  #[tokio::test]
  async fn failed_transaction_leaves_tables_untouched() {
    let store = Store::open(None).expect("store");
    let res: ApiResult<()> = store
      .transact(|t| {
        t.credit_xp("u1", 100);
        Err(ApiError::invalid("abort"))
      })
      .await;
    assert!(res.is_err());
    assert!(store.read(|t| t.user("u1").is_none()).await);
  }

  #[tokio::test]
  async fn snapshot_round_trips_through_disk() {
    let path = std::env::temp_dir().join(format!("learnpath-store-{}.json", Uuid::new_v4()));
    {
      let store = Store::open(Some(path.clone())).expect("open");
      store
        .transact(|t| {
          t.admins.insert("admin@example.com".into());
          t.credit_xp("u1", 42);
          Ok(())
        })
        .await
        .expect("write");
    }
    let reopened = Store::open(Some(path.clone())).expect("reopen");
    let (xp, admin) = reopened
      .read(|t| (t.user("u1").map(|u| u.xp), t.is_admin("admin@example.com")))
      .await;
    assert_eq!(xp, Some(42));
    assert!(admin);
    // Sequences survive too: the next user gets a fresh id.
    let u2 = reopened.transact(|t| Ok(t.credit_xp("u2", 1))).await.expect("u2");
    assert_eq!(u2.id, 2);
    let _ = std::fs::remove_file(&path);
  }
}
