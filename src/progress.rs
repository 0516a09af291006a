//! Course completion derived from lesson counts.
//!
//! `UserCourseProgress` caches counts of `UserLessonProgress` rows; the store
//! recomputes it through `apply_counts` after every lesson completion.

use chrono::{DateTime, Utc};

use crate::domain::UserCourseProgress;

/// True when every lesson in the course has a completion row.
pub fn is_course_complete(completed: u32, total: u32) -> bool {
  completed >= total
}

/// Refresh the cached counts. Completion is sticky: a completed row stays
/// completed and keeps the timestamp of its original transition.
pub fn apply_counts(row: &mut UserCourseProgress, completed: u32, total: u32, now: DateTime<Utc>) {
  row.completed_lessons = completed;
  row.total_lessons = total;
  if !row.is_completed && is_course_complete(completed, total) {
    row.is_completed = true;
    row.completed_at = Some(now);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn fresh(now: DateTime<Utc>) -> UserCourseProgress {
    UserCourseProgress {
      id: 1,
      clerk_id: "user_a".into(),
      course_id: 7,
      completed_lessons: 0,
      total_lessons: 0,
      is_completed: false,
      started_at: now,
      completed_at: None,
    }
  }

  #[test]
  fn completes_on_last_lesson_only() {
    let t0 = Utc::now();
    let mut row = fresh(t0);
    for done in 1..=3 {
      apply_counts(&mut row, done, 4, t0);
      assert!(!row.is_completed);
      assert!(row.completed_at.is_none());
    }
    let t4 = t0 + Duration::minutes(5);
    apply_counts(&mut row, 4, 4, t4);
    assert!(row.is_completed);
    assert_eq!(row.completed_at, Some(t4));
    assert_eq!((row.completed_lessons, row.total_lessons), (4, 4));
  }

  #[test]
  fn completion_timestamp_is_not_moved_or_cleared() {
    let t0 = Utc::now();
    let mut row = fresh(t0);
    apply_counts(&mut row, 2, 2, t0);
    // A lesson was added to the course later; the user finishes one more.
    apply_counts(&mut row, 3, 4, t0 + Duration::days(1));
    assert!(row.is_completed);
    assert_eq!(row.completed_at, Some(t0));
    assert_eq!(row.total_lessons, 4);
  }
}
