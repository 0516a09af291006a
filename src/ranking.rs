//! Leaderboard aggregation over correct-answer records.
//!
//! Groups by (user id, display name, email), counts rows, and sorts by count
//! descending. Equal counts are ordered by user id, then name, then email, so
//! the board is identical for identical input regardless of row order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::CorrectAnswerRecord;

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
  pub user_id: String,
  pub user_name: String,
  pub user_email: String,
  pub total_correct_answers: u64,
  pub rank: usize,
}

/// Where one user sits on the board. Users without records get `len + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Standing {
  pub rank: usize,
  pub points: u64,
}

pub fn build_leaderboard(records: &[CorrectAnswerRecord]) -> Vec<RankingEntry> {
  let mut groups: BTreeMap<(&str, Option<&str>, &str), u64> = BTreeMap::new();
  for r in records {
    *groups
      .entry((r.user_id.as_str(), r.user_name.as_deref(), r.user_email.as_str()))
      .or_default() += 1;
  }

  // BTreeMap iteration already yields the secondary key order; the stable sort keeps it.
  let mut rows: Vec<_> = groups.into_iter().collect();
  rows.sort_by(|a, b| b.1.cmp(&a.1));

  rows
    .into_iter()
    .enumerate()
    .map(|(idx, ((user_id, user_name, user_email), count))| RankingEntry {
      user_id: user_id.to_string(),
      user_name: user_name.unwrap_or(ANONYMOUS).to_string(),
      user_email: user_email.to_string(),
      total_correct_answers: count,
      rank: idx + 1,
    })
    .collect()
}

pub fn standing_of(board: &[RankingEntry], user_id: &str) -> Standing {
  match board.iter().position(|e| e.user_id == user_id) {
    Some(idx) => Standing { rank: idx + 1, points: board[idx].total_correct_answers },
    None => Standing { rank: board.len() + 1, points: 0 },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use uuid::Uuid;

  fn record(user: &str, name: Option<&str>) -> CorrectAnswerRecord {
    CorrectAnswerRecord {
      id: Uuid::new_v4(),
      attempt_id: Uuid::new_v4(),
      quiz_id: Uuid::new_v4(),
      question_id: Uuid::new_v4(),
      user_id: user.into(),
      user_email: format!("{user}@example.com"),
      user_name: name.map(Into::into),
      selected_option_id: "a".into(),
      correct_option_id: "a".into(),
      answered_at: Utc::now(),
    }
  }

  #[test]
  fn sorted_by_count_descending_with_ranks() {
    let rows = vec![
      record("u2", Some("Bea")),
      record("u1", Some("Ann")),
      record("u2", Some("Bea")),
      record("u3", None),
      record("u2", Some("Bea")),
      record("u3", None),
    ];
    let board = build_leaderboard(&rows);
    let summary: Vec<(&str, u64, usize)> = board
      .iter()
      .map(|e| (e.user_id.as_str(), e.total_correct_answers, e.rank))
      .collect();
    assert_eq!(summary, vec![("u2", 3, 1), ("u3", 2, 2), ("u1", 1, 3)]);
    assert_eq!(board[1].user_name, ANONYMOUS);
  }

  #[test]
  fn ties_break_on_user_id_independent_of_input_order() {
    let a = vec![record("zed", None), record("amy", None), record("kim", None)];
    let mut b = a.clone();
    b.reverse();
    let ids = |rows: &[CorrectAnswerRecord]| -> Vec<String> {
      build_leaderboard(rows).into_iter().map(|e| e.user_id).collect()
    };
    assert_eq!(ids(&a), vec!["amy", "kim", "zed"]);
    assert_eq!(ids(&a), ids(&b));
  }

  #[test]
  fn unranked_user_goes_last_with_zero_points() {
    let board = build_leaderboard(&[record("u1", None), record("u2", None)]);
    assert_eq!(standing_of(&board, "ghost"), Standing { rank: 3, points: 0 });
    assert_eq!(standing_of(&board, "u2").points, 1);
    assert_eq!(standing_of(&[], "ghost"), Standing { rank: 1, points: 0 });
  }
}
