//! Quiz scoring: exact option-id match per question, no partial credit.
//!
//! The loop walks the quiz's own questions, so answers keyed by foreign or
//! made-up question ids are ignored rather than rejected.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::Question;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
  pub question_id: String,
  pub question_text: String,
  pub correct_option_id: String,
  pub user_answer: Option<String>,
  pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scorecard {
  pub score: u32,
  pub total_questions: u32,
  pub results: Vec<QuestionResult>,
}

impl Scorecard {
  /// Questions answered correctly, in quiz order.
  pub fn correct<'a>(&'a self, questions: &'a [Question]) -> impl Iterator<Item = &'a Question> + 'a {
    questions
      .iter()
      .zip(self.results.iter())
      .filter(|(_, r)| r.is_correct)
      .map(|(q, _)| q)
  }
}

pub fn score_attempt(questions: &[Question], answers: &BTreeMap<String, String>) -> Scorecard {
  let mut score = 0u32;
  let results: Vec<QuestionResult> = questions
    .iter()
    .map(|q| {
      let qid = q.id.to_string();
      let user_answer = answers.get(&qid).cloned();
      let is_correct = user_answer.as_deref() == Some(q.correct_option_id.as_str());
      if is_correct {
        score += 1;
      }
      QuestionResult {
        question_id: qid,
        question_text: q.question_text.clone(),
        correct_option_id: q.correct_option_id.clone(),
        user_answer,
        is_correct,
      }
    })
    .collect();

  Scorecard {
    score,
    total_questions: u32::try_from(questions.len()).unwrap_or(u32::MAX),
    results,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionOption;
  use uuid::Uuid;

  fn question(quiz_id: Uuid, order: u32, correct: &str) -> Question {
    Question {
      id: Uuid::new_v4(),
      quiz_id,
      question_text: format!("Q{order}"),
      options: ["a", "b", "c"]
        .iter()
        .map(|id| QuestionOption { id: (*id).into(), text: id.to_uppercase() })
        .collect(),
      correct_option_id: correct.into(),
      order,
    }
  }

  #[test]
  fn two_of_three_correct() {
    let quiz = Uuid::new_v4();
    let qs = vec![question(quiz, 0, "a"), question(quiz, 1, "b"), question(quiz, 2, "c")];
    let answers = BTreeMap::from([
      (qs[0].id.to_string(), "a".to_string()),
      (qs[1].id.to_string(), "b".to_string()),
      (qs[2].id.to_string(), "a".to_string()),
    ]);

    let card = score_attempt(&qs, &answers);
    assert_eq!(card.score, 2);
    assert_eq!(card.total_questions, 3);
    assert!(!card.results[2].is_correct);
    let correct_ids: Vec<Uuid> = card.correct(&qs).map(|q| q.id).collect();
    assert_eq!(correct_ids, vec![qs[0].id, qs[1].id]);
  }

  #[test]
  fn unanswered_and_bogus_ids_never_score() {
    let quiz = Uuid::new_v4();
    let qs = vec![question(quiz, 0, "a"), question(quiz, 1, "b")];
    let answers = BTreeMap::from([
      (Uuid::new_v4().to_string(), "a".to_string()),
      ("not-a-question".to_string(), "b".to_string()),
    ]);

    let card = score_attempt(&qs, &answers);
    assert_eq!(card.score, 0);
    assert!(card.results.iter().all(|r| r.user_answer.is_none()));
  }

  #[test]
  fn empty_quiz_scores_zero_of_zero() {
    let card = score_attempt(&[], &BTreeMap::new());
    assert_eq!((card.score, card.total_questions), (0, 0));
  }
}
