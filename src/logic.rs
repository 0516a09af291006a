//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Quiz catalog/detail reads, quiz authoring and attempt scoring
//!   - Course catalog/detail reads, course and lesson authoring
//!   - Lesson completion: XP accrual, level recompute, course aggregate
//!   - Leaderboard and per-user standing
//!
//! Each write runs as one store transaction.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{Attempt, CorrectAnswerRecord, Question, QuestionOption, Quiz};
use crate::error::{ApiError, ApiResult};
use crate::protocol::*;
use crate::ranking::{build_leaderboard, standing_of};
use crate::scoring::score_attempt;
use crate::state::AppState;
use crate::store::{NewCourse, NewLesson};

/// A question before it is attached to a quiz.
#[derive(Clone, Debug)]
pub struct QuestionDraft {
  pub question_text: String,
  pub options: Vec<QuestionOption>,
  pub correct_option_id: String,
}

/// Validate and build a quiz with its questions; question order follows input order.
pub fn assemble_quiz(
  title: &str,
  description: Option<String>,
  duration_minutes: u32,
  created_by: &str,
  drafts: Vec<QuestionDraft>,
  now: DateTime<Utc>,
) -> ApiResult<(Quiz, Vec<Question>)> {
  let title = title.trim();
  if title.is_empty() {
    return Err(ApiError::invalid("Quiz title must not be empty"));
  }
  if duration_minutes == 0 {
    return Err(ApiError::invalid("durationMinutes must be positive"));
  }
  if drafts.is_empty() {
    return Err(ApiError::invalid("A quiz needs at least one question"));
  }

  let quiz = Quiz {
    id: Uuid::new_v4(),
    title: title.to_string(),
    description,
    duration_minutes,
    created_by: created_by.to_string(),
    created_at: now,
    is_active: true,
  };

  let mut questions = Vec::with_capacity(drafts.len());
  for (idx, d) in drafts.into_iter().enumerate() {
    let ids: BTreeSet<&str> = d.options.iter().map(|o| o.id.as_str()).collect();
    if ids.len() != d.options.len() {
      return Err(ApiError::invalid(format!("Question {} has duplicate option ids", idx + 1)));
    }
    if !ids.contains(d.correct_option_id.as_str()) {
      return Err(ApiError::invalid(format!(
        "Question {}: correctOptionId '{}' is not one of its options",
        idx + 1,
        d.correct_option_id
      )));
    }
    questions.push(Question {
      id: Uuid::new_v4(),
      quiz_id: quiz.id,
      question_text: d.question_text,
      options: d.options,
      correct_option_id: d.correct_option_id,
      order: u32::try_from(idx).unwrap_or(u32::MAX),
    });
  }
  Ok((quiz, questions))
}

// -------- quizzes --------

#[instrument(level = "info", skip(state))]
pub async fn list_quizzes(state: &AppState, user_id: Option<&str>) -> QuizCatalogOut {
  state
    .store
    .read(|t| QuizCatalogOut {
      quizzes: t.active_quizzes(),
      attempts: user_id.map(|u| t.attempts_for(u)).unwrap_or_default(),
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn get_quiz(state: &AppState, quiz_id: &str) -> ApiResult<QuizDetailOut> {
  let not_found = || ApiError::not_found("Quiz not found");
  let id = Uuid::parse_str(quiz_id).map_err(|_| not_found())?;
  state
    .store
    .read(|t| {
      let quiz = t.quizzes.get(&id).cloned().ok_or_else(not_found)?;
      let questions = t.quiz_questions(id).into_iter().map(QuestionOut::from).collect();
      Ok(QuizDetailOut { quiz, questions })
    })
    .await
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title, questions = body.questions.len()))]
pub async fn create_quiz(state: &AppState, body: CreateQuizIn) -> ApiResult<CreateQuizOut> {
  state.require_admin(body.user_email.as_deref()).await?;
  let author = body.user_email.unwrap_or_default();
  let drafts = body
    .questions
    .into_iter()
    .map(|q| QuestionDraft {
      question_text: q.question_text,
      options: q.options,
      correct_option_id: q.correct_option_id,
    })
    .collect();
  let (quiz, questions) =
    assemble_quiz(&body.title, body.description, body.duration_minutes, &author, drafts, Utc::now())?;

  let out = quiz.clone();
  state
    .store
    .transact(move |t| {
      t.insert_quiz(quiz, questions);
      Ok(())
    })
    .await?;
  info!(target: "quiz", id = %out.id, %author, "Quiz created");
  Ok(CreateQuizOut { success: true, quiz: out })
}

/// Score an attempt and record it with one correct-answer row per hit.
/// Re-submissions are allowed; each one is a separate attempt.
#[instrument(level = "info", skip(state, body), fields(quiz_id = %body.quiz_id, user_id = %body.user_id, answers = body.answers.len()))]
pub async fn submit_attempt(state: &AppState, body: SubmitAttemptIn) -> ApiResult<SubmitAttemptOut> {
  let now = Utc::now();
  let out = state
    .store
    .transact(|t| {
      if !t.quizzes.contains_key(&body.quiz_id) {
        return Err(ApiError::not_found("Quiz not found"));
      }
      let questions = t.quiz_questions(body.quiz_id);
      let card = score_attempt(&questions, &body.answers);

      let attempt = Attempt {
        id: Uuid::new_v4(),
        quiz_id: body.quiz_id,
        user_id: body.user_id.clone(),
        user_email: body.user_email.clone(),
        user_name: body.user_name.clone(),
        answers: body.answers.clone(),
        score: card.score,
        total_questions: card.total_questions,
        started_at: body.started_at,
        completed_at: now,
      };
      let records: Vec<CorrectAnswerRecord> = card
        .correct(&questions)
        .map(|q| CorrectAnswerRecord {
          id: Uuid::new_v4(),
          attempt_id: attempt.id,
          quiz_id: body.quiz_id,
          question_id: q.id,
          user_id: body.user_id.clone(),
          user_email: body.user_email.clone(),
          user_name: body.user_name.clone(),
          selected_option_id: q.correct_option_id.clone(),
          correct_option_id: q.correct_option_id.clone(),
          answered_at: now,
        })
        .collect();
      let correct_answers_count = u32::try_from(records.len()).unwrap_or(u32::MAX);

      t.insert_attempt(attempt.clone(), records);
      Ok(SubmitAttemptOut { success: true, attempt, results: card.results, correct_answers_count })
    })
    .await?;

  info!(target: "quiz", attempt = %out.attempt.id, score = out.attempt.score, total = out.attempt.total_questions, "Attempt scored");
  Ok(out)
}

// -------- courses --------

#[instrument(level = "info", skip(state))]
pub async fn list_courses(state: &AppState, clerk_id: Option<&str>) -> CourseCatalogOut {
  state
    .store
    .read(|t| CourseCatalogOut {
      success: true,
      courses: t.active_courses(),
      user: clerk_id.and_then(|c| t.user(c).cloned()),
      user_progress: clerk_id.map(|c| t.course_progress_for(c)).unwrap_or_default(),
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn get_course(state: &AppState, course_id: i64, clerk_id: Option<&str>) -> ApiResult<CourseDetailOut> {
  state
    .store
    .read(|t| {
      let course = t
        .courses
        .get(&course_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
      Ok(CourseDetailOut {
        success: true,
        course,
        lessons: t.course_lessons(course_id),
        completed_lesson_ids: clerk_id.map(|c| t.completed_lesson_ids(c, course_id)).unwrap_or_default(),
      })
    })
    .await
}

#[instrument(level = "info", skip(state, body), fields(title = %body.title))]
pub async fn create_course(state: &AppState, body: CreateCourseIn) -> ApiResult<CreateCourseOut> {
  state.require_admin(body.user_email.as_deref()).await?;
  if body.title.trim().is_empty() {
    return Err(ApiError::invalid("Course title must not be empty"));
  }
  let new = NewCourse {
    title: body.title.trim().to_string(),
    description: body.description,
    level_requirement: body.level_requirement,
    points_awarded: body.points_awarded,
    image_url: body.image_url,
    order: body.order,
    created_by: body.user_email.unwrap_or_default(),
  };
  let course = state.store.transact(|t| Ok(t.insert_course(new, Utc::now()))).await?;
  info!(target: "learnpath", id = course.id, "Course created");
  Ok(CreateCourseOut { success: true, course })
}

#[instrument(level = "info", skip(state, body), fields(course_id = body.course_id, title = %body.title))]
pub async fn add_lesson(state: &AppState, body: AddLessonIn) -> ApiResult<AddLessonOut> {
  state.require_admin(body.user_email.as_deref()).await?;
  let new = NewLesson {
    course_id: body.course_id,
    title: body.title,
    content: body.content,
    xp_reward: body.xp_reward,
    order: body.order,
  };
  let lesson = state.store.transact(|t| t.insert_lesson(new, Utc::now())).await?;
  info!(target: "learnpath", id = lesson.id, course_id = lesson.course_id, "Lesson added");
  Ok(AddLessonOut { success: true, lesson })
}

/// Mark a lesson complete, credit its XP once, and refresh the course aggregate.
///
/// The whole check-then-write sequence is one transaction, so concurrent
/// completions of the same (user, lesson) credit XP exactly once.
#[instrument(level = "info", skip(state, body), fields(clerk_id = %body.clerk_id, lesson_id = body.lesson_id, course_id = body.course_id))]
pub async fn complete_lesson(state: &AppState, body: CompleteLessonIn) -> ApiResult<CompleteLessonOut> {
  let now = Utc::now();
  let clerk_id = body.clerk_id.trim();
  if clerk_id.is_empty() {
    return Err(ApiError::invalid("clerkId is required"));
  }

  let out = state
    .store
    .transact(|t| {
      if t.lesson_progress_for(clerk_id, body.lesson_id).is_some() {
        let (total_xp, level) = t.user(clerk_id).map(|u| (u.xp, u.current_level)).unwrap_or_default();
        return Ok(CompleteLessonOut {
          success: true,
          already_completed: true,
          xp_earned: 0,
          total_xp,
          level,
          message: Some("Already completed".into()),
          course_progress: None,
        });
      }

      let lesson = t
        .lessons
        .get(&body.lesson_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Lesson not found"))?;
      if lesson.course_id != body.course_id {
        return Err(ApiError::invalid(format!(
          "Lesson {} does not belong to course {}",
          lesson.id, body.course_id
        )));
      }

      let row = t.insert_lesson_progress(clerk_id, &lesson, now)?;
      let user = t.credit_xp(clerk_id, row.xp_earned);
      let course_progress = t.recount_course_progress(clerk_id, lesson.course_id, now);

      Ok(CompleteLessonOut {
        success: true,
        already_completed: false,
        xp_earned: row.xp_earned,
        total_xp: user.xp,
        level: user.current_level,
        message: None,
        course_progress: Some(course_progress),
      })
    })
    .await?;

  if out.already_completed {
    debug!(target: "progress", %clerk_id, lesson_id = body.lesson_id, "Lesson already completed; no XP");
  } else {
    info!(target: "progress", %clerk_id, lesson_id = body.lesson_id, xp_earned = out.xp_earned, total_xp = out.total_xp, level = out.level.as_str(), "Lesson completed");
  }
  Ok(out)
}

// -------- rankings --------

#[instrument(level = "info", skip(state))]
pub async fn rankings(state: &AppState, clerk_id: Option<&str>) -> RankingsOut {
  let out = state
    .store
    .read(|t| {
      let board = build_leaderboard(&t.correct_answers);
      let user_stats = clerk_id.map(|c| {
        let standing = standing_of(&board, c);
        UserStats {
          rank: standing.rank,
          points: standing.points,
          xp: t.user(c).map(|u| u.xp).unwrap_or(0),
        }
      });
      RankingsOut { total_users: board.len(), top_rankers: board, user_stats }
    })
    .await;
  debug!(target: "ranking", total_users = out.total_users, with_user = out.user_stats.is_some(), "Leaderboard built");
  out
}
