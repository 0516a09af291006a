//! Built-in starter content, loaded into an empty store so a fresh install is usable.

use crate::config::{CourseCfg, LessonCfg, QuestionCfg, QuizCfg};
use crate::domain::{Level, QuestionOption};

fn lesson(order: i32, title: &str, content: &str) -> LessonCfg {
  LessonCfg { title: title.into(), content: content.into(), xp_reward: None, order: Some(order) }
}

fn options(pairs: &[(&str, &str)]) -> Vec<QuestionOption> {
  pairs.iter().map(|(id, text)| QuestionOption { id: (*id).into(), text: (*text).into() }).collect()
}

pub fn seed_courses() -> Vec<CourseCfg> {
  vec![
    CourseCfg {
      title: "Getting Around Safely".into(),
      description: Some("Street basics before your first solo trip.".into()),
      level_requirement: Some(Level::Red),
      points_awarded: None,
      image_url: None,
      order: Some(0),
      lessons: vec![
        lesson(0, "Crossing the street", "Use marked crossings and wait for the walk signal."),
        lesson(1, "Reading bus stops", "Each stop lists route numbers and the direction of travel."),
        lesson(2, "Asking for directions", "Name a landmark near your destination, not just the address."),
      ],
    },
    CourseCfg {
      title: "Map Reading".into(),
      description: Some("Orientation, scale and planning a route.".into()),
      level_requirement: Some(Level::Yellow),
      points_awarded: Some(80),
      image_url: None,
      order: Some(1),
      lessons: vec![
        lesson(0, "North up", "Most maps put north at the top; check the compass rose."),
        LessonCfg { xp_reward: Some(40), ..lesson(1, "Scale bars", "Measure distance against the scale bar before you set off.") },
      ],
    },
  ]
}

pub fn seed_quizzes() -> Vec<QuizCfg> {
  vec![QuizCfg {
    title: "Road Signs".into(),
    description: Some("Five minutes, three signs.".into()),
    duration_minutes: 5,
    questions: vec![
      QuestionCfg {
        question_text: "What does a red octagonal sign mean?".into(),
        options: options(&[("stop", "Stop"), ("yield", "Yield"), ("slow", "Slow down")]),
        correct_option_id: "stop".into(),
      },
      QuestionCfg {
        question_text: "A green pedestrian signal means:".into(),
        options: options(&[("wait", "Wait"), ("cross", "You may cross"), ("run", "Hurry")]),
        correct_option_id: "cross".into(),
      },
      QuestionCfg {
        question_text: "A yellow diamond-shaped sign is usually a:".into(),
        options: options(&[("warning", "Warning"), ("rule", "Regulation")]),
        correct_option_id: "warning".into(),
      },
    ],
  }]
}
