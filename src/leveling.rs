//! XP -> level mapping and the single place where a user's XP changes.

use crate::domain::{Level, User};

pub const YELLOW_XP: u64 = 500;
pub const GREEN_XP: u64 = 1500;

/// Total over all XP values; 0 maps to `Level::Red`.
pub fn level_for_xp(xp: u64) -> Level {
  if xp >= GREEN_XP {
    Level::Green
  } else if xp >= YELLOW_XP {
    Level::Yellow
  } else {
    Level::Red
  }
}

impl User {
  /// Fresh user row holding `xp`, with the level already derived.
  pub fn with_xp(id: i64, clerk_id: impl Into<String>, xp: u64) -> Self {
    Self {
      id,
      clerk_id: clerk_id.into(),
      xp,
      current_level: level_for_xp(xp),
      streak: 0,
    }
  }

  /// Add XP and recompute the stored level. XP only ever grows.
  pub fn credit_xp(&mut self, amount: u32) {
    self.xp = self.xp.saturating_add(u64::from(amount));
    self.current_level = level_for_xp(self.xp);
  }
}
