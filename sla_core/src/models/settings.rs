use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Singleton row (id `"default"`) holding the tunables referenced
/// throughout the engine. Workers re-read this periodically so an
/// operator's change takes effect without a restart (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
  pub default_sla_threshold_minutes: i32,
  pub warning_offset_minutes: i32,
  pub escalation_interval_minutes: i32,
  pub max_escalation_level: i32,
  pub global_manager_ids: HashSet<String>,
  pub low_rating_threshold: i32,
}

impl Default for GlobalSettings {
  fn default() -> Self {
    Self {
      default_sla_threshold_minutes: 60,
      warning_offset_minutes: 12,
      escalation_interval_minutes: 30,
      max_escalation_level: 5,
      global_manager_ids: HashSet::new(),
      low_rating_threshold: 3,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_spec() {
    let s = GlobalSettings::default();
    assert_eq!(s.warning_offset_minutes, 12);
    assert_eq!(s.escalation_interval_minutes, 30);
    assert_eq!(s.max_escalation_level, 5);
    assert_eq!(s.low_rating_threshold, 3);
  }
}
