use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use sla_core::contracts::SettingsRepository as SettingsRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::models::GlobalSettings;

const SETTINGS_ROW_ID: &str = "default";

#[derive(FromRow)]
struct SettingsRow {
  default_sla_threshold_minutes: i32,
  warning_offset_minutes: i32,
  escalation_interval_minutes: i32,
  max_escalation_level: i32,
  global_manager_ids: Vec<String>,
  low_rating_threshold: i32,
}

impl From<SettingsRow> for GlobalSettings {
  fn from(row: SettingsRow) -> Self {
    GlobalSettings {
      default_sla_threshold_minutes: row.default_sla_threshold_minutes,
      warning_offset_minutes: row.warning_offset_minutes,
      escalation_interval_minutes: row.escalation_interval_minutes,
      max_escalation_level: row.max_escalation_level,
      global_manager_ids: row.global_manager_ids.into_iter().collect(),
      low_rating_threshold: row.low_rating_threshold,
    }
  }
}

pub struct PgSettingsRepository {
  pool: Arc<PgPool>,
}

impl PgSettingsRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl SettingsRepositoryPort for PgSettingsRepository {
  /// Reads the singleton row, seeding it with defaults on first boot if
  /// absent (`global_settings` is created by the initial migration with
  /// these defaults already, so this is mostly a safety net for a fresh,
  /// un-migrated database in tests).
  async fn load(&self) -> CoreResult<GlobalSettings> {
    let row = sqlx::query_as::<_, SettingsRow>(
      r#"SELECT default_sla_threshold_minutes, warning_offset_minutes,
                escalation_interval_minutes, max_escalation_level,
                global_manager_ids, low_rating_threshold
         FROM global_settings WHERE id = $1"#,
    )
    .bind(SETTINGS_ROW_ID)
    .fetch_optional(&*self.pool)
    .await?;

    match row {
      Some(row) => Ok(row.into()),
      None => {
        let defaults = GlobalSettings::default();
        self.save(&defaults).await?;
        Ok(defaults)
      }
    }
  }

  async fn save(&self, settings: &GlobalSettings) -> CoreResult<()> {
    let managers: Vec<String> = settings.global_manager_ids.iter().cloned().collect();
    sqlx::query(
      r#"INSERT INTO global_settings
           (id, default_sla_threshold_minutes, warning_offset_minutes,
            escalation_interval_minutes, max_escalation_level,
            global_manager_ids, low_rating_threshold)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
           default_sla_threshold_minutes = EXCLUDED.default_sla_threshold_minutes,
           warning_offset_minutes = EXCLUDED.warning_offset_minutes,
           escalation_interval_minutes = EXCLUDED.escalation_interval_minutes,
           max_escalation_level = EXCLUDED.max_escalation_level,
           global_manager_ids = EXCLUDED.global_manager_ids,
           low_rating_threshold = EXCLUDED.low_rating_threshold"#,
    )
    .bind(SETTINGS_ROW_ID)
    .bind(settings.default_sla_threshold_minutes)
    .bind(settings.warning_offset_minutes)
    .bind(settings.escalation_interval_minutes)
    .bind(settings.max_escalation_level)
    .bind(managers)
    .bind(settings.low_rating_threshold)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }
}
