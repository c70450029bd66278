use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sla_core::contracts::AlertRepository as AlertRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::{AlertId, RequestId};
use sla_core::models::alert::{Alert, AlertType, DeliveryStatus, ResolvedAction};

#[derive(FromRow)]
struct AlertRow {
  id: Uuid,
  request_id: Uuid,
  alert_type: AlertType,
  minutes_elapsed: i64,
  escalation_level: i32,
  recipient_ids: Vec<String>,
  delivery_status: DeliveryStatus,
  next_escalation_at: Option<DateTime<Utc>>,
  resolved_action: Option<ResolvedAction>,
  created_at: DateTime<Utc>,
}

impl From<AlertRow> for Alert {
  fn from(row: AlertRow) -> Self {
    Alert {
      id: AlertId(row.id),
      request_id: RequestId(row.request_id),
      alert_type: row.alert_type,
      minutes_elapsed: row.minutes_elapsed,
      escalation_level: row.escalation_level,
      recipient_ids: row.recipient_ids,
      delivery_status: row.delivery_status,
      next_escalation_at: row.next_escalation_at,
      resolved_action: row.resolved_action,
      created_at: row.created_at,
    }
  }
}

const SELECT_COLUMNS: &str = r#"id, request_id, alert_type, minutes_elapsed, escalation_level,
  recipient_ids, delivery_status, next_escalation_at, resolved_action, created_at"#;

pub struct PgAlertRepository {
  pool: Arc<PgPool>,
}

impl PgAlertRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl AlertRepositoryPort for PgAlertRepository {
  async fn insert(&self, alert: &Alert) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO sla_alerts
           (id, request_id, alert_type, minutes_elapsed, escalation_level,
            recipient_ids, delivery_status, next_escalation_at, resolved_action, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
    )
    .bind(alert.id.0)
    .bind(alert.request_id.0)
    .bind(alert.alert_type)
    .bind(alert.minutes_elapsed)
    .bind(alert.escalation_level)
    .bind(&alert.recipient_ids)
    .bind(alert.delivery_status)
    .bind(alert.next_escalation_at)
    .bind(alert.resolved_action)
    .bind(alert.created_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn find_by_id(&self, id: AlertId) -> CoreResult<Option<Alert>> {
    let row = sqlx::query_as::<_, AlertRow>(&format!("SELECT {SELECT_COLUMNS} FROM sla_alerts WHERE id = $1"))
      .bind(id.0)
      .fetch_optional(&*self.pool)
      .await?;
    Ok(row.map(Alert::from))
  }

  async fn find_unresolved(&self, request_id: RequestId, escalation_level: i32) -> CoreResult<Option<Alert>> {
    let row = sqlx::query_as::<_, AlertRow>(&format!(
      r#"SELECT {SELECT_COLUMNS} FROM sla_alerts
         WHERE request_id = $1 AND escalation_level = $2 AND resolved_action IS NULL"#
    ))
    .bind(request_id.0)
    .bind(escalation_level)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(Alert::from))
  }

  async fn list_unresolved_for_request(&self, request_id: RequestId) -> CoreResult<Vec<Alert>> {
    let rows = sqlx::query_as::<_, AlertRow>(&format!(
      "SELECT {SELECT_COLUMNS} FROM sla_alerts WHERE request_id = $1 AND resolved_action IS NULL"
    ))
    .bind(request_id.0)
    .fetch_all(&*self.pool)
    .await?;
    Ok(rows.into_iter().map(Alert::from).collect())
  }

  async fn update(&self, alert: &Alert) -> CoreResult<()> {
    sqlx::query(
      r#"UPDATE sla_alerts SET
           delivery_status = $2, next_escalation_at = $3, resolved_action = $4
         WHERE id = $1"#,
    )
    .bind(alert.id.0)
    .bind(alert.delivery_status)
    .bind(alert.next_escalation_at)
    .bind(alert.resolved_action)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }
}
