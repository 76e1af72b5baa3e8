//! Contact-form inbox.

use crate::error::AppError;
use crate::model::{ContactMessage, NewContactMessage};
use crate::store::qualified_table;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, tenant_id, property_id, name, email, phone, message, read, created_at";

type MessageRow = (Uuid, Uuid, Option<Uuid>, String, String, Option<String>, String, bool, DateTime<Utc>);

fn message_from_row(row: MessageRow) -> ContactMessage {
    let (id, tenant_id, property_id, name, email, phone, message, read, created_at) = row;
    ContactMessage {
        id,
        tenant_id,
        property_id,
        name,
        email,
        phone,
        message,
        read,
        created_at,
    }
}

/// Inbox query string.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub unread: Option<bool>,
    pub property_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub struct MessageService;

impl MessageService {
    /// Store a visitor's message. A referenced listing must belong to the same tenant.
    pub async fn create(pool: &PgPool, tenant_id: Uuid, input: &NewContactMessage) -> Result<ContactMessage, AppError> {
        input.validate()?;
        if let Some(property_id) = input.property_id {
            let sql = format!(
                "SELECT 1 FROM {} WHERE tenant_id = $1 AND id = $2",
                qualified_table("properties")
            );
            let exists: Option<(i32,)> = sqlx::query_as(&sql)
                .bind(tenant_id)
                .bind(property_id)
                .fetch_optional(pool)
                .await?;
            if exists.is_none() {
                return Err(AppError::Validation(format!("unknown property_id: {}", property_id)));
            }
        }
        let sql = format!(
            r#"
            INSERT INTO {} (id, tenant_id, property_id, name, email, phone, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            qualified_table("contact_messages"),
            COLUMNS
        );
        let row: MessageRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(input.property_id)
            .bind(input.name.trim())
            .bind(input.email.trim())
            .bind(input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
            .bind(input.message.trim())
            .fetch_one(pool)
            .await?;
        let message = message_from_row(row);
        tracing::info!(tenant_id = %tenant_id, message_id = %message.id, "contact message received");
        Ok(message)
    }

    /// Newest first; limit defaults to 50, capped at 500.
    pub async fn list(pool: &PgPool, tenant_id: Uuid, query: &MessageQuery) -> Result<Vec<ContactMessage>, AppError> {
        let limit = query.limit.unwrap_or(50).min(500);
        let offset = query.offset.unwrap_or(0);
        let sql = format!(
            r#"
            SELECT {} FROM {}
            WHERE tenant_id = $1
              AND ($2::boolean IS NULL OR read = NOT $2)
              AND ($3::uuid IS NULL OR property_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            COLUMNS,
            qualified_table("contact_messages")
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(query.unread)
            .bind(query.property_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    pub async fn set_read(pool: &PgPool, tenant_id: Uuid, id: Uuid, read: bool) -> Result<Option<ContactMessage>, AppError> {
        let sql = format!(
            "UPDATE {} SET read = $3 WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            qualified_table("contact_messages"),
            COLUMNS
        );
        let row: Option<MessageRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(read)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(message_from_row))
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND id = $2",
            qualified_table("contact_messages")
        );
        let result = sqlx::query(&sql).bind(tenant_id).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn all_for_export(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<ContactMessage>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 ORDER BY created_at ASC",
            COLUMNS,
            qualified_table("contact_messages")
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql).bind(tenant_id).fetch_all(pool).await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }
}
