//! Back-office inbox.

use crate::access::TenantAccess;
use crate::error::AppError;
use crate::export::messages_csv;
use crate::model::{pages, Action, ContactMessage, MessagePatch};
use crate::response::{csv_attachment, success_many, success_one_ok, SuccessMany, SuccessOne};
use crate::service::{MessageQuery, MessageService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    access: TenantAccess,
    Query(query): Query<MessageQuery>,
) -> Result<(StatusCode, Json<SuccessMany<ContactMessage>>), AppError> {
    state.authorize(&access, pages::MESSAGES, Action::View).await?;
    let rows = MessageService::list(&state.pool, access.tenant.id, &query).await?;
    Ok(success_many(rows))
}

pub async fn update(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
    Json(body): Json<MessagePatch>,
) -> Result<(StatusCode, Json<SuccessOne<ContactMessage>>), AppError> {
    state.authorize(&access, pages::MESSAGES, Action::Edit).await?;
    let message = MessageService::set_read(&state.pool, access.tenant.id, id, body.read)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message {}", id)))?;
    Ok(success_one_ok(message))
}

pub async fn delete(
    State(state): State<AppState>,
    access: TenantAccess,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.authorize(&access, pages::MESSAGES, Action::Delete).await?;
    if !MessageService::delete(&state.pool, access.tenant.id, id).await? {
        return Err(AppError::NotFound(format!("message {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_csv(State(state): State<AppState>, access: TenantAccess) -> Result<Response, AppError> {
    state.authorize(&access, pages::MESSAGES, Action::View).await?;
    let rows = MessageService::all_for_export(&state.pool, access.tenant.id).await?;
    let filename = format!("mensagens-{}.csv", access.tenant.slug);
    Ok(csv_attachment(&filename, messages_csv(&rows)))
}
