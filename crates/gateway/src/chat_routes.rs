//! Website chat endpoint and the admin chat panel.
//!
//! The website talks to a single URL and picks the operation with `action`
//! (`send`, `get`, `markRead`, `getQuickReplies`, `getOperatorInfo`), passed
//! in the query string or a JSON body. Admin routes sit under the same prefix
//! and go through [`require_admin`].

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::Json,
    routing::{delete, get, post, put},
};

use {
    buran_common::PageRequest,
    serde::de::DeserializeOwned,
    serde_json::{Value, json},
};

use crate::{
    auth_middleware::require_admin,
    dto::{
        AdminMessage, AdminReplyBody, ChatActionParams, ConversationView, HistoryQuery,
        HistoryView, OperatorInfoBody, QuickRepliesBody, WidgetMessage,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Chat routes mounted at `prefix` (e.g. `/api/chat`).
pub fn router(state: &AppState, prefix: &str) -> Router<AppState> {
    let admin = Router::new()
        .route(&format!("{prefix}/admin/conversations"), get(conversations))
        .route(&format!("{prefix}/admin/unread-count"), get(unread_count))
        .route(&format!("{prefix}/admin/history/{{user_id}}"), get(history))
        .route(&format!("{prefix}/admin/reply/{{user_id}}"), post(admin_reply))
        .route(
            &format!("{prefix}/admin/conversation/{{user_id}}"),
            delete(delete_conversation),
        )
        .route(&format!("{prefix}/quick-replies"), put(update_quick_replies))
        .route(&format!("{prefix}/operator-info"), put(update_operator_info))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route(prefix, get(action_from_query).post(action_from_body))
        .merge(admin)
}

/// Parse an optional JSON body; empty or malformed bodies yield `None`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Option<T> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

fn parse_id(raw: Option<&str>, name: &str) -> ApiResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {name}"))),
    }
}

// ── Website actions ─────────────────────────────────────────────────────────

async fn action_from_query(
    State(state): State<AppState>,
    Query(params): Query<ChatActionParams>,
) -> ApiResult<Json<Value>> {
    handle_action(&state, params).await
}

async fn action_from_body(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let params = parse_body(&body).unwrap_or_default();
    handle_action(&state, params).await
}

async fn handle_action(state: &AppState, params: ChatActionParams) -> ApiResult<Json<Value>> {
    match params.action.as_deref() {
        Some("send") => {
            let user_id = params.user_id.unwrap_or_default();
            let message = params.message.unwrap_or_default();
            let result = state.chat.send(&user_id, &message).await?;

            let mut body = json!({ "success": true, "messageId": result.message.id });
            if let Some(answer) = result.auto_response {
                body["autoResponse"] = Value::String(answer);
            }
            Ok(Json(body))
        },
        Some("get") => {
            let Some(user_id) = params.user_id.filter(|u| !u.trim().is_empty()) else {
                return Err(ApiError::invalid_action());
            };
            let last_id = parse_id(params.last_id.as_deref(), "lastId")?.unwrap_or(0);
            let messages: Vec<WidgetMessage> = state
                .chat
                .get(&user_id, last_id)
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            Ok(Json(json!({ "success": true, "messages": messages })))
        },
        Some("markRead") => {
            let has_user = params.user_id.is_some_and(|u| !u.trim().is_empty());
            let message_id = parse_id(params.message_id.as_deref(), "messageId")?;
            let (true, Some(message_id)) = (has_user, message_id) else {
                return Err(ApiError::invalid_action());
            };
            state.chat.mark_read(message_id).await?;
            Ok(Json(json!({ "success": true })))
        },
        Some("getQuickReplies") => {
            let quick_replies = state.chat.quick_replies().await?;
            Ok(Json(json!({ "success": true, "quickReplies": quick_replies })))
        },
        Some("getOperatorInfo") => {
            let operator_info = state.chat.operator_info().await?;
            Ok(Json(json!({ "success": true, "operatorInfo": operator_info })))
        },
        _ => Err(ApiError::invalid_action()),
    }
}

// ── Admin panel ─────────────────────────────────────────────────────────────

async fn conversations(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let data: Vec<ConversationView> = state
        .chat
        .conversations()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(json!({ "success": true, "data": data })))
}

async fn unread_count(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let count = state.chat.unread_count().await?;
    Ok(Json(json!({ "success": true, "data": { "count": count } })))
}

async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Value>> {
    let defaults = PageRequest::default();
    let request = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.limit.unwrap_or(defaults.limit),
    );
    let page = state.chat.history(&user_id, request).await?;
    let data = HistoryView {
        messages: page.items.into_iter().map(AdminMessage::from).collect(),
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
    };
    Ok(Json(json!({ "success": true, "data": data })))
}

async fn admin_reply(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body: AdminReplyBody = parse_body(&body).unwrap_or_default();
    let message = state
        .chat
        .admin_reply(&user_id, body.message.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(
        json!({ "success": true, "data": AdminMessage::from(message) }),
    ))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.chat.delete_conversation(&user_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn update_quick_replies(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(QuickRepliesBody { quick_replies }) = parse_body(&body) else {
        return Err(ApiError::bad_request("quickReplies is required"));
    };
    state.chat.set_quick_replies(&quick_replies).await?;
    Ok(Json(json!({ "success": true })))
}

async fn update_operator_info(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(OperatorInfoBody { operator_info }) = parse_body(&body) else {
        return Err(ApiError::bad_request("operatorInfo is required"));
    };
    state.chat.set_operator_info(&operator_info).await?;
    Ok(Json(json!({ "success": true })))
}
