//! Website application form.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
};

use {
    buran_leads::{Lead, LeadStatus, NewLead},
    serde::Serialize,
    serde_json::{Value, json},
};

use crate::{
    dto::iso_timestamp,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/applications", post(create_application))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadView {
    id: i64,
    name: String,
    phone: String,
    country: String,
    form_type: String,
    status: LeadStatus,
    created_at: String,
}

impl From<Lead> for LeadView {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            created_at: iso_timestamp(lead.created_at),
            name: lead.name,
            phone: lead.phone,
            country: lead.country,
            form_type: lead.form_type,
            status: lead.status,
        }
    }
}

async fn create_application(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let form: NewLead = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Invalid application form"))?;
    let lead = state.leads.submit(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": LeadView::from(lead) })),
    ))
}
