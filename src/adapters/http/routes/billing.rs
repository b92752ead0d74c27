use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

#[derive(Deserialize)]
struct ChangePlanPayload {
    new_plan_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/runs/recurring", post(run_recurring))
        .route("/runs/renewals", post(run_renewals))
        .route("/runs/retries", post(run_retries))
        .route("/subscriptions/{id}/charge", post(charge_now))
        .route("/subscriptions/{id}/plan", post(change_plan))
}

async fn run_recurring(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = app_state
        .orchestrator
        .run_recurring_billing(Utc::now())
        .await?;
    Ok(Json(summary))
}

async fn run_renewals(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = app_state.orchestrator.run_renewals(Utc::now()).await?;
    Ok(Json(summary))
}

async fn run_retries(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = app_state.orchestrator.run_retries(Utc::now()).await?;
    Ok(Json(summary))
}

async fn charge_now(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .orchestrator
        .process_manual_billing(id, Utc::now())
        .await?;
    Ok(Json(outcome))
}

async fn change_plan(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePlanPayload>,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .orchestrator
        .process_plan_change(id, payload.new_plan_id, Utc::now())
        .await?;
    Ok(Json(outcome))
}
