// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! axum router and request handlers for the marketplace API.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::errors::ApiError;
use super::handlers::*;
use crate::config::NodeConfig;
use crate::marketplace::{JobSubmission, Marketplace};
use crate::storage::{JobFilter, JobStatus, MarketStore, Model, ModelFilter, User};
use crate::wallet::{verify_wallet_signature, SessionRegistry};

// Uploaded masks can be large layout files.
const MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<Marketplace>,
    pub sessions: Arc<SessionRegistry>,
    pub config: NodeConfig,
}

impl AppState {
    fn store(&self) -> &Arc<dyn MarketStore> {
        self.marketplace.store()
    }

    fn currency(&self) -> &str {
        self.marketplace.currency()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/wallet/connect", post(connect_wallet_handler))
        .route("/api/auth/wallet/disconnect", post(disconnect_wallet_handler))
        .route("/api/auth/current-user", get(current_user_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/models", get(models_handler))
        .route("/api/models/featured", get(featured_models_handler))
        .route("/api/models/available", get(available_models_handler))
        .route("/api/models/:model_id/purchase", post(purchase_model_handler))
        .route("/api/jobs", post(submit_job_handler).get(jobs_handler))
        .route("/api/jobs/active", get(active_jobs_handler))
        .route("/api/jobs/results/recent", get(recent_results_handler))
        .route("/api/jobs/:job_id", get(job_detail_handler))
        .route("/api/jobs/:job_id/results", get(job_results_handler))
        .route(
            "/api/jobs/:job_id/results/download",
            get(download_results_handler),
        )
        .route("/api/transactions/recent", get(recent_transactions_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("marketplace API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

// ---- auth helpers ----

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn optional_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let Some(wallet) = state.sessions.resolve(token).await else {
        return Ok(None);
    };
    state
        .store()
        .user_by_wallet(&wallet)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    optional_user(state, headers)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Wallet authentication required".to_string()))
}

fn model_names(models: &[Model]) -> HashMap<u64, String> {
    models.iter().map(|m| (m.id, m.name.clone())).collect()
}

async fn name_for_model(state: &AppState, model_id: u64) -> Result<String, ApiError> {
    Ok(state
        .store()
        .model_by_id(model_id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .map(|m| m.name)
        .unwrap_or_default())
}

// ---- handlers ----

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn connect_wallet_handler(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiErrorResponse> {
    if request.address.is_empty() || request.signature.is_empty() || request.message.is_empty() {
        return Err(ApiError::InvalidRequest("Missing required parameters".to_string()).into());
    }

    let valid = verify_wallet_signature(&request.address, &request.signature, &request.message)
        .unwrap_or(false);
    if !valid {
        return Err(ApiError::Unauthorized("Invalid signature".to_string()).into());
    }

    let user = state
        .store()
        .upsert_wallet_user(&request.address)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let token = state.sessions.issue(&user.wallet_address).await;

    Ok(Json(ConnectResponse {
        success: true,
        address: user.wallet_address,
        token,
    }))
}

async fn disconnect_wallet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }
    Json(json!({ "success": true }))
}

async fn current_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    match optional_user(&state, &headers).await? {
        Some(user) => Ok(Json(CurrentUserResponse {
            is_authenticated: true,
            wallet_address: Some(user.wallet_address),
            username: Some(user.username),
        })
        .into_response()),
        None => Ok((
            StatusCode::UNAUTHORIZED,
            Json(CurrentUserResponse {
                is_authenticated: false,
                wallet_address: None,
                username: None,
            }),
        )
            .into_response()),
    }
}

async fn dashboard_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, ApiErrorResponse> {
    let response = match optional_user(&state, &headers).await? {
        Some(user) => {
            let counts = state
                .store()
                .dashboard_counts(user.id)
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
            DashboardResponse::for_user(counts, state.currency())
        }
        None => DashboardResponse::anonymous(state.currency()),
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ModelsQuery {
    category_filter: Option<String>,
    price_range: Option<String>,
    search_term: Option<String>,
    show_owned: Option<bool>,
}

fn parse_price_range(raw: &str) -> Option<(f64, f64)> {
    let (min, max) = raw.split_once(',')?;
    Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
}

async fn models_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ModelsQuery>,
) -> Result<Json<ModelsResponse>, ApiErrorResponse> {
    let filter = ModelFilter {
        category: query
            .category_filter
            .filter(|c| c != "all_categories"),
        price_range: query.price_range.as_deref().and_then(parse_price_range),
        search: query.search_term,
        ..Default::default()
    };

    let store = state.store();
    let models = store
        .list_models(filter)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let categories = store
        .model_categories()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let licensed: Vec<u64> = match optional_user(&state, &headers).await? {
        Some(user) => store
            .licensed_model_ids(user.id)
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
        None => Vec::new(),
    };

    let mut views: Vec<ModelView> = models
        .iter()
        .map(|m| ModelView::build(m, state.currency(), licensed.contains(&m.id)))
        .collect();
    if query.show_owned.unwrap_or(false) {
        views.retain(|v| v.licensed_to_user);
    }

    Ok(Json(ModelsResponse {
        models: views,
        categories,
    }))
}

async fn featured_models_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ModelView>>, ApiErrorResponse> {
    let store = state.store();
    let models = store
        .list_models(ModelFilter {
            min_rating: Some(4.0),
            limit: Some(3),
            ..Default::default()
        })
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let licensed: Vec<u64> = match optional_user(&state, &headers).await? {
        Some(user) => store
            .licensed_model_ids(user.id)
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?,
        None => Vec::new(),
    };

    Ok(Json(
        models
            .iter()
            .map(|m| ModelView::build(m, state.currency(), licensed.contains(&m.id)))
            .collect(),
    ))
}

async fn available_models_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AvailableModelView>>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let store = state.store();
    let mut models = store
        .list_models(ModelFilter::default())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    models.sort_by(|a, b| a.name.cmp(&b.name));
    let licensed = store
        .licensed_model_ids(user.id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(
        models
            .iter()
            .map(|m| AvailableModelView {
                id: m.id.to_string(),
                name: m.name.clone(),
                price: crate::marketplace::pricing::format_cost(m.price, state.currency()),
                licensed: licensed.contains(&m.id),
            })
            .collect(),
    ))
}

async fn purchase_model_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(model_id): Path<String>,
) -> Result<Json<crate::marketplace::PurchaseReceipt>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let model_id: u64 = model_id
        .parse()
        .map_err(|_| ApiError::InvalidRequest("Invalid model id".to_string()))?;
    let receipt = state
        .marketplace
        .purchase_model(&user, model_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(receipt))
}

async fn submit_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut mask_file_name: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "maskFile" {
            mask_file_name = field.file_name().map(|f| f.to_string());
            // The upload itself belongs to the file-storage collaborator;
            // only the original name is needed to derive the object name.
            let _ = field.bytes().await;
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Unreadable field {}: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    let submission = submission_from_fields(&fields)?;
    let job = state
        .marketplace
        .submit_job(&user, submission, mask_file_name.as_deref())
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(job)).into_response())
}

/// Assemble a [`JobSubmission`] from multipart text fields. Number parsing
/// failures surface as per-field validation errors, before the workflow's
/// own range checks run.
fn submission_from_fields(fields: &HashMap<String, String>) -> Result<JobSubmission, ApiError> {
    use crate::marketplace::FieldViolation;

    let text = |key: &str| fields.get(key).cloned().unwrap_or_default();
    let mut violations = Vec::new();
    let mut number = |key: &str, label: &str| -> f64 {
        match fields.get(key).map(|v| v.trim().parse::<f64>()) {
            Some(Ok(n)) => n,
            _ => {
                violations.push(FieldViolation {
                    field: key.to_string(),
                    message: format!("{} must be a number", label),
                });
                f64::NAN
            }
        }
    };

    let resolution = number("resolution", "Resolution");
    let wavelength = number("wavelength", "Wavelength");
    let numerical_aperture = number("numericalAperture", "Numerical aperture");
    let iterations = match fields.get("iterations").map(|v| v.trim().parse::<u32>()) {
        Some(Ok(n)) => n,
        _ => {
            violations.push(FieldViolation {
                field: "iterations".to_string(),
                message: "Iterations must be a positive integer".to_string(),
            });
            0
        }
    };

    if !violations.is_empty() {
        return Err(ApiError::ValidationFailed(violations));
    }

    Ok(JobSubmission {
        name: text("name"),
        model_id: text("modelId"),
        resolution,
        wavelength,
        numerical_aperture,
        iterations,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JobsQuery {
    status_filter: Option<String>,
    search_term: Option<String>,
}

async fn jobs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let status = query
        .status_filter
        .filter(|s| s != "all_statuses")
        .and_then(|s| JobStatus::parse(&s));

    let jobs = state
        .store()
        .jobs_for_user(
            user.id,
            JobFilter {
                status,
                search: query.search_term,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let models = state
        .store()
        .list_models(ModelFilter::default())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let names = model_names(&models);

    Ok(Json(JobsResponse {
        jobs: jobs
            .iter()
            .map(|j| {
                JobView::build(
                    j,
                    names.get(&j.model_id).map(String::as_str).unwrap_or(""),
                    state.currency(),
                )
            })
            .collect(),
    }))
}

async fn active_jobs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<JobView>>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let jobs = state
        .store()
        .jobs_for_user(
            user.id,
            JobFilter {
                active_only: true,
                limit: Some(5),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let models = state
        .store()
        .list_models(ModelFilter::default())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let names = model_names(&models);

    Ok(Json(
        jobs.iter()
            .map(|j| {
                JobView::build(
                    j,
                    names.get(&j.model_id).map(String::as_str).unwrap_or(""),
                    state.currency(),
                )
            })
            .collect(),
    ))
}

async fn job_detail_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetailView>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let job = state
        .store()
        .job_by_display_id(user.id, &job_id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;
    let model_name = name_for_model(&state, job.model_id).await?;
    Ok(Json(JobDetailView::build(&job, &model_name, state.currency())))
}

async fn job_results_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetailView>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let job = state
        .store()
        .job_by_display_id(user.id, &job_id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .filter(|j| j.status == JobStatus::Completed && j.result_id.is_some())
        .ok_or_else(|| ApiError::NotFound("Job results not found".to_string()))?;
    let model_name = name_for_model(&state, job.model_id).await?;
    Ok(Json(JobDetailView::build(&job, &model_name, state.currency())))
}

async fn download_results_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Redirect, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let url = state
        .store()
        .job_by_display_id(user.id, &job_id)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .filter(|j| j.status == JobStatus::Completed)
        .and_then(|j| j.result_file_url)
        .ok_or_else(|| ApiError::NotFound("Result file not found".to_string()))?;
    Ok(Redirect::temporary(&url))
}

async fn recent_results_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<RecentResultView>>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let jobs = state
        .store()
        .recent_results(user.id, 4)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let models = state
        .store()
        .list_models(ModelFilter::default())
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let names = model_names(&models);

    Ok(Json(
        jobs.iter()
            .map(|j| RecentResultView {
                id: j.result_id.clone().unwrap_or_default(),
                job_id: j.display_id.clone(),
                model_name: names.get(&j.model_id).cloned().unwrap_or_default(),
                completed_at: j.completed_at,
                status: j.status,
                image_url: j.result_image_url.clone(),
            })
            .collect(),
    ))
}

async fn recent_transactions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TransactionView>>, ApiErrorResponse> {
    let user = require_user(&state, &headers).await?;
    let txs = state
        .store()
        .recent_transactions(user.id, 10)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(
        txs.iter()
            .map(|t| TransactionView::build(t, state.currency()))
            .collect(),
    ))
}

// Error response wrapper
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        ApiErrorResponse(err)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_response())).into_response()
    }
}
