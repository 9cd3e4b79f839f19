// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    AvailableModelView, ConnectRequest, ConnectResponse, CurrentUserResponse, DashboardResponse,
    DashboardStats, HealthResponse, JobDetailView, JobView, JobsResponse, ModelView,
    ModelsResponse, RecentResultView, TransactionView,
};
pub use http_server::{build_router, start_server, AppState};
