use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::AdminSummary,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/admin",
    responses(
        (status = 200, description = "Dashboard totals (admin only)", body = ApiResponse<AdminSummary>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdminSummary>>> {
    let resp = admin_service::summary(&state, &user).await?;
    Ok(Json(resp))
}
