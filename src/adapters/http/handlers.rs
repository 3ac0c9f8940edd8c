//! Request handlers for the dashboard API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::ApiState;
use crate::domain::alert::Alert;
use crate::ports::sources::SourceError;
use crate::usecases::dashboard::DashboardSnapshot;

/// JSON body returned when an upstream fetch fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An upstream failure surfaced as `502 Bad Gateway`; a request
/// rejected before reaching upstream is a `400 Bad Request`.
pub struct UpstreamError(SourceError);

impl From<SourceError> for UpstreamError {
    fn from(e: SourceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SourceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// New favorite flag after a toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggled {
    pub id: String,
    pub is_favorite: bool,
}

pub async fn dashboard(State(state): State<ApiState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot().await)
}

pub async fn list_alerts(State(state): State<ApiState>) -> Json<Vec<Alert>> {
    Json(state.alerts.alerts().await)
}

pub async fn dismiss_alert(State(state): State<ApiState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.alerts.remove(id).await {
        StatusCode::NO_CONTENT
    } else {
        debug!(%id, "Dismiss for unknown alert");
        StatusCode::NOT_FOUND
    }
}

pub async fn clear_alerts(State(state): State<ApiState>) -> StatusCode {
    state.alerts.clear().await;
    StatusCode::NO_CONTENT
}

pub async fn toggle_city(
    State(state): State<ApiState>,
    Path(city): Path<String>,
) -> Json<FavoriteToggled> {
    let is_favorite = state.dashboard.toggle_city_favorite(&city).await;
    Json(FavoriteToggled {
        id: city,
        is_favorite,
    })
}

pub async fn toggle_crypto(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<FavoriteToggled> {
    let is_favorite = state.dashboard.toggle_crypto_favorite(&id).await;
    Json(FavoriteToggled { id, is_favorite })
}

pub async fn refresh_all(State(state): State<ApiState>) -> Json<DashboardSnapshot> {
    state.dashboard.refresh_all().await;
    Json(state.dashboard.snapshot().await)
}

pub async fn refresh_weather(
    State(state): State<ApiState>,
    Path(city): Path<String>,
) -> Result<StatusCode, UpstreamError> {
    state.dashboard.refresh_weather(&city).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_forecast(
    State(state): State<ApiState>,
    Path(city): Path<String>,
) -> Result<StatusCode, UpstreamError> {
    state.dashboard.refresh_forecast(&city).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_history(
    State(state): State<ApiState>,
    Path(city): Path<String>,
) -> Result<StatusCode, UpstreamError> {
    state.dashboard.refresh_history(&city).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_coin(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, UpstreamError> {
    state.dashboard.refresh_coin(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_news(State(state): State<ApiState>) -> Result<StatusCode, UpstreamError> {
    state.dashboard.refresh_news().await?;
    Ok(StatusCode::NO_CONTENT)
}
