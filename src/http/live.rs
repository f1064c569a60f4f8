use super::state::HttpServerState;
use crate::live::LiveState;
use axum::Json;
use axum::extract::State;

/// Latest live reading
///
/// Returns the scored latest reading, `noReading` when the source has none
/// and `failed` when the live subscription broke.
#[utoipa::path(
    get,
    path = "/api/v1/live",
    tag = "Live",
    responses(
        (status = 200, description = "Current live state"),
    )
)]
pub async fn live_state(State(state): State<HttpServerState>) -> Json<LiveState> {
    Json(state.live.current())
}
