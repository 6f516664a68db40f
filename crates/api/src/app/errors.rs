use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tradepost_infra::MutationError;

pub fn mutation_error_to_response(err: MutationError) -> axum::response::Response {
    match err {
        MutationError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        MutationError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        MutationError::Store(e) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
