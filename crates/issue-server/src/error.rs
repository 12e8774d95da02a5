use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use issue_core::error::BoardError;

// ---------------------------------------------------------------------------
// Sentinels for explicit statuses
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Error type for every handler. Rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            return StatusCode::NOT_FOUND;
        }
        match self.0.downcast_ref::<BoardError>() {
            Some(e) => match e {
                BoardError::ColumnNotFound(_)
                | BoardError::BoardFileMissing(_)
                | BoardError::UnknownBoard(_) => StatusCode::NOT_FOUND,
                BoardError::CardIndexOutOfRange { .. }
                | BoardError::InvalidContent(_)
                | BoardError::InvalidDate(_)
                | BoardError::UnknownField { .. }
                | BoardError::UnknownOption { .. } => StatusCode::BAD_REQUEST,
                BoardError::Gh(_) => StatusCode::BAD_GATEWAY,
                BoardError::GhNotInstalled => StatusCode::SERVICE_UNAVAILABLE,
                BoardError::HomeNotFound
                | BoardError::Io(_)
                | BoardError::Yaml(_)
                | BoardError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn status_of(err: BoardError) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn column_not_found_maps_to_404() {
        assert_eq!(
            status_of(BoardError::ColumnNotFound("Nope".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn missing_board_file_maps_to_404() {
        assert_eq!(
            status_of(BoardError::BoardFileMissing(PathBuf::from("board.kanban.md"))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn index_out_of_range_maps_to_400() {
        let err = BoardError::CardIndexOutOfRange {
            column: "To Do".into(),
            index: 9,
            len: 2,
        };
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_date_maps_to_400() {
        assert_eq!(
            status_of(BoardError::InvalidDate("tomorrow-ish".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_content_maps_to_400() {
        assert_eq!(
            status_of(BoardError::InvalidContent("metadata 'note' needs a value".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        assert_eq!(
            status_of(BoardError::Io(io_err)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn gh_failures_map_to_gateway_statuses() {
        assert_eq!(status_of(BoardError::Gh("HTTP 502".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(BoardError::GhNotInstalled),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn constructors_map_to_their_status() {
        assert_eq!(
            AppError::bad_request("empty title").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("no route").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError(BoardError::ColumnNotFound("X".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
