use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

/// Failures a handler cannot turn into a redirect. Rendered as a bare 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
    }
}
