use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use bk_registry::RegistryError;
use bk_session::SessionError;
use bk_store::StoreError;
use bk_studio::StudioError;
use bk_types::TypeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Studio(#[from] StudioError),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Studio(e) => studio_status(e),
            Self::InvalidName(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn studio_status(e: &StudioError) -> StatusCode {
    match e {
        StudioError::ProjectNotFound(_)
        | StudioError::AssetNotFound(_)
        | StudioError::NoSelection(_) => StatusCode::NOT_FOUND,
        StudioError::InvalidInput(_) | StudioError::EmptyImage | StudioError::InvalidName(_) => {
            StatusCode::BAD_REQUEST
        }
        StudioError::EmptyPrompt | StudioError::Upstream(_) => StatusCode::BAD_GATEWAY,
        StudioError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        StudioError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StudioError::Store(e) => store_status(e),
        StudioError::Registry(e) => registry_status(e),
        StudioError::Session(e) => session_status(e),
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        StoreError::StorageUnavailable(_) | StoreError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::CorruptObject { .. } | StoreError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn registry_status(e: &RegistryError) -> StatusCode {
    match e {
        RegistryError::AlreadyExists { .. } => StatusCode::CONFLICT,
        RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistryError::InvalidName(_) => StatusCode::BAD_REQUEST,
        RegistryError::StorageUnavailable(_) | RegistryError::Io(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RegistryError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn session_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::CategoryNotDeduplicated(_)
        | SessionError::NoActiveProject
        | SessionError::WrongProject { .. }
        | SessionError::WrongCategory { .. } => StatusCode::BAD_REQUEST,
        SessionError::Store(e) => store_status(e),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let retryable = matches!(&self, Self::Studio(e) if e.is_retryable());
        (
            status,
            Json(json!({ "error": self.to_string(), "retryable": retryable })),
        )
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
