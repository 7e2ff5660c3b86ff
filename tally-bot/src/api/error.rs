//! Mapping of ledger errors onto HTTP responses

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tally_common::Error;
use tracing::{debug, error};

/// Error carried out of a handler
#[derive(Debug)]
pub enum ApiError {
    /// Ledger operation failed
    Ledger(Error),
    /// Request body could not be understood
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Ledger(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(e) => match e {
                Error::InvalidScore(_) => StatusCode::BAD_REQUEST,
                Error::UnknownEpisode(_) => StatusCode::NOT_FOUND,
                Error::DuplicateEpisode(_) => StatusCode::CONFLICT,
                Error::CorruptState(_) | Error::Persistence(_) | Error::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ledger(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejection uses the same `{"error": ...}` shape
/// as every other API failure
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::BadRequest(rejection.body_text()))
            }
        }
    }
}
