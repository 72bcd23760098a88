//! HTTP error mapping. Kept from the teacher's own approach almost exactly:
//! a thin `anyhow::Error` wrapper whose `IntoResponse` impl recovers the
//! structured `mg_core::DogError` underneath (kind, message, JSON body) when
//! one is present, and otherwise degrades to a 500.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use mg_core::errors::DogError;

#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<mg_store::StoreError> for ApiError {
    fn from(e: mg_store::StoreError) -> Self {
        Self(store_error_to_dog(e).into_anyhow())
    }
}

impl From<mg_queue::QueueError> for ApiError {
    fn from(e: mg_queue::QueueError) -> Self {
        Self(DogError::bad_gateway(e.to_string()).into_anyhow())
    }
}

fn store_error_to_dog(e: mg_store::StoreError) -> DogError {
    match &e {
        mg_store::StoreError::NotFound { .. } => DogError::not_found(e.to_string()),
        mg_store::StoreError::InvalidTransition { .. } => DogError::conflict(e.to_string()),
        _ => DogError::general_error(e.to_string()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(dog) = self.0.chain().find_map(|e| e.downcast_ref::<DogError>()) {
            let safe = dog.sanitize_for_client();
            let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        let dog = DogError::general_error(self.0.to_string());
        let safe = dog.sanitize_for_client();
        (StatusCode::INTERNAL_SERVER_ERROR, Json(safe.to_json())).into_response()
    }
}
