use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use catalogsearch_common::CatalogSearchError;
use std::fmt;

use crate::types::ErrorResponse;

/// HTTP rendering of [`CatalogSearchError`]
#[derive(Debug)]
pub struct ApiError(pub CatalogSearchError);

impl From<CatalogSearchError> for ApiError {
    fn from(err: CatalogSearchError) -> Self {
        Self(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            CatalogSearchError::InvalidInput(msg) => format!("invalid argument: {}", msg),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(CatalogSearchError::invalid_input("empty body"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(CatalogSearchError::Cancelled);
        assert_eq!(err.status_code().as_u16(), 499);

        let err = ApiError::from(CatalogSearchError::network("refused"));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_input_message() {
        let response = ApiError::from(CatalogSearchError::invalid_input("limit")).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
