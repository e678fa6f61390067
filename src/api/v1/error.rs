use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(err) = err.find::<ApiRejection>() {
        (err.code.clone(), err.message.clone())
    } else if let Some(err) = err.find::<warp::body::BodyDeserializeError>() {
        (ApiErrorCode::InvalidInput, err.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (ApiErrorCode::InvalidInput, "payload too large".to_string())
    } else if err.is_not_found() || err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (ApiErrorCode::NotFound, ApiErrorCode::NotFound.to_string())
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (
            ApiErrorCode::InternalError,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid request")]
    InvalidInput,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidInput => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejection carried through warp until [`recover_error`] renders it.
#[derive(Debug, Clone)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiRejection {
    pub fn new(code: ApiErrorCode) -> Self {
        ApiRejection {
            code,
            message: code.to_string(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        Self::new(ApiErrorCode::InternalError)
    }
}

impl reject::Reject for ApiRejection {}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => Self::new(ApiErrorCode::InvalidCredentials),
            AuthError::Conflict => Self::new(ApiErrorCode::EmailTaken),
            AuthError::InvalidInput(message) => ApiRejection {
                code: ApiErrorCode::InvalidInput,
                message,
            },
            // Reuse is logged where it is detected; callers only learn "no".
            AuthError::Unauthorized | AuthError::SessionInvalid => {
                Self::new(ApiErrorCode::Unauthorized)
            }
            AuthError::Store(e) => Self::internal(e),
            AuthError::InternalError(e) => Self::internal(e),
        }
    }
}
