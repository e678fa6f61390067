use super::cookie::RefreshCookie;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::Identity;
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// The refresh token itself travels only in the cookie.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&AuthResult> for AuthResponse {
    fn from(result: &AuthResult) -> Self {
        AuthResponse {
            user: result.identity.clone(),
            access_token: result.tokens.access_token.clone(),
            access_token_expires_at: result.tokens.access_token_expires_at,
            refresh_token_expires_at: result.tokens.refresh_token_expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

fn session_reply(
    result: AuthResult,
    cookie: &RefreshCookie,
) -> warp::reply::WithHeader<warp::reply::Json> {
    let body = ApiResponse::ok(AuthResponse::from(&result));
    warp::reply::with_header(
        warp::reply::json(&body),
        SET_COOKIE,
        cookie.set(&result.tokens.refresh_token.0),
    )
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: RefreshCookie,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Login user with email {}", body.email);
    let login_input = LoginInput {
        email: body.email.clone(),
        password: body.password,
    };
    let result = auth_service.login(login_input).await.map_err(|e| {
        warn!("Error login user with email {} - {}", body.email, e);
        reject::custom(ApiRejection::from(e))
    })?;

    Ok(session_reply(result, &cookie))
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: RefreshCookie,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Register user with email {}", body.email);
    let register_input = RegisterInput {
        email: body.email.clone(),
        password: body.password,
    };
    let result = auth_service.register(register_input).await.map_err(|e| {
        warn!("Error register user with email {} - {}", body.email, e);
        reject::custom(ApiRejection::from(e))
    })?;

    Ok(session_reply(result, &cookie))
}

pub async fn logout(
    caller: Identity,
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookie: RefreshCookie,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Logout user - {}", caller.email);
    match refresh_token {
        Some(token) => auth_service
            .logout_as(caller.user_id, &token)
            .await
            .map_err(|e| {
                warn!("Error logout user {} - {}", caller.email, e);
                reject::custom(ApiRejection::from(e))
            })?,
        None => debug!("logout without a refresh cookie, nothing to revoke"),
    }

    Ok(warp::reply::with_header(
        warp::reply::json(&ApiResponse::ok(LogoutResponse { logged_out: true })),
        SET_COOKIE,
        cookie.clear(),
    ))
}

pub async fn refresh(
    caller: Identity,
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookie: RefreshCookie,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Refreshing token by user - {}", caller.email);
    let token = refresh_token
        .ok_or_else(|| reject::custom(ApiRejection::new(ApiErrorCode::Unauthorized)))?;
    let result = auth_service
        .refresh_as(caller.user_id, &token)
        .await
        .map_err(|e| {
            warn!(
                "Error while refreshing the token by user - {} - {}",
                caller.email, e
            );
            reject::custom(ApiRejection::from(e))
        })?;

    Ok(session_reply(result, &cookie))
}
