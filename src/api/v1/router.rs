use super::cookie::RefreshCookie;
use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::Identity;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path!("auth" / "login"))
        .and(json_body::<handler::LoginRequest>())
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.refresh_cookie.clone()))
        .and_then(handler::login);

    let register = warp::post()
        .and(warp::path!("auth" / "register"))
        .and(json_body::<handler::RegisterRequest>())
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.refresh_cookie.clone()))
        .and_then(handler::register);

    let logout = warp::post()
        .and(warp::path!("auth" / "logout"))
        .and(with_verification(server.auth_service.clone()))
        .and(refresh_token_cookie(server.refresh_cookie.clone()))
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.refresh_cookie.clone()))
        .and_then(handler::logout);

    let refresh = warp::post()
        .and(warp::path!("auth" / "refresh"))
        .and(with_verification(server.auth_service.clone()))
        .and(refresh_token_cookie(server.refresh_cookie.clone()))
        .and(with(server.auth_service.clone()))
        .and(with_cookie(server.refresh_cookie.clone()))
        .and_then(handler::refresh);

    login.or(register).or(logout).or(refresh)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_cookie(
    cookie: RefreshCookie,
) -> impl Filter<Extract = (RefreshCookie,), Error = Infallible> + Clone {
    warp::any().map(move || cookie.clone())
}

fn refresh_token_cookie(
    cookie: RefreshCookie,
) -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::COOKIE.as_str())
        .map(move |header: Option<String>| cookie.extract(header.as_deref()))
}

/// Access-token guard: resolves the bearer token to the caller's identity.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Identity,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str()).and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let Some(token) = header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) else {
                    return Err(reject::custom(ApiRejection::new(ApiErrorCode::Unauthorized)));
                };
                auth_service
                    .verify_access(token)
                    .await
                    .map_err(ApiRejection::from)
                    .map_err(reject::custom)
            }
        },
    )
}
