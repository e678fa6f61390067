mod common;

use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use warden::api::v1::{RefreshCookie, recover_error, routes};
use warden::application_port::AuthService;
use warden::domain_port::SessionStore;
use warden::server::Server;
use warp::Filter;
use warp::http::StatusCode;
use warp::http::header::SET_COOKIE;
use warp::hyper::body::Bytes;

fn cookie() -> RefreshCookie {
    RefreshCookie {
        name: "refreshToken".to_string(),
        path: "/api/v1/auth".to_string(),
        secure: true,
        max_age_secs: 30 * 24 * 3600,
    }
}

fn api(
    auth_service: Arc<dyn AuthService>,
    session_store: Arc<dyn SessionStore>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let server = Arc::new(Server::from_parts(
        auth_service,
        session_store,
        cookie(),
        Duration::from_secs(60),
    ));
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}

fn access_token_of(res: &warp::http::Response<Bytes>) -> String {
    body_json(res.body())["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn body_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

/// `refreshToken=<value>` from a Set-Cookie header.
fn cookie_pair(res: &warp::http::Response<Bytes>) -> String {
    let header = res.headers()[SET_COOKIE].to_str().unwrap();
    header.split(';').next().unwrap().to_string()
}

async fn login<F>(filter: &F, email: &str, password: &str) -> warp::http::Response<Bytes>
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    warp::test::request()
        .method("POST")
        .path("/api/v1/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .reply(filter)
        .await
}

#[tokio::test]
async fn login_sets_http_only_refresh_cookie() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());

    let res = login(&filter, "a@x.com", "p1").await;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("refreshToken="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/api/v1/auth"));
    assert!(set_cookie.contains("Max-Age=2592000"));

    let body = body_json(res.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "a@x.com");
    assert!(body["data"]["access_token"].as_str().is_some());
    assert!(body["data"].get("refresh_token").is_none());
}

#[tokio::test]
async fn bad_credentials_are_a_client_error() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());

    let res = login(&filter, "a@x.com", "nope").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().get(SET_COOKIE).is_none());
    let body = body_json(res.body());
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidCredentials");
}

#[tokio::test]
async fn refresh_rotates_the_cookie_and_rejects_replay() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());

    let res = login(&filter, "a@x.com", "p1").await;
    let access = access_token_of(&res);
    let first_cookie = cookie_pair(&res);

    let refreshed = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("authorization", format!("Bearer {access}"))
        .header("cookie", &first_cookie)
        .reply(&filter)
        .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    let second_cookie = cookie_pair(&refreshed);
    assert_ne!(first_cookie, second_cookie);

    let replay = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("authorization", format!("Bearer {access}"))
        .header("cookie", &first_cookie)
        .reply(&filter)
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(replay.body())["error"]["code"], "Unauthorized");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_access_token() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());
    let res = login(&filter, "a@x.com", "p1").await;
    let refresh_cookie = cookie_pair(&res);

    let missing = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("cookie", &refresh_cookie)
        .reply(&filter)
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    // the refresh token itself is not an access token
    let refresh_value = refresh_cookie.trim_start_matches("refreshToken=");
    let wrong_type = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/logout")
        .header("authorization", format!("Bearer {refresh_value}"))
        .header("cookie", &refresh_cookie)
        .reply(&filter)
        .await;
    assert_eq!(wrong_type.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());
    let res = login(&filter, "a@x.com", "p1").await;
    let access = access_token_of(&res);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("authorization", format!("Bearer {access}"))
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie_and_ends_the_session() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());
    let res = login(&filter, "a@x.com", "p1").await;
    let access = access_token_of(&res);
    let refresh_cookie = cookie_pair(&res);

    let out = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/logout")
        .header("authorization", format!("Bearer {access}"))
        .header("cookie", &refresh_cookie)
        .reply(&filter)
        .await;
    assert_eq!(out.status(), StatusCode::OK);
    assert_eq!(body_json(out.body())["data"]["logged_out"], true);
    let cleared = out.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("refreshToken=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert!(h.session_store.is_empty());

    let again = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("authorization", format!("Bearer {access}"))
        .header("cookie", &refresh_cookie)
        .reply(&filter)
        .await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_conflicts_on_duplicate_email() {
    let h = harness();
    let filter = api(h.auth_service.clone(), h.session_store.clone());
    let body = json!({ "email": "new@x.com", "password": "password1" });

    let created = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&body)
        .reply(&filter)
        .await;
    assert_eq!(created.status(), StatusCode::OK);
    assert!(created.headers().get(SET_COOKIE).is_some());

    let duplicate = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/register")
        .json(&body)
        .reply(&filter)
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(duplicate.body())["error"]["code"], "EmailTaken");
}

#[tokio::test]
async fn malformed_body_and_unknown_route() {
    let h = harness();
    let filter = api(h.auth_service.clone(), h.session_store.clone());

    let malformed = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body("{\"email\":")
        .reply(&filter)
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unknown = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/whoami")
        .reply(&filter)
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_cookie_of_another_user_is_refused() {
    let h = harness();
    h.seed_user("a@x.com", "p1").await;
    let b_id = h.seed_user("b@x.com", "p2").await;
    let filter = api(h.auth_service.clone(), h.session_store.clone());

    let a_access = access_token_of(&login(&filter, "a@x.com", "p1").await);
    let b_login = login(&filter, "b@x.com", "p2").await;
    let b_cookie = cookie_pair(&b_login);
    let b_session = h.session_store.get_current(b_id).await.unwrap().unwrap();

    for route in ["/api/v1/auth/refresh", "/api/v1/auth/logout"] {
        let res = warp::test::request()
            .method("POST")
            .path(route)
            .header("authorization", format!("Bearer {a_access}"))
            .header("cookie", &b_cookie)
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{route}");
        assert!(!String::from_utf8_lossy(res.body()).contains("b@x.com"));
    }
    assert_eq!(
        h.session_store.get_current(b_id).await.unwrap(),
        Some(b_session)
    );

    let b_access = access_token_of(&b_login);
    let own = warp::test::request()
        .method("POST")
        .path("/api/v1/auth/refresh")
        .header("authorization", format!("Bearer {b_access}"))
        .header("cookie", &b_cookie)
        .reply(&filter)
        .await;
    assert_eq!(own.status(), StatusCode::OK);
}
