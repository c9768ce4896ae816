use actix_web::http::StatusCode;
use chrono::{Duration, Utc};
use urbanease_engine::db_types::Role;

use super::helpers::*;
use crate::{auth::JwtClaims, routes::CheckTokenRoute};

#[actix_web::test]
async fn check_token_echoes_the_claims() {
    let _ = env_logger::try_init();
    let mut claims = JwtClaims::new("64f1c0ffee", Role::Moderator);
    claims.name = Some("Ravi".into());
    let token = issue_token(claims, Utc::now() + Duration::minutes(10));
    let (status, body) = get_request(&format!("Bearer {token}"), "/check_token", |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token is valid.");
    assert_eq!(body["data"]["id"], "64f1c0ffee");
    assert_eq!(body["data"]["role"], "moderator");
    assert_eq!(body["data"]["name"], "Ravi");
}

#[actix_web::test]
async fn expired_tokens() {
    let _ = env_logger::try_init();
    let token = issue_token(JwtClaims::new("alice", Role::User), Utc::now() - Duration::minutes(5));
    let (status, body) = get_request(&format!("Bearer {token}"), "/check_token", |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_web::test]
async fn missing_or_wrong_scheme() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("", "/check_token", |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");

    let token = issue_token(JwtClaims::new("alice", Role::User), Utc::now() + Duration::minutes(5));
    let (status, _) = get_request(&format!("Basic {token}"), "/check_token", |cfg| {
        cfg.service(CheckTokenRoute::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
