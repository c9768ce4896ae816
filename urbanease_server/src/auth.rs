//! Access tokens.
//!
//! Users log in through the storefront's authentication service, which issues HS256 JWTs signed with a secret shared
//! with this server. We only ever validate those tokens; [`TokenIssuer`] exists for tooling and tests.
use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use chrono::Duration;
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use log::*;
use serde::{Deserialize, Serialize};
use ue_common::Secret;
use urbanease_engine::db_types::{Role, UserId};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: UserId,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

impl JwtClaims {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: UserId::new(id), role, name: None, email: None }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string())),
    }
}

#[derive(Clone, Debug)]
pub struct TokenValidator {
    secret: Secret<String>,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone() }
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let key = Hs256Key::new(self.secret.reveal().as_bytes());
        let token: Token<JwtClaims> =
            Hs256.validator(&key).validate(&untrusted).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let (_, claims) = token.into_parts();
        trace!("🔑️ Access token validated for {}", claims.custom.id);
        Ok(claims.custom)
    }
}

pub struct TokenIssuer {
    secret: Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone() }
    }

    /// Issue a new access token for `claims`, valid for `duration` (one day by default).
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), duration);
        let header = Header::empty().with_token_type("JWT");
        let key = Hs256Key::new(self.secret.reveal().as_bytes());
        Hs256.token(&header, &claims, &key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }
}
