/*!
 * # Authentication
 *
 * Verifies bearer JWTs and turns their claims into a typed [`Principal`]
 * (user id + account role). The principal is inserted into request extensions
 * by [`auth_middleware`] and handed explicitly to every service call, where
 * the access gate in [`access`] decides what the caller may touch.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub mod access;

pub const EMPLOYEE_ACCOUNT_TYPE: &str = "employee";
pub const CUSTOMER_ACCOUNT_TYPE: &str = "customer";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user ID)
    pub account_type: String, // "employee" grants staff rights
    pub jti: String,          // JWT ID
    pub iat: i64,             // Issued at time
    pub exp: i64,             // Expiration time
    pub iss: String,          // Issuer
    pub aud: String,          // Audience
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Customer,
    Employee,
}

impl AccountRole {
    /// Anything other than the employee marker is treated as a customer.
    pub fn from_account_type(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(EMPLOYEE_ACCOUNT_TYPE) {
            AccountRole::Employee
        } else {
            AccountRole::Customer
        }
    }

    pub fn as_account_type(self) -> &'static str {
        match self {
            AccountRole::Customer => CUSTOMER_ACCOUNT_TYPE,
            AccountRole::Employee => EMPLOYEE_ACCOUNT_TYPE,
        }
    }
}

/// The verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: AccountRole,
}

impl Principal {
    pub fn new(user_id: Uuid, role: AccountRole) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: Uuid) -> Self {
        Self::new(user_id, AccountRole::Customer)
    }

    pub fn employee(user_id: Uuid) -> Self {
        Self::new(user_id, AccountRole::Employee)
    }

    pub fn is_employee(&self) -> bool {
        self.role == AccountRole::Employee
    }
}

impl TryFrom<Claims> for Principal {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(Principal::new(
            user_id,
            AccountRole::from_account_type(&claims.account_type),
        ))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.jwt_audience.clone(),
            cfg.jwt_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Issues and validates tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Mint a signed token for `user_id`. Used by the `issue-token` binary and tests.
    pub fn issue_token(&self, user_id: Uuid, role: AccountRole) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            account_type: role.as_account_type().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Resolves the caller from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let raw = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = raw
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidToken)?;

        let claims = self.validate_token(token)?;
        Principal::try_from(claims)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Authentication middleware: verifies the bearer token and stores the
/// resulting [`Principal`] in request extensions.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()) {
        Ok(principal) => {
            debug!(user_id = %principal.user_id, role = ?principal.role, "authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "authentication rejected");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit-test-signing-key-0123456789abcdef".into(),
            "storage-service-api".into(),
            "storage-service".into(),
            Duration::from_secs(600),
        ))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn issued_token_round_trips_to_principal() {
        let auth = service();
        let user = Uuid::new_v4();
        let token = auth.issue_token(user, AccountRole::Employee).unwrap();

        let principal = auth.authenticate(&bearer(&token)).unwrap();
        assert_eq!(principal, Principal::employee(user));
    }

    #[test]
    fn unknown_account_type_is_customer() {
        assert_eq!(AccountRole::from_account_type("admin"), AccountRole::Customer);
        assert_eq!(AccountRole::from_account_type(""), AccountRole::Customer);
        assert_eq!(
            AccountRole::from_account_type("Employee"),
            AccountRole::Employee
        );
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_matches!(
            service().authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(AuthConfig::new(
            "a-completely-different-secret-value-xyz".into(),
            "storage-service-api".into(),
            "storage-service".into(),
            Duration::from_secs(600),
        ));
        let token = other
            .issue_token(Uuid::new_v4(), AccountRole::Customer)
            .unwrap();

        assert_matches!(
            service().authenticate(&bearer(&token)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut cfg = service().config;
        cfg.jwt_audience = "someone-else".into();
        let token = AuthService::new(cfg)
            .issue_token(Uuid::new_v4(), AccountRole::Customer)
            .unwrap();

        assert!(service().authenticate(&bearer(&token)).is_err());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let claims = Claims {
            sub: "not-a-uuid".into(),
            account_type: "customer".into(),
            jti: "x".into(),
            iat: 0,
            exp: 0,
            iss: String::new(),
            aud: String::new(),
        };
        assert_matches!(Principal::try_from(claims), Err(AuthError::InvalidToken));
    }
}
