use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

const SESSION_LIFETIME_HOURS: i64 = 24;

/// Player identity carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid Authorization header format")]
    InvalidFormat,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims, as written by the login service.
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    image: String,
    exp: i64,
    iat: i64,
}

/// Verifies (and, for the login service, issues) HS256 session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Sign a session token valid for 24 hours.
    pub fn issue(&self, user: &AuthUser) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id.clone(),
            username: user.username.clone(),
            image: user.avatar_url.clone(),
            exp: (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if data.claims.id.is_empty() {
            return Err(AuthError::InvalidToken("Missing id claim".to_string()));
        }

        Ok(AuthUser {
            id: data.claims.id,
            username: data.claims.username,
            avatar_url: data.claims.image,
        })
    }

    /// Authenticate a request from the session cookie, falling back to a
    /// Bearer token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(&self.cookie_name) {
            return self.verify(cookie.value());
        }

        let auth_header = headers
            .get("authorization")
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    fn keys(secret: &str) -> SessionKeys {
        SessionKeys::new(&SessionConfig {
            jwt_secret: secret.to_string(),
            cookie_name: "access_token".to_string(),
        })
    }

    fn player() -> AuthUser {
        AuthUser {
            id: "109876543210".to_string(),
            username: "Ada Lovelace".to_string(),
            avatar_url: "https://example.com/ada.png".to_string(),
        }
    }

    fn headers_with(name: axum::http::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("secret");
        let token = keys.issue(&player()).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), player());
    }

    #[test]
    fn test_cookie_authentication() {
        let keys = keys("secret");
        let token = keys.issue(&player()).unwrap();
        let headers = headers_with(COOKIE, &format!("theme=dark; access_token={}", token));
        assert_eq!(keys.authenticate(&headers).unwrap().id, "109876543210");
    }

    #[test]
    fn test_bearer_fallback() {
        let keys = keys("secret");
        let token = keys.issue(&player()).unwrap();
        let headers = headers_with(AUTHORIZATION, &format!("Bearer {}", token));
        assert_eq!(keys.authenticate(&headers).unwrap().username, "Ada Lovelace");
    }

    #[test]
    fn test_missing_token() {
        let err = keys("secret").authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
        assert_eq!(err.to_string(), "No token provided");
    }

    #[test]
    fn test_basic_auth_is_rejected() {
        let headers = headers_with(AUTHORIZATION, "Basic dXNlcjpwYXNz");
        let err = keys("secret").authenticate(&headers).unwrap_err();
        assert!(matches!(err, AuthError::InvalidFormat));
    }

    #[test]
    fn test_wrong_secret() {
        let token = keys("secret").issue(&player()).unwrap();
        let err = keys("other").verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let claims = Claims {
            id: "u1".to_string(),
            username: String::new(),
            image: String::new(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(26)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = keys("secret").verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_garbage_cookie() {
        let headers = headers_with(COOKIE, "access_token=not-a-jwt");
        let err = keys("secret").authenticate(&headers).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
