use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AppConfig, CookieConfig};
use crate::models::{User, UserRole};

/// Claims carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn for_user(user: &User, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no session cookie")]
    Missing,
    #[error("invalid session token: {0}")]
    Invalid(String),
    #[error("session token generation error: {0}")]
    Encoding(String),
}

/// Issues, reads and clears the signed session cookie.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie: CookieConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(config: &AppConfig) -> Self {
        let secret = config.security.session_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            cookie: config.cookie.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie.key
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let claims = SessionClaims::for_user(user, self.cookie.expiry_secs);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Resolve the session from a request's `Cookie` headers.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Result<SessionClaims, TokenError> {
        let jar = CookieJar::from_headers(headers);
        let cookie = jar.get(&self.cookie.key).ok_or(TokenError::Missing)?;
        self.verify(cookie.value())
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut builder = Cookie::build((self.cookie.key.clone(), token))
            .path(self.cookie.path.clone())
            .http_only(self.cookie.http_only)
            .secure(self.cookie.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.cookie.expiry_secs));
        if let Some(domain) = &self.cookie.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    /// Removal cookie: empty value, already expired.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.cookie.key.clone(), ""))
            .path(self.cookie.path.clone())
            .http_only(self.cookie.http_only)
            .secure(self.cookie.secure);
        if let Some(domain) = &self.cookie.domain {
            builder = builder.domain(domain.clone());
        }
        let mut cookie = builder.build();
        cookie.make_removal();
        cookie
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn admin() -> User {
        User {
            id: 1,
            name: "Admin".into(),
            email: "admin@example.com".into(),
            role: UserRole::Admin,
            pwd_hash: None,
        }
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let sessions = SessionManager::new(&AppConfig::test());
        let token = sessions.issue(&admin()).unwrap();
        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.id, 1);
        assert!(claims.is_admin());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let mut other = AppConfig::test();
        other.security.session_secret = "someone-else".into();
        let forged = SessionManager::new(&other).issue(&admin()).unwrap();

        let sessions = SessionManager::new(&AppConfig::test());
        assert!(matches!(sessions.verify(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn session_is_read_from_cookie_header() {
        let sessions = SessionManager::new(&AppConfig::test());
        let token = sessions.issue(&admin()).unwrap();

        let mut headers = HeaderMap::new();
        assert!(matches!(sessions.session_from_headers(&headers), Err(TokenError::Missing)));

        headers.insert(
            COOKIE,
            format!("theme=dark; {}={}", sessions.cookie_name(), token).parse().unwrap(),
        );
        let claims = sessions.session_from_headers(&headers).unwrap();
        assert_eq!(claims.email, "admin@example.com");
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let sessions = SessionManager::new(&AppConfig::test());
        let rendered = sessions.cleared_cookie().to_string();
        assert!(rendered.starts_with("ExpressGeneratorTs=;"), "{rendered}");
        assert!(rendered.contains("Max-Age=0"), "{rendered}");
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }
}
