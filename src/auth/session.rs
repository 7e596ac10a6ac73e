use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::cookies::{read_cookie, CookieSettings, REFRESH_COOKIE, SESSION_COOKIE};
use super::{AuthError, Claims, JwtKeys, TokenKind};
use crate::config::SecurityConfig;

/// Result of resolving request credentials.
///
/// `principal_id` is `None` for anonymous callers. `set_cookies` carries any
/// rotated credentials that must reach the client regardless of the gate's
/// decision.
#[derive(Debug, Default, Clone)]
pub struct SessionOutcome {
    pub principal_id: Option<Uuid>,
    pub set_cookies: Vec<String>,
}

impl SessionOutcome {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Freshly minted credentials for a principal
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub principal_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip)]
    pub set_cookies: Vec<String>,
}

/// Source of the authenticated principal for a request
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Never fails: any credential or refresh problem resolves to anonymous
    async fn resolve(&self, headers: &HeaderMap) -> SessionOutcome;

    /// `Set-Cookie` values that end the session
    fn sign_out_cookies(&self) -> Vec<String>;
}

/// Cookie-borne HS256 session with refresh-token rotation
pub struct JwtSessionProvider {
    keys: JwtKeys,
    cookies: CookieSettings,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl JwtSessionProvider {
    pub fn new(security: &SecurityConfig) -> Result<Self, AuthError> {
        Ok(Self {
            keys: JwtKeys::from_secret(&security.jwt_secret)?,
            cookies: CookieSettings { secure: security.require_https },
            access_lifetime: Duration::minutes(security.access_token_minutes),
            refresh_lifetime: Duration::hours(security.refresh_token_hours),
        })
    }

    /// Mint an access and refresh token pair
    pub fn issue(&self, principal_id: Uuid) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let access_token = self.keys.sign(&Claims::new(principal_id, TokenKind::Access, now, self.access_lifetime))?;
        let refresh_token = self.keys.sign(&Claims::new(principal_id, TokenKind::Refresh, now, self.refresh_lifetime))?;

        let set_cookies = vec![
            self.access_cookie(&access_token),
            self.cookies.build(REFRESH_COOKIE, &refresh_token, self.refresh_lifetime.num_seconds(), true),
        ];

        Ok(IssuedSession {
            principal_id,
            access_token,
            refresh_token,
            set_cookies,
        })
    }

    fn access_cookie(&self, token: &str) -> String {
        self.cookies.build(SESSION_COOKIE, token, self.access_lifetime.num_seconds(), true)
    }

    /// Exchange a valid refresh token for a new access token
    fn rotate(&self, refresh_token: &str) -> Result<(Uuid, String), AuthError> {
        let claims = self.keys.verify(refresh_token, TokenKind::Refresh)?;
        let access = Claims::new(claims.sub, TokenKind::Access, Utc::now(), self.access_lifetime);
        let token = self.keys.sign(&access)?;
        Ok((claims.sub, self.access_cookie(&token)))
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> SessionOutcome {
        if let Some(token) = read_cookie(headers, SESSION_COOKIE) {
            match self.keys.verify(token, TokenKind::Access) {
                Ok(claims) => {
                    return SessionOutcome {
                        principal_id: Some(claims.sub),
                        set_cookies: Vec::new(),
                    };
                }
                Err(e) => tracing::debug!("Access token rejected, trying refresh: {}", e),
            }
        }

        let Some(refresh_token) = read_cookie(headers, REFRESH_COOKIE) else {
            return SessionOutcome::anonymous();
        };

        match self.rotate(refresh_token) {
            Ok((principal_id, cookie)) => {
                tracing::debug!("Rotated access token for principal {}", principal_id);
                SessionOutcome {
                    principal_id: Some(principal_id),
                    set_cookies: vec![cookie],
                }
            }
            Err(e) => {
                tracing::warn!("Session refresh failed, continuing anonymous: {}", e);
                SessionOutcome::anonymous()
            }
        }
    }

    fn sign_out_cookies(&self) -> Vec<String> {
        vec![
            self.cookies.clear(SESSION_COOKIE, true),
            self.cookies.clear(REFRESH_COOKIE, true),
        ]
    }
}
