//! Access-token cookie and the authenticated-caller extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::authz::Principal;
use crate::errors::FolioError;
use crate::settings::Settings;
use crate::storage::{roles, users};
use crate::tokens::{IssuedToken, TokenKind};
use crate::web::AppState;

pub const ACCESS_COOKIE_NAME: &str = "access_token";

#[derive(Clone, Debug)]
pub struct AccessCookie {
    pub token: String,
}

impl AccessCookie {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

        for cookie in cookie_header.split(';') {
            let cookie = cookie.trim();
            if let Some(value) = cookie
                .strip_prefix(ACCESS_COOKIE_NAME)
                .and_then(|s| s.strip_prefix('='))
            {
                return Some(Self {
                    token: value.to_string(),
                });
            }
        }
        None
    }

    pub fn to_cookie_header(&self, settings: &Settings, issued: &IssuedToken) -> String {
        let secure = settings.public_url().starts_with("https://");
        let max_age = (issued.expires_at - chrono::Utc::now().timestamp()).max(0);

        format!(
            "{}={}; HttpOnly; {}SameSite=Lax; Path=/; Max-Age={}",
            ACCESS_COOKIE_NAME,
            self.token,
            if secure { "Secure; " } else { "" },
            max_age
        )
    }

    pub fn delete_cookie_header() -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            ACCESS_COOKIE_NAME
        )
    }
}

/// Bearer header first, then the cookie.
fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| AccessCookie::from_headers(headers).map(|c| c.token))
}

/// The logged-in caller.
///
/// The user row and its role are re-read on every request, so deactivation
/// and role changes take effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = FolioError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers)
            .ok_or_else(|| FolioError::Unauthorized("Missing access token".to_string()))?;
        let claims = state.tokens.verify(&token, TokenKind::Access)?;

        let user = users::get_user(&state.db, &claims.uid)
            .await?
            .ok_or_else(|| FolioError::Unauthorized("Invalid token".to_string()))?;
        if !user.is_active {
            return Err(FolioError::Unauthorized("User is not active".to_string()));
        }

        let role_level = match user.role_id {
            Some(id) => roles::get_role(&state.db, id).await?.map(|r| r.level),
            None => None,
        };

        Ok(AuthUser(Principal {
            id: user.id,
            username: user.username,
            role_id: user.role_id,
            role_level,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_parsed_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi; lang=en"),
        );
        let cookie = AccessCookie::from_headers(&headers).unwrap();
        assert_eq!(cookie.token, "abc.def.ghi");
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(access_token(&headers).as_deref(), Some("header"));

        headers.remove(header::AUTHORIZATION);
        assert_eq!(access_token(&headers).as_deref(), Some("cookie"));
    }

    #[test]
    fn test_delete_cookie_expires_immediately() {
        assert!(AccessCookie::delete_cookie_header().contains("Max-Age=0"));
    }
}
