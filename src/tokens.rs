use crate::errors::FolioError;
use crate::settings::{Keys, Tokens};
use chrono::Utc;
use josekit::jwk::Jwk;
use josekit::jws::{JwsHeader, RS256};
use josekit::jwt;
use josekit::jwt::JwtPayload;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub uid: String,
    pub username: String,
    pub role_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    ttl: Tokens,
    private_jwk: Arc<Jwk>,
    public_jwk: Arc<Jwk>,
}

impl TokenSigner {
    pub async fn new(cfg: Keys, ttl: Tokens) -> Result<Self, FolioError> {
        if let Some(parent) = cfg.private_key_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If private key exists, load it; otherwise generate and persist it
        let private_jwk = if cfg.private_key_path.exists() {
            let s = fs::read_to_string(&cfg.private_key_path)?;
            serde_json::from_str::<Jwk>(&s)?
        } else {
            let mut jwk = Jwk::generate_rsa_key(2048)?;
            let kid = cfg
                .key_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
            jwk.set_key_id(&kid);
            jwk.set_algorithm(cfg.alg.as_str());
            jwk.set_key_use("sig");
            fs::write(&cfg.private_key_path, serde_json::to_string_pretty(&jwk)?)?;
            tracing::info!(kid = %kid, "Generated token signing key");
            jwk
        };
        let public_jwk = private_jwk.to_public_key()?;

        Ok(Self {
            ttl,
            private_jwk: Arc::new(private_jwk),
            public_jwk: Arc::new(public_jwk),
        })
    }

    pub fn issue(&self, claims: &TokenClaims, kind: TokenKind) -> Result<IssuedToken, FolioError> {
        let minutes = match kind {
            TokenKind::Access => self.ttl.access_ttl_minutes,
            TokenKind::Refresh => self.ttl.refresh_ttl_minutes,
        };
        let now = Utc::now().timestamp();
        let expires_at = now + minutes * 60;

        let mut payload = JwtPayload::new();
        payload.set_subject(&claims.uid);
        payload.set_issued_at(&(SystemTime::UNIX_EPOCH + Duration::from_secs(now as u64)));
        payload.set_expires_at(&(SystemTime::UNIX_EPOCH + Duration::from_secs(expires_at as u64)));
        payload.set_claim("uid", Some(json!(claims.uid)))?;
        payload.set_claim("username", Some(json!(claims.username)))?;
        payload.set_claim("role_code", Some(json!(claims.role_code)))?;
        payload.set_claim("token_type", Some(json!(kind.as_str())))?;

        let signer = RS256.signer_from_jwk(&self.private_jwk)?;
        let mut header = JwsHeader::new();
        if let Some(kid) = self.private_jwk.key_id() {
            header.set_key_id(kid);
        }
        header.set_algorithm("RS256");
        let token = jwt::encode_with_signer(&payload, &header, &signer)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, expiry and token kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, FolioError> {
        let invalid = || FolioError::Unauthorized("Invalid token".to_string());

        let verifier = RS256.verifier_from_jwk(&self.public_jwk)?;
        let (payload, _header) = jwt::decode_with_verifier(token, &verifier).map_err(|e| {
            tracing::debug!(error = %e, "Token signature rejected");
            invalid()
        })?;

        match payload.expires_at() {
            Some(exp) if exp > SystemTime::now() => {}
            _ => return Err(FolioError::Unauthorized("Token expired".to_string())),
        }

        if payload.claim("token_type").and_then(Value::as_str) != Some(kind.as_str()) {
            return Err(invalid());
        }

        let uid = payload
            .claim("uid")
            .and_then(Value::as_str)
            .ok_or_else(invalid)?
            .to_string();
        let username = payload
            .claim("username")
            .and_then(Value::as_str)
            .ok_or_else(invalid)?
            .to_string();
        let role_code = payload
            .claim("role_code")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(TokenClaims {
            uid,
            username,
            role_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn signer(dir: &TempDir, ttl: Tokens) -> TokenSigner {
        let keys = Keys {
            key_id: Some("test-key".to_string()),
            alg: "RS256".to_string(),
            private_key_path: dir.path().join("keys/private.json"),
        };
        TokenSigner::new(keys, ttl).await.expect("signer")
    }

    fn claims() -> TokenClaims {
        TokenClaims {
            uid: "u-1".to_string(),
            username: "alice".to_string(),
            role_code: Some("USER".to_string()),
        }
    }

    #[tokio::test]
    async fn test_issue_and_verify_access_token() {
        let dir = TempDir::new().unwrap();
        let signer = signer(&dir, Tokens::default()).await;

        let issued = signer.issue(&claims(), TokenKind::Access).unwrap();
        let verified = signer.verify(&issued.token, TokenKind::Access).unwrap();

        assert_eq!(verified, claims());
        assert!(issued.expires_at > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access_token() {
        let dir = TempDir::new().unwrap();
        let signer = signer(&dir, Tokens::default()).await;

        let issued = signer.issue(&claims(), TokenKind::Refresh).unwrap();
        let err = signer.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, FolioError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let dir = TempDir::new().unwrap();
        let ttl = Tokens {
            access_ttl_minutes: -1,
            refresh_ttl_minutes: 10,
        };
        let signer = signer(&dir, ttl).await;

        let issued = signer.issue(&claims(), TokenKind::Access).unwrap();
        let err = signer.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[tokio::test]
    async fn test_key_is_persisted_and_reloaded() {
        let dir = TempDir::new().unwrap();
        let first = signer(&dir, Tokens::default()).await;
        let issued = first.issue(&claims(), TokenKind::Access).unwrap();

        let second = signer(&dir, Tokens::default()).await;
        assert!(second.verify(&issued.token, TokenKind::Access).is_ok());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let dir = TempDir::new().unwrap();
        let signer = signer(&dir, Tokens::default()).await;
        let issued = signer.issue(&claims(), TokenKind::Access).unwrap();

        let mut tampered = issued.token.clone();
        tampered.push('x');
        assert!(signer.verify(&tampered, TokenKind::Access).is_err());
    }
}
