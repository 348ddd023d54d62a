use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::MAX_TTL_SECONDS,
    models::{RoomId, SessionId},
    Error, Result,
};

/// JWT token type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Passed the site password
    Site,
    /// Holds a seat in one room
    Room,
}

impl TokenType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Room => "room",
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Session ID for room tokens, a random nonce for site tokens
    pub sub: String,
    /// Token type (site or room)
    pub typ: String,
    /// Room the seat belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomId>,
    pub iat: i64,
    pub exp: i64,
}

/// Verified room token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomClaims {
    pub session_id: SessionId,
    pub room_id: RoomId,
}

/// Signs and verifies HS256 site and room tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    site_ttl: Duration,
    room_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("site_ttl", &self.site_ttl)
            .field("room_ttl", &self.room_ttl)
            .finish_non_exhaustive()
    }
}

/// Token lifetime, clamped so `now + ttl` stays in range
fn token_ttl(seconds: u64) -> Duration {
    i64::try_from(seconds.min(MAX_TTL_SECONDS)).map_or(Duration::zero(), Duration::seconds)
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], site_ttl_seconds: u64, room_ttl_seconds: u64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            site_ttl: token_ttl(site_ttl_seconds),
            room_ttl: token_ttl(room_ttl_seconds),
        }
    }

    /// Random 256-bit hex secret for deployments that did not configure one
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn sign_site_token(&self) -> Result<String> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: crate::models::generate_id(),
            typ: TokenType::Site.as_str().to_string(),
            room: None,
            iat: now.timestamp(),
            exp: (now + self.site_ttl).timestamp(),
        })
    }

    pub fn sign_room_token(&self, session_id: &SessionId, room_id: RoomId) -> Result<String> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: session_id.as_str().to_string(),
            typ: TokenType::Room.as_str().to_string(),
            room: Some(room_id),
            iat: now.timestamp(),
            exp: (now + self.room_ttl).timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify signature and expiry, then the token type
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 60; // clock skew

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        if claims.typ != expected.as_str() {
            return Err(Error::Authentication(format!(
                "Not a {} token",
                expected.as_str()
            )));
        }
        Ok(claims)
    }

    pub fn verify_site_token(&self, token: &str) -> Result<()> {
        self.verify(token, TokenType::Site).map(|_| ())
    }

    pub fn verify_room_token(&self, token: &str) -> Result<RoomClaims> {
        let claims = self.verify(token, TokenType::Room)?;
        let room_id = claims
            .room
            .ok_or_else(|| Error::Authentication("Room token without room".to_string()))?;
        Ok(RoomClaims {
            session_id: SessionId::from_string(claims.sub),
            room_id,
        })
    }
}
