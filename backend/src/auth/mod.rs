use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Which population the token subject belongs to. Residents book facilities
/// and file reports; staff review them, scoped by facility assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Resident,
    Staff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated actor attached to each request. `is_admin` is read fresh
/// from the staff row on every request, never from the token.
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn is_resident(&self) -> bool {
        self.role == Role::Resident
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_resident(&self) -> Result<(), AppError> {
        if self.is_resident() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_staff() && self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let headers = &parts.headers;
        let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;

        let key = DecodingKey::from_secret(app_state.jwt_secret.as_bytes());
        let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::warn!("JWT decode failed: {}", e);
                AppError::Unauthorized
            })?
            .claims;

        // Verify the subject still exists and is active; staff admin status
        // is re-read so a revoked admin loses access on the next request.
        let (is_active, is_admin) = match claims.role {
            Role::Staff => {
                let row = sqlx::query_as::<_, (bool, bool)>(
                    "SELECT is_active, is_admin FROM staff WHERE id = $1",
                )
                .bind(claims.sub)
                .fetch_optional(&app_state.pool)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Auth DB check failed: {}", e)))?
                .ok_or(AppError::Unauthorized)?;
                (row.0, row.1)
            }
            Role::Resident => {
                let active = sqlx::query_scalar::<_, bool>(
                    "SELECT is_active FROM residents WHERE id = $1",
                )
                .bind(claims.sub)
                .fetch_optional(&app_state.pool)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Auth DB check failed: {}", e)))?
                .ok_or(AppError::Unauthorized)?;
                (active, false)
            }
        };

        if !is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            is_admin,
        })
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("Authorization")?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

/// Mint an HS256 token for a resident or staff member. Token issuance
/// endpoints live in the identity service; this is used by it and by tests.
pub fn create_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    expiry_hours: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = OffsetDateTime::now_utc();
    let exp = now + time::Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user_id,
        role,
        exp: exp.unix_timestamp(),
        iat: now.unix_timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
