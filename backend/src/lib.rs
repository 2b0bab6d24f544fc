pub mod api;
pub mod auth;
pub mod booking_rules;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod visibility;

use sqlx::PgPool;

use crate::crypto::FieldCipher;

/// Shared application state available to all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cipher: FieldCipher,
}

impl axum::extract::FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
