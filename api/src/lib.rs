pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod rest;
pub mod store;
pub mod token;
pub mod transcription;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::sqlite::SqlitePool;

use crate::{
    config::{AuthConfig, Config},
    token::{TokenIssuer, TokenVerifier},
    transcription::TranscriptionPoller,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: Arc<AuthConfig>,
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<TokenVerifier>,
    pub labeler: TranscriptionPoller,
}

impl AppState {
    pub fn new(db: SqlitePool, auth: AuthConfig, labeler: TranscriptionPoller) -> Self {
        Self {
            db,
            issuer: Arc::new(TokenIssuer::new(auth.clone())),
            verifier: Arc::new(TokenVerifier::new(auth.clone())),
            auth: Arc::new(auth),
            labeler,
        }
    }

    pub fn from_config(db: SqlitePool, config: &Config) -> Self {
        Self::new(
            db,
            config.auth.clone(),
            TranscriptionPoller::from_config(&config.transcript),
        )
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
