use std::{collections::HashMap, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{models::AppState, AppError};

/// Bearer-token registry resolving a credential to a caller identity.
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an owner and return it.
    pub async fn issue(&self, owner: Uuid) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.write().await.insert(token.clone(), owner);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        self.tokens.read().await.get(token).copied()
    }

    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }

    /// Seed a static token from `API_TOKEN`/`API_USER` so a deployed
    /// instance has at least one usable credential.
    pub async fn seed_from_env(&self) {
        let Ok(token) = std::env::var("API_TOKEN") else {
            return;
        };
        let owner = std::env::var("API_USER")
            .ok()
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .unwrap_or_else(Uuid::new_v4);
        self.tokens.write().await.insert(token, owner);
        tracing::info!("seeded API token for user {owner}");
    }
}

/// Resolved caller identity. Rejects with 401 before any store access.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> core::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;
        let owner = state
            .sessions
            .resolve(token)
            .await
            .ok_or(AppError::Unauthorized)?;
        Ok(AuthUser(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_resolves_to_its_owner() {
        let sessions = SessionStore::new();
        let owner = Uuid::new_v4();
        let token = sessions.issue(owner).await;
        assert_eq!(sessions.resolve(&token).await, Some(owner));
    }

    #[tokio::test]
    async fn unknown_token_does_not_resolve() {
        let sessions = SessionStore::new();
        assert_eq!(sessions.resolve("nope").await, None);
    }

    #[tokio::test]
    async fn revoked_token_stops_resolving() {
        let sessions = SessionStore::new();
        let token = sessions.issue(Uuid::new_v4()).await;
        sessions.revoke(&token).await;
        assert_eq!(sessions.resolve(&token).await, None);
    }
}
