use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::models::ApiKey;
use crate::db::ApiKeyRepository;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/:id", delete(deactivate_key))
}

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedKeyResponse {
    pub id: Uuid,
    pub name: String,
    /// Returned exactly once; only the hash is stored.
    pub api_key: String,
}

fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("hz_{}", hex::encode(bytes))
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

async fn list_keys(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<ApiKey>>> {
    let keys = ApiKeyRepository::list(&state.db).await?;
    Ok(Json(keys))
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateKeyRequest>,
) -> AppResult<(StatusCode, Json<CreatedKeyResponse>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Integration name cannot be empty".to_string(),
        ));
    }

    let plaintext = generate_api_key();
    let key = ApiKeyRepository::create(&state.db, name, &hash_api_key(&plaintext)).await?;

    tracing::info!("API key created for integration '{}'", key.name);

    Ok((
        StatusCode::CREATED,
        Json(CreatedKeyResponse {
            id: key.id,
            name: key.name,
            api_key: plaintext,
        }),
    ))
}

async fn deactivate_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let removed = ApiKeyRepository::deactivate(&state.db, id).await?;
    if !removed {
        return Err(AppError::NotFound(format!("API key {} not found", id)));
    }

    tracing::info!("API key {} deactivated", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with("hz_"));
        assert_eq!(a.len(), 3 + 48);
        assert_ne!(a, b);
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_api_key("hz_abc"), hash_api_key("hz_abc"));
        assert_ne!(hash_api_key("hz_abc"), hash_api_key("hz_abd"));
    }
}
