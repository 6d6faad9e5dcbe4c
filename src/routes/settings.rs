use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::db::models::{
    EmailSettings, NotificationSetting, RecipientSettings, WhatsAppSettings, KNOWN_SETTING_KEYS,
    SETTING_EMAIL, SETTING_RECIPIENTS, SETTING_WHATSAPP,
};
use crate::db::SettingsRepository;
use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_settings))
        .route("/:key", get(get_setting).put(update_setting))
}

async fn list_settings(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<NotificationSetting>>> {
    let settings = SettingsRepository::list(&state.db).await?;
    Ok(Json(settings))
}

async fn get_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> AppResult<Json<NotificationSetting>> {
    let setting = SettingsRepository::find_by_key(&state.db, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Setting '{}' not found", key)))?;
    Ok(Json(setting))
}

/// Upsert one of the three known settings rows. The blob stays loosely
/// typed in storage, but present fields must parse into the typed view so a
/// fat-fingered admin edit cannot silently disable dispatches.
async fn update_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> AppResult<Json<NotificationSetting>> {
    if !KNOWN_SETTING_KEYS.contains(&key.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown setting key: {}",
            key
        )));
    }
    if !value.is_object() {
        return Err(AppError::Validation(
            "Setting value must be a JSON object".to_string(),
        ));
    }

    let type_check = match key.as_str() {
        SETTING_EMAIL => serde_json::from_value::<EmailSettings>(value.clone()).map(|_| ()),
        SETTING_RECIPIENTS => {
            serde_json::from_value::<RecipientSettings>(value.clone()).map(|_| ())
        }
        SETTING_WHATSAPP => serde_json::from_value::<WhatsAppSettings>(value.clone()).map(|_| ()),
        _ => unreachable!(),
    };
    type_check.map_err(|e| AppError::Validation(format!("Invalid {} value: {}", key, e)))?;

    let setting = SettingsRepository::upsert(&state.db, &key, value).await?;
    tracing::info!("Setting '{}' updated", key);
    Ok(Json(setting))
}
