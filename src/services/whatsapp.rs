use serde::Serialize;

use crate::db::models::WhatsAppSettings;
use crate::error::{AppError, AppResult};
use crate::services::dispatch::DeliveryStatus;

/// Per-phone delivery record, written into the integration log.
#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppDelivery {
    pub phone: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// WhatsApp executor. Provider URL and key live in the
/// `whatsapp_notifications` settings row, not in process environment, so the
/// service itself only owns the HTTP client.
#[derive(Clone)]
pub struct WhatsAppService {
    client: reqwest::Client,
}

/// Strip every non-digit character from a phone value.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

impl WhatsAppService {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::WhatsApp(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Attempt one send. Never fails the dispatch; every outcome becomes a
    /// delivery record.
    pub async fn send(
        &self,
        settings: &WhatsAppSettings,
        phone: &str,
        message: &str,
    ) -> WhatsAppDelivery {
        let digits = sanitize_phone(phone);
        if digits.is_empty() {
            tracing::debug!("Skipping WhatsApp target with no digits: {:?}", phone);
            return WhatsAppDelivery {
                phone: phone.to_string(),
                status: DeliveryStatus::InvalidNumber,
                detail: None,
            };
        }

        let (api_url, api_key) = match (settings.api_url.as_deref(), settings.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => (url, key),
            _ => {
                // Provider integration is not wired up yet; log the rendered
                // message so operators can see what would have gone out.
                tracing::info!("WhatsApp API not configured; message for {} not sent: {}", digits, message);
                return WhatsAppDelivery {
                    phone: digits,
                    status: DeliveryStatus::SkippedNoApi,
                    detail: None,
                };
            }
        };

        let body = serde_json::json!({ "number": digits, "message": message });

        match self
            .client
            .post(api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => WhatsAppDelivery {
                phone: digits,
                status: DeliveryStatus::Sent,
                detail: None,
            },
            Ok(response) => {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("WhatsApp API error ({}) for {}: {}", status, digits, error_text);
                WhatsAppDelivery {
                    phone: digits,
                    status: DeliveryStatus::Failed,
                    detail: Some(format!("WhatsApp API error ({}): {}", status, error_text)),
                }
            }
            Err(e) => {
                tracing::error!("WhatsApp request failed for {}: {}", digits, e);
                WhatsAppDelivery {
                    phone: digits,
                    status: DeliveryStatus::Error,
                    detail: Some(e.to_string()),
                }
            }
        }
    }

    /// Send to every target in sequence.
    pub async fn send_all(
        &self,
        settings: &WhatsAppSettings,
        phones: &[String],
        message: &str,
    ) -> Vec<WhatsAppDelivery> {
        let mut results = Vec::with_capacity(phones.len());
        for phone in phones {
            results.push(self.send(settings, phone, message).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_everything_but_digits() {
        assert_eq!(sanitize_phone("+91 98765-43210"), "919876543210");
        assert_eq!(sanitize_phone("(022) 4000 1234"), "02240001234");
        assert_eq!(sanitize_phone("n/a"), "");
        assert_eq!(sanitize_phone(""), "");
    }

    #[tokio::test]
    async fn non_digit_target_yields_invalid_number() {
        let service = WhatsAppService::new().unwrap();
        let settings = WhatsAppSettings {
            api_url: Some("https://wa.example.com/send".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };

        let delivery = service.send(&settings, "n/a", "hello").await;
        assert_eq!(delivery.status, DeliveryStatus::InvalidNumber);
        assert_eq!(delivery.phone, "n/a");
    }

    #[tokio::test]
    async fn missing_api_config_yields_skipped_no_api() {
        let service = WhatsAppService::new().unwrap();
        let settings = WhatsAppSettings::default();

        let results = service
            .send_all(
                &settings,
                &["+919800000001".to_string(), "+919800000002".to_string()],
                "hello",
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|d| d.status == DeliveryStatus::SkippedNoApi));
    }
}
