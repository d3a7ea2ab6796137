use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{instrument, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct DescriptionRequest {
    pub width_cm: Decimal,
    pub height_cm: Decimal,
    /// Names of the materials selected for the piece.
    #[validate(length(min = 1, message = "At least one material is required"))]
    pub materials: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

/// Produces a cosmetic marketing description for an order item.
///
/// When an external text-generation endpoint is configured the service
/// tries it first, but the result is never critical: any failure falls
/// back to a deterministic template.
#[derive(Clone)]
pub struct DescriptionService {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl DescriptionService {
    pub fn new(api_url: Option<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url,
            api_key,
        }
    }

    fn fallback(request: &DescriptionRequest) -> String {
        format!(
            "Custom frame, {} x {} cm, assembled with {}.",
            request.width_cm,
            request.height_cm,
            request.materials.join(", ")
        )
    }

    #[instrument(skip(self, request))]
    pub async fn generate(
        &self,
        request: DescriptionRequest,
    ) -> Result<DescriptionResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let description = match (&self.api_url, &self.api_key) {
            (Some(url), Some(key)) => match self.call_remote(url, key, &request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Description service unavailable; using fallback");
                    Self::fallback(&request)
                }
            },
            _ => Self::fallback(&request),
        };

        Ok(DescriptionResponse { description })
    }

    async fn call_remote(
        &self,
        url: &str,
        key: &str,
        request: &DescriptionRequest,
    ) -> Result<String, ServiceError> {
        let prompt = format!(
            "Write one short, appealing sentence describing a custom picture frame \
             of {} x {} cm made with: {}.",
            request.width_cm,
            request.height_cm,
            request.materials.join(", ")
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        #[derive(Deserialize)]
        struct RemoteResponse {
            text: String,
        }

        let body: RemoteResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn falls_back_to_template_without_remote_endpoint() {
        let service = DescriptionService::new(None, None);
        let response = service
            .generate(DescriptionRequest {
                width_cm: dec!(60),
                height_cm: dec!(80),
                materials: vec!["Oak moulding".into(), "Anti-reflective glass".into()],
            })
            .await
            .expect("fallback generation should not fail");

        assert!(response.description.contains("60 x 80 cm"));
        assert!(response.description.contains("Oak moulding"));
    }
}
