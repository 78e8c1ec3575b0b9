//! HTTP inventory backend
//!
//! Talks JSON to the inventory service. Document generation is a multipart
//! request: one `json_data` text field plus the attached images.

use crate::backend::{InventoryBackend, TaskHandle, TaskStatusResponse};
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use infradoc_core::{
    Attachment, CollectionPayload, DocumentRequest, OptionId, OptionLevel, OptionNode, RawOption,
    normalize_options,
};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Configuration for [`HttpBackend`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

/// Inventory service client
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn get_options(&self, level: OptionLevel, path: &str) -> Result<Vec<OptionNode>> {
        let raw: Vec<RawOption> = self.get_json(path).await?;
        Ok(normalize_options(level, raw)?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => body,
    };
    Err(CloudError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl InventoryBackend for HttpBackend {
    async fn list_regions(&self) -> Result<Vec<OptionNode>> {
        self.get_options(OptionLevel::Region, "/api/regions").await
    }

    async fn list_compartments(&self, region: &OptionId) -> Result<Vec<OptionNode>> {
        self.get_options(
            OptionLevel::Compartment,
            &format!("/api/{}/compartments", region),
        )
        .await
    }

    async fn list_instances(
        &self,
        region: &OptionId,
        compartment_id: &OptionId,
    ) -> Result<Vec<OptionNode>> {
        self.get_options(
            OptionLevel::Instance,
            &format!("/api/{}/instances/{}", region, compartment_id),
        )
        .await
    }

    async fn submit_collection(&self, payload: &CollectionPayload) -> Result<TaskHandle> {
        let url = self.url(&format!("/api/{}/start-collection", payload.region));
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CloudError::Submission(e.to_string()))?;
        let response = check_status(response).await.map_err(|e| match e {
            CloudError::Api { status, message } => {
                CloudError::Submission(format!("{} ({})", message, status))
            }
            other => other,
        })?;
        Ok(response.json().await?)
    }

    async fn poll_status(&self, task_id: &str) -> Result<TaskStatusResponse> {
        self.get_json(&format!("/api/collection-status/{}", task_id))
            .await
    }

    async fn export_document(
        &self,
        request: &DocumentRequest,
        attachments: &[Attachment],
    ) -> Result<Vec<u8>> {
        let url = self.url("/api/generate-document");
        let mut form = Form::new().text("json_data", serde_json::to_string(request)?);
        for attachment in attachments {
            let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
            form = form.part(attachment.kind.field_name(), part);
        }

        tracing::debug!(
            "POST {} ({} attachments)",
            url,
            attachments.len()
        );
        let response = self.client.post(&url).multipart(form).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
