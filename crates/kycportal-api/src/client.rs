//! HTTP client for the bank backend.
//!
//! All calls are JSON over HTTP against a single base URL. Nothing here
//! retries: every failure is returned to the caller once.

use crate::error::ApiError;
use async_trait::async_trait;
use futures::future::join_all;
use kycportal_core::{
    ChainReceipt, ClientId, CreatedRequest, KycHistory, KycRequest, Payload, PaymentReceipt,
    ProfileRow, RequestId, ReuseCheckReport,
};
use reqwest::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Fallback shown when a create call fails without a server message.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create KYC request.";

/// The one backend capability the intake pipeline needs.
#[async_trait]
pub trait KycBackend: Send + Sync {
    /// `POST /kyc-requests` with the payload as body.
    async fn create_request(&self, payload: &Payload) -> Result<CreatedRequest, ApiError>;
}

/// Body of the pay call. The amount is omitted when the backend computes it.
#[derive(Debug, Serialize)]
struct PayBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
}

/// Client for the bank backend REST API.
#[derive(Debug, Clone)]
pub struct KycApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl KycApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:4000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kycportal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Link to the stored identity card image of a request.
    pub fn ktp_url(&self, request_id: RequestId) -> String {
        self.url(&format!("/kyc-requests/{}/ktp", request_id))
    }

    /// Link to the stored KYC documents of a request.
    pub fn docs_url(&self, request_id: RequestId) -> String {
        self.url(&format!("/kyc-requests/{}/view", request_id))
    }

    /// `GET /kyc-requests`.
    pub async fn list_requests(&self) -> Result<Vec<KycRequest>, ApiError> {
        let resp = self.http.get(self.url("/kyc-requests")).send().await?;
        read_json(resp).await
    }

    /// Ask the backend to pull the identity registry status of one request.
    pub async fn refresh_registry_status(&self, request_id: RequestId) -> Result<(), ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/dukcapil-status/{}", request_id)))
            .send()
            .await?;
        expect_success(resp).await
    }

    /// List requests, refresh every row still in review, then list again.
    ///
    /// Refresh failures are logged and do not fail the sync.
    pub async fn load_and_sync(&self) -> Result<Vec<KycRequest>, ApiError> {
        let rows = self.list_requests().await?;
        let pending: Vec<RequestId> = rows
            .iter()
            .filter(|r| r.needs_status_sync())
            .map(|r| r.request_id)
            .collect();

        if pending.is_empty() {
            return Ok(rows);
        }

        tracing::info!("Syncing registry status for {} request(s)", pending.len());
        let results = join_all(pending.iter().map(|id| self.refresh_registry_status(*id))).await;
        for (id, result) in pending.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!("Status sync for request {} failed: {}", id, e);
            }
        }

        self.list_requests().await
    }

    /// `POST /kyc-requests/{id}/send-to-dukcapil`.
    pub async fn send_to_dukcapil(&self, request_id: RequestId) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/kyc-requests/{}/send-to-dukcapil", request_id)))
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `POST /kyc-requests/{id}/send-to-chain`.
    pub async fn send_to_chain(&self, request_id: RequestId) -> Result<ChainReceipt, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/kyc-requests/{}/send-to-chain", request_id)))
            .send()
            .await?;
        read_json(resp).await
    }

    /// `POST /kyc-requests/{id}/pay`. Without an amount the backend computes
    /// the share itself.
    pub async fn pay(
        &self,
        request_id: RequestId,
        amount_wei: Option<u128>,
    ) -> Result<PaymentReceipt, ApiError> {
        let body = PayBody {
            amount: amount_wei.map(|w| w.to_string()),
        };
        let resp = self
            .http
            .post(self.url(&format!("/kyc-requests/{}/pay", request_id)))
            .json(&body)
            .send()
            .await?;
        read_json(resp).await
    }

    /// `POST /kyc-requests/{id}/fetch-and-verify-reuse`.
    pub async fn fetch_and_verify_reuse(
        &self,
        request_id: RequestId,
    ) -> Result<ReuseCheckReport, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!(
                "/kyc-requests/{}/fetch-and-verify-reuse",
                request_id
            )))
            .send()
            .await?;
        read_json(resp).await
    }

    /// `DELETE /kyc-requests/{id}`.
    pub async fn delete_request(&self, request_id: RequestId) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(self.url(&format!("/kyc-requests/{}", request_id)))
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `GET /kyc-requests/{client_id}/onchain-history`.
    pub async fn onchain_history(&self, client_id: ClientId) -> Result<KycHistory, ApiError> {
        if client_id == 0 {
            return Err(ApiError::InvalidArgument(
                "Invalid Client ID provided.".to_string(),
            ));
        }
        let resp = self
            .http
            .get(self.url(&format!("/kyc-requests/{}/onchain-history", client_id)))
            .send()
            .await?;
        read_json(resp).await
    }

    /// `GET /profile-ids`.
    pub async fn profile_ids(&self) -> Result<Vec<ProfileRow>, ApiError> {
        let resp = self.http.get(self.url("/profile-ids")).send().await?;
        read_json(resp).await
    }
}

#[async_trait]
impl KycBackend for KycApiClient {
    async fn create_request(&self, payload: &Payload) -> Result<CreatedRequest, ApiError> {
        tracing::debug!(
            "POST /kyc-requests for client {} ({})",
            payload.client_id,
            payload.status_request
        );
        let resp = self
            .http
            .post(self.url("/kyc-requests"))
            .json(payload)
            .send()
            .await?;
        let created: CreatedRequest = read_json(resp).await?;
        tracing::info!("Backend created KYC request #{}", created.request_id);
        Ok(created)
    }
}

/// Decode a 2xx JSON body, or turn a non-2xx response into [`ApiError::Server`].
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::from_error_body(status.as_u16(), &body));
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// Like [`read_json`] but ignores the success body.
async fn expect_success(resp: Response) -> Result<(), ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.bytes().await?;
    Err(ApiError::from_error_body(status.as_u16(), &body))
}
