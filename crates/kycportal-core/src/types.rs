//! Core domain types shared with the bank backend.

use serde::{Deserialize, Serialize};

pub type RequestId = u64;
pub type ClientId = u64;

/// Kind of KYC request - exhaustive match required (no default case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusRequest {
    /// First onboarding of a customer.
    New,
    /// Refresh of data already registered on chain.
    Update,
    /// Reuse of KYC data registered by another bank.
    ReuseKyc,
}

impl StatusRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusRequest::New => "new",
            StatusRequest::Update => "update",
            StatusRequest::ReuseKyc => "reuse_kyc",
        }
    }

    pub fn all() -> &'static [StatusRequest] {
        &[
            StatusRequest::New,
            StatusRequest::Update,
            StatusRequest::ReuseKyc,
        ]
    }
}

impl std::fmt::Display for StatusRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend workflow status of a KYC request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKyc {
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "in review")]
    InReview,
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "paid")]
    Paid,
}

impl StatusKyc {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKyc::Submitted => "submitted",
            StatusKyc::InReview => "in review",
            StatusKyc::Verified => "verified",
            StatusKyc::Failed => "failed",
            StatusKyc::Success => "success",
            StatusKyc::Paid => "paid",
        }
    }
}

impl std::fmt::Display for StatusKyc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by a customer's QR code, posted as-is to create a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub client_id: ClientId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status_request: StatusRequest,
    pub home_bank_code: String,
}

/// Body returned by `POST /kyc-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRequest {
    pub request_id: RequestId,
}

/// A KYC request row as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycRequest {
    pub request_id: RequestId,
    pub client_id: ClientId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_ktp: String,
    #[serde(default)]
    pub customer_kyc: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    pub status_kyc: StatusKyc,
    pub status_request: StatusRequest,
    #[serde(default)]
    pub note: Option<String>,
}

impl KycRequest {
    /// Whether the backend still waits on the identity registry for this row.
    pub fn needs_status_sync(&self) -> bool {
        self.status_kyc == StatusKyc::InReview
            && matches!(
                self.status_request,
                StatusRequest::New | StatusRequest::Update
            )
    }
}

/// One version of a customer's KYC record on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainRecord {
    pub version: u32,
    pub hash_ktp: String,
    pub hash_kyc: String,
    pub status: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub issuer: String,
    pub revoked: bool,
}

/// On-chain history of one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycHistory {
    #[serde(default)]
    pub total_bill: f64,
    #[serde(default)]
    pub versions: Vec<OnChainRecord>,
    #[serde(default)]
    pub participating_banks: Vec<String>,
}

impl KycHistory {
    /// Most recent non-revoked version, if any.
    pub fn latest_active(&self) -> Option<&OnChainRecord> {
        self.versions
            .iter()
            .filter(|v| !v.revoked)
            .max_by_key(|v| v.version)
    }
}

/// Profile id issued by the backend for a completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub request_id: RequestId,
    pub client_id: ClientId,
    pub customer_name: String,
    pub profile_id: String,
}

/// Receipt of a `send-to-chain` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReceipt {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Receipt of a `pay` call. `amount_paid` is a decimal wei string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(default)]
    pub amount_paid: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Body of the `fetch-and-verify-reuse` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReuseCheckReport {
    #[serde(default)]
    pub message: Option<String>,
}
