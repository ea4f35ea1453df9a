//! Text rendering and guards for the request dashboard commands.

use chrono::DateTime;
use kycportal_core::{
    ChainReceipt, KycHistory, KycRequest, PaymentReceipt, ProfileRow, RequestId, RowAction,
    available_actions, format_wei_str, short_hash, truncate,
};
use std::fmt::Write;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("Request #{0} not found")]
    NotFound(RequestId),

    #[error("'{action}' is not available for request #{request_id} (status {status_kyc}, {status_request})")]
    ActionUnavailable {
        action: &'static str,
        request_id: RequestId,
        status_kyc: String,
        status_request: String,
    },
}

/// Find a row by request id.
pub fn find_request(rows: &[KycRequest], request_id: RequestId) -> Result<&KycRequest, DashboardError> {
    rows.iter()
        .find(|r| r.request_id == request_id)
        .ok_or(DashboardError::NotFound(request_id))
}

/// Refuse workflow steps the row does not currently offer.
pub fn ensure_action(row: &KycRequest, action: RowAction) -> Result<(), DashboardError> {
    if available_actions(row).contains(&action) {
        Ok(())
    } else {
        Err(DashboardError::ActionUnavailable {
            action: action.label(row.status_request),
            request_id: row.request_id,
            status_kyc: row.status_kyc.to_string(),
            status_request: row.status_request.to_string(),
        })
    }
}

/// Render the request table.
pub fn render_requests(rows: &[KycRequest]) -> String {
    if rows.is_empty() {
        return "No KYC requests found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:>6}  {:<20}  {:<24}  {:<14}  {:<10}  {:<9}  {:<16}  ACTIONS",
        "REQ", "CLIENT", "NAME", "EMAIL", "PHONE", "STATUS", "REQUEST", "NOTE"
    );
    for row in rows {
        let actions: Vec<&str> = available_actions(row)
            .iter()
            .map(|a| a.label(row.status_request))
            .collect();
        let _ = writeln!(
            out,
            "{:>6}  {:>6}  {:<20}  {:<24}  {:<14}  {:<10}  {:<9}  {:<16}  {}",
            row.request_id,
            row.client_id,
            truncate(&row.customer_name, 20),
            truncate(&row.customer_email, 24),
            truncate(&row.customer_phone, 14),
            row.status_kyc.as_str(),
            row.status_request.as_str(),
            truncate(row.note.as_deref().unwrap_or("N/A"), 16),
            actions.join(", ")
        );
    }
    out
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Render the on-chain history of one client.
pub fn render_history(client_id: u64, history: &KycHistory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "On-chain KYC history for client {}", client_id);
    let _ = writeln!(out, "Total bill:          {} ETH", history.total_bill);
    let banks = if history.participating_banks.is_empty() {
        "none".to_string()
    } else {
        history.participating_banks.join(", ")
    };
    let _ = writeln!(out, "Participating banks: {}", banks);
    match history.latest_active() {
        Some(v) => {
            let _ = writeln!(out, "Latest active:       v{} ({})", v.version, v.status);
        }
        None => {
            let _ = writeln!(out, "Latest active:       none");
        }
    }

    if history.versions.is_empty() {
        let _ = writeln!(out, "No on-chain versions recorded.");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>4}  {:<10}  {:<23}  {:<14}  {:<14}  {:<14}  REVOKED",
        "VER", "STATUS", "TIMESTAMP", "ISSUER", "HASH KTP", "HASH KYC"
    );
    let mut versions: Vec<_> = history.versions.iter().collect();
    versions.sort_by_key(|v| std::cmp::Reverse(v.version));
    for v in versions {
        let _ = writeln!(
            out,
            "{:>4}  {:<10}  {:<23}  {:<14}  {:<14}  {:<14}  {}",
            v.version,
            truncate(&v.status, 10),
            format_timestamp(v.timestamp),
            short_hash(&v.issuer, 12),
            short_hash(&v.hash_ktp, 12),
            short_hash(&v.hash_kyc, 12),
            if v.revoked { "yes" } else { "no" }
        );
    }
    out
}

/// Render the profile id table.
pub fn render_profiles(rows: &[ProfileRow]) -> String {
    if rows.is_empty() {
        return "No profiles found.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:>6}  {:<24}  PROFILE ID", "REQ", "CLIENT", "NAME");
    for row in rows {
        let _ = writeln!(
            out,
            "{:>6}  {:>6}  {:<24}  {}",
            row.request_id,
            row.client_id,
            truncate(&row.customer_name, 24),
            row.profile_id
        );
    }
    out
}

/// Summary line for a send-to-chain receipt.
pub fn chain_receipt_message(receipt: &ChainReceipt) -> String {
    let version = receipt
        .version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".to_string());
    match receipt.tx_hash.as_deref().filter(|h| !h.is_empty()) {
        Some(hash) => format!("Success! Version {}. Tx Hash: {}", version, short_hash(hash, 8)),
        None => format!("Success! Version {}, but no txHash returned.", version),
    }
}

/// Summary line for a pay receipt.
pub fn payment_message(receipt: &PaymentReceipt) -> String {
    let tx = receipt
        .tx_hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .map(|h| short_hash(h, 10))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "Payment submission successful. Amount processed: {} ETH. Tx: {}",
        format_wei_str(receipt.amount_paid.as_deref()),
        tx
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycportal_core::{OnChainRecord, StatusKyc, StatusRequest};

    fn row(request_id: u64, status_kyc: StatusKyc, status_request: StatusRequest) -> KycRequest {
        KycRequest {
            request_id,
            client_id: 10,
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: "555".to_string(),
            customer_ktp: String::new(),
            customer_kyc: String::new(),
            profile_id: None,
            status_kyc,
            status_request,
            note: None,
        }
    }

    #[test]
    fn test_find_request() {
        let rows = vec![row(1, StatusKyc::Submitted, StatusRequest::New)];
        assert!(find_request(&rows, 1).is_ok());
        assert_eq!(find_request(&rows, 2), Err(DashboardError::NotFound(2)));
    }

    #[test]
    fn test_ensure_action() {
        let verified = row(3, StatusKyc::Verified, StatusRequest::Update);
        assert!(ensure_action(&verified, RowAction::SendToChain).is_ok());
        assert!(ensure_action(&verified, RowAction::Delete).is_ok());

        let err = ensure_action(&verified, RowAction::Verify).unwrap_err();
        assert!(err.to_string().contains("Verify (Dukcapil)"));
        assert!(err.to_string().contains("#3"));
    }

    #[test]
    fn test_render_requests_lists_actions() {
        let rows = vec![
            row(1, StatusKyc::Submitted, StatusRequest::New),
            row(2, StatusKyc::Paid, StatusRequest::ReuseKyc),
        ];
        let table = render_requests(&rows);
        assert!(table.contains("Verify (Dukcapil), Delete"));
        assert!(table.contains("Check & Verify Data, Delete"));
        assert!(table.contains("N/A"));
        assert_eq!(render_requests(&[]), "No KYC requests found.\n");
    }

    #[test]
    fn test_render_history_newest_first() {
        let record = |version| OnChainRecord {
            version,
            hash_ktp: "0x1111222233334444".to_string(),
            hash_kyc: "0x5555666677778888".to_string(),
            status: "verified".to_string(),
            timestamp: 0,
            issuer: "0xbank".to_string(),
            revoked: false,
        };
        let history = KycHistory {
            total_bill: 1.1,
            versions: vec![record(1), record(2)],
            participating_banks: vec!["0xbank".to_string()],
        };
        let text = render_history(9, &history);
        let v2 = text.find("   2  ").unwrap();
        let v1 = text.find("   1  ").unwrap();
        assert!(v2 < v1);
        assert!(text.contains("1970-01-01 00:00:00 UTC"));
        assert!(text.contains("Participating banks: 0xbank"));
        assert!(text.contains("Latest active:       v2 (verified)"));
    }

    #[test]
    fn test_render_history_skips_revoked_for_latest() {
        let record = |version, revoked| OnChainRecord {
            version,
            hash_ktp: "0xktp".to_string(),
            hash_kyc: "0xkyc".to_string(),
            status: "verified".to_string(),
            timestamp: 1_700_000_000,
            issuer: "0xbank".to_string(),
            revoked,
        };
        let history = KycHistory {
            total_bill: 1.1,
            versions: vec![record(1, false), record(2, true)],
            participating_banks: vec![],
        };
        let text = render_history(9, &history);
        assert!(text.contains("Latest active:       v1 (verified)"));

        let all_revoked = KycHistory {
            versions: vec![record(1, true)],
            ..history
        };
        assert!(render_history(9, &all_revoked).contains("Latest active:       none"));
    }

    #[test]
    fn test_render_history_empty() {
        let text = render_history(9, &KycHistory {
            total_bill: 0.0,
            versions: vec![],
            participating_banks: vec![],
        });
        assert!(text.contains("No on-chain versions recorded."));
        assert!(text.contains("Participating banks: none"));
        assert!(text.contains("Latest active:       none"));
    }

    #[test]
    fn test_chain_receipt_message() {
        let msg = chain_receipt_message(&ChainReceipt {
            version: Some(2),
            tx_hash: Some("0xabcdef1234567890".to_string()),
        });
        assert_eq!(msg, "Success! Version 2. Tx Hash: 0xabcdef…");

        let msg = chain_receipt_message(&ChainReceipt {
            version: Some(1),
            tx_hash: None,
        });
        assert!(msg.contains("no txHash returned"));
    }

    #[test]
    fn test_payment_message() {
        let msg = payment_message(&PaymentReceipt {
            amount_paid: Some("250000000000000000".to_string()),
            tx_hash: None,
        });
        assert_eq!(
            msg,
            "Payment submission successful. Amount processed: 0.25 ETH. Tx: N/A"
        );
    }
}
