//! Display helpers and workflow actions for the request dashboard.

use crate::types::{KycRequest, StatusKyc, StatusRequest};

/// Decimals of one ether expressed in wei.
pub const ETHER_DECIMALS: u32 = 18;
const WEI_PER_ETHER: u128 = 10u128.pow(ETHER_DECIMALS);

/// Workflow step offered for a request row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Ask the identity registry to verify the customer.
    Verify,
    /// Register (new) or refresh (update) the record on chain.
    SendToChain,
    /// Pay the reuse share to the home bank.
    PayShare,
    /// Pull and check the reused data after payment.
    CheckReuse,
    Delete,
}

impl RowAction {
    /// Button label for the given request kind.
    pub fn label(&self, status_request: StatusRequest) -> &'static str {
        match self {
            RowAction::Verify => "Verify (Dukcapil)",
            RowAction::SendToChain => match status_request {
                StatusRequest::New => "Send to Chain (1 ETH)",
                _ => "Update Chain (0.1 ETH)",
            },
            RowAction::PayShare => "Pay Share",
            RowAction::CheckReuse => "Check & Verify Data",
            RowAction::Delete => "Delete",
        }
    }
}

/// Actions available for a row given its current statuses.
pub fn available_actions(request: &KycRequest) -> Vec<RowAction> {
    let mut actions = Vec::with_capacity(2);
    match (request.status_request, request.status_kyc) {
        (StatusRequest::New | StatusRequest::Update, StatusKyc::Submitted) => {
            actions.push(RowAction::Verify)
        }
        (StatusRequest::New | StatusRequest::Update, StatusKyc::Verified) => {
            actions.push(RowAction::SendToChain)
        }
        (StatusRequest::ReuseKyc, StatusKyc::Submitted) => actions.push(RowAction::PayShare),
        (StatusRequest::ReuseKyc, StatusKyc::Paid) => actions.push(RowAction::CheckReuse),
        _ => {}
    }
    actions.push(RowAction::Delete);
    actions
}

/// Amount parsing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid or no amount entered.")]
    Empty,
    #[error("Invalid ETH amount format.")]
    Format,
    #[error("Amount must be greater than zero.")]
    NotPositive,
    #[error("Amount is too large.")]
    Overflow,
}

/// Parse a decimal ETH amount ("0.01") into wei.
pub fn parse_ether(input: &str) -> Result<u128, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if (whole.is_empty() && frac.is_empty())
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
        || frac.len() > ETHER_DECIMALS as usize
    {
        return Err(AmountError::Format);
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let frac_wei: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = ETHER_DECIMALS as usize);
        padded.parse().map_err(|_| AmountError::Format)?
    };

    let wei = whole
        .checked_mul(WEI_PER_ETHER)
        .and_then(|w| w.checked_add(frac_wei))
        .ok_or(AmountError::Overflow)?;
    if wei == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(wei)
}

/// Format wei as a decimal ETH amount without trailing zeros ("0.01", "1.0").
pub fn format_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let frac = wei % WEI_PER_ETHER;
    if frac == 0 {
        return format!("{}.0", whole);
    }
    let frac = format!("{:0>width$}", frac, width = ETHER_DECIMALS as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Format a wei amount received as a decimal string; unparseable input shows as 0.
pub fn format_wei_str(wei: Option<&str>) -> String {
    let wei = wei.and_then(|w| w.trim().parse::<u128>().ok()).unwrap_or(0);
    format_ether(wei)
}

/// Truncate a transaction hash for display.
pub fn short_hash(hash: &str, len: usize) -> String {
    if hash.chars().count() <= len {
        hash.to_string()
    } else {
        let prefix: String = hash.chars().take(len).collect();
        format!("{}…", prefix)
    }
}

/// Truncate text to a column width.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status_request: StatusRequest, status_kyc: StatusKyc) -> KycRequest {
        KycRequest {
            request_id: 1,
            client_id: 1,
            customer_name: "Jane".to_string(),
            customer_email: "j@x.com".to_string(),
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
    fn test_actions_for_new_requests() {
        assert_eq!(
            available_actions(&row(StatusRequest::New, StatusKyc::Submitted)),
            vec![RowAction::Verify, RowAction::Delete]
        );
        assert_eq!(
            available_actions(&row(StatusRequest::Update, StatusKyc::Verified)),
            vec![RowAction::SendToChain, RowAction::Delete]
        );
        assert_eq!(
            available_actions(&row(StatusRequest::New, StatusKyc::InReview)),
            vec![RowAction::Delete]
        );
    }

    #[test]
    fn test_actions_for_reuse_requests() {
        assert_eq!(
            available_actions(&row(StatusRequest::ReuseKyc, StatusKyc::Submitted)),
            vec![RowAction::PayShare, RowAction::Delete]
        );
        assert_eq!(
            available_actions(&row(StatusRequest::ReuseKyc, StatusKyc::Paid)),
            vec![RowAction::CheckReuse, RowAction::Delete]
        );
        assert_eq!(
            available_actions(&row(StatusRequest::ReuseKyc, StatusKyc::Verified)),
            vec![RowAction::Delete]
        );
    }

    #[test]
    fn test_send_to_chain_label() {
        assert_eq!(
            RowAction::SendToChain.label(StatusRequest::New),
            "Send to Chain (1 ETH)"
        );
        assert_eq!(
            RowAction::SendToChain.label(StatusRequest::Update),
            "Update Chain (0.1 ETH)"
        );
    }

    #[test]
    fn test_parse_ether() {
        assert_eq!(parse_ether("1").unwrap(), WEI_PER_ETHER);
        assert_eq!(parse_ether("0.01").unwrap(), 10_000_000_000_000_000);
        assert_eq!(parse_ether(".5").unwrap(), WEI_PER_ETHER / 2);
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn test_parse_ether_rejects_bad_input() {
        assert_eq!(parse_ether(""), Err(AmountError::Empty));
        assert_eq!(parse_ether("abc"), Err(AmountError::Format));
        assert_eq!(parse_ether("-1"), Err(AmountError::Format));
        assert_eq!(parse_ether("."), Err(AmountError::Format));
        assert_eq!(parse_ether("0.0000000000000000001"), Err(AmountError::Format));
        assert_eq!(parse_ether("0"), Err(AmountError::NotPositive));
        assert_eq!(parse_ether("0.000"), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(0), "0.0");
        assert_eq!(format_ether(WEI_PER_ETHER), "1.0");
        assert_eq!(format_ether(10_000_000_000_000_000), "0.01");
        assert_eq!(format_ether(1_500_000_000_000_000_000), "1.5");
        assert_eq!(format_wei_str(Some("100000000000000000")), "0.1");
        assert_eq!(format_wei_str(None), "0.0");
        assert_eq!(format_wei_str(Some("garbage")), "0.0");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0x1234567890abcdef", 8), "0x123456…");
        assert_eq!(short_hash("0xab", 8), "0xab");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello…");
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_format_then_parse_preserves_wei(wei in 1u128..u64::MAX as u128 * 1000) {
            prop_assert_eq!(parse_ether(&format_ether(wei)).unwrap(), wei);
        }

        #[test]
        fn test_parse_ether_never_panics(input in ".{0,40}") {
            let _ = parse_ether(&input);
        }
    }
}
