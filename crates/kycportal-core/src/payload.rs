//! Validation of text decoded from a QR symbol.
//!
//! The text must be a JSON object carrying every [`Payload`] field with the
//! right type. Unknown extra fields are ignored. A numeric `client_id` sent as
//! a string, or a `status_request` outside the known set, is rejected.

use crate::error::PipelineError;
use crate::types::Payload;

/// Parse decoded QR text into a [`Payload`].
pub fn parse_payload(text: &str) -> Result<Payload, PipelineError> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(PipelineError::InvalidPayload("empty QR content".to_string()));
    }

    serde_json::from_str::<Payload>(text).map_err(|e| {
        let reason = if e.is_syntax() || e.is_eof() {
            format!("not valid JSON ({e})")
        } else {
            format!("unexpected shape ({e})")
        };
        PipelineError::InvalidPayload(reason)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusRequest;

    const JANE: &str = r#"{"client_id":1,"customer_name":"Jane","customer_email":"j@x.com","customer_phone":"555","status_request":"new","home_bank_code":"BA"}"#;

    #[test]
    fn test_parse_valid_payload() {
        let payload = parse_payload(JANE).unwrap();
        assert_eq!(payload.client_id, 1);
        assert_eq!(payload.customer_name, "Jane");
        assert_eq!(payload.status_request, StatusRequest::New);
        assert_eq!(payload.home_bank_code, "BA");
    }

    #[test]
    fn test_parse_not_json() {
        match parse_payload("not json") {
            Err(PipelineError::InvalidPayload(reason)) => assert!(reason.contains("not valid JSON")),
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_field() {
        let text = r#"{"client_id":1,"customer_name":"Jane"}"#;
        match parse_payload(text) {
            Err(PipelineError::InvalidPayload(reason)) => assert!(reason.contains("unexpected shape")),
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_string_client_id() {
        let text = JANE.replace("\"client_id\":1", "\"client_id\":\"1\"");
        assert!(matches!(
            parse_payload(&text),
            Err(PipelineError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_status_request() {
        let text = JANE.replace("\"new\"", "\"renew\"");
        assert!(parse_payload(&text).is_err());
    }

    #[test]
    fn test_parse_ignores_extra_fields_and_whitespace() {
        let text = JANE.replace("{\"client_id\"", "\u{feff}  {\"qr_version\":2,\"client_id\"");
        let payload = parse_payload(&text).unwrap();
        assert_eq!(payload.client_id, 1);
    }

    #[test]
    fn test_parse_array_is_invalid() {
        assert!(parse_payload("[1, 2, 3]").is_err());
        assert!(parse_payload("   ").is_err());
    }
}
