pub mod file;

use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Load a typed request from `--input`, falling back to piped stdin.
///
/// Returns `None` when neither source supplied data, so the caller can
/// build the request from individual flags.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_document(path)?));
    }
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// An empty or whitespace-only pipe means no request.
fn parse_piped<T: DeserializeOwned>(text: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    log::debug!("read {} bytes of JSON from stdin", trimmed.len());
    Ok(Some(serde_json::from_str(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcf_core::valuation::wacc_override::WaccRequest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_pipe_is_no_request() {
        let parsed: Option<WaccRequest> = parse_piped(" \n\t").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_piped_request_parsed_into_type() {
        let text = r#"{
            "market_cap": "3000", "total_debt": "1000", "interest_expense": "50",
            "beta": "1.1", "tax_rate": "0.21", "risk_free_rate": "0.042",
            "equity_risk_premium": "0.055", "equity_weight_override": "0.6"
        }"#;
        let parsed: WaccRequest = parse_piped(text).unwrap().unwrap();
        assert_eq!(parsed.capital.market_cap, dec!(3000));
        assert_eq!(parsed.equity_weight_override, Some(dec!(0.6)));
    }

    #[test]
    fn test_malformed_pipe_is_an_error() {
        assert!(parse_piped::<WaccRequest>("{ not json").is_err());
    }
}
