use thiserror::Error;

/// Failures surfaced by the fetch pipeline and the change-series builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Every attempt failed with a non-200 status or a transport error.
    #[error(
        "request to {url} failed after {attempts} attempt(s) (last status: {})",
        status_text(.status)
    )]
    Transient {
        url: String,
        status: Option<u16>,
        attempts: u32,
    },

    /// The server answered 200 but the body is not JSON or lacks a required field.
    #[error("response from {context} is missing `{field}`")]
    MalformedResponse { field: String, context: String },

    /// The requested day count reaches past the representable calendar.
    #[error("a {days}-day history window is out of range")]
    WindowOutOfRange { days: u32 },

    #[error("no historical bars for {symbol}")]
    NoData { symbol: String },

    /// The latest-trade endpoint had nothing for the symbol. Not fatal.
    #[error("no latest trade for {symbol}")]
    NoTradeData { symbol: String },

    #[error("cannot build a change series from zero bars")]
    EmptyInput,
}

fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => String::from("none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_message_names_status_and_url() {
        let err = FetchError::Transient {
            url: String::from("https://example.test/v2/stocks/UNH/bars"),
            status: Some(500),
            attempts: 3,
        };

        assert_eq!(
            err.to_string(),
            "request to https://example.test/v2/stocks/UNH/bars failed after 3 attempt(s) (last status: 500)"
        );
    }

    #[test]
    fn transient_without_status_says_none() {
        let err = FetchError::Transient {
            url: String::from("https://example.test"),
            status: None,
            attempts: 1,
        };

        assert!(err.to_string().ends_with("(last status: none)"));
    }
}
