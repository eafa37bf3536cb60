//! Standard reason phrases keyed by status code.
//!
//! Phrases follow the IANA HTTP Status Code Registry. 418 is kept even though
//! it is not a registered status.

/// Phrase used when a status code has no registered reason phrase.
pub const UNKNOWN_STATUS_PHRASE: &str = "unknown status code";

/// Returns the standard reason phrase for a status code.
///
/// # Example
///
/// ```
/// use fratily_core::status::reason_phrase;
///
/// assert_eq!(reason_phrase(404), Some("Not Found"));
/// assert_eq!(reason_phrase(299), None);
/// ```
#[must_use]
pub const fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Content Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Content",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}

/// Returns the standard reason phrase, or [`UNKNOWN_STATUS_PHRASE`].
#[must_use]
pub const fn reason_phrase_or_unknown(code: u16) -> &'static str {
    match reason_phrase(code) {
        Some(phrase) => phrase,
        None => UNKNOWN_STATUS_PHRASE,
    }
}

/// Returns `true` if responses with this status never carry a body.
#[must_use]
pub const fn forbids_body(code: u16) -> bool {
    matches!(code, 100..=199 | 204 | 304)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_revised_phrases() {
        assert_eq!(reason_phrase(413), Some("Content Too Large"));
        assert_eq!(reason_phrase(422), Some("Unprocessable Content"));
        assert_eq!(reason_phrase(418), Some("I'm a teapot"));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(reason_phrase_or_unknown(599), UNKNOWN_STATUS_PHRASE);
        assert_eq!(reason_phrase_or_unknown(200), "OK");
    }

    #[test]
    fn test_bodyless_statuses() {
        assert!(forbids_body(101));
        assert!(forbids_body(204));
        assert!(forbids_body(304));
        assert!(!forbids_body(200));
        assert!(!forbids_body(404));
    }

    proptest! {
        #[test]
        fn prop_phrases_are_never_empty(code in 100u16..600) {
            prop_assert!(!reason_phrase_or_unknown(code).is_empty());
        }
    }
}
