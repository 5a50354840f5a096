//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and parses `HttpResponse` values; a
//! [`Transport`](crate::transport::Transport) performs the round-trip in
//! between. Tests can therefore drive every operation with canned responses.
//!
//! All fields use owned types (`String`, `Vec`) so values can be recorded,
//! cloned and compared freely.

/// Header carrying the service's numeric error code on failed calls.
pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Header carrying the service's human-readable error message.
pub const ERROR_MESSAGE_HEADER: &str = "X-Error";

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// HTTP method for a request. Pocket only ever needs these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries any query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// The body has been read in full by the time this value exists. It is kept
/// as raw bytes: error pages need not be UTF-8, and decoding is the parser's
/// job.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 403,
            headers: vec![
                ("x-error-code".to_string(), "152".to_string()),
                ("X-ERROR".to_string(), "Invalid consumer key.".to_string()),
            ],
            body: Vec::new(),
        };
        assert_eq!(response.header(ERROR_CODE_HEADER), Some("152"));
        assert_eq!(response.header(ERROR_MESSAGE_HEADER), Some("Invalid consumer key."));
        assert_eq!(response.header("content-type"), None);
    }
}
