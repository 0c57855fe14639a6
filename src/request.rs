//! Request context supplied by the host application.

use std::collections::HashMap;

use crate::error::{CasError, Result};

/// The parts of an inbound HTTP request the CAS adapter inspects.
#[derive(Debug, Clone, Default)]
pub struct CasRequest {
    secure: bool,
    host: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, Vec<String>>,
}

impl CasRequest {
    /// Create a request context. `host` may carry a port ("example.com:8443").
    pub fn new(secure: bool, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
        }
    }

    /// Build a request context from an absolute URL as seen by the host.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = url::Url::parse(raw)
            .map_err(|e| CasError::InvalidRequest(format!("'{}': {}", raw, e)))?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(CasError::InvalidRequest(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| CasError::InvalidRequest(format!("'{}' has no host", raw)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut request = Self::new(secure, host, url.path());
        // Last occurrence wins for repeated parameters
        for (name, value) in url.query_pairs() {
            request.query.insert(name.into_owned(), value.into_owned());
        }

        Ok(request)
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Whether the request arrived over a secure transport.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// "https" for secure requests, "http" otherwise.
    pub fn protocol(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `{protocol}://{host}` of this request.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.protocol(), self.host)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first())
            .map(|s| s.as_str())
    }

    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }
}

/// Protocol of a request: "https" when secure, else "http".
pub fn protocol_for(request: &CasRequest) -> &'static str {
    request.protocol()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol() {
        assert_eq!(protocol_for(&CasRequest::new(true, "app.example.com", "/")), "https");
        assert_eq!(protocol_for(&CasRequest::new(false, "app.example.com", "/")), "http");
    }

    #[test]
    fn test_from_url() {
        let request =
            CasRequest::from_url("https://app.example.com:8443/auth/after/?ticket=ST-1&next=%2Fhome")
                .unwrap();
        assert!(request.is_secure());
        assert_eq!(request.host(), "app.example.com:8443");
        assert_eq!(request.path(), "/auth/after/");
        assert_eq!(request.query_param("ticket"), Some("ST-1"));
        assert_eq!(request.query_param("next"), Some("/home"));
        assert_eq!(request.origin(), "https://app.example.com:8443");
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(CasRequest::from_url("not a url").is_err());
        assert!(CasRequest::from_url("ftp://files.example.com/").is_err());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = CasRequest::new(false, "app.example.com", "/")
            .with_header("Referer", "http://app.example.com/elections");
        assert_eq!(request.referer(), Some("http://app.example.com/elections"));
        assert_eq!(request.header("REFERER"), Some("http://app.example.com/elections"));
        assert_eq!(request.header("X-Forwarded-Proto"), None);
    }
}
