//! CAS protocol client.
//!
//! [`CasClient`] carries the per-request protocol options and builds the
//! login, logout and validate URLs. Ticket validation itself is delegated to
//! a [`TicketValidator`].

pub mod http;
pub mod validator;

pub use http::HttpTicketValidator;
pub use validator::{TicketValidator, TicketVerification};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::{CasConfig, CasVersion, UsernameCase};
use crate::error::{CasError, Result, ValidationError};
use crate::request::CasRequest;

/// A configured CAS client for one service URL.
#[derive(Clone)]
pub struct CasClient {
    service_url: Option<String>,
    version: CasVersion,
    server_url: Url,
    extra_login_params: BTreeMap<String, String>,
    renew: bool,
    username_attribute: String,
    proxy_callback: Option<String>,
    username_case: Option<UsernameCase>,
    validator: Arc<dyn TicketValidator>,
}

impl fmt::Debug for CasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasClient")
            .field("service_url", &self.service_url)
            .field("version", &self.version)
            .field("server_url", &self.server_url.as_str())
            .field("renew", &self.renew)
            .field("username_attribute", &self.username_attribute)
            .field("proxy_callback", &self.proxy_callback)
            .finish_non_exhaustive()
    }
}

/// Build a [`CasClient`] from the configuration.
///
/// A path-only `server_url` is completed with the scheme (`X-Forwarded-Proto`
/// first) and host (`Host` header first) of `request`. The result must be an
/// absolute http(s) URL.
pub fn cas_client(
    config: &CasConfig,
    validator: Arc<dyn TicketValidator>,
    service_url: Option<String>,
    request: Option<&CasRequest>,
) -> Result<CasClient> {
    let configured = config
        .server_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| CasError::Config("CAS server_url is not configured".to_string()))?;

    let resolved = match request {
        Some(request) if configured.starts_with('/') => {
            let scheme = request
                .header("X-Forwarded-Proto")
                .and_then(|proto| proto.split(',').next())
                .map(str::trim)
                .filter(|proto| !proto.is_empty())
                .unwrap_or_else(|| request.protocol());
            let host = request.header("Host").unwrap_or_else(|| request.host());
            format!("{}://{}{}", scheme, host, configured)
        }
        _ => configured.to_string(),
    };

    let server_url = Url::parse(&resolved)
        .map_err(|e| CasError::InvalidServerUrl(format!("'{}': {}", resolved, e)))?;
    if !matches!(server_url.scheme(), "http" | "https") || !server_url.has_host() {
        return Err(CasError::InvalidServerUrl(format!(
            "'{}' is not an absolute http(s) URL",
            resolved
        )));
    }

    Ok(CasClient {
        service_url,
        version: config.version,
        server_url,
        extra_login_params: config.extra_login_params.clone().unwrap_or_default(),
        renew: config.renew,
        username_attribute: config.username_attribute.clone(),
        proxy_callback: config.proxy_callback.clone(),
        username_case: config.force_change_username_case,
        validator,
    })
}

impl CasClient {
    pub fn service_url(&self) -> Option<&str> {
        self.service_url.as_deref()
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn version(&self) -> CasVersion {
        self.version
    }

    pub fn renew(&self) -> bool {
        self.renew
    }

    pub fn username_attribute(&self) -> &str {
        &self.username_attribute
    }

    pub fn proxy_callback(&self) -> Option<&str> {
        self.proxy_callback.as_deref()
    }

    /// CAS login URL for this client's service.
    pub fn login_url(&self) -> Result<String> {
        let mut url = self.endpoint("login")?;

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(ref service) = self.service_url {
            params.push(("service", service.as_str()));
        }
        if self.renew {
            params.push(("renew", "true"));
        }
        for (name, value) in &self.extra_login_params {
            params.push((name.as_str(), value.as_str()));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!(url = %url, "Built CAS login URL");
        Ok(url.into())
    }

    /// CAS logout URL, returning the browser to `redirect_url` afterwards.
    pub fn logout_url(&self, redirect_url: Option<&str>) -> Result<String> {
        let mut url = self.endpoint("logout")?;
        if let Some(redirect) = redirect_url {
            url.query_pairs_mut()
                .append_pair(self.version.logout_redirect_param(), redirect);
        }
        Ok(url.into())
    }

    /// Validate endpoint URL for `ticket`, with all protocol parameters.
    pub fn validation_url(&self, ticket: &str) -> Result<Url, ValidationError> {
        let mut url = self.server_url.join(self.version.validate_path())?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ticket", ticket);
            if let Some(ref service) = self.service_url {
                query.append_pair("service", service);
            }
            if let Some(ref callback) = self.proxy_callback {
                query.append_pair("pgtUrl", callback);
            }
            if self.renew {
                query.append_pair("renew", "true");
            }
            if self.version != CasVersion::V1 {
                query.append_pair("format", "JSON");
            }
        }
        Ok(url)
    }

    /// Exchange `ticket` for the verified principal.
    ///
    /// The username is taken from `username_attribute` when the server
    /// released it, then case-folded if configured. Validator errors are
    /// returned unchanged.
    pub async fn verify_ticket(&self, ticket: &str) -> Result<TicketVerification> {
        let mut verification = self.validator.validate(self, ticket).await?;

        if let Some(username) = verification.attributes.get_single(&self.username_attribute) {
            verification.username = username.to_string();
        }
        if let Some(case) = self.username_case {
            verification.username = case.apply(&verification.username);
        }

        info!(
            user = %verification.username,
            attributes = verification.attributes.len(),
            "CAS ticket validated"
        );

        Ok(verification)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.server_url
            .join(path)
            .map_err(|e| CasError::InvalidServerUrl(format!("'{}': {}", self.server_url, e)))
    }
}
