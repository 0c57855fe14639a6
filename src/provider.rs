//! CAS login/logout flow.
//!
//! A request without a ticket is sent to the CAS login page; the browser comes
//! back with a `ticket` parameter which is validated and turned into a
//! [`UserIdentity`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::{cas_client, CasClient, HttpTicketValidator, TicketValidator};
use crate::config::CasConfig;
use crate::error::{CasError, Result};
use crate::identity::UserIdentity;
use crate::request::CasRequest;
use crate::session::{store_attributes, SessionStore};
use crate::urls;

/// Login button text.
pub const LOGIN_MESSAGE: &str = "Log in with my NetID";

/// CAS users have no status feed to post updates to.
pub const STATUS_UPDATES: bool = false;

/// Query parameter carrying the CAS service ticket.
pub const TICKET_PARAM: &str = "ticket";

/// An HTTP redirect the host should send to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// HTTP status for the redirect (302 Found).
    pub fn status(&self) -> u16 {
        302
    }
}

/// CAS single sign-on adapter.
pub struct CasProvider {
    config: CasConfig,
    validator: Arc<dyn TicketValidator>,
}

impl CasProvider {
    /// Create a provider with the given configuration and ticket validator.
    ///
    /// CAS 1.0 releases no attributes, so it cannot produce a
    /// [`UserIdentity`] and is rejected here.
    pub fn new(config: CasConfig, validator: Arc<dyn TicketValidator>) -> Result<Self> {
        config.validate().map_err(CasError::Config)?;
        if !config.version.releases_attributes() {
            return Err(CasError::Config(format!(
                "CAS version {} releases no attributes for the user identity",
                config.version
            )));
        }

        Ok(Self { config, validator })
    }

    /// Create a provider validating tickets over HTTP against the CAS server.
    pub fn with_http_validator(config: CasConfig) -> Result<Self> {
        let validator =
            HttpTicketValidator::new(Duration::from_secs(config.validate_timeout_secs))?;
        Self::new(config, Arc::new(validator))
    }

    pub fn config(&self) -> &CasConfig {
        &self.config
    }

    /// Post-login redirect target for `request`.
    pub fn redirect_target(&self, request: Option<&CasRequest>) -> String {
        urls::redirect_target(&self.config, request)
    }

    /// Callback URL the CAS server sends the browser back to.
    pub fn service_url(&self, request: &CasRequest, redirect_to: Option<&str>) -> String {
        urls::service_url(&self.config, request, redirect_to)
    }

    /// CAS client for `service_url`, resolving a path-only server URL
    /// against `request`.
    pub fn cas_client(
        &self,
        service_url: Option<String>,
        request: Option<&CasRequest>,
    ) -> Result<CasClient> {
        cas_client(&self.config, Arc::clone(&self.validator), service_url, request)
    }

    /// CAS login URL for the callback `redirect_url`.
    pub fn login_url(&self, request: &CasRequest, redirect_url: &str) -> Result<String> {
        self.cas_client(Some(redirect_url.to_string()), Some(request))?
            .login_url()
    }

    /// Redirect to the CAS login page with the service URL of `request`.
    pub fn begin_login(&self, request: &CasRequest) -> Result<Redirect> {
        let service = self.service_url(request, None);
        let location = self.login_url(request, &service)?;

        debug!(service = %service, "Redirecting to CAS login");
        Ok(Redirect::to(location))
    }

    /// Redirect ending the user's session.
    ///
    /// The browser returns to the origin of `request`, or to `logout_host`
    /// when one is configured. With `logout_completely` unset the CAS session
    /// is left alone and only the local redirect is issued.
    pub fn logout(&self, request: &CasRequest, user: Option<&UserIdentity>) -> Result<Redirect> {
        let return_to = match self.config.logout_host.as_deref() {
            Some(host) if host.contains("://") => host.to_string(),
            Some(host) => format!("https://{}", host),
            None => request.origin(),
        };

        if !self.config.logout_completely {
            debug!(return_to = %return_to, "Local logout only");
            return Ok(Redirect::to(return_to));
        }

        let service = self.service_url(request, None);
        let location = self
            .cas_client(Some(service), Some(request))?
            .logout_url(Some(&return_to))?;

        info!(
            user = user.map(|u| u.user_id.as_str()).unwrap_or("anonymous"),
            return_to = %return_to,
            "Redirecting to CAS logout"
        );
        Ok(Redirect::to(location))
    }

    /// Finish a login from the CAS callback.
    ///
    /// Returns `Ok(None)` when the request carries no ticket (a logout
    /// callback). Otherwise the ticket is validated, the user identity is built
    /// and only then is the attribute mapping written to the session.
    /// Validation failures are propagated unchanged and leave the session
    /// untouched.
    pub async fn complete_login<S>(
        &self,
        request: &CasRequest,
        session: &mut S,
    ) -> Result<Option<UserIdentity>>
    where
        S: SessionStore + ?Sized,
    {
        let ticket = match request.query_param(TICKET_PARAM).filter(|t| !t.is_empty()) {
            Some(ticket) => ticket,
            None => {
                debug!("No CAS ticket on callback, treating as logout");
                return Ok(None);
            }
        };

        let service = self.service_url(request, None);
        let client = self.cas_client(Some(service), Some(request))?;
        let verification = client.verify_ticket(ticket).await?;

        let mut identity =
            UserIdentity::from_attributes(&verification.attributes, &self.config.attribute_mapping)?;
        if let Some(case) = self.config.force_change_username_case {
            identity.user_id = case.apply(&identity.user_id);
        }

        if !verification.attributes.is_empty() {
            store_attributes(session, &verification.attributes)?;
        }

        info!(
            user_id = %identity.user_id,
            username = %verification.username,
            "CAS login completed"
        );

        Ok(Some(identity))
    }

    /// Posting status updates is not supported for CAS users.
    pub fn update_status(&self, _token: Option<&str>, _message: &str) {}
}
