//! Ticket validation capability.

use async_trait::async_trait;

use super::CasClient;
use crate::attributes::CasAttributes;
use crate::error::ValidationError;

/// Outcome of a successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketVerification {
    /// Principal name reported by the CAS server.
    pub username: String,
    /// Attributes released for the principal.
    pub attributes: CasAttributes,
    /// Proxy-granting ticket IOU, when a proxy callback was requested.
    pub pgt_iou: Option<String>,
}

/// Exchanges a service ticket for the verified principal.
///
/// Implementations own the CAS wire protocol. The client supplies the
/// service URL, server URL and protocol options the ticket was issued for.
#[async_trait]
pub trait TicketValidator: Send + Sync {
    /// Validate `ticket` for the service described by `client`.
    async fn validate(
        &self,
        client: &CasClient,
        ticket: &str,
    ) -> Result<TicketVerification, ValidationError>;
}
