//! CAS single sign-on adapter.
//!
//! Builds CAS login/logout redirects, validates service tickets through a
//! [`TicketValidator`], maps the released attributes onto a [`UserIdentity`]
//! and answers election-eligibility questions keyed on the user's category.
//!
//! The host application owns routing, sessions and user persistence; this
//! crate only supplies the handler logic.
//!
//! ```ignore
//! use cas_sso::{CasConfig, CasProvider, CasRequest, MemorySession};
//!
//! let provider = CasProvider::with_http_validator(CasConfig {
//!     server_url: Some("https://cas.example.edu/cas/".to_string()),
//!     ..Default::default()
//! })?;
//!
//! let request = CasRequest::from_url("https://vote.example.edu/auth/after/?ticket=ST-1")?;
//! let mut session = MemorySession::new();
//! match provider.complete_login(&request, &mut session).await? {
//!     Some(user) => println!("welcome {}", user.name),
//!     None => println!("logged out"),
//! }
//! ```

pub mod attributes;
pub mod client;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod identity;
pub mod provider;
pub mod request;
pub mod session;
pub mod urls;

pub use attributes::{AttributeValue, CasAttributes};
pub use client::{cas_client, CasClient, HttpTicketValidator, TicketValidator, TicketVerification};
pub use config::{AttributeMapping, CasConfig, CasConfigJson, CasVersion, UsernameCase};
pub use eligibility::{
    build_constraint, can_create_election, constraint_category_id, constraint_satisfied,
    describe_constraint, list_categories, list_categories_from, Category, EligibilityConstraint,
};
pub use error::{CasError, ValidationError};
pub use identity::{UserIdentity, UserInfo, CAS_USER_TYPE};
pub use provider::{CasProvider, Redirect, LOGIN_MESSAGE, STATUS_UPDATES};
pub use request::{protocol_for, CasRequest};
pub use session::{MemorySession, SessionStore, SESSION_ATTRIBUTES_KEY};
pub use urls::{redirect_target, service_url};
