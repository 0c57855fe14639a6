//! User identity handed to the host application after a CAS login.

use serde::{Deserialize, Serialize};

use crate::attributes::CasAttributes;
use crate::config::AttributeMapping;
use crate::error::Result;

/// Identity type tag for users authenticated through CAS.
pub const CAS_USER_TYPE: &str = "cas";

/// Profile information attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Eligibility category ("year" the user belongs to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl UserInfo {
    pub fn with_category(category: impl Into<String>) -> Self {
        Self {
            name: None,
            category: Some(category.into()),
        }
    }
}

/// Identity record for a user authenticated by the CAS server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub name: String,
    pub info: UserInfo,
    /// Always empty for CAS users.
    pub token: Option<String>,
    #[serde(rename = "type")]
    pub user_type: String,
}

impl UserIdentity {
    /// Build the identity from validated CAS attributes.
    ///
    /// Every mapped attribute must be present, otherwise
    /// [`CasError::MissingAttribute`](crate::CasError::MissingAttribute) names
    /// the first one missing.
    pub fn from_attributes(attributes: &CasAttributes, mapping: &AttributeMapping) -> Result<Self> {
        let user_id = attributes.require(&mapping.user_id)?;
        let name = attributes.require(&mapping.name)?;
        let category = attributes.require(&mapping.category)?;

        Ok(Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            info: UserInfo {
                name: Some(name.to_string()),
                category: Some(category.to_string()),
            },
            token: None,
            user_type: CAS_USER_TYPE.to_string(),
        })
    }
}
