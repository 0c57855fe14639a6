//! CAS adapter configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// CAS protocol version spoken with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasVersion {
    /// Plain-text `validate` endpoint. Returns the username only, never
    /// attributes, so it cannot back a login that needs the user identity.
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2")]
    V2,
    #[serde(rename = "3")]
    V3,
}

impl CasVersion {
    /// Path of the ticket validation endpoint, relative to the server URL.
    pub fn validate_path(&self) -> &'static str {
        match self {
            CasVersion::V1 => "validate",
            CasVersion::V2 => "serviceValidate",
            CasVersion::V3 => "p3/serviceValidate",
        }
    }

    /// Whether validation responses can carry user attributes.
    pub fn releases_attributes(&self) -> bool {
        !matches!(self, CasVersion::V1)
    }

    /// Query parameter carrying the redirect target on logout.
    pub fn logout_redirect_param(&self) -> &'static str {
        match self {
            CasVersion::V1 => "url",
            CasVersion::V2 | CasVersion::V3 => "service",
        }
    }
}

impl FromStr for CasVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(CasVersion::V1),
            "2" => Ok(CasVersion::V2),
            "3" => Ok(CasVersion::V3),
            other => Err(format!("Unsupported CAS version: {}", other)),
        }
    }
}

impl fmt::Display for CasVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CasVersion::V1 => write!(f, "1"),
            CasVersion::V2 => write!(f, "2"),
            CasVersion::V3 => write!(f, "3"),
        }
    }
}

/// Case folding applied to the username returned by the CAS server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsernameCase {
    Lower,
    Upper,
}

impl UsernameCase {
    pub fn apply(&self, username: &str) -> String {
        match self {
            UsernameCase::Lower => username.to_lowercase(),
            UsernameCase::Upper => username.to_uppercase(),
        }
    }
}

impl FromStr for UsernameCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lower" => Ok(UsernameCase::Lower),
            "upper" => Ok(UsernameCase::Upper),
            other => Err(format!("Unsupported username case: {}", other)),
        }
    }
}

/// CAS attribute names used to build the user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeMapping {
    /// Attribute holding the user ID.
    #[serde(default = "default_user_id_attribute")]
    pub user_id: String,

    /// Attribute holding the display name.
    #[serde(default = "default_name_attribute")]
    pub name: String,

    /// Attribute holding the eligibility category.
    #[serde(default = "default_category_attribute")]
    pub category: String,
}

fn default_user_id_attribute() -> String {
    "uid".to_string()
}

fn default_name_attribute() -> String {
    "personName".to_string()
}

fn default_category_attribute() -> String {
    "tipoAcessoLogin".to_string()
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self {
            user_id: default_user_id_attribute(),
            name: default_name_attribute(),
            category: default_category_attribute(),
        }
    }
}

/// CAS adapter configuration.
///
/// Built once at startup and handed to the provider; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CasConfig {
    /// CAS server base URL. A path-only value (e.g. "/cas/") is completed
    /// with the scheme and host of the current request.
    #[serde(default)]
    pub server_url: Option<String>,

    /// CAS protocol version.
    #[serde(default = "default_version")]
    pub version: CasVersion,

    /// Attribute the CAS client uses as the principal identifier.
    #[serde(default = "default_username_attribute")]
    pub username_attribute: String,

    /// Extra query parameters merged into the login URL.
    #[serde(default)]
    pub extra_login_params: Option<BTreeMap<String, String>>,

    /// Force re-authentication at the CAS server.
    #[serde(default)]
    pub renew: bool,

    /// Proxy-granting ticket callback URL.
    #[serde(default)]
    pub proxy_callback: Option<String>,

    /// Never trust the Referer header as redirect target.
    #[serde(default)]
    pub ignore_referer: bool,

    /// Leave "next" tracking to the host instead of the service URL.
    #[serde(default)]
    pub store_next: bool,

    /// Fallback redirect target after login.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Query parameter carrying the post-login redirect target.
    #[serde(default = "default_redirect_field_name")]
    pub redirect_field_name: String,

    /// Whether first-time CAS logins provision a local account. Read by the
    /// host, which owns user persistence.
    #[serde(default = "default_true")]
    pub create_user: bool,

    /// End the CAS session on logout, not just the local one.
    #[serde(default = "default_true")]
    pub logout_completely: bool,

    /// Fixed host to return to after logout. When unset the host of the
    /// current request is used.
    #[serde(default)]
    pub logout_host: Option<String>,

    /// Case folding for the verified username.
    #[serde(default)]
    pub force_change_username_case: Option<UsernameCase>,

    /// Message shown after a successful login ("%s" is the username).
    #[serde(default = "default_login_msg")]
    pub login_msg: String,

    /// Message shown to an already logged-in user ("%s" is the username).
    #[serde(default = "default_logged_msg")]
    pub logged_msg: String,

    /// Whether the host sends the user back to the login page after a failed
    /// validation. Read by the host; the adapter never retries on its own.
    #[serde(default)]
    pub retry_login: bool,

    /// Attribute names used to build the user identity.
    #[serde(default)]
    pub attribute_mapping: AttributeMapping,

    /// Timeout for ticket validation requests in seconds.
    #[serde(default = "default_validate_timeout")]
    pub validate_timeout_secs: u64,
}

fn default_version() -> CasVersion {
    CasVersion::V2
}

fn default_username_attribute() -> String {
    "uid".to_string()
}

fn default_redirect_url() -> String {
    "/".to_string()
}

fn default_redirect_field_name() -> String {
    "next".to_string()
}

fn default_true() -> bool {
    true
}

fn default_login_msg() -> String {
    "Login succeeded. Welcome, %s.".to_string()
}

fn default_logged_msg() -> String {
    "You are logged in as %s.".to_string()
}

fn default_validate_timeout() -> u64 {
    10
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            version: default_version(),
            username_attribute: default_username_attribute(),
            extra_login_params: None,
            renew: false,
            proxy_callback: None,
            ignore_referer: false,
            store_next: false,
            redirect_url: default_redirect_url(),
            redirect_field_name: default_redirect_field_name(),
            create_user: true,
            logout_completely: true,
            logout_host: None,
            force_change_username_case: None,
            login_msg: default_login_msg(),
            logged_msg: default_logged_msg(),
            retry_login: false,
            attribute_mapping: AttributeMapping::default(),
            validate_timeout_secs: default_validate_timeout(),
        }
    }
}

impl CasConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let server_url = match self.server_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return Err("CAS server_url is required".to_string()),
        };

        // Path-only URLs are resolved per request
        if !server_url.starts_with('/') {
            let parsed = url::Url::parse(server_url)
                .map_err(|e| format!("CAS server_url '{}' is not a valid URL: {}", server_url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!(
                    "CAS server_url '{}' must use http or https",
                    server_url
                ));
            }
        }

        if self.redirect_field_name.is_empty() {
            return Err("redirect_field_name must not be empty".to_string());
        }

        if self.validate_timeout_secs == 0 {
            return Err("validate_timeout_secs must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Login success message for a user.
    pub fn welcome_message(&self, username: &str) -> String {
        self.login_msg.replace("%s", username)
    }

    /// Message for a user who is already logged in.
    pub fn logged_in_message(&self, username: &str) -> String {
        self.logged_msg.replace("%s", username)
    }
}

/// JSON configuration overlay, merged into a [`CasConfig`] at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CasConfigJson {
    pub server_url: Option<String>,
    pub version: Option<CasVersion>,
    pub username_attribute: Option<String>,
    #[serde(default)]
    pub extra_login_params: BTreeMap<String, String>,
    pub renew: Option<bool>,
    pub proxy_callback: Option<String>,
    pub ignore_referer: Option<bool>,
    pub store_next: Option<bool>,
    pub redirect_url: Option<String>,
    pub redirect_field_name: Option<String>,
    pub create_user: Option<bool>,
    pub logout_completely: Option<bool>,
    pub logout_host: Option<String>,
    pub force_change_username_case: Option<UsernameCase>,
    pub login_msg: Option<String>,
    pub logged_msg: Option<String>,
    pub retry_login: Option<bool>,
    pub attribute_mapping: Option<AttributeMapping>,
    pub validate_timeout_secs: Option<u64>,
}

impl CasConfigJson {
    /// Merge JSON config into existing config.
    pub fn apply_to(&self, config: &mut CasConfig) {
        if let Some(ref url) = self.server_url {
            config.server_url = Some(url.clone());
        }
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(ref attr) = self.username_attribute {
            config.username_attribute = attr.clone();
        }
        if !self.extra_login_params.is_empty() {
            config.extra_login_params = Some(self.extra_login_params.clone());
        }
        if let Some(renew) = self.renew {
            config.renew = renew;
        }
        if let Some(ref url) = self.proxy_callback {
            config.proxy_callback = Some(url.clone());
        }
        if let Some(ignore) = self.ignore_referer {
            config.ignore_referer = ignore;
        }
        if let Some(store) = self.store_next {
            config.store_next = store;
        }
        if let Some(ref url) = self.redirect_url {
            config.redirect_url = url.clone();
        }
        if let Some(ref name) = self.redirect_field_name {
            config.redirect_field_name = name.clone();
        }
        if let Some(create) = self.create_user {
            config.create_user = create;
        }
        if let Some(completely) = self.logout_completely {
            config.logout_completely = completely;
        }
        if let Some(ref host) = self.logout_host {
            config.logout_host = Some(host.clone());
        }
        if let Some(case) = self.force_change_username_case {
            config.force_change_username_case = Some(case);
        }
        if let Some(ref msg) = self.login_msg {
            config.login_msg = msg.clone();
        }
        if let Some(ref msg) = self.logged_msg {
            config.logged_msg = msg.clone();
        }
        if let Some(retry) = self.retry_login {
            config.retry_login = retry;
        }
        if let Some(ref mapping) = self.attribute_mapping {
            config.attribute_mapping = mapping.clone();
        }
        if let Some(timeout) = self.validate_timeout_secs {
            config.validate_timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CasConfig::default();
        assert_eq!(config.server_url, None);
        assert_eq!(config.version, CasVersion::V2);
        assert_eq!(config.username_attribute, "uid");
        assert_eq!(config.redirect_url, "/");
        assert_eq!(config.redirect_field_name, "next");
        assert!(config.create_user);
        assert!(config.logout_completely);
        assert!(!config.renew);
        assert!(!config.ignore_referer);
        assert!(!config.store_next);
        assert_eq!(config.attribute_mapping.category, "tipoAcessoLogin");
    }

    #[test]
    fn test_validation() {
        let mut config = CasConfig::default();
        assert!(config.validate().is_err()); // missing server_url

        config.server_url = Some("cas.example.com/cas".to_string());
        assert!(config.validate().is_err()); // not absolute

        config.server_url = Some("ftp://cas.example.com/cas/".to_string());
        assert!(config.validate().is_err()); // wrong scheme

        config.server_url = Some("https://cas.example.com/cas/".to_string());
        assert!(config.validate().is_ok());

        config.server_url = Some("/cas/".to_string());
        assert!(config.validate().is_ok()); // resolved per request

        config.validate_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("3".parse::<CasVersion>().unwrap(), CasVersion::V3);
        assert!("CAS_2_SAML_1_0".parse::<CasVersion>().is_err());
        assert_eq!(CasVersion::V3.validate_path(), "p3/serviceValidate");
        assert_eq!(CasVersion::V1.logout_redirect_param(), "url");
        assert!(!CasVersion::V1.releases_attributes());
        assert!(CasVersion::V2.releases_attributes());
        assert!(CasVersion::V3.releases_attributes());
    }

    #[test]
    fn test_messages() {
        let config = CasConfig::default();
        assert_eq!(
            config.welcome_message("alice"),
            "Login succeeded. Welcome, alice."
        );
        assert_eq!(config.logged_in_message("alice"), "You are logged in as alice.");
    }

    #[test]
    fn test_json_overlay() {
        let json = r#"{
            "server-url": "https://cas.example.com/cas/",
            "version": "3",
            "store-next": true,
            "extra-login-params": {"lang": "pt"},
            "force-change-username-case": "lower",
            "create-user": false,
            "retry-login": true
        }"#;
        let overlay: CasConfigJson = serde_json::from_str(json).unwrap();

        let mut config = CasConfig::default();
        overlay.apply_to(&mut config);

        assert_eq!(config.server_url.as_deref(), Some("https://cas.example.com/cas/"));
        assert_eq!(config.version, CasVersion::V3);
        assert!(config.store_next);
        assert_eq!(
            config.extra_login_params.unwrap().get("lang").map(String::as_str),
            Some("pt")
        );
        assert_eq!(config.force_change_username_case, Some(UsernameCase::Lower));
        assert!(!config.create_user);
        assert!(config.retry_login);
        // untouched fields keep their defaults
        assert_eq!(config.redirect_url, "/");
    }
}
