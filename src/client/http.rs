//! HTTP ticket validator speaking to the CAS validate endpoints.
//!
//! Versions 2 and 3 request the JSON response format; version 1 uses the
//! plain-text `yes`/`no` answer.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::validator::{TicketValidator, TicketVerification};
use super::CasClient;
use crate::attributes::{AttributeValue, CasAttributes};
use crate::config::CasVersion;
use crate::error::{CasError, ValidationError};

/// Ticket validator backed by a shared `reqwest` client.
pub struct HttpTicketValidator {
    http_client: reqwest::Client,
}

impl HttpTicketValidator {
    /// Create a validator whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CasError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CasError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl TicketValidator for HttpTicketValidator {
    async fn validate(
        &self,
        client: &CasClient,
        ticket: &str,
    ) -> Result<TicketVerification, ValidationError> {
        let url = client.validation_url(ticket)?;
        debug!(url = %url, "Validating CAS ticket");

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationError::MalformedResponse(format!(
                "CAS server returned HTTP {}",
                status
            )));
        }

        let body = response.text().await?;

        match client.version() {
            CasVersion::V1 => parse_v1_response(&body),
            CasVersion::V2 | CasVersion::V3 => parse_json_response(&body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    #[serde(rename = "serviceResponse")]
    service_response: ServiceResponse,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(rename = "authenticationSuccess")]
    success: Option<AuthenticationSuccess>,
    #[serde(rename = "authenticationFailure")]
    failure: Option<AuthenticationFailure>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationSuccess {
    user: String,
    #[serde(rename = "proxyGrantingTicket")]
    proxy_granting_ticket: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationFailure {
    code: String,
    #[serde(default)]
    description: String,
}

/// Parse a `serviceValidate` / `p3/serviceValidate` JSON body.
pub fn parse_json_response(body: &str) -> Result<TicketVerification, ValidationError> {
    let envelope: JsonEnvelope = serde_json::from_str(body)
        .map_err(|e| ValidationError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let response = envelope.service_response;

    if let Some(failure) = response.failure {
        return Err(ValidationError::rejected(
            failure.code,
            failure.description.trim(),
        ));
    }

    let success = response.success.ok_or_else(|| {
        ValidationError::MalformedResponse(
            "response holds neither authenticationSuccess nor authenticationFailure".to_string(),
        )
    })?;

    let attributes = success
        .attributes
        .into_iter()
        .filter_map(|(name, value)| attribute_value(value).map(|v| (name, v)))
        .collect::<CasAttributes>();

    Ok(TicketVerification {
        username: success.user,
        attributes,
        pgt_iou: success.proxy_granting_ticket,
    })
}

/// Parse a version 1 `validate` body ("yes\n<user>\n" or "no\n\n").
pub fn parse_v1_response(body: &str) -> Result<TicketVerification, ValidationError> {
    let mut lines = body.lines();

    match lines.next().map(str::trim) {
        Some("yes") => {
            let username = lines
                .next()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    ValidationError::MalformedResponse("missing username".to_string())
                })?;

            Ok(TicketVerification {
                username: username.to_string(),
                attributes: CasAttributes::new(),
                pgt_iou: None,
            })
        }
        Some("no") => Err(ValidationError::rejected(
            "INVALID_TICKET",
            "ticket not recognized",
        )),
        _ => Err(ValidationError::MalformedResponse(
            "expected 'yes' or 'no'".to_string(),
        )),
    }
}

fn attribute_value(value: Value) -> Option<AttributeValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(AttributeValue::Single(s)),
        Value::Array(items) => Some(AttributeValue::Multiple(
            items.into_iter().filter_map(scalar_to_string).collect(),
        )),
        other => scalar_to_string(other).map(AttributeValue::Single),
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "serviceResponse": {
                "authenticationSuccess": {
                    "user": "alice",
                    "proxyGrantingTicket": "PGTIOU-84678-8a9d",
                    "attributes": {
                        "uid": ["alice"],
                        "personName": "Alice A",
                        "tipoAcessoLogin": [2026],
                        "memberOf": ["staff", "voters"]
                    }
                }
            }
        }"#;

        let verification = parse_json_response(body).unwrap();
        assert_eq!(verification.username, "alice");
        assert_eq!(verification.pgt_iou.as_deref(), Some("PGTIOU-84678-8a9d"));
        assert_eq!(verification.attributes.get_single("uid"), Some("alice"));
        assert_eq!(verification.attributes.get_single("personName"), Some("Alice A"));
        assert_eq!(verification.attributes.get_single("tipoAcessoLogin"), Some("2026"));
        assert_eq!(
            verification.attributes.get("memberOf").unwrap().values(),
            vec!["staff", "voters"]
        );
    }

    #[test]
    fn test_parse_failure() {
        let body = r#"{
            "serviceResponse": {
                "authenticationFailure": {
                    "code": "INVALID_TICKET",
                    "description": "Ticket ST-1856339-aA5Yuvrxzpv8Tau1cYQ7 not recognized"
                }
            }
        }"#;

        match parse_json_response(body) {
            Err(ValidationError::TicketRejected { code, description }) => {
                assert_eq!(code, "INVALID_TICKET");
                assert!(description.contains("not recognized"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_json_response("<cas:serviceResponse/>"),
            Err(ValidationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_json_response(r#"{"serviceResponse": {}}"#),
            Err(ValidationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_v1() {
        let verification = parse_v1_response("yes\nalice\n").unwrap();
        assert_eq!(verification.username, "alice");
        assert!(verification.attributes.is_empty());

        assert!(matches!(
            parse_v1_response("no\n\n"),
            Err(ValidationError::TicketRejected { .. })
        ));
        assert!(matches!(
            parse_v1_response("maybe"),
            Err(ValidationError::MalformedResponse(_))
        ));
    }
}
