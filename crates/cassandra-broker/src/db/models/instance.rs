//! Instance model: one provisioned keyspace plus its login role.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::plan::Plan;

/// Catalog row as read from the `provision` table.
///
/// Rows written by older deployments carry free-form plan strings and a
/// textual `claimed` flag, so everything but the identity columns is
/// decoded leniently. Queries select `claimed::text`.
#[derive(Debug, Clone, FromRow)]
pub struct InstanceRow {
    pub name: String,
    pub plan: Option<String>,
    pub claimed: Option<String>,
    pub billingcode: Option<String>,
    pub username: String,
    pub password: String,
}

/// Text stored in the `claimed` column.
pub fn encode_claimed(claimed: bool) -> &'static str {
    if claimed {
        "yes"
    } else {
        "no"
    }
}

/// Accepts `yes`/`no` as well as the Postgres boolean spellings.
pub fn decode_claimed(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "t" | "1"
    )
}

/// A provisioned instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Instance {
    /// Keyspace name, unique across the catalog
    pub name: String,

    /// Plan name as recorded; may predate the current plan table
    pub plan: String,

    /// Login role created for this keyspace
    pub username: String,

    pub password: String,

    pub billing_code: String,

    pub claimed: bool,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("plan", &self.plan)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("billing_code", &self.billing_code)
            .field("claimed", &self.claimed)
            .finish()
    }
}

impl Instance {
    /// The recorded plan, if it is one this broker still offers.
    pub fn known_plan(&self) -> Option<Plan> {
        self.plan.parse().ok()
    }
}

impl From<InstanceRow> for Instance {
    fn from(row: InstanceRow) -> Self {
        Instance {
            name: row.name,
            plan: row.plan.unwrap_or_default(),
            username: row.username,
            password: row.password,
            billing_code: row.billingcode.unwrap_or_default(),
            claimed: row.claimed.as_deref().is_some_and(decode_claimed),
        }
    }
}

/// Instance as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceResponse {
    #[serde(rename = "CASSANDRA_KEYSPACE")]
    pub keyspace: String,

    /// Comma-joined cluster host list
    #[serde(rename = "CASSANDRA_LOCATION")]
    pub location: String,

    #[serde(rename = "CASSANDRA_PASSWORD")]
    pub password: String,

    #[serde(rename = "CASSANDRA_USERNAME")]
    pub username: String,
}

impl InstanceResponse {
    pub fn new(instance: &Instance, location: impl Into<String>) -> Self {
        Self {
            keyspace: instance.name.clone(),
            location: location.into(),
            password: instance.password.clone(),
            username: instance.username.clone(),
        }
    }
}

/// Body of `POST /v1/cassandra/instance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub plan: String,

    #[serde(default)]
    pub billingcode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plan: &str) -> InstanceRow {
        InstanceRow {
            name: "ks1".to_string(),
            plan: Some(plan.to_string()),
            claimed: Some("true".to_string()),
            billingcode: Some("ACME-1".to_string()),
            username: "uabc".to_string(),
            password: "pdef".to_string(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let instance = Instance::from(row("medium"));
        assert_eq!(instance.known_plan(), Some(Plan::Medium));
        assert_eq!(instance.billing_code, "ACME-1");
        assert!(instance.claimed);
    }

    #[test]
    fn test_row_with_unrecognized_plan_still_decodes() {
        let instance = Instance::from(row("xlarge"));
        assert_eq!(instance.plan, "xlarge");
        assert_eq!(instance.known_plan(), None);
        assert_eq!(instance.username, "uabc");
        assert_eq!(instance.password, "pdef");
    }

    #[test]
    fn test_legacy_row_decodes() {
        let legacy = InstanceRow {
            name: "ks2".to_string(),
            plan: Some(String::new()),
            claimed: Some("yes".to_string()),
            billingcode: None,
            username: "uold".to_string(),
            password: "pold".to_string(),
        };
        let instance = Instance::from(legacy);
        assert!(instance.claimed);
        assert_eq!(instance.plan, "");
        assert_eq!(instance.billing_code, "");

        let unset = InstanceRow {
            claimed: None,
            ..row("small")
        };
        assert!(!Instance::from(unset).claimed);
    }

    #[test]
    fn test_claimed_encoding() {
        assert_eq!(encode_claimed(true), "yes");
        assert!(decode_claimed(encode_claimed(true)));
        assert!(!decode_claimed(encode_claimed(false)));
        assert!(decode_claimed("TRUE"));
        assert!(!decode_claimed("f"));
    }

    #[test]
    fn test_response_field_names() {
        let instance = Instance::from(row("small"));
        let json = serde_json::to_value(InstanceResponse::new(&instance, "host1,host2")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "CASSANDRA_KEYSPACE": "ks1",
                "CASSANDRA_LOCATION": "host1,host2",
                "CASSANDRA_PASSWORD": "pdef",
                "CASSANDRA_USERNAME": "uabc"
            })
        );
    }

    #[test]
    fn test_request_without_billing_code() {
        let request: ProvisionRequest = serde_json::from_str(r#"{"plan":"large"}"#).unwrap();
        assert_eq!(request.plan, "large");
        assert_eq!(request.billingcode, "");
    }
}
