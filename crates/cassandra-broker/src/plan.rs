//! Plan catalog: fixed replication settings offered to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::BrokerError;

/// Replication strategy used by every plan.
pub const STRATEGY: &str = "SimpleStrategy";

/// A named replication configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Small,
    Medium,
    Large,
}

/// Replication parameters a plan resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replication {
    pub strategy: &'static str,
    pub replication_factor: u32,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Small, Plan::Medium, Plan::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Small => "small",
            Plan::Medium => "medium",
            Plan::Large => "large",
        }
    }

    pub fn resolve(&self) -> Replication {
        let replication_factor = match self {
            Plan::Small => 1,
            Plan::Medium => 2,
            Plan::Large => 3,
        };
        Replication {
            strategy: STRATEGY,
            replication_factor,
        }
    }

    /// Human-readable summary shown by the plans endpoint.
    pub fn description(&self) -> &'static str {
        match self {
            Plan::Small => "1 replica, SimpleStrategy",
            Plan::Medium => "2 replicas, SimpleStrategy",
            Plan::Large => "3 replicas, SimpleStrategy",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Plan::Small),
            "medium" => Ok(Plan::Medium),
            "large" => Ok(Plan::Large),
            _ => Err(BrokerError::Validation(format!(
                "unknown plan '{}', expected one of: small, medium, large",
                s
            ))),
        }
    }
}

/// Plan name to description, as served by `GET /v1/cassandra/plans`.
pub fn catalog() -> BTreeMap<&'static str, &'static str> {
    Plan::ALL
        .iter()
        .map(|p| (p.as_str(), p.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_factors() {
        assert_eq!(Plan::Small.resolve().replication_factor, 1);
        assert_eq!(Plan::Medium.resolve().replication_factor, 2);
        assert_eq!(Plan::Large.resolve().replication_factor, 3);
        for plan in Plan::ALL {
            assert_eq!(plan.resolve().strategy, "SimpleStrategy");
        }
    }

    #[test]
    fn test_parse_round_trips_names() {
        for plan in Plan::ALL {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
    }

    #[test]
    fn test_unknown_plan_rejected() {
        let err = "huge".parse::<Plan>().unwrap_err();
        assert!(matches!(err, BrokerError::Validation(_)));
        assert!("Small".parse::<Plan>().is_err());
        assert!("".parse::<Plan>().is_err());
    }

    #[test]
    fn test_catalog_listing() {
        let listing = catalog();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing["small"], "1 replica, SimpleStrategy");
        assert_eq!(listing["medium"], "2 replicas, SimpleStrategy");
        assert_eq!(listing["large"], "3 replicas, SimpleStrategy");
    }
}
