//! Identifier and credential generation.
//!
//! Every generated value is a fixed ASCII prefix followed by the full
//! 128-bit random UUID in its 32-character hex form, so the output is
//! always a valid unquoted CQL identifier.

use uuid::Uuid;

use crate::cluster::ClusterError;

/// Longest identifier the cluster accepts for keyspace and role names.
pub const MAX_IDENTIFIER_LEN: usize = 48;

/// Hex characters contributed by the random part of a generated value.
pub const RANDOM_PART_LEN: usize = 32;

/// Longest keyspace prefix that still fits within `MAX_IDENTIFIER_LEN`.
pub const MAX_PREFIX_LEN: usize = MAX_IDENTIFIER_LEN - RANDOM_PART_LEN;

const USERNAME_PREFIX: &str = "u";
const PASSWORD_PREFIX: &str = "p";

/// Credentials generated for one provisioning attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedCredentials {
    pub keyspace: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for GeneratedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedCredentials")
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Produces instance names, usernames and passwords.
#[derive(Debug, Clone)]
pub struct Generator {
    name_prefix: String,
}

impl Generator {
    /// Create a generator that prepends `name_prefix` to keyspace names.
    ///
    /// The prefix is expected to be validated by `AppConfig::validate`.
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
        }
    }

    pub fn new_instance_name(&self) -> String {
        format!("{}{}", self.name_prefix, random_part())
    }

    pub fn new_username(&self) -> String {
        format!("{}{}", USERNAME_PREFIX, random_part())
    }

    pub fn new_password(&self) -> String {
        format!("{}{}", PASSWORD_PREFIX, random_part())
    }

    /// Draw a fresh keyspace, username and password.
    pub fn generate(&self) -> GeneratedCredentials {
        GeneratedCredentials {
            keyspace: self.new_instance_name(),
            username: self.new_username(),
            password: self.new_password(),
        }
    }
}

/// 32 lowercase hex characters from a v4 UUID.
fn random_part() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Check that `value` can be spliced into an administrative statement.
///
/// Accepts an ASCII letter followed by ASCII letters, digits or `_`,
/// at most `MAX_IDENTIFIER_LEN` characters. Everything else is refused,
/// since the cluster does not accept bind markers in DDL.
pub fn validate_identifier(value: &str) -> Result<&str, ClusterError> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid || value.len() > MAX_IDENTIFIER_LEN {
        return Err(ClusterError::InvalidIdentifier(value.to_string()));
    }
    Ok(value)
}
