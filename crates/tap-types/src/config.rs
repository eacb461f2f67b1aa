//! Configuration values for escrow deployments.
//!
//! Deployment addresses and key material often live outside the configuration file.
//! The [`LiteralOrEnv`] wrapper lets any `FromStr` value be written either literally
//! or as a reference to an environment variable:
//!
//! ```json
//! {
//!   "token": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
//!   "staking": "$STAKING_ADDRESS",
//!   "verifier": "${VERIFIER_ADDRESS}"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Accepted forms are a literal (`"0xabc..."`), `"$NAME"` and `"${NAME}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Returns the variable name if `s` is written as `$NAME` or `${NAME}`.
fn env_reference(s: &str) -> Option<&str> {
    if let Some(braced) = s.strip_prefix("${") {
        return braced.strip_suffix('}').filter(|name| !name.is_empty());
    }
    let name = s.strip_prefix('$')?;
    let is_identifier = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_identifier.then_some(name)
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let resolved = match env_reference(&raw) {
            Some(name) => std::env::var(name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{name}' not found (referenced as '{raw}')"
                ))
            })?,
            None => raw,
        };
        let parsed = resolved
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {e}")))?;
        Ok(LiteralOrEnv(parsed))
    }
}

impl<T: Serialize> Serialize for LiteralOrEnv<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, address};

    #[test]
    fn test_env_reference_forms() {
        assert_eq!(env_reference("$FOO_BAR"), Some("FOO_BAR"));
        assert_eq!(env_reference("${FOO_BAR}"), Some("FOO_BAR"));
        assert_eq!(env_reference("${}"), None);
        assert_eq!(env_reference("$"), None);
        assert_eq!(env_reference("$FOO-BAR"), None);
        assert_eq!(env_reference("0x1234"), None);
    }

    #[test]
    fn test_literal_address() {
        let json = "\"0x5FbDB2315678afecb367f032d93F642f64180aa3\"";
        let value: LiteralOrEnv<Address> = serde_json::from_str(json).unwrap();
        assert_eq!(
            *value,
            address!("0x5FbDB2315678afecb367f032d93F642f64180aa3")
        );
    }

    #[test]
    fn test_missing_env_variable() {
        let json = "\"$TAP_TYPES_TEST_SURELY_UNSET_VARIABLE\"";
        let err = serde_json::from_str::<LiteralOrEnv<Address>>(json).unwrap_err();
        assert!(err.to_string().contains("TAP_TYPES_TEST_SURELY_UNSET_VARIABLE"));
    }

    #[test]
    fn test_unparseable_literal() {
        let err = serde_json::from_str::<LiteralOrEnv<u64>>("\"ten\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse value"));
    }
}
