//! Serde adapters rendering 256-bit integers as decimal strings.
//!
//! JSON numbers lose precision past 2^53, so every `U256` that leaves the agent
//! (HTTP bodies, logs on disk) goes through here.

use alloy_primitives::U256;
use serde::{de::Error, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    U256::from_str(&raw).map_err(D::Error::custom)
}

/// Same as the parent module, for `Option<U256>`
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| U256::from_str(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
