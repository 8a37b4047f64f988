// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A persistent integer identifier stored with the graph asset.
///
/// Ids are assigned by the model when an object is created and never reused within
/// one asset, so they survive save/reload. Zero is reserved as "unassigned".
pub struct Id<T> {
    value: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: u64) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn get(self) -> u64 {
        self.value
    }
}

// Manual impls: derives would put bounds on the phantom tag.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|_| IdError::NotAnInteger(s.to_owned()))?;
        Self::new(value)
    }
}

impl<T> TryFrom<u64> for Id<T> {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Zero,
    NotAnInteger(String),
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("id must not be zero"),
            Self::NotAnInteger(raw) => write!(f, "id must be a positive integer (got {raw:?})"),
        }
    }
}

impl std::error::Error for IdError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeIdTag {}
pub type NodeId = Id<NodeIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotIdTag {}
pub type SlotId = Id<SlotIdTag>;

#[cfg(test)]
mod tests {
    use super::{IdError, NodeId, SlotId};

    #[test]
    fn id_rejects_zero() {
        assert_eq!(NodeId::new(0), Err(IdError::Zero));
    }

    #[test]
    fn id_parses_trimmed_integers() {
        let id: NodeId = " 42 ".parse().expect("node id");
        assert_eq!(id.get(), 42);
        assert!(matches!("x1".parse::<SlotId>(), Err(IdError::NotAnInteger(_))));
    }

    #[test]
    fn id_serializes_as_plain_integer() {
        let id = NodeId::new(7).expect("node id");
        assert_eq!(serde_json::to_string(&id).expect("json"), "7");
        let back: NodeId = serde_json::from_str("7").expect("parse");
        assert_eq!(back, id);
        assert!(serde_json::from_str::<NodeId>("0").is_err());
    }
}
