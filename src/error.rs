// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Caller-facing error taxonomy.
//!
//! Every component keeps its own error type; they are folded into [`AdapterError`] at the
//! tool boundary, keeping the component's message.

use serde::Serialize;

use crate::access::AccessError;
use crate::catalog::CatalogError;
use crate::identity::IdentityError;
use crate::model::{AssetPathError, SessionError};
use crate::ops::MutationError;
use crate::reflect::ReflectError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterError {
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    AmbiguousMatch {
        message: String,
        candidates: Vec<String>,
    },
    #[error("{message}")]
    UnsupportedOperation { message: String },
    #[error("{message}")]
    InvocationFailure { message: String },
    #[error("{message}")]
    ValidationError { message: String },
}

impl AdapterError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AmbiguousMatch { .. } => "ambiguous_match",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::InvocationFailure { .. } => "invocation_failure",
            Self::ValidationError { .. } => "validation_error",
        }
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::NotFound {
            message: message.to_string(),
        }
    }

    pub fn unsupported(message: impl ToString) -> Self {
        Self::UnsupportedOperation {
            message: message.to_string(),
        }
    }

    pub fn invocation(message: impl ToString) -> Self {
        Self::InvocationFailure {
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl ToString) -> Self {
        Self::ValidationError {
            message: message.to_string(),
        }
    }
}

impl From<ReflectError> for AdapterError {
    fn from(err: ReflectError) -> Self {
        match &err {
            ReflectError::TypeNotFound { .. } => Self::not_found(err),
            ReflectError::MemberMissing { .. }
            | ReflectError::ReadOnlyMember { .. }
            | ReflectError::MethodMissing { .. } => Self::unsupported(err),
            ReflectError::NoMatchingOverload { .. } => Self::validation(err),
            ReflectError::AmbiguousOverload { .. } | ReflectError::InvocationFailure { .. } => {
                Self::invocation(err)
            }
        }
    }
}

impl From<CatalogError> for AdapterError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::NotFound { .. } => Self::not_found(err),
            CatalogError::AmbiguousMatch { candidates, .. } => Self::AmbiguousMatch {
                message: err.to_string(),
                candidates: candidates.clone(),
            },
            CatalogError::EmptyIdentifier | CatalogError::DuplicateIdentifier { .. } => {
                Self::validation(err)
            }
            CatalogError::InvalidVariant { .. } => Self::invocation(err),
        }
    }
}

impl From<IdentityError> for AdapterError {
    fn from(err: IdentityError) -> Self {
        Self::not_found(err)
    }
}

impl From<AssetPathError> for AdapterError {
    fn from(err: AssetPathError) -> Self {
        Self::validation(err)
    }
}

impl From<StoreError> for AdapterError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => Self::not_found(err),
            StoreError::PathOutsideRoot { .. } => Self::validation(err),
            StoreError::Io { .. } | StoreError::Json { .. } | StoreError::SymlinkRefused { .. } => {
                Self::invocation(err)
            }
        }
    }
}

impl From<AccessError> for AdapterError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Store(store) => store.into(),
            AccessError::NotAGraphAsset { .. } | AccessError::ResourceNotFound { .. } => {
                Self::not_found(err)
            }
            AccessError::InvalidPath(_) | AccessError::AlreadyExists { .. } => {
                Self::validation(err)
            }
            AccessError::SessionUnavailable { .. } => Self::invocation(err),
        }
    }
}

impl From<SessionError> for AdapterError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::NodeNotFound { .. } | SessionError::SlotNotFound { .. } => {
                Self::not_found(err)
            }
            SessionError::NotRemovable { .. } => Self::unsupported(err),
            SessionError::WrongDirection { .. } | SessionError::Model(_) => Self::validation(err),
            SessionError::Unavailable(_) | SessionError::AttributeRejected { .. } => {
                Self::invocation(err)
            }
        }
    }
}

impl From<MutationError> for AdapterError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Reflect(source) => source.into(),
            MutationError::Session(source) => source.into(),
            MutationError::Store(source) => source.into(),
            MutationError::StaleHandle { .. }
            | MutationError::PortNotFound { .. }
            | MutationError::LinkNotFound { .. } => Self::not_found(err),
            MutationError::Unsupported { .. } => Self::unsupported(err),
            MutationError::WrongCategory { .. }
            | MutationError::NotAContext { .. }
            | MutationError::InvalidPosition { .. }
            | MutationError::PortLinked { .. }
            | MutationError::IncompatibleValue { .. }
            | MutationError::IncompatiblePorts { .. } => Self::validation(err),
            MutationError::AttributeFailed {
                source: ReflectError::NoMatchingOverload { .. },
                ..
            } => Self::validation(err),
            MutationError::AttributeFailed { .. }
            | MutationError::CreationFailed { .. }
            | MutationError::RemovalFailed { .. } => Self::invocation(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::model::{AssetPath, NodeId};

    fn node(raw: u64) -> NodeId {
        NodeId::new(raw).expect("node id")
    }

    #[test]
    fn ambiguous_matches_keep_their_candidates() {
        let err: AdapterError = CatalogError::AmbiguousMatch {
            input: "vector2".to_owned(),
            candidates: vec!["operator.inline_vector2".to_owned(), "parameter.vector2".to_owned()],
        }
        .into();
        let AdapterError::AmbiguousMatch { candidates, message } = &err else {
            panic!("expected ambiguous match, got {err:?}");
        };
        assert_eq!(candidates.len(), 2);
        assert!(message.contains("vector2"));

        let json = serde_json::to_value(&err).expect("json");
        assert_eq!(json["kind"], "ambiguous_match");
    }

    #[rstest]
    #[case(MutationError::StaleHandle { id: node(4) }, "not_found")]
    #[case(
        MutationError::Unsupported { id: node(4), operation: "set position", type_name: "T".to_owned() },
        "unsupported_operation"
    )]
    #[case(
        MutationError::NotAContext { id: node(4) },
        "validation_error"
    )]
    #[case(
        MutationError::PortLinked { id: node(4), port: "A".to_owned() },
        "validation_error"
    )]
    #[case(
        MutationError::AttributeFailed {
            id: node(4),
            operation: "set setting",
            source: ReflectError::InvocationFailure {
                type_name: "T".to_owned(),
                method: "set_setting".to_owned(),
                reason: "unknown setting".to_owned(),
            },
        },
        "invocation_failure"
    )]
    #[case(
        MutationError::Session(SessionError::NodeNotFound { node_id: node(9) }),
        "not_found"
    )]
    fn mutation_errors_map_onto_the_taxonomy(#[case] err: MutationError, #[case] kind: &str) {
        let message = err.to_string();
        let mapped = AdapterError::from(err);
        assert_eq!(mapped.kind(), kind);
        assert_eq!(mapped.to_string(), message);
    }

    #[test]
    fn access_errors_unwrap_store_failures() {
        let path = AssetPath::parse("Gone.vfx").expect("path");
        let err: AdapterError = AccessError::Store(StoreError::NotFound { path }).into();
        assert_eq!(err.kind(), "not_found");

        let err: AdapterError =
            AccessError::InvalidPath(AssetPathError::NotRelative("/abs.vfx".to_owned())).into();
        assert_eq!(err.kind(), "validation_error");
    }
}
