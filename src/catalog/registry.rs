// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::model::NodeClass;
use crate::reflect::{ReflectError, TypeResolver};

use super::builtin::builtin_variants;
use super::{VariantDescriptor, VariantSpec};

const MAX_SUGGESTIONS: usize = 5;
const SUGGESTION_CUTOFF: f64 = 0.6;

pub type VariantList = Arc<[Arc<VariantDescriptor>]>;

type VariantSource = Box<dyn Fn(NodeClass) -> Vec<VariantSpec> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("variant {identifier} cannot be registered: {source}")]
    InvalidVariant {
        identifier: String,
        source: ReflectError,
    },
    #[error("variant identifier {identifier} is registered twice")]
    DuplicateIdentifier { identifier: String },
    #[error("node kind identifier must not be empty")]
    EmptyIdentifier,
    #[error("{}", not_found_message(.input, .suggestions))]
    NotFound {
        input: String,
        suggestions: Vec<String>,
    },
    #[error("{input:?} matches several node kinds: {}", .candidates.join(", "))]
    AmbiguousMatch {
        input: String,
        candidates: Vec<String>,
    },
}

fn not_found_message(input: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        format!("no node kind matches {input:?}")
    } else {
        format!(
            "no node kind matches {input:?}; did you mean: {}",
            suggestions.join(", ")
        )
    }
}

fn category_index(category: NodeClass) -> usize {
    match category {
        NodeClass::Context => 0,
        NodeClass::Operator => 1,
        NodeClass::Block => 2,
        NodeClass::Parameter => 3,
    }
}

/// Catalog of creatable node kinds, validated against the host types.
///
/// Each category is built on first use and kept for the registry's lifetime.
pub struct VariantRegistry {
    resolver: Arc<TypeResolver>,
    source: VariantSource,
    lists: [OnceLock<Result<VariantList, CatalogError>>; 4],
    builds: AtomicUsize,
}

impl VariantRegistry {
    pub fn builtin(resolver: Arc<TypeResolver>) -> Self {
        Self::with_source(resolver, builtin_variants)
    }

    pub fn with_source<F>(resolver: Arc<TypeResolver>, source: F) -> Self
    where
        F: Fn(NodeClass) -> Vec<VariantSpec> + Send + Sync + 'static,
    {
        Self {
            resolver,
            source: Box::new(source),
            lists: std::array::from_fn(|_| OnceLock::new()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Registry over a fixed list, grouped by each variant's category.
    pub fn from_specs(resolver: Arc<TypeResolver>, specs: Vec<VariantSpec>) -> Self {
        Self::with_source(resolver, move |category| {
            specs
                .iter()
                .filter(|spec| spec.category == category)
                .cloned()
                .collect()
        })
    }

    pub fn resolver(&self) -> &Arc<TypeResolver> {
        &self.resolver
    }

    /// How many categories have been built so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn list_kinds(&self, category: NodeClass) -> Result<VariantList, CatalogError> {
        self.lists[category_index(category)]
            .get_or_init(|| self.build(category))
            .clone()
    }

    /// Builds every category and returns the total number of kinds.
    pub fn validate_all(&self) -> Result<usize, CatalogError> {
        let mut total = 0;
        let mut seen = BTreeSet::new();
        for category in NodeClass::ALL {
            for descriptor in self.list_kinds(category)?.iter() {
                if !seen.insert(descriptor.identifier().to_lowercase()) {
                    return Err(CatalogError::DuplicateIdentifier {
                        identifier: descriptor.identifier().to_owned(),
                    });
                }
                total += 1;
            }
        }
        Ok(total)
    }

    /// Resolves free text to exactly one kind.
    ///
    /// All loose matches are collected in catalog order. Several matches are narrowed to
    /// the ones whose identifier equals the input; if that does not leave exactly one the
    /// match is ambiguous and every loose candidate is reported.
    pub fn match_variant(&self, identifier: &str) -> Result<Arc<VariantDescriptor>, CatalogError> {
        let input = identifier.trim();
        if input.is_empty() {
            return Err(CatalogError::EmptyIdentifier);
        }
        let needle = input.to_lowercase();

        let mut loose = Vec::new();
        for category in NodeClass::ALL {
            for descriptor in self.list_kinds(category)?.iter() {
                if descriptor.matches_loosely(&needle) {
                    loose.push(Arc::clone(descriptor));
                }
            }
        }

        if let [only] = loose.as_slice() {
            debug!(input, identifier = only.identifier(), "matched node kind");
            return Ok(Arc::clone(only));
        }

        if loose.is_empty() {
            return Err(CatalogError::NotFound {
                input: input.to_owned(),
                suggestions: self.suggestions(&needle)?,
            });
        }

        let exact = loose
            .iter()
            .filter(|descriptor| descriptor.identifier().to_lowercase() == needle)
            .collect::<Vec<_>>();
        if let [only] = exact.as_slice() {
            debug!(input, identifier = only.identifier(), "narrowed to exact identifier");
            return Ok(Arc::clone(*only));
        }

        Err(CatalogError::AmbiguousMatch {
            input: input.to_owned(),
            candidates: loose
                .iter()
                .map(|descriptor| descriptor.identifier().to_owned())
                .collect(),
        })
    }

    /// Exact, case-insensitive lookup by unique identifier.
    pub fn descriptor(&self, identifier: &str) -> Result<Arc<VariantDescriptor>, CatalogError> {
        let needle = identifier.trim().to_lowercase();
        for category in NodeClass::ALL {
            if let Some(found) = self
                .list_kinds(category)?
                .iter()
                .find(|descriptor| descriptor.identifier().to_lowercase() == needle)
            {
                return Ok(Arc::clone(found));
            }
        }
        Err(CatalogError::NotFound {
            input: identifier.trim().to_owned(),
            suggestions: self.suggestions(&needle)?,
        })
    }

    fn build(&self, category: NodeClass) -> Result<VariantList, CatalogError> {
        self.builds.fetch_add(1, Ordering::Relaxed);
        let descriptors = (self.source)(category)
            .into_iter()
            .map(|spec| {
                let ty = self
                    .resolver
                    .resolve_type(spec.type_candidates.as_slice())
                    .map_err(|source| CatalogError::InvalidVariant {
                        identifier: spec.identifier.to_string(),
                        source,
                    })?;
                Ok::<_, CatalogError>(Arc::new(VariantDescriptor::new(spec, &ty)))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        info!(%category, kinds = descriptors.len(), "built node catalog");
        Ok(descriptors.into())
    }

    fn suggestions(&self, needle: &str) -> Result<Vec<String>, CatalogError> {
        let mut scored = Vec::new();
        for category in NodeClass::ALL {
            for descriptor in self.list_kinds(category)?.iter() {
                let best = descriptor
                    .match_keys()
                    .map(|key| rapidfuzz::fuzz::ratio(needle.chars(), key.to_lowercase().chars()))
                    .fold(0.0_f64, f64::max);
                if best >= SUGGESTION_CUTOFF {
                    scored.push((best, descriptor.identifier().to_owned()));
                }
            }
        }
        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, identifier)| identifier)
            .collect())
    }
}
