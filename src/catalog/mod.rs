// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Catalog of creatable node kinds.

use std::collections::BTreeMap;

use serde::Serialize;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::model::{NodeClass, NodeTemplate, SlotTemplate, Value};
use crate::reflect::{TypeDescriptor, SETTING_MUTATOR};

mod builtin;
mod registry;

pub use builtin::builtin_variants;
pub use registry::{CatalogError, VariantRegistry};

/// Builds the node template for a validated variant.
pub type VariantFactory = fn(&VariantDescriptor) -> NodeTemplate;

/// A node kind as declared, before it is validated against the host types.
#[derive(Debug, Clone)]
pub struct VariantSpec {
    pub identifier: SmolStr,
    pub display_name: SmolStr,
    pub synonyms: SmallVec<[SmolStr; 4]>,
    pub category: NodeClass,
    pub type_candidates: SmallVec<[SmolStr; 2]>,
    pub settings: Vec<(SmolStr, Value)>,
    pub inputs: Vec<SlotTemplate>,
    pub outputs: Vec<SlotTemplate>,
    pub factory: VariantFactory,
}

impl VariantSpec {
    pub fn new(
        identifier: &str,
        display_name: &str,
        category: NodeClass,
        type_candidates: &[&str],
    ) -> Self {
        Self {
            identifier: SmolStr::new(identifier),
            display_name: SmolStr::new(display_name),
            synonyms: SmallVec::new(),
            category,
            type_candidates: type_candidates.iter().copied().map(SmolStr::new).collect(),
            settings: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            factory: standard_template,
        }
    }

    pub fn synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms.extend(synonyms.iter().copied().map(SmolStr::new));
        self
    }

    pub fn setting(mut self, name: &str, value: Value) -> Self {
        self.settings.push((SmolStr::new(name), value));
        self
    }

    pub fn input(mut self, slot: SlotTemplate) -> Self {
        self.inputs.push(slot);
        self
    }

    pub fn output(mut self, slot: SlotTemplate) -> Self {
        self.outputs.push(slot);
        self
    }

    pub fn factory(mut self, factory: VariantFactory) -> Self {
        self.factory = factory;
        self
    }

    fn declares_setting(&self, name: &str) -> bool {
        self.settings.iter().any(|(setting, _)| setting == name)
    }
}

/// How a node capability can be exercised on the host type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Access {
    /// A public settable member with the capability's name.
    pub attribute: bool,
    /// The generic setting mutator plus a declared setting with the capability's name.
    pub setting: bool,
}

impl Access {
    pub fn is_supported(self) -> bool {
        self.attribute || self.setting
    }
}

/// Capabilities computed once when a variant is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub positionable: Access,
    pub enableable: Access,
    pub nameable: Access,
    pub configurable: bool,
}

impl Capabilities {
    /// `declares_setting` reports whether the node kind carries a setting of that name.
    pub fn compute(ty: &TypeDescriptor, declares_setting: impl Fn(&str) -> bool) -> Self {
        let configurable = ty.has_method(SETTING_MUTATOR);
        let access = |name: &str| Access {
            attribute: ty.has_settable_member(name),
            setting: configurable && declares_setting(name),
        };
        Self {
            positionable: access("position"),
            enableable: access("enabled"),
            nameable: access("name"),
            configurable,
        }
    }
}

/// A registered, validated node kind.
#[derive(Debug, Clone)]
pub struct VariantDescriptor {
    spec: VariantSpec,
    type_name: SmolStr,
    capabilities: Capabilities,
}

impl VariantDescriptor {
    pub(crate) fn new(spec: VariantSpec, ty: &TypeDescriptor) -> Self {
        let capabilities = Capabilities::compute(ty, |name| spec.declares_setting(name));
        Self {
            spec,
            type_name: SmolStr::new(ty.qualified_name()),
            capabilities,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.spec.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    pub fn synonyms(&self) -> &[SmolStr] {
        &self.spec.synonyms
    }

    pub fn category(&self) -> NodeClass {
        self.spec.category
    }

    /// Qualified name of the host type this variant resolved to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn spec(&self) -> &VariantSpec {
        &self.spec
    }

    pub fn template(&self) -> NodeTemplate {
        (self.spec.factory)(self)
    }

    /// Case-insensitive match against identifier, display name, `category/display name`
    /// and synonyms. `needle` must already be lowercase.
    fn matches_loosely(&self, needle: &str) -> bool {
        self.match_keys().any(|key| key.to_lowercase() == needle)
    }

    fn match_keys(&self) -> impl Iterator<Item = String> + '_ {
        [
            self.spec.identifier.to_string(),
            self.spec.display_name.to_string(),
            format!("{}/{}", self.spec.category, self.spec.display_name),
        ]
        .into_iter()
        .chain(self.spec.synonyms.iter().map(ToString::to_string))
    }
}

fn standard_template(descriptor: &VariantDescriptor) -> NodeTemplate {
    let spec = descriptor.spec();
    NodeTemplate {
        kind: spec.identifier.to_string(),
        type_name: descriptor.type_name().to_owned(),
        class: spec.category,
        name: spec.display_name.to_string(),
        enabled: true,
        settings: spec
            .settings
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>(),
        inputs: spec.inputs.clone(),
        outputs: spec.outputs.clone(),
    }
}
