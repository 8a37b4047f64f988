// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! vfxgraph: an editing adapter for visual-effects node graphs.
//!
//! Requests resolve a graph asset into an editable [`model::GraphSession`], locate nodes
//! through [`identity::IdentityMap`] and node kinds through
//! [`catalog::VariantRegistry`], edit through [`ops::MutationController`] and persist
//! with its commit protocol. [`snapshot`] exports a read-only view. The [`tools`]
//! layer wraps all of it into caller-facing responses served by [`mcp`].

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod reflect;
pub mod snapshot;
pub mod store;
pub mod tools;
