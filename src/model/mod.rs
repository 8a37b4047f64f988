// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Host graph model: the persisted document, the per-request resource, and the editable
//! session built on top of it.

pub mod graph;
pub mod ids;
pub mod resource;
pub mod session;
pub mod value;

pub use graph::{
    GraphModel, ModelError, ModelLink, ModelNode, ModelSlot, NodeClass, NodeTemplate,
    SlotDirection, SlotTemplate, GRAPH_FORMAT_VERSION,
};
pub use ids::{Id, IdError, NodeId, SlotId};
pub use resource::{AssetPath, AssetPathError, GraphResource, GRAPH_ASSET_EXTENSION};
pub use session::{
    Anchor, AttributeSetter, EdgeController, GraphSession, NodeController, PortController,
    SessionError,
};
pub use value::{Assignability, Value, ValueType, Vec2};
