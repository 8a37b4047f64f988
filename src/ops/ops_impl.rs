// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Edit operations for `MutationController`.
/// Keeps `ops::mod` focused on the public types, strategies and errors.
impl MutationController {
    /// Creates a root node of `variant` at `position` and resyncs the session.
    pub fn add_node(
        &self,
        session: &mut GraphSession,
        position: Vec2,
        variant: &VariantDescriptor,
    ) -> Result<NodeHandle, MutationError> {
        let position = finite(position)?;
        let node_id = session
            .add_node(variant.template(), position)
            .map_err(|source| MutationError::CreationFailed {
                kind: variant.identifier().to_owned(),
                source,
            })?;
        session.sync_from_model();
        info!(node = %node_id, kind = variant.identifier(), %position, "added node");
        handle_for(session, node_id)
    }

    /// Creates a block of `variant` inside `context`, before its `index`-th block.
    pub fn add_block(
        &self,
        session: &mut GraphSession,
        context: NodeHandle,
        variant: &VariantDescriptor,
        index: Option<usize>,
    ) -> Result<NodeHandle, MutationError> {
        if variant.category() != NodeClass::Block {
            return Err(MutationError::WrongCategory {
                identifier: variant.identifier().to_owned(),
                expected: NodeClass::Block,
                found: variant.category(),
            });
        }
        if controller(session, context)?.class != NodeClass::Context {
            return Err(MutationError::NotAContext { id: context.id });
        }
        let node_id = session
            .add_block(context.id, variant.template(), index)
            .map_err(|source| MutationError::CreationFailed {
                kind: variant.identifier().to_owned(),
                source,
            })?;
        session.sync_from_model();
        info!(node = %node_id, context = %context.id, kind = variant.identifier(), "added block");
        handle_for(session, node_id)
    }

    /// Removes the node (and, for contexts, its blocks and every link touching them).
    pub fn remove_node(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
    ) -> Result<Removed, MutationError> {
        controller(session, handle)?;
        let id = handle.id;
        let outcome = run_strategies(&RemovalStrategy::ORDER, |strategy| {
            let attempt = match strategy {
                RemovalStrategy::SessionLevel => session.remove_node(id),
                RemovalStrategy::ModelParent => {
                    let owned = session.model().node(id).is_some_and(|node| node.parent.is_some());
                    if !owned {
                        return StrategyOutcome::NotApplicable;
                    }
                    session.remove_from_parent(id)
                }
            };
            match attempt {
                Ok(()) => StrategyOutcome::Applied,
                Err(err) => StrategyOutcome::Failed(err),
            }
        });
        match outcome {
            Ok(Some(strategy)) => {
                session.sync_from_model();
                info!(node = %id, %strategy, "removed node");
                Ok(Removed { id, strategy })
            }
            Ok(None) => Err(MutationError::Unsupported {
                id,
                operation: "remove",
                type_name: type_name_of(session, id),
            }),
            Err(source) => {
                warn!(node = %id, error = %source, "every removal strategy failed");
                Err(MutationError::RemovalFailed { id, source })
            }
        }
    }

    pub fn set_position(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        position: Vec2,
    ) -> Result<AttributeStrategy, MutationError> {
        self.write_attribute(session, handle, Attribute::Position, Value::Vec2(position))
    }

    pub fn toggle_enabled(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        enabled: bool,
    ) -> Result<AttributeStrategy, MutationError> {
        self.write_attribute(session, handle, Attribute::Enabled, Value::Bool(enabled))
    }

    pub fn rename(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        name: &str,
    ) -> Result<AttributeStrategy, MutationError> {
        self.write_attribute(session, handle, Attribute::Name, Value::Str(name.to_owned()))
    }

    /// Writes a declared setting through the host's named-setting mutator.
    pub fn set_setting(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        name: &str,
        value: Value,
    ) -> Result<(), MutationError> {
        controller(session, handle)?;
        let node = model_node(session, handle.id)?;
        if !self.capabilities(&node)?.configurable {
            return Err(MutationError::Unsupported {
                id: handle.id,
                operation: "set setting",
                type_name: node.type_name,
            });
        }
        let args = [Value::Str(name.to_owned()), value];
        session
            .edit_node(handle.id, |node| {
                self.resolver.invoke_method(node, SETTING_MUTATOR, &args)
            })?
            .map_err(|source| MutationError::AttributeFailed {
                id: handle.id,
                operation: "set setting",
                source,
            })?;
        debug!(node = %handle.id, setting = name, "set node setting");
        Ok(())
    }

    /// Re-creates the node's kind with its name, settings and enabled state.
    ///
    /// Root nodes land at `position`, or at the source's current position plus the
    /// configured offset. Blocks are inserted right after the source in the same context
    /// and ignore `position`. Duplicating a context also duplicates its blocks.
    pub fn duplicate_node(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        position: Option<Vec2>,
    ) -> Result<NodeHandle, MutationError> {
        controller(session, handle)?;
        let source = model_node(session, handle.id)?;
        let creation_failed = |err: SessionError| MutationError::CreationFailed {
            kind: source.kind.clone(),
            source: err,
        };

        let copy_id = match source.parent {
            Some(parent) => {
                let after = session
                    .model()
                    .children(parent)
                    .position(|child| child.id == source.id)
                    .map(|index| index + 1);
                session
                    .add_block(parent, template_of(&source), after)
                    .map_err(creation_failed)?
            }
            None => {
                let target = finite(
                    position.unwrap_or_else(|| source.position.offset(self.duplicate_offset)),
                )?;
                let copy_id = session
                    .add_node(template_of(&source), target)
                    .map_err(creation_failed)?;
                let blocks = session
                    .model()
                    .children(source.id)
                    .map(template_of)
                    .collect::<Vec<_>>();
                for block in blocks {
                    session
                        .add_block(copy_id, block, None)
                        .map_err(creation_failed)?;
                }
                copy_id
            }
        };

        session.sync_from_model();
        info!(source = %source.id, copy = %copy_id, kind = %source.kind, "duplicated node");
        handle_for(session, copy_id)
    }

    /// Links `from_port` on `from` to `to_port` on `to`; returns `false` when the link
    /// already existed. Ports match by name or path, ignoring case.
    pub fn connect(
        &self,
        session: &mut GraphSession,
        from: NodeHandle,
        from_port: &str,
        to: NodeHandle,
        to_port: &str,
    ) -> Result<bool, MutationError> {
        let output = port(session, from, from_port, SlotDirection::Output)?;
        let input = port(session, to, to_port, SlotDirection::Input)?;
        if input.value_type.accepts(Some(output.value_type)) == Assignability::Incompatible {
            return Err(MutationError::IncompatiblePorts {
                output: output.name,
                output_type: output.value_type.label(),
                input: input.name,
                input_type: input.value_type.label(),
            });
        }
        let created = session.create_link(output.slot, input.slot)?;
        session.sync_from_model();
        debug!(from = %from.id, to = %to.id, created, "connected ports");
        Ok(created)
    }

    /// Stores a constant on an unlinked input, coerced to the port's type.
    pub fn set_slot_value(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        port_name: &str,
        value: Value,
    ) -> Result<SlotValueChange, MutationError> {
        let input = port(session, handle, port_name, SlotDirection::Input)?;
        if session.model().is_linked_input(input.slot) {
            return Err(MutationError::PortLinked {
                id: handle.id,
                port: input.name,
            });
        }
        let found = value.value_type().map_or("null", ValueType::label);
        let value = value
            .coerce_to(input.value_type)
            .ok_or_else(|| MutationError::IncompatibleValue {
                port: input.name.clone(),
                expected: input.value_type.label(),
                found,
            })?;
        let previous = session.set_slot_value(input.slot, value.clone())?;
        session.sync_from_model();
        debug!(node = %handle.id, port = %input.name, %value, "set input value");
        Ok(SlotValueChange {
            port: input.name,
            previous,
            value,
        })
    }

    pub fn disconnect(
        &self,
        session: &mut GraphSession,
        from: NodeHandle,
        from_port: &str,
        to: NodeHandle,
        to_port: &str,
    ) -> Result<(), MutationError> {
        let output = port(session, from, from_port, SlotDirection::Output)?;
        let input = port(session, to, to_port, SlotDirection::Input)?;
        if !session.remove_link(output.slot, input.slot)? {
            return Err(MutationError::LinkNotFound {
                from: from.id,
                from_port: from_port.to_owned(),
                to: to.id,
                to_port: to_port.to_owned(),
            });
        }
        session.sync_from_model();
        debug!(from = %from.id, to = %to.id, "disconnected ports");
        Ok(())
    }

    /// Nudges `requested` along x past every root node closer than the overlap tolerance.
    pub fn place(&self, session: &GraphSession, requested: Vec2) -> Placement {
        let mut position = requested;
        for node in session.model().nodes().iter().filter(|node| node.parent.is_none()) {
            if node.position.distance(position) < self.overlap_tolerance {
                position = Vec2::new(position.x + self.overlap_tolerance + 1.0, position.y);
            }
        }
        let warning = (position != requested).then(|| {
            format!(
                "position {requested} overlaps an existing node; placed at {position} instead"
            )
        });
        Placement { position, warning }
    }

    /// Light-applies queued writes, resyncs, marks `resource` modified and saves it.
    ///
    /// Without pending changes this is a no-op and nothing is written. A rejected queued
    /// write does not stop the commit: the remaining changes are persisted and the
    /// rejection is returned afterwards.
    pub fn commit(
        &self,
        session: &mut GraphSession,
        resource: &mut GraphResource,
    ) -> Result<CommitOutcome, MutationError> {
        if !session.has_pending_changes() {
            debug!(path = %resource.path(), "nothing to commit");
            return Ok(CommitOutcome::Unchanged);
        }

        let applied = session.light_apply();
        if let Err(err) = &applied {
            warn!(path = %resource.path(), error = %err, "queued write rejected during commit");
        }
        session.sync_from_model();
        resource.apply_model(session.model().clone());
        self.store.save(resource)?;
        session.mark_committed();
        info!(
            path = %resource.path(),
            nodes = session.model().nodes().len(),
            links = session.model().links().len(),
            "committed graph"
        );

        Ok(CommitOutcome::Written { applied: applied? })
    }

    fn write_attribute(
        &self,
        session: &mut GraphSession,
        handle: NodeHandle,
        attribute: Attribute,
        value: Value,
    ) -> Result<AttributeStrategy, MutationError> {
        controller(session, handle)?;
        let node = model_node(session, handle.id)?;
        let access = attribute.access(&self.capabilities(&node)?);

        let outcome = run_strategies(&AttributeStrategy::ORDER, |strategy| match strategy {
            AttributeStrategy::DirectAttribute if access.attribute => {
                self.queue_direct(session, &node, attribute, value.clone())
            }
            AttributeStrategy::NamedSetting if access.setting => {
                self.invoke_setting(session, &node, attribute, value.clone())
            }
            _ => StrategyOutcome::NotApplicable,
        });

        match outcome {
            Ok(Some(strategy)) => {
                debug!(node = %handle.id, member = attribute.member(), %strategy, "wrote attribute");
                Ok(strategy)
            }
            Ok(None) => Err(MutationError::Unsupported {
                id: handle.id,
                operation: attribute.operation(),
                type_name: node.type_name,
            }),
            Err(source) => Err(MutationError::AttributeFailed {
                id: handle.id,
                operation: attribute.operation(),
                source,
            }),
        }
    }

    fn queue_direct(
        &self,
        session: &mut GraphSession,
        node: &ModelNode,
        attribute: Attribute,
        value: Value,
    ) -> StrategyOutcome<ReflectError> {
        let member = attribute.member();
        let setter = match self.resolver.member_setter(&node.type_name, member) {
            Ok(setter) => setter,
            Err(err) => return StrategyOutcome::Failed(err),
        };
        // Dry run on a copy; the queued write lands on the next light apply.
        let mut scratch = node.clone();
        if let Err(reason) = setter(&mut scratch, value.clone()) {
            return StrategyOutcome::Failed(ReflectError::InvocationFailure {
                type_name: node.type_name.clone(),
                method: format!("set {member}"),
                reason,
            });
        }
        session.queue_attribute_write(node.id, member, setter, value);
        StrategyOutcome::Applied
    }

    fn invoke_setting(
        &self,
        session: &mut GraphSession,
        node: &ModelNode,
        attribute: Attribute,
        value: Value,
    ) -> StrategyOutcome<ReflectError> {
        let args = [Value::Str(attribute.member().to_owned()), value];
        let invoked = session.edit_node(node.id, |node| {
            self.resolver.invoke_method(node, SETTING_MUTATOR, &args)
        });
        match invoked {
            Ok(Ok(_)) => StrategyOutcome::Applied,
            Ok(Err(err)) => StrategyOutcome::Failed(err),
            Err(err) => StrategyOutcome::Failed(ReflectError::InvocationFailure {
                type_name: node.type_name.clone(),
                method: SETTING_MUTATOR.to_owned(),
                reason: err.to_string(),
            }),
        }
    }

    /// Capabilities registered for the node's kind, or computed from its host type and
    /// settings when the kind is not in the catalog.
    fn capabilities(&self, node: &ModelNode) -> Result<Capabilities, MutationError> {
        if let Ok(variant) = self.registry.descriptor(&node.kind) {
            if variant.type_name() == node.type_name {
                return Ok(variant.capabilities());
            }
        }
        let ty = self.resolver.type_of(node)?;
        Ok(Capabilities::compute(&ty, |name| {
            node.settings.contains_key(name)
        }))
    }
}

fn finite(position: Vec2) -> Result<Vec2, MutationError> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(MutationError::InvalidPosition { position })
    }
}

fn controller(session: &GraphSession, handle: NodeHandle) -> Result<&NodeController, MutationError> {
    session
        .node(handle.slot)
        .filter(|node| node.id == handle.id)
        .ok_or(MutationError::StaleHandle { id: handle.id })
}

fn model_node(session: &GraphSession, id: NodeId) -> Result<ModelNode, MutationError> {
    session
        .model()
        .node(id)
        .cloned()
        .ok_or(MutationError::StaleHandle { id })
}

fn handle_for(session: &GraphSession, id: NodeId) -> Result<NodeHandle, MutationError> {
    session
        .nodes()
        .iter()
        .position(|node| node.id == id)
        .map(|slot| NodeHandle { id, slot })
        .ok_or(MutationError::StaleHandle { id })
}

fn type_name_of(session: &GraphSession, id: NodeId) -> String {
    session
        .model()
        .node(id)
        .map(|node| node.type_name.clone())
        .unwrap_or_default()
}

fn port(
    session: &GraphSession,
    handle: NodeHandle,
    name: &str,
    direction: SlotDirection,
) -> Result<PortController, MutationError> {
    let node = controller(session, handle)?;
    let ports = match direction {
        SlotDirection::Input => &node.inputs,
        SlotDirection::Output => &node.outputs,
    };
    let wanted = name.trim();
    ports
        .iter()
        .find(|port| port.name.eq_ignore_ascii_case(wanted) || port.path.eq_ignore_ascii_case(wanted))
        .cloned()
        .ok_or_else(|| MutationError::PortNotFound {
            id: handle.id,
            port: wanted.to_owned(),
            direction,
            available: ports.iter().map(|port| port.name.clone()).collect(),
        })
}

fn template_of(node: &ModelNode) -> NodeTemplate {
    let slots = |slots: &[ModelSlot]| {
        slots
            .iter()
            .map(|slot| {
                SlotTemplate::new(slot.name.clone(), slot.value_type)
                    .with_path(slot.path.clone())
                    .with_value(slot.value.clone())
            })
            .collect::<Vec<_>>()
    };
    NodeTemplate {
        kind: node.kind.clone(),
        type_name: node.type_name.clone(),
        class: node.class,
        name: node.name.clone(),
        enabled: node.enabled,
        settings: node.settings.clone(),
        inputs: slots(&node.inputs),
        outputs: slots(&node.outputs),
    }
}
