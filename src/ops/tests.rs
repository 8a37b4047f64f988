// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rstest::{fixture, rstest};

use crate::access::ResourceAccessor;
use crate::catalog::{VariantDescriptor, VariantRegistry};
use crate::identity::{IdentityMap, NodeHandle};
use crate::model::{GraphResource, GraphSession, NodeClass, Value, Vec2};
use crate::reflect::{builtin_modules, TypeResolver};
use crate::store::MemoryStore;

use super::{
    run_strategies, AttributeStrategy, CommitOutcome, MutationController, MutationError,
    RemovalStrategy, StrategyOutcome,
};

const ASSET: &str = "Effects/Fx.vfx";

struct Ctx {
    store: Arc<MemoryStore>,
    accessor: ResourceAccessor,
    registry: Arc<VariantRegistry>,
    controller: MutationController,
}

impl Ctx {
    fn open(&self) -> (GraphResource, GraphSession) {
        self.accessor.load(ASSET).expect("load")
    }

    fn variant(&self, identifier: &str) -> Arc<VariantDescriptor> {
        self.registry.match_variant(identifier).expect("variant")
    }

    fn add(&self, session: &mut GraphSession, identifier: &str, position: Vec2) -> NodeHandle {
        self.controller
            .add_node(session, position, &self.variant(identifier))
            .expect("add node")
    }
}

#[fixture]
fn ctx() -> Ctx {
    let resolver = Arc::new(TypeResolver::new(builtin_modules()));
    let registry = Arc::new(VariantRegistry::builtin(resolver));
    let store = Arc::new(MemoryStore::new());
    let accessor = ResourceAccessor::new(store.clone());
    let controller = MutationController::new(Arc::clone(&registry), store.clone());
    accessor.create(ASSET).expect("create");
    Ctx {
        store,
        accessor,
        registry,
        controller,
    }
}

#[rstest]
fn add_then_remove_changes_identity_by_exactly_one_id(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    ctx.add(&mut session, "operator.add", Vec2::ZERO);
    let before = IdentityMap::build(&session);

    let handle = ctx.add(&mut session, "operator.multiply", Vec2::new(100.0, 0.0));
    let after_add = IdentityMap::build(&session);
    assert_eq!(after_add.len(), before.len() + 1);
    assert!(!before.contains(handle.id));
    assert_eq!(after_add.lookup(handle.id), Ok(handle));

    let removed = ctx.controller.remove_node(&mut session, handle).expect("remove");
    assert_eq!(removed.strategy, RemovalStrategy::SessionLevel);
    let after_remove = IdentityMap::build(&session);
    assert_eq!(after_remove, before);
}

#[rstest]
fn commit_without_changes_writes_nothing(ctx: Ctx) {
    let (mut resource, mut session) = ctx.open();
    let writes = ctx.store.write_count();

    assert_eq!(
        ctx.controller.commit(&mut session, &mut resource).expect("commit"),
        CommitOutcome::Unchanged
    );
    assert_eq!(ctx.store.write_count(), writes);

    ctx.add(&mut session, "operator.add", Vec2::ZERO);
    assert_eq!(
        ctx.controller.commit(&mut session, &mut resource).expect("commit"),
        CommitOutcome::Written { applied: 0 }
    );
    assert!(resource.is_modified());
    assert_eq!(
        ctx.controller.commit(&mut session, &mut resource).expect("commit"),
        CommitOutcome::Unchanged
    );
    assert_eq!(ctx.store.write_count(), writes + 1);
}

#[rstest]
fn moved_emitter_survives_commit_and_reload(ctx: Ctx) {
    let (mut resource, mut session) = ctx.open();
    let emitter = ctx.add(&mut session, "emitter", Vec2::ZERO);
    let strategy = ctx
        .controller
        .set_position(&mut session, emitter, Vec2::new(50.0, 50.0))
        .expect("move");
    assert_eq!(strategy, AttributeStrategy::DirectAttribute);
    assert_eq!(
        ctx.controller.commit(&mut session, &mut resource).expect("commit"),
        CommitOutcome::Written { applied: 1 }
    );

    let (_, reloaded) = ctx.open();
    let handle = IdentityMap::build(&reloaded).lookup(emitter.id).expect("same id");
    let node = reloaded.node(handle.slot).expect("controller");
    assert_eq!(node.kind, "context.spawn");
    assert_eq!(node.position, Vec2::new(50.0, 50.0));
}

#[rstest]
fn blocks_fall_back_to_model_parent_removal(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let context = ctx.add(&mut session, "context.initialize", Vec2::ZERO);
    let block = ctx
        .controller
        .add_block(&mut session, context, &ctx.variant("block.set_lifetime"), None)
        .expect("block");

    let removed = ctx.controller.remove_node(&mut session, block).expect("remove");
    assert_eq!(removed.strategy, RemovalStrategy::ModelParent);
    assert_eq!(session.model().children(context.id).count(), 0);

    assert!(matches!(
        ctx.controller.remove_node(&mut session, block),
        Err(MutationError::StaleHandle { .. })
    ));
}

#[rstest]
fn add_block_checks_category_and_parent(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let context = ctx.add(&mut session, "context.update", Vec2::ZERO);
    let operator = ctx.add(&mut session, "operator.add", Vec2::new(200.0, 0.0));

    assert!(matches!(
        ctx.controller
            .add_block(&mut session, context, &ctx.variant("operator.multiply"), None),
        Err(MutationError::WrongCategory {
            expected: NodeClass::Block,
            found: NodeClass::Operator,
            ..
        })
    ));
    assert!(matches!(
        ctx.controller
            .add_block(&mut session, operator, &ctx.variant("block.gravity"), None),
        Err(MutationError::NotAContext { .. })
    ));
    assert!(matches!(
        ctx.controller
            .add_node(&mut session, Vec2::ZERO, &ctx.variant("block.gravity")),
        Err(MutationError::CreationFailed { .. })
    ));
}

#[rstest]
fn toggle_enabled_picks_the_strategy_the_type_supports(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let context = ctx.add(&mut session, "context.update", Vec2::ZERO);
    let block = ctx
        .controller
        .add_block(&mut session, context, &ctx.variant("block.gravity"), None)
        .expect("block");

    let via_context = ctx
        .controller
        .toggle_enabled(&mut session, context, false)
        .expect("context");
    assert_eq!(via_context, AttributeStrategy::NamedSetting);
    let via_block = ctx
        .controller
        .toggle_enabled(&mut session, block, false)
        .expect("block");
    assert_eq!(via_block, AttributeStrategy::DirectAttribute);

    session.light_apply().expect("apply");
    let model = session.model();
    assert!(!model.node(context.id).expect("context").is_enabled());
    assert!(!model.node(block.id).expect("block").is_enabled());
}

#[rstest]
fn unsupported_attribute_writes_are_reported(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let operator = ctx.add(&mut session, "operator.add", Vec2::ZERO);
    let context = ctx.add(&mut session, "context.update", Vec2::new(300.0, 0.0));
    let block = ctx
        .controller
        .add_block(&mut session, context, &ctx.variant("block.gravity"), None)
        .expect("block");

    assert!(matches!(
        ctx.controller.toggle_enabled(&mut session, operator, false),
        Err(MutationError::Unsupported {
            operation: "toggle enabled",
            ..
        })
    ));
    assert!(matches!(
        ctx.controller
            .set_position(&mut session, block, Vec2::new(1.0, 1.0)),
        Err(MutationError::Unsupported {
            operation: "set position",
            ..
        })
    ));
    assert_eq!(session.pending_writes(), 0);
}

#[rstest]
fn rejected_values_fail_before_they_are_queued(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let operator = ctx.add(&mut session, "operator.add", Vec2::ZERO);

    let err = ctx
        .controller
        .set_position(&mut session, operator, Vec2::new(f32::NAN, 0.0))
        .expect_err("non-finite");
    assert!(matches!(err, MutationError::AttributeFailed { .. }), "{err}");
    assert!(ctx.controller.rename(&mut session, operator, "  ").is_err());
    assert_eq!(session.pending_writes(), 0);

    ctx.controller
        .rename(&mut session, operator, "Sum")
        .expect("rename");
    session.light_apply().expect("apply");
    assert_eq!(session.model().node(operator.id).expect("node").name, "Sum");
}

#[rstest]
fn failed_steps_do_not_roll_back_earlier_ones(ctx: Ctx) {
    let (mut resource, mut session) = ctx.open();
    let operator = ctx.add(&mut session, "operator.add", Vec2::ZERO);
    assert!(ctx
        .controller
        .toggle_enabled(&mut session, operator, false)
        .is_err());

    ctx.controller
        .commit(&mut session, &mut resource)
        .expect("commit");
    let (_, reloaded) = ctx.open();
    assert!(IdentityMap::build(&reloaded).contains(operator.id));
}

#[rstest]
fn set_setting_coerces_and_rejects_unknown_names(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let random = ctx.add(&mut session, "operator.random", Vec2::ZERO);

    ctx.controller
        .set_setting(&mut session, random, "seed", Value::Int(7))
        .expect("seed");
    assert_eq!(
        session.model().node(random.id).expect("node").settings.get("seed"),
        Some(&Value::Int(7))
    );

    assert!(matches!(
        ctx.controller
            .set_setting(&mut session, random, "missing", Value::Int(1)),
        Err(MutationError::AttributeFailed { .. })
    ));
    assert!(matches!(
        ctx.controller
            .set_setting(&mut session, random, "constant", Value::Str("no".to_owned())),
        Err(MutationError::AttributeFailed { .. })
    ));
}

#[rstest]
fn duplicates_are_offset_from_the_source(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let source = ctx.add(&mut session, "operator.random", Vec2::new(10.0, 20.0));
    ctx.controller
        .set_setting(&mut session, source, "seed", Value::Int(3))
        .expect("seed");

    let copy = ctx
        .controller
        .duplicate_node(&mut session, source, None)
        .expect("duplicate");
    let model = session.model();
    let copied = model.node(copy.id).expect("copy");
    assert_ne!(copy.id, source.id);
    assert_eq!(copied.position, Vec2::new(60.0, 70.0));
    assert_eq!(copied.settings.get("seed"), Some(&Value::Int(3)));
    assert_eq!(copied.kind, "operator.random");

    let placed = ctx
        .controller
        .duplicate_node(&mut session, source, Some(Vec2::new(-5.0, 0.0)))
        .expect("duplicate");
    assert_eq!(
        session.model().node(placed.id).expect("copy").position,
        Vec2::new(-5.0, 0.0)
    );
}

#[rstest]
fn duplicating_a_context_copies_its_blocks_in_order(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let context = ctx.add(&mut session, "context.initialize", Vec2::ZERO);
    let first = ctx
        .controller
        .add_block(&mut session, context, &ctx.variant("block.set_position"), None)
        .expect("first");
    ctx.controller
        .add_block(&mut session, context, &ctx.variant("block.set_lifetime"), None)
        .expect("second");

    let copy = ctx
        .controller
        .duplicate_node(&mut session, context, None)
        .expect("duplicate");
    let kinds = session
        .model()
        .children(copy.id)
        .map(|block| block.kind.as_str())
        .collect::<Vec<_>>();
    assert_eq!(kinds, ["block.set_position", "block.set_lifetime"]);

    let block_copy = ctx
        .controller
        .duplicate_node(&mut session, first, None)
        .expect("duplicate block");
    let order = session
        .model()
        .children(context.id)
        .map(|block| block.id)
        .collect::<Vec<_>>();
    assert_eq!(order[0], first.id);
    assert_eq!(order[1], block_copy.id);
    assert_eq!(order.len(), 3);
}

#[rstest]
fn connect_checks_port_names_and_types(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let spawn = ctx.add(&mut session, "context.spawn", Vec2::ZERO);
    let add = ctx.add(&mut session, "operator.add", Vec2::new(200.0, 0.0));
    let multiply = ctx.add(&mut session, "operator.multiply", Vec2::new(400.0, 0.0));

    assert!(matches!(
        ctx.controller
            .connect(&mut session, spawn, "spawn event", add, "A"),
        Err(MutationError::IncompatiblePorts { .. })
    ));
    let err = ctx
        .controller
        .connect(&mut session, add, "Result", multiply, "a")
        .expect_err("unknown port");
    assert!(err.to_string().contains("available: Out"), "{err}");

    assert!(ctx
        .controller
        .connect(&mut session, add, "out", multiply, "A")
        .expect("connect"));
    assert!(!ctx
        .controller
        .connect(&mut session, add, "Out", multiply, "a")
        .expect("already linked"));
    assert_eq!(session.edges().len(), 1);

    ctx.controller
        .disconnect(&mut session, add, "Out", multiply, "A")
        .expect("disconnect");
    assert!(matches!(
        ctx.controller
            .disconnect(&mut session, add, "Out", multiply, "A"),
        Err(MutationError::LinkNotFound { .. })
    ));
}

#[rstest]
fn placement_nudges_overlapping_nodes(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    ctx.add(&mut session, "operator.add", Vec2::new(100.0, 100.0));

    let clear = ctx.controller.place(&session, Vec2::new(0.0, 0.0));
    assert_eq!(clear.position, Vec2::ZERO);
    assert!(!clear.adjusted());

    let nudged = ctx.controller.place(&session, Vec2::new(102.0, 100.0));
    assert_eq!(nudged.position, Vec2::new(108.0, 100.0));
    assert!(nudged.warning.expect("warning").contains("overlaps"));
}

#[test]
fn strategies_report_the_last_failure() {
    let both_failed = run_strategies(&RemovalStrategy::ORDER, |strategy| match strategy {
        RemovalStrategy::SessionLevel => StrategyOutcome::Failed("session refused"),
        RemovalStrategy::ModelParent => StrategyOutcome::Failed("parent refused"),
    });
    assert_eq!(both_failed, Err("parent refused"));

    let skipped_then_failed = run_strategies(&RemovalStrategy::ORDER, |strategy| match strategy {
        RemovalStrategy::SessionLevel => StrategyOutcome::NotApplicable,
        RemovalStrategy::ModelParent => StrategyOutcome::Failed("parent refused"),
    });
    assert_eq!(skipped_then_failed, Err("parent refused"));

    let failed_then_skipped = run_strategies(&RemovalStrategy::ORDER, |strategy| match strategy {
        RemovalStrategy::SessionLevel => StrategyOutcome::Failed("session refused"),
        RemovalStrategy::ModelParent => StrategyOutcome::NotApplicable,
    });
    assert_eq!(failed_then_skipped, Err("session refused"));

    let none_applicable: Result<Option<RemovalStrategy>, &str> =
        run_strategies(&RemovalStrategy::ORDER, |_| StrategyOutcome::NotApplicable);
    assert_eq!(none_applicable, Ok(None));
}

#[rstest]
fn non_finite_positions_create_nothing(ctx: Ctx) {
    let (_, mut session) = ctx.open();
    let source = ctx.add(&mut session, "operator.add", Vec2::ZERO);
    session.mark_committed();

    assert!(matches!(
        ctx.controller
            .add_node(&mut session, Vec2::new(f32::INFINITY, 0.0), &ctx.variant("operator.add")),
        Err(MutationError::InvalidPosition { .. })
    ));
    assert!(matches!(
        ctx.controller
            .duplicate_node(&mut session, source, Some(Vec2::new(0.0, f32::NAN))),
        Err(MutationError::InvalidPosition { .. })
    ));
    assert_eq!(session.model().nodes().len(), 1);
    assert!(!session.has_pending_changes());
}

#[rstest]
fn slot_values_are_coerced_and_refused_on_linked_inputs(ctx: Ctx) {
    let (mut resource, mut session) = ctx.open();
    let add = ctx.add(&mut session, "operator.add", Vec2::ZERO);
    let multiply = ctx.add(&mut session, "operator.multiply", Vec2::new(200.0, 0.0));

    let change = ctx
        .controller
        .set_slot_value(&mut session, multiply, "b", Value::Int(2))
        .expect("set value");
    assert_eq!(change.port, "B");
    assert_eq!(change.previous, None);
    assert_eq!(change.value, Value::Float(2.0));

    assert!(matches!(
        ctx.controller
            .set_slot_value(&mut session, multiply, "A", Value::Bool(true)),
        Err(MutationError::IncompatibleValue { expected: "float", found: "bool", .. })
    ));
    assert!(matches!(
        ctx.controller
            .set_slot_value(&mut session, multiply, "Out", Value::Float(1.0)),
        Err(MutationError::PortNotFound { .. })
    ));

    ctx.controller
        .connect(&mut session, add, "Out", multiply, "A")
        .expect("connect");
    assert!(matches!(
        ctx.controller
            .set_slot_value(&mut session, multiply, "A", Value::Float(1.0)),
        Err(MutationError::PortLinked { .. })
    ));

    let copy = ctx
        .controller
        .duplicate_node(&mut session, multiply, None)
        .expect("duplicate");
    assert_eq!(
        session.model().node(copy.id).expect("copy").inputs[1].value,
        Some(Value::Float(2.0))
    );

    ctx.controller.commit(&mut session, &mut resource).expect("commit");
    let (_, reloaded) = ctx.open();
    let handle = IdentityMap::build(&reloaded).lookup(multiply.id).expect("same id");
    let node = reloaded.node(handle.slot).expect("controller");
    assert_eq!(node.inputs[1].value, Some(Value::Float(2.0)));
    assert_eq!(node.inputs[0].value, None);
}
