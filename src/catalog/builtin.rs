// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{NodeClass, NodeTemplate, SlotTemplate, Value, ValueType};
use crate::reflect::{BLOCK_TYPE, CONTEXT_TYPE, OPERATOR_TYPE, PARAMETER_TYPE};

use super::{standard_template, VariantDescriptor, VariantSpec};

/// Built-in node kinds for `category`, in catalog order.
pub fn builtin_variants(category: NodeClass) -> Vec<VariantSpec> {
    match category {
        NodeClass::Context => contexts(),
        NodeClass::Operator => operators(),
        NodeClass::Block => blocks(),
        NodeClass::Parameter => parameters(),
    }
}

fn flow(name: &str) -> SlotTemplate {
    SlotTemplate::new(name, ValueType::Object)
}

fn contexts() -> Vec<VariantSpec> {
    let context = |identifier: &str, display: &str| {
        VariantSpec::new(identifier, display, NodeClass::Context, &[CONTEXT_TYPE])
            .setting("enabled", Value::Bool(true))
    };
    vec![
        context("context.spawn", "Spawn")
            .synonyms(&["spawner", "emitter"])
            .setting("loop_duration", Value::Float(0.0))
            .output(flow("Spawn Event").with_path("spawn_event")),
        context("context.initialize", "Initialize Particle")
            .synonyms(&["initialize", "init"])
            .setting("capacity", Value::Int(128))
            .input(flow("Spawn Event").with_path("spawn_event"))
            .output(flow("Particles").with_path("particles")),
        context("context.update", "Update Particle")
            .synonyms(&["update"])
            .input(flow("Particles").with_path("particles"))
            .output(flow("Particles").with_path("particles")),
        context("context.output_quad", "Output Particle Quad")
            .synonyms(&["output", "quad"])
            .setting("blend_mode", Value::Str("alpha".to_owned()))
            .input(flow("Particles").with_path("particles")),
    ]
}

fn operators() -> Vec<VariantSpec> {
    let binary = |identifier: &str, display: &str, synonyms: &[&str]| {
        VariantSpec::new(identifier, display, NodeClass::Operator, &[OPERATOR_TYPE])
            .synonyms(synonyms)
            .input(SlotTemplate::new("A", ValueType::Float).with_path("a"))
            .input(SlotTemplate::new("B", ValueType::Float).with_path("b"))
            .output(SlotTemplate::new("Out", ValueType::Float).with_path("out"))
    };
    vec![
        binary("operator.add", "Add", &["sum", "plus"]),
        binary("operator.multiply", "Multiply", &["mul", "times"]),
        VariantSpec::new(
            "operator.random",
            "Random Number",
            NodeClass::Operator,
            &[OPERATOR_TYPE],
        )
        .synonyms(&["random"])
        .setting("seed", Value::Int(0))
        .setting("constant", Value::Bool(true))
        .input(SlotTemplate::new("Min", ValueType::Float).with_path("min"))
        .input(SlotTemplate::new("Max", ValueType::Float).with_path("max"))
        .output(SlotTemplate::new("R", ValueType::Float).with_path("r")),
        VariantSpec::new(
            "operator.total_time",
            "Total Time",
            NodeClass::Operator,
            &[OPERATOR_TYPE],
        )
        .synonyms(&["time"])
        .output(SlotTemplate::new("T", ValueType::Float).with_path("t")),
        // Only registered under its short name in the operators module.
        VariantSpec::new(
            "operator.inline_vector2",
            "Inline Vector2",
            NodeClass::Operator,
            &["Vfx.Model.VfxInlineVector2", "VfxInlineOperator"],
        )
        .synonyms(&["vector2"])
        .input(SlotTemplate::new("Value", ValueType::Vec2).with_path("value"))
        .output(SlotTemplate::new("Value", ValueType::Vec2).with_path("value")),
    ]
}

fn blocks() -> Vec<VariantSpec> {
    let block = |identifier: &str, display: &str, synonyms: &[&str], slot: SlotTemplate| {
        VariantSpec::new(identifier, display, NodeClass::Block, &[BLOCK_TYPE])
            .synonyms(synonyms)
            .setting("composition", Value::Str("overwrite".to_owned()))
            .input(slot)
    };
    vec![
        block(
            "block.set_position",
            "Set Position",
            &["position"],
            SlotTemplate::new("Position", ValueType::Vec2).with_path("position"),
        ),
        block(
            "block.set_velocity",
            "Set Velocity",
            &["velocity"],
            SlotTemplate::new("Velocity", ValueType::Vec2).with_path("velocity"),
        ),
        block(
            "block.set_lifetime",
            "Set Lifetime",
            &["lifetime"],
            SlotTemplate::new("Lifetime", ValueType::Float).with_path("lifetime"),
        ),
        block(
            "block.gravity",
            "Gravity",
            &[],
            SlotTemplate::new("Force", ValueType::Vec2).with_path("force"),
        ),
    ]
}

fn parameters() -> Vec<VariantSpec> {
    let parameter = |identifier: &str, display: &str, value_type: ValueType, default_name: &str| {
        VariantSpec::new(identifier, display, NodeClass::Parameter, &[PARAMETER_TYPE])
            .setting("exposed", Value::Bool(true))
            .setting("exposed_name", Value::Str(default_name.to_owned()))
            .output(SlotTemplate::new("Value", value_type).with_path("value"))
            .factory(exposed_parameter)
    };
    vec![
        parameter("parameter.float", "Float", ValueType::Float, "New Float")
            .synonyms(&["float parameter"]),
        parameter("parameter.vector2", "Vector2", ValueType::Vec2, "New Vector2"),
        parameter("parameter.bool", "Bool", ValueType::Bool, "New Bool")
            .synonyms(&["boolean", "toggle"]),
    ]
}

/// Parameters are named after their exposed property.
fn exposed_parameter(descriptor: &VariantDescriptor) -> NodeTemplate {
    let mut template = standard_template(descriptor);
    if let Some(Value::Str(exposed)) = template.settings.get("exposed_name") {
        template.name = exposed.clone();
    }
    template
}
