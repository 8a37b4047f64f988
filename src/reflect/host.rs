// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{ModelNode, Value, ValueType, Vec2};

use super::{TypeDescriptor, TypeModule, Visibility};

/// Generic named-setting mutator exposed by every host node type.
pub const SETTING_MUTATOR: &str = "set_setting";
pub const SETTING_ACCESSOR: &str = "get_setting";

pub const CONTEXT_TYPE: &str = "Vfx.Model.VfxContext";
pub const OPERATOR_TYPE: &str = "Vfx.Model.VfxOperator";
pub const BLOCK_TYPE: &str = "Vfx.Model.VfxBlock";
pub const PARAMETER_TYPE: &str = "Vfx.Model.VfxParameter";
pub const INLINE_OPERATOR_TYPE: &str = "Vfx.Model.Operators.VfxInlineOperator";

/// Host modules in scan order.
pub fn builtin_modules() -> Vec<TypeModule> {
    vec![
        TypeModule::new(
            "Vfx.Model",
            vec![
                with_settings(named(positioned(TypeDescriptor::new(CONTEXT_TYPE))))
                    // Contexts toggle through their `enabled` setting.
                    .with_method(SETTING_MUTATOR, &[ValueType::Str, ValueType::Bool], set_setting),
                with_settings(named(positioned(TypeDescriptor::new(OPERATOR_TYPE)))),
                with_settings(named(TypeDescriptor::new(BLOCK_TYPE))).with_member(
                    "enabled",
                    ValueType::Bool,
                    Visibility::Public,
                    get_enabled,
                    Some(set_enabled),
                ),
                with_settings(named(positioned(TypeDescriptor::new(PARAMETER_TYPE)))),
            ],
        ),
        TypeModule::new(
            "Vfx.Model.Operators",
            vec![with_settings(named(positioned(TypeDescriptor::new(
                INLINE_OPERATOR_TYPE,
            ))))],
        ),
    ]
}

fn named(ty: TypeDescriptor) -> TypeDescriptor {
    ty.with_member("name", ValueType::Str, Visibility::Public, get_name, Some(set_name))
        .with_member("kind", ValueType::Str, Visibility::NonPublic, get_kind, None)
}

fn positioned(ty: TypeDescriptor) -> TypeDescriptor {
    ty.with_member(
        "position",
        ValueType::Vec2,
        Visibility::Public,
        get_position,
        Some(set_position),
    )
}

fn with_settings(ty: TypeDescriptor) -> TypeDescriptor {
    ty.with_method(SETTING_MUTATOR, &[ValueType::Str, ValueType::Object], set_setting)
        .with_method(SETTING_ACCESSOR, &[ValueType::Str], get_setting)
}

fn get_name(node: &ModelNode) -> Value {
    Value::Str(node.name.clone())
}

fn set_name(node: &mut ModelNode, value: Value) -> Result<(), String> {
    match value {
        Value::Str(name) if !name.trim().is_empty() => {
            node.name = name;
            Ok(())
        }
        other => Err(format!("name must be a non-empty string, got {other}")),
    }
}

fn get_kind(node: &ModelNode) -> Value {
    Value::Str(node.kind.clone())
}

fn get_position(node: &ModelNode) -> Value {
    Value::Vec2(node.position)
}

fn set_position(node: &mut ModelNode, value: Value) -> Result<(), String> {
    let position: Vec2 = value
        .as_vec2()
        .ok_or_else(|| format!("position must be a vec2, got {value}"))?;
    if !position.x.is_finite() || !position.y.is_finite() {
        return Err(format!("position must be finite, got {position}"));
    }
    node.position = position;
    Ok(())
}

fn get_enabled(node: &ModelNode) -> Value {
    Value::Bool(node.enabled)
}

fn set_enabled(node: &mut ModelNode, value: Value) -> Result<(), String> {
    node.enabled = value
        .as_bool()
        .ok_or_else(|| format!("enabled must be a bool, got {value}"))?;
    Ok(())
}

fn set_setting(node: &mut ModelNode, args: &[Value]) -> Result<Value, String> {
    let [name, value] = args else {
        return Err(format!("expected 2 arguments, got {}", args.len()));
    };
    let name = name.as_str().ok_or("setting name must be a string")?;
    let current = node
        .settings
        .get(name)
        .ok_or_else(|| format!("unknown setting {name:?}"))?;
    let value = match current.value_type() {
        Some(expected) => value
            .clone()
            .coerce_to(expected)
            .ok_or_else(|| format!("setting {name:?} expects {}, got {value}", expected.label()))?,
        None => value.clone(),
    };
    node.settings.insert(name.to_owned(), value);
    Ok(Value::Null)
}

fn get_setting(node: &mut ModelNode, args: &[Value]) -> Result<Value, String> {
    let [name] = args else {
        return Err(format!("expected 1 argument, got {}", args.len()));
    };
    let name = name.as_str().ok_or("setting name must be a string")?;
    node.settings
        .get(name)
        .cloned()
        .ok_or_else(|| format!("unknown setting {name:?}"))
}
