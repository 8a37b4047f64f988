// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A 2D position on the graph canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, by: Self) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The static type of a member parameter, setting or port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Vec2,
    Str,
    /// Reference-typed slot that accepts any value (including null).
    Object,
}

impl ValueType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Str => "string",
            Self::Object => "object",
        }
    }

    /// Returns how a value of type `from` binds to a slot of type `self`.
    ///
    /// `None` stands for `null`.
    pub fn accepts(self, from: Option<ValueType>) -> Assignability {
        match (self, from) {
            (to, Some(from)) if to == from => Assignability::Exact,
            (Self::Object, _) => Assignability::Assignable,
            (Self::Float, Some(Self::Int)) => Assignability::Assignable,
            (Self::Str, None) => Assignability::Assignable,
            _ => Assignability::Incompatible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Assignability {
    Exact,
    Assignable,
    Incompatible,
}

/// A dynamically-typed value exchanged with the host model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec2(Vec2),
    Str(String),
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int(_) => Some(ValueType::Int),
            Self::Float(_) => Some(ValueType::Float),
            Self::Vec2(_) => Some(ValueType::Vec2),
            Self::Str(_) => Some(ValueType::Str),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Coerces the value to the slot type, widening `Int` to `Float`.
    pub fn coerce_to(self, target: ValueType) -> Option<Value> {
        match (target.accepts(self.value_type()), self) {
            (Assignability::Incompatible, _) => None,
            (_, Value::Int(raw)) if target == ValueType::Float => Some(Value::Float(raw as f64)),
            (_, value) => Some(value),
        }
    }

    /// Converts a caller-supplied JSON value into a host value.
    ///
    /// Objects with numeric `x`/`y` fields become `Vec2` when both fit a finite `f32`;
    /// arrays and other objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(value) => Some(Value::Bool(*value)),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Value::Int)
                .or_else(|| number.as_f64().map(Value::Float)),
            serde_json::Value::String(value) => Some(Value::Str(value.clone())),
            serde_json::Value::Object(map) => {
                let x = map.get("x")?.as_f64()?;
                let y = map.get("y")?.as_f64()?;
                let position = Vec2::new(x as f32, y as f32);
                position.is_finite().then_some(Value::Vec2(position))
            }
            serde_json::Value::Array(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(value) => serde_json::json!(value),
            Self::Int(value) => serde_json::json!(value),
            Self::Float(value) => serde_json::json!(value),
            Self::Vec2(value) => serde_json::json!({ "x": value.x, "y": value.y }),
            Self::Str(value) => serde_json::json!(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Vec2(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}
