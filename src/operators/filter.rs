//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Mnema.
//! The Mnema project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Filter Expressions
//!
//! [`MnFilter`] is a boolean predicate over a single record. Leaves compare
//! operands ([`MnOperand`]), each of which is either a path resolved against
//! the record or a literal value. `not`, `and` and `or` nest expressions.
//!
//! Evaluation never fails. A path that resolves to nothing is *absent*:
//! absent equals only absent, orders against nothing and contains nothing.
//!
//! ## Declarative Form
//!
//! Expressions can be read from JSON in tagged-array form:
//!
//! ```json
//! ["and", ["eq", ["type"], "IMAGE"], ["contains", ["lang"], "de"]]
//! ```
//!
//! Operands: an array is a list-form path, a string with a `.` or a `[n]`
//! suffix is a dotted path, `{"path": ...}` forces a path, `{"value": ...}`
//! forces a literal, and everything else is a literal.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::errors::{MnError, Result};
use crate::path::MnPath;
use crate::record::{values_equal, MnRecord};

/// Operand of a filter leaf.
#[derive(Clone, Debug, PartialEq)]
pub enum MnOperand {
    /// Resolved against the record under evaluation.
    Path(MnPath),
    /// Used as-is.
    Literal(Value),
}

impl MnOperand {
    pub fn path(path: MnPath) -> Self {
        MnOperand::Path(path)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        MnOperand::Literal(value.into())
    }

    /// Resolves the operand; `None` is absent.
    pub fn resolve<'a>(&'a self, record: &'a MnRecord) -> Option<&'a Value> {
        match self {
            MnOperand::Path(path) => record.resolve(path),
            MnOperand::Literal(value) => Some(value),
        }
    }

    /// Reads an operand from its declarative form.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(MnOperand::Path(operand_path(value)?)),
            Value::Object(map) if map.len() == 1 && map.contains_key("path") => {
                Ok(MnOperand::Path(operand_path(&map["path"])?))
            }
            Value::Object(map) if map.len() == 1 && map.contains_key("value") => {
                Ok(MnOperand::Literal(map["value"].clone()))
            }
            Value::String(text) if looks_like_path(text) => Ok(MnOperand::Path(operand_path(value)?)),
            literal => Ok(MnOperand::Literal(literal.clone())),
        }
    }
}

impl From<MnPath> for MnOperand {
    fn from(path: MnPath) -> Self {
        MnOperand::Path(path)
    }
}

impl From<Value> for MnOperand {
    fn from(value: Value) -> Self {
        MnOperand::Literal(value)
    }
}

fn looks_like_path(text: &str) -> bool {
    text.contains('.') || (text.contains('[') && text.contains(']'))
}

fn operand_path(value: &Value) -> Result<MnPath> {
    MnPath::from_value(value).map_err(|err| MnError::invalid_expression(err.to_string()))
}

/// Boolean predicate over a record.
#[derive(Clone, Debug, PartialEq)]
pub enum MnFilter {
    True,
    False,
    Eq(MnOperand, MnOperand),
    Neq(MnOperand, MnOperand),
    Gt(MnOperand, MnOperand),
    Gte(MnOperand, MnOperand),
    Lt(MnOperand, MnOperand),
    Lte(MnOperand, MnOperand),
    /// Container first, needle second.
    Contains(MnOperand, MnOperand),
    Exists(MnOperand),
    Not(Box<MnFilter>),
    And(Vec<MnFilter>),
    Or(Vec<MnFilter>),
}

impl MnFilter {
    pub fn equals(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Eq(left.into(), right.into())
    }

    pub fn not_equals(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Neq(left.into(), right.into())
    }

    pub fn greater_than(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Gt(left.into(), right.into())
    }

    pub fn greater_or_equal(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Gte(left.into(), right.into())
    }

    pub fn less_than(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Lt(left.into(), right.into())
    }

    pub fn less_or_equal(left: impl Into<MnOperand>, right: impl Into<MnOperand>) -> Self {
        MnFilter::Lte(left.into(), right.into())
    }

    pub fn contains(container: impl Into<MnOperand>, needle: impl Into<MnOperand>) -> Self {
        MnFilter::Contains(container.into(), needle.into())
    }

    pub fn exists(operand: impl Into<MnOperand>) -> Self {
        MnFilter::Exists(operand.into())
    }

    pub fn negate(inner: MnFilter) -> Self {
        MnFilter::Not(Box::new(inner))
    }

    pub fn all(parts: Vec<MnFilter>) -> Self {
        MnFilter::And(parts)
    }

    pub fn any(parts: Vec<MnFilter>) -> Self {
        MnFilter::Or(parts)
    }

    /// Tag of the expression in its declarative form.
    pub fn tag(&self) -> &'static str {
        match self {
            MnFilter::True => "true",
            MnFilter::False => "false",
            MnFilter::Eq(..) => "eq",
            MnFilter::Neq(..) => "neq",
            MnFilter::Gt(..) => "gt",
            MnFilter::Gte(..) => "gte",
            MnFilter::Lt(..) => "lt",
            MnFilter::Lte(..) => "lte",
            MnFilter::Contains(..) => "contains",
            MnFilter::Exists(_) => "exists",
            MnFilter::Not(_) => "not",
            MnFilter::And(_) => "and",
            MnFilter::Or(_) => "or",
        }
    }

    /// Evaluates the predicate against `record`.
    ///
    /// `and` / `or` short-circuit in declaration order; an empty `and` is
    /// true and an empty `or` is false.
    pub fn evaluate(&self, record: &MnRecord) -> bool {
        match self {
            MnFilter::True => true,
            MnFilter::False => false,
            MnFilter::Eq(left, right) => equal(left.resolve(record), right.resolve(record)),
            MnFilter::Neq(left, right) => !equal(left.resolve(record), right.resolve(record)),
            MnFilter::Gt(left, right) => matches!(
                compare(left.resolve(record), right.resolve(record)),
                Some(Ordering::Greater)
            ),
            MnFilter::Gte(left, right) => matches!(
                compare(left.resolve(record), right.resolve(record)),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            MnFilter::Lt(left, right) => matches!(
                compare(left.resolve(record), right.resolve(record)),
                Some(Ordering::Less)
            ),
            MnFilter::Lte(left, right) => matches!(
                compare(left.resolve(record), right.resolve(record)),
                Some(Ordering::Less | Ordering::Equal)
            ),
            MnFilter::Contains(container, needle) => {
                contains(container.resolve(record), needle.resolve(record))
            }
            MnFilter::Exists(operand) => {
                !matches!(operand.resolve(record), None | Some(Value::Null))
            }
            MnFilter::Not(inner) => !inner.evaluate(record),
            MnFilter::And(parts) => parts.iter().all(|part| part.evaluate(record)),
            MnFilter::Or(parts) => parts.iter().any(|part| part.evaluate(record)),
        }
    }

    /// Reads an expression from its declarative tagged-array form.
    pub fn from_value(expr: &Value) -> Result<Self> {
        let items = expr.as_array().ok_or_else(|| {
            MnError::invalid_expression(format!(
                "filter expression must be a tagged array, got {expr}"
            ))
        })?;

        let (tag, operands) = items
            .split_first()
            .ok_or_else(|| MnError::invalid_expression("filter expression may not be empty"))?;

        let tag = tag.as_str().ok_or_else(|| {
            MnError::invalid_expression(format!("filter tag must be a string, got {tag}"))
        })?;

        match tag {
            "true" => expect_arity(tag, operands, 0).map(|_| MnFilter::True),
            "false" => expect_arity(tag, operands, 0).map(|_| MnFilter::False),
            "eq" => binary(tag, operands, MnFilter::Eq),
            "neq" => binary(tag, operands, MnFilter::Neq),
            "gt" => binary(tag, operands, MnFilter::Gt),
            "gte" => binary(tag, operands, MnFilter::Gte),
            "lt" => binary(tag, operands, MnFilter::Lt),
            "lte" => binary(tag, operands, MnFilter::Lte),
            "contains" => binary(tag, operands, MnFilter::Contains),
            "exists" => {
                expect_arity(tag, operands, 1)?;
                Ok(MnFilter::Exists(MnOperand::from_value(&operands[0])?))
            }
            "not" => {
                expect_arity(tag, operands, 1)?;
                Ok(MnFilter::Not(Box::new(Self::from_value(&operands[0])?)))
            }
            "and" => Ok(MnFilter::And(
                operands.iter().map(Self::from_value).collect::<Result<_>>()?,
            )),
            "or" => Ok(MnFilter::Or(
                operands.iter().map(Self::from_value).collect::<Result<_>>()?,
            )),
            other => Err(MnError::invalid_expression(format!(
                "unknown filter tag '{other}'"
            ))),
        }
    }

    /// Parses a JSON document holding a tagged-array expression.
    pub fn from_json(text: &str) -> Result<Self> {
        let expr: Value = serde_json::from_str(text)?;
        Self::from_value(&expr)
    }
}

fn expect_arity(tag: &str, operands: &[Value], expected: usize) -> Result<()> {
    if operands.len() != expected {
        return Err(MnError::invalid_expression(format!(
            "'{tag}' expects {expected} operand(s), got {}",
            operands.len()
        )));
    }
    Ok(())
}

fn binary(
    tag: &str,
    operands: &[Value],
    build: fn(MnOperand, MnOperand) -> MnFilter,
) -> Result<MnFilter> {
    expect_arity(tag, operands, 2)?;
    Ok(build(
        MnOperand::from_value(&operands[0])?,
        MnOperand::from_value(&operands[1])?,
    ))
}

fn equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => values_equal(left, right),
        _ => false,
    }
}

fn compare(left: Option<&Value>, right: Option<&Value>) -> Option<Ordering> {
    match (left?, right?) {
        (Value::Number(left), Value::Number(right)) => compare_numbers(left, right),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

/// Integers are ordered exactly; `f64` is used only when a float is involved.
fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }
    if !left.is_f64() && !right.is_f64() {
        // a negative integer against one above i64::MAX
        return Some(if left.as_u64().is_some() {
            Ordering::Greater
        } else {
            Ordering::Less
        });
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

fn contains(container: Option<&Value>, needle: Option<&Value>) -> bool {
    let (Some(container), Some(needle)) = (container, needle) else {
        return false;
    };
    match (container, needle) {
        (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}
