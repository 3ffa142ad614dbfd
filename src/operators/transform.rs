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

//! # Transform Expressions
//!
//! [`MnTransform`] builds a fresh output record from a source record. The
//! output starts as an empty mapping; leaf expressions write into it at their
//! `target` path, combinators decide how leaves share that output.
//!
//! ## Leaves
//!
//! - `copy(target, source)`: copies the value at `source`; absent becomes null.
//! - `static(target, value)`: writes `value`.
//! - `fill(target, value)`: writes `value` only if the output has nothing
//!   (or null) at `target` yet.
//! - `join(target, joiner, sources...)`: joins the rendered source values.
//!   With a single source that resolves to a sequence, joins its elements.
//! - `split(target, splitter, source)`: writes each part of a string or
//!   sequence to `target`, with `{}` replaced by the 1-based part index.
//! - `combine(target, sources...)`: writes the source values as a sequence.
//! - `custom(target, function)`: writes whatever the function returns.
//!
//! ## Combinators
//!
//! - `sequence(...)`: children run in order against one accumulating output,
//!   so `["sequence", ["copy", "lang", "x"], ["fill", "lang", "NA"]]` copies
//!   and then defaults.
//! - `parallel(...)`: each child starts from the output as it was when the
//!   `parallel` began; their writes are merged back in declared order and the
//!   last declared child wins on overlapping targets.
//!
//! Every child reads from the original source record, never from the output.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{MnError, Result};
use crate::path::MnPath;
use crate::record::{render_value, MnRecord};
use crate::registry::MnFunctionRegistry;

/// Caller-supplied computation used by the `custom` transform.
///
/// Errors returned here are propagated to the caller of
/// [`MnTransform::evaluate`] without modification.
pub trait MnCustomFn: Send + Sync {
    fn apply(&self, record: &MnRecord) -> Result<Value>;
}

impl<F> MnCustomFn for F
where
    F: Fn(&MnRecord) -> Result<Value> + Send + Sync,
{
    fn apply(&self, record: &MnRecord) -> Result<Value> {
        self(record)
    }
}

/// A named, shareable custom function.
#[derive(Clone)]
pub struct MnFunction {
    name: String,
    function: Arc<dyn MnCustomFn>,
}

impl MnFunction {
    pub fn new(name: impl Into<String>, function: impl MnCustomFn + 'static) -> Self {
        Self {
            name: name.into(),
            function: Arc::new(function),
        }
    }

    pub fn from_arc(name: impl Into<String>, function: Arc<dyn MnCustomFn>) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, record: &MnRecord) -> Result<Value> {
        self.function.apply(record)
    }
}

impl fmt::Debug for MnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnFunction").field("name", &self.name).finish()
    }
}

/// Rule for producing an output record from a source record.
#[derive(Clone, Debug)]
pub enum MnTransform {
    Copy { target: MnPath, source: MnPath },
    Static { target: MnPath, value: Value },
    Fill { target: MnPath, value: Value },
    Join { target: MnPath, joiner: String, sources: Vec<MnPath> },
    Split { target: MnPath, splitter: String, source: MnPath },
    Combine { target: MnPath, sources: Vec<MnPath> },
    Custom { target: MnPath, function: MnFunction },
    Parallel(Vec<MnTransform>),
    Sequence(Vec<MnTransform>),
}

/// Output under construction plus the paths written to it, in order.
#[derive(Default)]
struct Output {
    record: MnRecord,
    written: Vec<MnPath>,
}

impl Output {
    fn starting_from(record: MnRecord) -> Self {
        Self {
            record,
            written: Vec::new(),
        }
    }

    fn read(&self, path: &MnPath) -> Option<&Value> {
        self.record.resolve(path)
    }

    fn write(&mut self, path: &MnPath, value: Value) -> Result<()> {
        self.record.set(path, value)?;
        self.written.push(path.clone());
        Ok(())
    }

    /// Replays this branch's writes, with their final values, onto `output`.
    fn replay_into(self, output: &mut Output) -> Result<()> {
        for path in &self.written {
            let value = self.record.resolve(path).cloned().unwrap_or(Value::Null);
            output.write(path, value)?;
        }
        Ok(())
    }
}

impl MnTransform {
    pub fn copy(target: MnPath, source: MnPath) -> Self {
        MnTransform::Copy { target, source }
    }

    pub fn constant(target: MnPath, value: impl Into<Value>) -> Self {
        MnTransform::Static {
            target,
            value: value.into(),
        }
    }

    pub fn fill(target: MnPath, value: impl Into<Value>) -> Self {
        MnTransform::Fill {
            target,
            value: value.into(),
        }
    }

    pub fn join(target: MnPath, joiner: impl Into<String>, sources: Vec<MnPath>) -> Self {
        MnTransform::Join {
            target,
            joiner: joiner.into(),
            sources,
        }
    }

    /// An empty `splitter` splits strings on whitespace.
    pub fn split(target: MnPath, splitter: impl Into<String>, source: MnPath) -> Self {
        MnTransform::Split {
            target,
            splitter: splitter.into(),
            source,
        }
    }

    pub fn combine(target: MnPath, sources: Vec<MnPath>) -> Self {
        MnTransform::Combine { target, sources }
    }

    pub fn custom(target: MnPath, function: MnFunction) -> Self {
        MnTransform::Custom { target, function }
    }

    pub fn parallel(children: Vec<MnTransform>) -> Self {
        MnTransform::Parallel(children)
    }

    pub fn sequence(children: Vec<MnTransform>) -> Self {
        MnTransform::Sequence(children)
    }

    /// Tag of the expression in its declarative form.
    pub fn tag(&self) -> &'static str {
        match self {
            MnTransform::Copy { .. } => "copy",
            MnTransform::Static { .. } => "static",
            MnTransform::Fill { .. } => "fill",
            MnTransform::Join { .. } => "join",
            MnTransform::Split { .. } => "split",
            MnTransform::Combine { .. } => "combine",
            MnTransform::Custom { .. } => "custom",
            MnTransform::Parallel(_) => "parallel",
            MnTransform::Sequence(_) => "sequence",
        }
    }

    /// Builds the output record for `source`.
    ///
    /// Fails only when a target cannot be written or a custom function fails.
    pub fn evaluate(&self, source: &MnRecord) -> Result<MnRecord> {
        let mut output = Output::default();
        self.apply(source, &mut output)?;
        Ok(output.record)
    }

    fn apply(&self, source: &MnRecord, output: &mut Output) -> Result<()> {
        match self {
            MnTransform::Copy { target, source: from } => {
                let value = source.resolve(from).cloned().unwrap_or(Value::Null);
                output.write(target, value)
            }
            MnTransform::Static { target, value } => output.write(target, value.clone()),
            MnTransform::Fill { target, value } => {
                if matches!(output.read(target), None | Some(Value::Null)) {
                    output.write(target, value.clone())
                } else {
                    Ok(())
                }
            }
            MnTransform::Join {
                target,
                joiner,
                sources,
            } => {
                let joined = join_sources(source, joiner, sources);
                output.write(target, Value::String(joined))
            }
            MnTransform::Split {
                target,
                splitter,
                source: from,
            } => {
                for (position, part) in split_parts(source.resolve(from), splitter)
                    .into_iter()
                    .enumerate()
                {
                    output.write(&target.with_placeholder(position + 1), part)?;
                }
                Ok(())
            }
            MnTransform::Combine { target, sources } => {
                let combined = sources
                    .iter()
                    .map(|path| source.resolve(path).cloned().unwrap_or(Value::Null))
                    .collect();
                output.write(target, Value::Array(combined))
            }
            MnTransform::Custom { target, function } => {
                let value = function.call(source)?;
                output.write(target, value)
            }
            MnTransform::Sequence(children) => {
                for child in children {
                    child.apply(source, output)?;
                }
                Ok(())
            }
            MnTransform::Parallel(children) => {
                let snapshot = output.record.clone();
                for child in children {
                    let mut branch = Output::starting_from(snapshot.clone());
                    child.apply(source, &mut branch)?;
                    branch.replay_into(output)?;
                }
                Ok(())
            }
        }
    }

    /// Reads an expression from its declarative tagged-array form.
    ///
    /// A top-level array of arrays is an implicit `parallel`. Custom function
    /// names are resolved through `registry`.
    pub fn from_value(expr: &Value, registry: &MnFunctionRegistry) -> Result<Self> {
        let items = expr.as_array().ok_or_else(|| {
            MnError::invalid_expression(format!(
                "transform expression must be a tagged array, got {expr}"
            ))
        })?;

        match items.first() {
            None => Err(MnError::invalid_expression(
                "transform expression may not be empty",
            )),
            Some(Value::Array(_)) => Ok(MnTransform::Parallel(children(items, registry)?)),
            Some(Value::String(tag)) => Self::from_tagged(tag, &items[1..], registry),
            Some(other) => Err(MnError::invalid_expression(format!(
                "transform tag must be a string, got {other}"
            ))),
        }
    }

    /// Parses a JSON document holding a tagged-array expression.
    pub fn from_json(text: &str, registry: &MnFunctionRegistry) -> Result<Self> {
        let expr: Value = serde_json::from_str(text)?;
        Self::from_value(&expr, registry)
    }

    fn from_tagged(tag: &str, operands: &[Value], registry: &MnFunctionRegistry) -> Result<Self> {
        match tag {
            "copy" => {
                expect_arity(tag, operands, 2)?;
                Ok(MnTransform::Copy {
                    target: expr_path(tag, &operands[0])?,
                    source: expr_path(tag, &operands[1])?,
                })
            }
            "static" => {
                expect_arity(tag, operands, 2)?;
                Ok(MnTransform::Static {
                    target: expr_path(tag, &operands[0])?,
                    value: operands[1].clone(),
                })
            }
            "fill" => {
                expect_arity(tag, operands, 2)?;
                Ok(MnTransform::Fill {
                    target: expr_path(tag, &operands[0])?,
                    value: operands[1].clone(),
                })
            }
            "join" => {
                expect_at_least(tag, operands, 3)?;
                Ok(MnTransform::Join {
                    target: expr_path(tag, &operands[0])?,
                    joiner: expr_string(tag, "joiner", &operands[1])?,
                    sources: expr_paths(tag, &operands[2..])?,
                })
            }
            "split" => {
                expect_arity(tag, operands, 3)?;
                Ok(MnTransform::Split {
                    target: expr_path(tag, &operands[0])?,
                    splitter: expr_string(tag, "splitter", &operands[1])?,
                    source: expr_path(tag, &operands[2])?,
                })
            }
            "combine" => {
                expect_at_least(tag, operands, 2)?;
                Ok(MnTransform::Combine {
                    target: expr_path(tag, &operands[0])?,
                    sources: expr_paths(tag, &operands[1..])?,
                })
            }
            "custom" => {
                expect_arity(tag, operands, 2)?;
                let name = expr_string(tag, "function name", &operands[1])?;
                Ok(MnTransform::Custom {
                    target: expr_path(tag, &operands[0])?,
                    function: registry.get(&name)?,
                })
            }
            "parallel" => Ok(MnTransform::Parallel(children(operands, registry)?)),
            "sequence" => Ok(MnTransform::Sequence(children(operands, registry)?)),
            other => Err(MnError::invalid_expression(format!(
                "unknown transform tag '{other}'"
            ))),
        }
    }
}

fn children(items: &[Value], registry: &MnFunctionRegistry) -> Result<Vec<MnTransform>> {
    items
        .iter()
        .map(|item| MnTransform::from_value(item, registry))
        .collect()
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

fn expect_at_least(tag: &str, operands: &[Value], minimum: usize) -> Result<()> {
    if operands.len() < minimum {
        return Err(MnError::invalid_expression(format!(
            "'{tag}' expects at least {minimum} operands, got {}",
            operands.len()
        )));
    }
    Ok(())
}

fn expr_path(tag: &str, value: &Value) -> Result<MnPath> {
    MnPath::from_value(value)
        .map_err(|err| MnError::invalid_expression(format!("'{tag}': {err}")))
}

fn expr_paths(tag: &str, values: &[Value]) -> Result<Vec<MnPath>> {
    values.iter().map(|value| expr_path(tag, value)).collect()
}

fn expr_string(tag: &str, what: &str, value: &Value) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        MnError::invalid_expression(format!("'{tag}' requires string {what}, got {value}"))
    })
}

fn join_sources(source: &MnRecord, joiner: &str, sources: &[MnPath]) -> String {
    if let [single] = sources {
        if let Some(Value::Array(items)) = source.resolve(single) {
            return items.iter().map(render_value).collect::<Vec<_>>().join(joiner);
        }
    }
    sources
        .iter()
        .map(|path| source.resolve(path).map(render_value).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(joiner)
}

fn split_parts(value: Option<&Value>, splitter: &str) -> Vec<Value> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => {
            if splitter.is_empty() {
                text.split_whitespace().map(|part| Value::String(part.to_string())).collect()
            } else {
                text.split(splitter).map(|part| Value::String(part.to_string())).collect()
            }
        }
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}
