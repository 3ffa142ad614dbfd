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

//! # Mnema Pipeline Module
//!
//! A pipeline is an ordered list of stages applied lazily to a record
//! source. Pipelines are declared as a list of steps:
//!
//! ```json
//! [
//!   {"operator": "filter", "config": {"expression": ["eq", ["type"], "IMAGE"]}},
//!   {"operator": "transform", "config": {"expression": ["copy", "id", "record.id"]}},
//!   {"operator": "limit", "config": {"count": 100}}
//! ]
//! ```
//!
//! The same shape can be written in YAML. A definition can be run any number
//! of times; each [`MnPipeline::run`] builds a fresh adapter chain.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::errors::{MnError, Result};
use crate::operators::filter::MnFilter;
use crate::operators::transform::MnTransform;
use crate::record::MnRecord;
use crate::registry::MnFunctionRegistry;
use crate::stream::{MnRecordIter, MnRecordsFilter, MnRecordsLimit, MnRecordsTransform};

/// One step of a pipeline.
#[derive(Clone, Debug)]
pub enum MnStage {
    Filter(MnFilter),
    Transform(MnTransform),
    Limit(usize),
}

impl MnStage {
    pub fn name(&self) -> &'static str {
        match self {
            MnStage::Filter(_) => "filter",
            MnStage::Transform(_) => "transform",
            MnStage::Limit(_) => "limit",
        }
    }

    fn attach<'a>(&self, source: MnRecordIter<'a>) -> MnRecordIter<'a> {
        match self {
            MnStage::Filter(filter) => Box::new(MnRecordsFilter::new(source, filter.clone())),
            MnStage::Transform(transform) => {
                Box::new(MnRecordsTransform::new(source, transform.clone()))
            }
            MnStage::Limit(count) => Box::new(MnRecordsLimit::new(source, *count)),
        }
    }
}

/// Simple linear pipeline composed of sequential stages.
#[derive(Clone, Debug, Default)]
pub struct MnPipeline {
    stages: Vec<MnStage>,
}

impl MnPipeline {
    pub fn new(stages: Vec<MnStage>) -> Self {
        MnPipeline { stages }
    }

    pub fn push(&mut self, stage: MnStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[MnStage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(MnStage::name).collect()
    }

    /// Ensures the pipeline contains at least one stage.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(MnError::pipeline("pipeline", "no stages configured"));
        }
        Ok(())
    }

    /// Chains the stages over `source` in declared order. Nothing is pulled
    /// until the returned iterator is advanced.
    pub fn run<'a, I>(&self, source: I) -> MnRecordIter<'a>
    where
        I: Iterator<Item = Result<MnRecord>> + 'a,
    {
        self.stages
            .iter()
            .fold(Box::new(source) as MnRecordIter<'a>, |chain, stage| {
                stage.attach(chain)
            })
    }

    /// Runs the pipeline to completion, stopping at the first error.
    pub fn collect<I>(&self, source: I) -> Result<Vec<MnRecord>>
    where
        I: Iterator<Item = Result<MnRecord>>,
    {
        self.run(source).collect()
    }
}

/// Builder that turns declarative step lists into pipelines.
#[derive(Debug, Default)]
pub struct MnPipelineBuilder {
    functions: MnFunctionRegistry,
}

impl MnPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose `custom` transforms resolve through `functions`.
    pub fn with_functions(functions: MnFunctionRegistry) -> Self {
        MnPipelineBuilder { functions }
    }

    pub fn functions(&self) -> &MnFunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut MnFunctionRegistry {
        &mut self.functions
    }

    /// Builds a pipeline from a sequence of configuration steps.
    pub fn build_from_config(&self, steps: &[Value]) -> Result<MnPipeline> {
        let mut stages = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let object = step.as_object().ok_or_else(|| {
                MnError::validation(format!("pipeline step #{index} must be an object"))
            })?;

            let operator = object
                .get("operator")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    MnError::validation(format!("pipeline step #{index} missing string 'operator'"))
                })?;

            let config = object.get("config").cloned().unwrap_or(Value::Null);
            let stage = self
                .build_stage(operator, &config)
                .map_err(|err| err.at_stage(&format!("step #{index} ({operator})")))?;
            log::debug!("pipeline step #{index}: {operator}");
            stages.push(stage);
        }

        let pipeline = MnPipeline::new(stages);
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Builds a pipeline from a JSON document holding the step list.
    pub fn build_from_json(&self, text: &str) -> Result<MnPipeline> {
        let document: Value = serde_json::from_str(text)?;
        self.build_from_document(&document)
    }

    /// Builds a pipeline from a YAML document holding the step list.
    pub fn build_from_yaml(&self, text: &str) -> Result<MnPipeline> {
        let document: Value = serde_yaml::from_str(text)?;
        self.build_from_document(&document)
    }

    /// Loads a definition file; `.yaml` / `.yml` are read as YAML, anything
    /// else as JSON.
    pub fn build_from_path(&self, path: impl AsRef<Path>) -> Result<MnPipeline> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        log::debug!("loading pipeline definition from {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => self.build_from_yaml(&text),
            _ => self.build_from_json(&text),
        }
    }

    fn build_from_document(&self, document: &Value) -> Result<MnPipeline> {
        let steps = document
            .as_array()
            .ok_or_else(|| MnError::validation("pipeline definition must be a list of steps"))?;
        self.build_from_config(steps)
    }

    fn build_stage(&self, operator: &str, config: &Value) -> Result<MnStage> {
        match operator {
            "filter" => {
                let expression = required_expression(operator, config)?;
                Ok(MnStage::Filter(MnFilter::from_value(expression)?))
            }
            "transform" => {
                let expression = required_expression(operator, config)?;
                Ok(MnStage::Transform(MnTransform::from_value(
                    expression,
                    &self.functions,
                )?))
            }
            "limit" => {
                let count = config
                    .get("count")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| MnError::validation("limit requires unsigned integer 'count'"))?;
                Ok(MnStage::Limit(count as usize))
            }
            other => Err(MnError::validation(format!("unknown operator '{other}'"))),
        }
    }
}

fn required_expression<'a>(operator: &str, config: &'a Value) -> Result<&'a Value> {
    config
        .get("expression")
        .ok_or_else(|| MnError::validation(format!("{operator} requires 'expression'")))
}
