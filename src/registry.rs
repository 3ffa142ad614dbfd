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

//! # Function Registry Module
//!
//! Declarative transform expressions refer to custom functions by name
//! (`["custom", "target", "name"]`). [`MnFunctionRegistry`] maps those names
//! to the callables supplied by the host program.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{MnError, Result};
use crate::operators::transform::{MnCustomFn, MnFunction};
use crate::record::MnRecord;

/// Registry mapping custom function names to their implementations.
#[derive(Clone, Default)]
pub struct MnFunctionRegistry {
    inner: HashMap<String, Arc<dyn MnCustomFn>>,
}

impl MnFunctionRegistry {
    pub fn new() -> Self {
        MnFunctionRegistry {
            inner: HashMap::new(),
        }
    }

    /// Registers `function` under `name`, replacing any earlier entry.
    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&MnRecord) -> Result<Value> + Send + Sync + 'static,
    {
        self.inner.insert(name.to_string(), Arc::new(function));
    }

    pub fn register_arc(&mut self, name: &str, function: Arc<dyn MnCustomFn>) {
        self.inner.insert(name.to_string(), function);
    }

    pub fn get(&self, name: &str) -> Result<MnFunction> {
        self.inner
            .get(name)
            .map(|function| MnFunction::from_arc(name, Arc::clone(function)))
            .ok_or_else(|| MnError::invalid_expression(format!("unknown custom function: {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for MnFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnFunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
