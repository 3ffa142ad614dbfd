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

//! # Mnema Core Library
//!
//! Mnema is a toolkit for working with metadata harvested from digital
//! archives. Records flow lazily from a source through filters and
//! transforms into a sink, one record at a time.
//!
//! ## Module Overview
//!
//! - **record**: [`MnRecord`], the recursive mapping/sequence/scalar value
//! - **path**: [`MnPath`], addressing locations inside a record
//! - **operators**: the filter and transform expression engines
//! - **registry**: named custom functions for declarative transforms
//! - **stream**: lazy adapters over record sources
//! - **pipeline**: declarative, reusable chains of stages
//! - **ingest**: file and directory readers
//! - **export**: file and directory writers
//!
//! ## Feature Flags
//!
//! - `csv`: CSV reading and writing
//! - `compression`: gzip and zstd input
//! - `full`: all of the above (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use mnema::{MnFunctionRegistry, MnPipelineBuilder, MnRecord, MnValueRecords};
//! use serde_json::json;
//!
//! let pipeline = MnPipelineBuilder::with_functions(MnFunctionRegistry::new())
//!     .build_from_json(r#"[
//!         {"operator": "filter", "config": {"expression": ["eq", ["type"], "IMAGE"]}},
//!         {"operator": "transform", "config": {"expression":
//!             ["sequence", ["copy", "lang", "dcLanguage[0]"], ["fill", "lang", "NA"]]}}
//!     ]"#)
//!     .unwrap();
//!
//! let source = MnValueRecords::new(
//!     vec![
//!         json!({"type": "IMAGE", "dcLanguage": ["de"]}),
//!         json!({"type": "TEXT"}),
//!         json!({"type": "IMAGE"}),
//!     ]
//!     .into_iter(),
//! );
//! let output: Vec<MnRecord> = pipeline.collect(source).unwrap();
//! assert_eq!(output[0].as_value(), &json!({"lang": "de"}));
//! assert_eq!(output[1].as_value(), &json!({"lang": "NA"}));
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, MnError>`. Addressing a path
//! that does not exist is never an error; malformed expressions, failing
//! custom functions and IO problems are.

pub mod errors;
pub mod export;
pub mod ingest;
pub mod operators;
pub mod path;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod stream;

pub use errors::{MnError, Result};
pub use operators::filter::{MnFilter, MnOperand};
pub use operators::transform::{MnCustomFn, MnFunction, MnTransform};
pub use path::{MnPath, MnPathSegment};
pub use pipeline::{MnPipeline, MnPipelineBuilder, MnStage};
pub use record::MnRecord;
pub use registry::MnFunctionRegistry;
pub use stream::{
    MnRecordIter, MnRecordStream, MnRecordsFilter, MnRecordsLimit, MnRecordsTransform,
    MnValueRecords,
};

pub use export::{write_all, MnJsonDirWriter, MnJsonlWriter, MnRecordSink, MnWriteStats};
pub use ingest::{MnFormatDetector, MnJsonlReader, MnReaderConfig, MnStreamReader};
