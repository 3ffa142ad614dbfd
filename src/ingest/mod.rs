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

//! # Data Ingestion Module
//!
//! Record sources backed by files and directories.
//!
//! ## Module Components
//!
//! - **Format Detection** ([format.rs](format/index.html)): format and compression from file names
//! - **Reader** ([reader.rs](reader/index.html)): lazy readers yielding `Result<MnRecord>`
//!
//! ## Supported Input
//!
//! - **JSONL**: one JSON document per line
//! - **JSON**: an array of records, or a single object
//! - **CSV**: header row plus string-valued rows (feature `csv`)
//! - **Directories**: every `.json` file below the directory, one record each
//!
//! Gzip (`.gz`) and Zstd (`.zst`) compressed files are read transparently
//! with the `compression` feature.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use mnema::ingest::{MnReaderConfig, MnStreamReader};
//!
//! let reader = MnStreamReader::new().with_config(MnReaderConfig {
//!     skip_errors: false,
//!     ..Default::default()
//! });
//! for record in reader.read_path("harvest.jsonl.gz")? {
//!     println!("{}", record?);
//! }
//! ```

pub mod format;
pub mod reader;

pub use format::{MnCompression, MnDataFormat, MnFormatDetector, MnFormatInfo};
#[cfg(feature = "csv")]
pub use reader::MnCsvReader;
pub use reader::{open_input, MnJsonDirReader, MnJsonlReader, MnReaderConfig, MnStreamReader};
pub use crate::stream::MnValueRecords;
