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

//! # Data Export Module
//!
//! This module writes record sources out to storage.
//!
//! ## Module Components
//!
//! - **Writer** ([writer.rs](writer/index.html)): the [`MnRecordSink`] contract,
//!   [`write_all`], JSONL output and the hashed JSON directory layout
//! - **Tabular** ([tabular.rs](tabular/index.html)): CSV output (feature `csv`)
//!
//! ## Usage Patterns
//!
//! ```rust
//! use mnema::export::{write_all, MnJsonDirWriter};
//! use mnema::ingest::MnStreamReader;
//! use mnema::path::MnPath;
//!
//! let source = MnStreamReader::open("harvest.jsonl")?;
//! let mut sink = MnJsonDirWriter::new("out", MnPath::parse("id")?);
//! let stats = write_all(&mut sink, source)?;
//! println!("{} written, {} without id", stats.records_written, stats.records_skipped);
//! ```

pub mod writer;
#[cfg(feature = "csv")]
pub mod tabular;

pub use writer::{
    write_all, MnJsonDirWriter, MnJsonlWriter, MnRecordSink, MnWriteOutcome, MnWriteStats,
};
#[cfg(feature = "csv")]
pub use tabular::{MnCsvWriter, MnCsvWriterConfig, MnExtrasAction};
