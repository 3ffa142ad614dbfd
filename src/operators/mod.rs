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

//! # Operators Module
//!
//! Expression engines applied to individual records.
//!
//! ## Operator Categories
//!
//! - **filter**: predicates over a record ([`filter::MnFilter`])
//! - **transform**: builders of new records from a source record
//!   ([`transform::MnTransform`])
//!
//! ## Usage
//!
//! Expressions are built either with the typed constructors or from their
//! declarative JSON form, and applied to record sources through the adapters
//! in [`crate::stream`].

pub mod filter;
pub mod transform;
