// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! # Tessera Telemetry
//!
//! Everything a host needs to observe the governor: logger setup, a JSON
//! diagnostics report, and a bounded history of tier changes fed from the
//! context's notification channel.

#![warn(missing_docs)]

pub mod history;
pub mod logging;
pub mod report;
pub mod service;

pub use history::TierChangeHistory;
pub use logging::init_logging;
pub use report::{summary_line, to_json, write_json};
pub use service::TelemetryService;
