// Copyright 2025 sluice contributors
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

//! Error types for the metrics system.

use std::fmt::Display;

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
///
/// Combine operators never fail; errors arise only at the edges, when a
/// caller asks for a capability the backing view cannot supply or constructs
/// a component from incomplete configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// Committed values were requested from a view whose execution backend
    /// cannot report them. This is a structural capability gap, not a
    /// transient fault; retrying will never succeed.
    CommittedUnsupported,
    /// A component was constructed from configuration missing a required
    /// option. Raised at construction, never papered over with a default.
    MissingConfiguration(&'static str),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::CommittedUnsupported => {
                write!(
                    f,
                    "committed metrics are not supported by this execution backend"
                )
            }
            MetricsError::MissingConfiguration(option) => {
                write!(f, "missing required configuration: {option}")
            }
        }
    }
}

impl std::error::Error for MetricsError {}
