//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Error types for configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Daemon-level configuration errors
///
/// Every variant is fatal: the daemon cannot start without its own bind
/// address and storage credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the expected shape
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more mandatory daemon or database parameters are empty
    #[error("missing mandatory config parameters: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The `[server]` table holds unusable values
    #[error("invalid server settings: {0}")]
    InvalidServer(String),
}

/// Per-ESME validation errors
///
/// These never abort a load; the offending profile is dropped instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// One or more mandatory profile parameters are empty or zero
    #[error("missing one or many parameters: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// One or more numeric profile parameters do not fit their wire type
    #[error("parameters out of range: {}", .0.join(", "))]
    OutOfRange(Vec<&'static str>),
}

impl ProfileError {
    /// Names of the fields that failed validation
    pub fn fields(&self) -> &[&'static str] {
        match self {
            ProfileError::MissingFields(fields) | ProfileError::OutOfRange(fields) => fields,
        }
    }
}
