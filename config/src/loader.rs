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

//! Configuration loading, validation and sanitization

use crate::{ConfigError, EsmeProfile, GatewayConfig, ProfileError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

impl GatewayConfig {
    /// Load configuration from a TOML file
    ///
    /// Daemon-level problems are returned as errors. ESME profiles with
    /// missing parameters are dropped with a warning and never reach the
    /// returned value.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse, validate and sanitize configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: GatewayConfig = toml::from_str(contents)?;

        config.validate()?;
        config.sanitize();

        let disabled = config.esmes.values().filter(|esme| !esme.enabled).count();
        info!(
            address = %config.bind_address(),
            esmes = config.esmes.len(),
            disabled,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate daemon-level mandatory parameters
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("host");
        }
        if self.port.is_empty() {
            missing.push("port");
        }
        if self.database.user.is_empty() {
            missing.push("database.user");
        }
        if self.database.password.is_empty() {
            missing.push("database.password");
        }
        if self.database.host.is_empty() {
            missing.push("database.host");
        }
        if self.database.storable_db.is_empty() {
            missing.push("database.storable_db");
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        self.server.validate().map_err(ConfigError::InvalidServer)
    }

    /// Drop every ESME profile that is missing a mandatory parameter or
    /// holds an out-of-range value
    ///
    /// Emits one warning per dropped profile and returns the dropped names.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();

        self.esmes.retain(|name, esme| match esme.validate() {
            Ok(()) => true,
            Err(ProfileError::MissingFields(fields)) => {
                warn!(
                    name = %name,
                    missing = %fields.join(","),
                    "Missing one or many parameters for ESME, dropping it"
                );
                dropped.push(name.clone());
                false
            }
            Err(ProfileError::OutOfRange(fields)) => {
                warn!(
                    name = %name,
                    invalid = %fields.join(","),
                    "Parameters out of range for ESME, dropping it"
                );
                dropped.push(name.clone());
                false
            }
        });

        dropped
    }

    /// Listener address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Look up an ESME profile by name
    pub fn esme(&self, name: &str) -> Option<&EsmeProfile> {
        self.esmes.get(name)
    }

    /// All admitted ESME profiles, enabled or not
    pub fn esmes(&self) -> impl Iterator<Item = (&str, &EsmeProfile)> {
        self.esmes.iter().map(|(name, esme)| (name.as_str(), esme))
    }

    /// Admitted ESME profiles that may be dispatched against
    pub fn active_esmes(&self) -> impl Iterator<Item = (&str, &EsmeProfile)> {
        self.esmes().filter(|(_, esme)| esme.enabled)
    }
}
