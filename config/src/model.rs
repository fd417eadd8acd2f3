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

//! Typed configuration model
//!
//! Every struct decodes with `#[serde(default)]`, so a key that is absent from
//! the file is indistinguishable from one that is present but empty. Mandatory
//! field checks therefore only need to look for empty strings and zero ports.
//!
//! ESME numeric fields decode as `i64` and are range checked by
//! [`EsmeProfile::validate`], so one peer's bad value drops that peer instead
//! of failing the whole document.

use crate::ProfileError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Largest timezone shift in hours, either direction
const TZ_SHIFT_LIMIT: i64 = 24;

/// Connection and addressing parameters for one external messaging entity
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EsmeProfile {
    /// Whether sessions may be dispatched against this peer
    pub enabled: bool,
    /// Free-text name as written in the profile
    pub name: String,
    /// Operator label
    pub operator: String,
    /// Peer host
    pub host: String,
    /// Peer port
    pub port: i64,
    /// Seconds between enquire_link keep-alive probes
    pub enquire_interval: i64,
    /// SMPP system_id credential
    pub system_id: String,
    /// SMPP password credential
    pub password: String,
    /// Destination number prefix used to route traffic to this peer
    pub dst_number_prefix: i64,
    /// Source address
    pub src_addr: String,
    /// Type of number for destination addresses
    pub addr_ton: i64,
    /// Numbering plan indicator for destination addresses
    pub addr_npi: i64,
    /// Type of number for the source address
    pub src_ton: i64,
    /// Numbering plan indicator for the source address
    pub src_npi: i64,
    /// Timezone shift in hours applied to this peer's timestamps
    pub tz_shift: i64,
}

impl EsmeProfile {
    /// Check that every mandatory parameter is present and every numeric
    /// parameter fits its wire type
    ///
    /// Missing parameters are reported before out-of-range ones. Either way
    /// all offending fields are returned at once so the warning can name them.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.system_id.is_empty() {
            missing.push("system_id");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        if self.src_addr.is_empty() {
            missing.push("src_addr");
        }

        if !missing.is_empty() {
            return Err(ProfileError::MissingFields(missing));
        }

        let u8_range = 0..=i64::from(u8::MAX);
        let checks = [
            ("port", (1..=i64::from(u16::MAX)).contains(&self.port)),
            (
                "enquire_interval",
                (0..=i64::from(u32::MAX)).contains(&self.enquire_interval),
            ),
            ("dst_number_prefix", self.dst_number_prefix >= 0),
            ("addr_ton", u8_range.contains(&self.addr_ton)),
            ("addr_npi", u8_range.contains(&self.addr_npi)),
            ("src_ton", u8_range.contains(&self.src_ton)),
            ("src_npi", u8_range.contains(&self.src_npi)),
            ("tz_shift", (-TZ_SHIFT_LIMIT..=TZ_SHIFT_LIMIT).contains(&self.tz_shift)),
        ];
        let invalid: Vec<&'static str> = checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| field)
            .collect();

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(ProfileError::OutOfRange(invalid))
        }
    }

    /// Interval between keep-alive probes
    pub fn enquire_interval(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.enquire_interval).unwrap_or(0))
    }

    /// Peer address as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for EsmeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsmeProfile")
            .field("enabled", &self.enabled)
            .field("name", &self.name)
            .field("operator", &self.operator)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enquire_interval", &self.enquire_interval)
            .field("system_id", &self.system_id)
            .field("password", &"<redacted>")
            .field("dst_number_prefix", &self.dst_number_prefix)
            .field("src_addr", &self.src_addr)
            .field("addr_ton", &self.addr_ton)
            .field("addr_npi", &self.addr_npi)
            .field("src_ton", &self.src_ton)
            .field("src_npi", &self.src_npi)
            .field("tz_shift", &self.tz_shift)
            .finish()
    }
}

/// Backing datastore credentials
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database host
    pub host: String,
    /// Database name
    pub name: String,
    /// Name of the database holding stored messages
    pub storable_db: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("storable_db", &self.storable_db)
            .finish()
    }
}

/// Listener and session timing, read from the optional `[server]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Seconds a session may wait for a complete line
    #[serde(rename = "idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Longest accepted line, terminator included
    pub max_line_length: usize,
    /// First sleep after a failed accept
    pub accept_backoff_initial_ms: u64,
    /// Upper bound for the accept backoff
    pub accept_backoff_max_ms: u64,
    /// Seconds to wait for sessions during shutdown
    #[serde(rename = "shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            max_line_length: 4096,
            accept_backoff_initial_ms: 10,
            accept_backoff_max_ms: 1000,
            shutdown_timeout_secs: 5,
        }
    }
}

impl ServerSettings {
    /// Session idle timeout
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Initial accept backoff
    pub fn accept_backoff_initial(&self) -> Duration {
        Duration::from_millis(self.accept_backoff_initial_ms)
    }

    /// Maximum accept backoff
    pub fn accept_backoff_max(&self) -> Duration {
        Duration::from_millis(self.accept_backoff_max_ms)
    }

    /// Shutdown grace period
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_timeout_secs == 0 {
            return Err("idle_timeout must be greater than 0".to_string());
        }

        if self.max_line_length == 0 {
            return Err("max_line_length must be greater than 0".to_string());
        }

        if self.accept_backoff_initial_ms == 0 {
            return Err("accept_backoff_initial_ms must be greater than 0".to_string());
        }

        if self.accept_backoff_initial_ms > self.accept_backoff_max_ms {
            return Err(
                "accept_backoff_initial_ms must not exceed accept_backoff_max_ms".to_string(),
            );
        }

        if self.shutdown_timeout_secs == 0 {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Top-level daemon configuration
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the daemon listens on
    pub host: String,
    /// Port the daemon listens on, kept as written in the file
    #[serde(deserialize_with = "deserialize_port")]
    pub port: String,
    /// Backing datastore credentials
    pub database: DatabaseConfig,
    /// ESME profiles keyed by name
    pub esmes: BTreeMap<String, EsmeProfile>,
    /// Listener and session timing
    pub server: ServerSettings,
}

/// Accepts `port = "2775"` as well as `port = 2775`.
fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Text(String),
        Number(i64),
    }

    Ok(match PortValue::deserialize(deserializer)? {
        PortValue::Text(text) => text,
        PortValue::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> EsmeProfile {
        EsmeProfile {
            enabled: true,
            name: "alpha".to_string(),
            operator: "Operator A".to_string(),
            host: "10.0.0.1".to_string(),
            port: 2775,
            enquire_interval: 30,
            system_id: "alpha_id".to_string(),
            password: "secret".to_string(),
            dst_number_prefix: 7701,
            src_addr: "INFO".to_string(),
            addr_ton: 1,
            addr_npi: 1,
            src_ton: 5,
            src_npi: 0,
            tz_shift: 3,
        }
    }

    #[test]
    fn test_complete_profile_is_valid() {
        assert!(complete_profile().validate().is_ok());
    }

    #[test]
    fn test_profile_reports_every_missing_field() {
        let profile = EsmeProfile {
            port: 0,
            password: String::new(),
            ..complete_profile()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::MissingFields(vec!["port", "password"]))
        );

        let empty = EsmeProfile::default();
        assert_eq!(empty.validate().unwrap_err().fields().len(), 5);
    }

    #[test]
    fn test_profile_reports_out_of_range_fields() {
        let profile = EsmeProfile {
            port: 70000,
            addr_ton: -1,
            src_npi: 256,
            ..complete_profile()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::OutOfRange(vec!["port", "addr_ton", "src_npi"]))
        );

        let profile = EsmeProfile {
            enquire_interval: -5,
            dst_number_prefix: -1,
            tz_shift: 25,
            ..complete_profile()
        };
        assert_eq!(
            profile.validate().unwrap_err().fields(),
            &["enquire_interval", "dst_number_prefix", "tz_shift"]
        );
    }

    #[test]
    fn test_missing_fields_take_precedence_over_range() {
        let profile = EsmeProfile {
            password: String::new(),
            addr_ton: 300,
            ..complete_profile()
        };
        assert_eq!(
            profile.validate(),
            Err(ProfileError::MissingFields(vec!["password"]))
        );
    }

    #[test]
    fn test_range_boundaries_are_accepted() {
        let profile = EsmeProfile {
            port: 65535,
            enquire_interval: 0,
            addr_ton: 255,
            src_ton: 0,
            tz_shift: -24,
            ..complete_profile()
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_disabled_flag_does_not_affect_validation() {
        let profile = EsmeProfile {
            enabled: false,
            ..complete_profile()
        };
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_profile_accessors() {
        let profile = complete_profile();
        assert_eq!(profile.enquire_interval(), Duration::from_secs(30));
        assert_eq!(profile.address(), "10.0.0.1:2775");
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let rendered = format!("{:?}", complete_profile());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));

        let database = DatabaseConfig {
            password: "dbsecret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", database).contains("dbsecret"));
    }

    #[test]
    fn test_server_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.idle_timeout(), Duration::from_secs(300));
        assert_eq!(settings.max_line_length, 4096);
        assert_eq!(settings.accept_backoff_initial(), Duration::from_millis(10));
        assert_eq!(settings.accept_backoff_max(), Duration::from_secs(1));
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_settings_validation() {
        let mut settings = ServerSettings::default();

        settings.idle_timeout_secs = 0;
        assert!(settings.validate().is_err());

        settings.idle_timeout_secs = 300;
        settings.accept_backoff_initial_ms = 5000;
        assert!(settings.validate().is_err());

        settings.accept_backoff_initial_ms = 10;
        settings.max_line_length = 0;
        assert!(settings.validate().is_err());
    }
}
