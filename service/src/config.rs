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

//! Dispatcher configuration

use smsd_config::ServerSettings;
use std::time::Duration;

/// Dispatcher configuration
///
/// Timing and limits for the accept loop and its sessions. Usually derived
/// from the `[server]` table of the daemon configuration, but can be built
/// directly with the builder methods.
///
/// # Example
///
/// ```
/// use smsd_service::DispatcherConfig;
/// use std::time::Duration;
///
/// let config = DispatcherConfig::default()
///     .with_idle_timeout(Duration::from_secs(60))
///     .with_max_line_length(1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Time a session may wait for a complete line
    pub idle_timeout: Duration,

    /// Time a single reply may take to write
    pub write_timeout: Duration,

    /// Longest accepted line, terminator included
    pub max_line_length: usize,

    /// First sleep after a failed accept
    pub accept_backoff_initial: Duration,

    /// Upper bound for the accept backoff
    pub accept_backoff_max: Duration,

    /// Time to wait for sessions to finish during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for DispatcherConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            idle_timeout: settings.idle_timeout(),
            write_timeout: Duration::from_secs(30),
            max_line_length: settings.max_line_length,
            accept_backoff_initial: settings.accept_backoff_initial(),
            accept_backoff_max: settings.accept_backoff_max(),
            shutdown_timeout: settings.shutdown_timeout(),
        }
    }
}

impl DispatcherConfig {
    /// Set the idle timeout duration
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the write timeout duration
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the maximum line length
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    /// Set the accept backoff bounds
    pub fn with_accept_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.accept_backoff_initial = initial;
        self.accept_backoff_max = max;
        self
    }

    /// Set the shutdown timeout duration
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_timeout.is_zero() {
            return Err("idle_timeout must be greater than 0".to_string());
        }

        if self.write_timeout.is_zero() {
            return Err("write_timeout must be greater than 0".to_string());
        }

        if self.max_line_length == 0 {
            return Err("max_line_length must be greater than 0".to_string());
        }

        if self.accept_backoff_initial.is_zero() {
            return Err("accept_backoff_initial must be greater than 0".to_string());
        }

        if self.accept_backoff_initial > self.accept_backoff_max {
            return Err("accept_backoff_initial must not exceed accept_backoff_max".to_string());
        }

        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.max_line_length, 4096);
        assert_eq!(config.accept_backoff_initial, Duration::from_millis(10));
        assert_eq!(config.accept_backoff_max, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_server_settings() {
        let settings = ServerSettings {
            idle_timeout_secs: 12,
            max_line_length: 256,
            ..Default::default()
        };
        let config = DispatcherConfig::from(&settings);
        assert_eq!(config.idle_timeout, Duration::from_secs(12));
        assert_eq!(config.max_line_length, 256);
    }

    #[test]
    fn test_builder_pattern() {
        let config = DispatcherConfig::default()
            .with_idle_timeout(Duration::from_secs(5))
            .with_write_timeout(Duration::from_secs(2))
            .with_max_line_length(64)
            .with_accept_backoff(Duration::from_millis(1), Duration::from_millis(50))
            .with_shutdown_timeout(Duration::from_secs(1));

        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(2));
        assert_eq!(config.max_line_length, 64);
        assert_eq!(config.accept_backoff_max, Duration::from_millis(50));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_validation() {
        let mut config = DispatcherConfig::default();
        assert!(config.validate().is_ok());

        config.idle_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config.idle_timeout = Duration::from_secs(1);
        config.max_line_length = 0;
        assert!(config.validate().is_err());

        config.max_line_length = 16;
        config.accept_backoff_initial = Duration::from_secs(5);
        assert!(config.validate().is_err());
    }
}
