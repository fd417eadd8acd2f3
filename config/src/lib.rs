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

//! smsd Configuration Registry
//!
//! Loads the daemon's own listen address, its backing datastore credentials
//! and the set of trusted ESME peer profiles from a TOML document.
//!
//! Validation is asymmetric:
//!
//! - A missing daemon-level parameter (`host`, `port`, or any of the
//!   `database` credentials) fails the whole load with [`ConfigError`].
//! - A missing ESME parameter only drops that one profile, with a warning.
//!
//! # Example
//!
//! ```
//! use smsd_config::GatewayConfig;
//!
//! let config = GatewayConfig::from_toml_str(r#"
//!     host = "0.0.0.0"
//!     port = "2775"
//!
//!     [database]
//!     user = "smsd"
//!     password = "secret"
//!     host = "localhost"
//!     name = "sms"
//!     storable_db = "sms_store"
//!
//!     [esmes.alpha]
//!     enabled = true
//!     host = "10.0.0.1"
//!     port = 2775
//!     system_id = "alpha"
//!     password = "alpha_pw"
//!     src_addr = "INFO"
//! "#).unwrap();
//!
//! assert_eq!(config.bind_address(), "0.0.0.0:2775");
//! assert_eq!(config.active_esmes().count(), 1);
//! ```

mod error;
mod loader;
mod model;

pub use error::{ConfigError, ProfileError, Result};
pub use model::{DatabaseConfig, EsmeProfile, GatewayConfig, ServerSettings};
