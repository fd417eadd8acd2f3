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

//! Command line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// SMS gateway daemon
#[derive(Parser, Debug)]
#[command(name = "smsd")]
#[command(author, version, about = "SMS gateway daemon accepting ESME connections")]
pub struct Args {
    /// Path to the TOML config file
    #[arg(short, long, value_name = "FILE", default_value = "./settings.toml")]
    pub config: PathBuf,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Load and validate the config, print a summary and exit
    #[arg(long)]
    pub check: bool,
}

/// Log output format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line human readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["smsd"]).unwrap();
        assert_eq!(args.config, PathBuf::from("./settings.toml"));
        assert_eq!(args.log_level, "info");
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(args.log_file.is_none());
        assert!(!args.check);
    }

    #[test]
    fn test_short_config_flag() {
        let args =
            Args::try_parse_from(["smsd", "-c", "/etc/smsd.toml", "--log-format", "pretty", "--check"])
                .unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/smsd.toml"));
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.check);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["smsd", "--log-format", "xml"]).is_err());
    }
}
