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

//! smsd daemon entry point

mod cli;
mod logging;

use clap::Parser;
use cli::Args;
use smsd_config::GatewayConfig;
use smsd_service::{Dispatcher, EchoHandler, ServiceError};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const EXIT_BIND: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_LOGGING: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(&args.log_level, args.log_format, args.log_file.as_deref()) {
        eprintln!("smsd: {e}");
        return ExitCode::from(EXIT_LOGGING);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "starting smsd"
    );

    let config = match GatewayConfig::load(&args.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, config = %args.config.display(), "Fail in loading configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if args.check {
        print_summary(&config);
        return ExitCode::SUCCESS;
    }

    let dispatcher = match Dispatcher::new(config.clone()).await {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(error = %e, address = %config.bind_address(), "Fail in start daemon");
            return ExitCode::from(exit_code(&e));
        }
    };

    if let Err(e) = dispatcher.start(Arc::new(EchoHandler::new())).await {
        error!(error = %e, "Fail in start daemon");
        return ExitCode::from(exit_code(&e));
    }

    wait_for_shutdown().await;

    if let Err(e) = dispatcher.shutdown().await {
        error!(error = %e, "shutdown failed");
    }
    info!(snapshot = %dispatcher.snapshot(), "smsd stopped");

    ExitCode::SUCCESS
}

fn exit_code(e: &ServiceError) -> u8 {
    match e {
        ServiceError::InvalidConfig(_) => EXIT_CONFIG,
        _ => EXIT_BIND,
    }
}

fn print_summary(config: &GatewayConfig) {
    println!("configuration OK");
    println!("  listen: {}", config.bind_address());
    println!("  database: {}", config.database.host);
    for (name, esme) in config.esmes() {
        let status = if esme.enabled { "enabled" } else { "disabled" };
        println!("  esme {name}: {} ({status})", esme.address());
    }
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
