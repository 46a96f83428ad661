//! nlmt-server
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──▶ policy decoders ──▶ config::resolve ──▶ ServerConfig
//!                                            │
//!                                            └─▶ events::compose (console, syslog, netprint)
//!
//!   ServerConfig ──▶ lifecycle::run ──▶ Engine::construct ──▶ listen_and_serve
//!                          ▲
//!   SIGINT/SIGTERM ──▶ signal controller ──▶ shutdown (1st) / exit 3 (2nd)
//! ```

use std::process::ExitCode;

use nlmt_server::cli::{self, Cli};
use nlmt_server::config;
use nlmt_server::lifecycle::{self, ExitClass};
use nlmt_server::observability::logging;
use nlmt_server::policy::FILLER_FACTORIES;
use nlmt_server::server::Reflector;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_from_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(exit) => {
            eprint!("{}", exit.message);
            return exit.class.into();
        }
    };

    if cli.version {
        println!("{}", cli::version_text());
        return ExitClass::Success.into();
    }

    logging::init(cli.really_quiet);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nlmt-server starting");

    let config = match config::resolve(&cli, FILLER_FACTORIES) {
        Ok(config) => config,
        Err(e) => {
            let class = e.exit_class();
            eprintln!("Error: {e}");
            if class == ExitClass::BadCommandLine {
                eprint!("{}", Cli::usage());
                eprintln!();
            }
            return class.into();
        }
    };

    match lifecycle::run::<Reflector>(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitClass::Success.into()
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_class().into()
        }
    }
}
