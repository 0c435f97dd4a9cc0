//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`validate`]. Each handler lives in its
//! own submodule.

pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::HostgateError;

pub async fn dispatch(cli: Cli) -> Result<(), HostgateError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  hostgate v{version}: host-based HTTP reverse proxy\n\n  \
         No command provided. To get started:\n\n    \
         hostgate run                      Start the proxy (auto-detects ./hostgate.yaml)\n    \
         hostgate run -c routes.yaml       Start with a specific config file\n    \
         hostgate validate routes.yaml     Check a config file\n    \
         hostgate --help                   See all commands and options\n"
    );
}
