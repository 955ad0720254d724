//! Network Diagnostics Toolkit - Main CLI Application
//!
//! Inspects the local network configuration and runs ping, port scan,
//! traceroute, speed test and troubleshooting probes from the command line.

use clap::Parser;
use network_diagnostics_toolkit::{app::App, cli::Cli, error::ErrorReporter};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
    }));

    let cli = Cli::parse();
    let mut reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    let app = match App::new(cli).await {
        Ok(app) => app,
        Err(e) => {
            reporter.report_error(&e);
            process::exit(e.exit_code());
        }
    };
    reporter.use_color = app.config().enable_color;

    match app.run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            reporter.report_error(&e);
            process::exit(e.exit_code());
        }
    }
}
