//! folio - crypto prices and GitHub profiles from the terminal
//!
//! Prints the top coins by market cap (optionally refreshing on an interval),
//! sampled price charts, and GitHub profiles with their repositories.

use std::io;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::app::App;
use folio::cli::{Cli, Command, StartupConfig};
use folio::config::Config;

/// Exit status for rejected arguments, matching clap's usage errors
const USAGE_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli, Config::from_env()) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            process::exit(USAGE_EXIT_CODE);
        }
    };
    tracing::debug!(config = ?startup.config, "configuration loaded");

    let mut app = App::new(&startup.config);

    if let Command::Prices {
        watch: true,
        sort,
        desc,
        ..
    } = startup.command
    {
        app.set_price_order(sort, desc);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };

        let result = app.watch_prices(stdin, &mut io::stdout(), shutdown).await;
        if let Err(e) = result {
            eprintln!("{}: {}", e.code(), e);
            process::exit(1);
        }
        // A blocked stdin read would otherwise hold up runtime shutdown
        process::exit(0);
    }

    match app.run(&startup.command).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}: {}", e.code(), e);
            process::exit(1);
        }
    }
}
