mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use emmascraper_lib::ScraperError;

#[derive(Parser)]
#[command(name = "emmascraper")]
#[command(about = "Scrape municipal bond issues and final scale pricing from EMMA")]
struct Cli {
    #[command(flatten)]
    scrape: commands::scrape::ScrapeArgs,
}

/// 2 when the CUSIP file was missing (and has been created), 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ScraperError>() {
        Some(ScraperError::MissingIdentifierFile { .. }) => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("emmascraper=info".parse().unwrap())
                .add_directive("emma_api=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match commands::scrape::run(&cli.scrape).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
