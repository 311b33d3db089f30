#![warn(unused_extern_crates)]

mod cmd;
mod console;

use clap::Parser;
use cmd::Cli;
use std::time::Duration;

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = open_console(&cli).await {
        eprintln!("Error: {}", error_chain(&err));
        std::process::exit(1);
    }
}

async fn open_console(cli: &Cli) -> Result<(), console::Error> {
    let (config, region) = console::load_aws_config(cli.region.as_deref()).await?;
    let url = console::get_sign_in_url(&config, &region, cli.policy.as_deref()).await?;

    // Drop any live console session first so the federated one wins.
    let _ = webbrowser::open(console::logout_url(&region));
    tokio::time::sleep(Duration::from_secs(2)).await;

    if webbrowser::open(&url).is_err() {
        println!("Please open the following URL in your browser: {url}");
    }

    Ok(())
}
