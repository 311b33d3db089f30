use clap::Parser;

/// CLI tool for opening the AWS web console from ambient credentials
#[derive(Parser)]
#[command(about, version)]
pub struct Cli {
    /// Scope the federated session to a managed policy ARN,
    /// e.g. arn:aws:iam::aws:policy/AdministratorAccess.
    /// If not provided, an allow-all inline policy is used.
    #[arg(short, long)]
    pub policy: Option<String>,

    /// The AWS region to open the console in.
    /// If not provided, falls back to the ambient AWS configuration.
    #[arg(short, long)]
    pub region: Option<String>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}
