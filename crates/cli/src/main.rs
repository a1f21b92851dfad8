mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use commands::ArtifactArg;

#[derive(Parser)]
#[command(
    name = "rtcgit",
    version,
    about = "Inspect the GitHub and GitLab repositories linked to RTC work items"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect whether a repository is hosted on GitHub, GitLab or elsewhere
    Detect {
        /// Repository URL
        url: String,
        /// Skip detection and use this host (GITHUB, GITLAB)
        #[arg(long)]
        hint: Option<String>,
    },

    /// Check the token in RTCGIT_TOKEN against the repository's host
    ValidateToken {
        url: String,
        #[arg(long)]
        hint: Option<String>,
    },

    /// List the most recent commits, issues or pull/merge requests
    List {
        #[arg(value_enum)]
        artifact: ArtifactArg,
        url: String,
        #[arg(long)]
        hint: Option<String>,
    },

    /// Show a single commit, issue or pull/merge request
    Show {
        #[arg(value_enum)]
        artifact: ArtifactArg,
        url: String,
        /// Commit sha or issue/request number
        id: String,
        #[arg(long)]
        hint: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,rtcgit=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    if let Commands::Config = command {
        return config::show_config();
    }

    let config = config::load_config()?;
    match command {
        Commands::Detect { url, hint } => commands::run_detect(&config, &url, hint).await,
        Commands::ValidateToken { url, hint } => {
            commands::run_validate_token(&config, &url, hint).await
        }
        Commands::List {
            artifact,
            url,
            hint,
        } => commands::run_list(&config, artifact, &url, hint).await,
        Commands::Show {
            artifact,
            url,
            id,
            hint,
        } => commands::run_show(&config, artifact, &url, &id, hint).await,
        Commands::Config => config::show_config(),
    }
}
