//! element-manager
//!
//! ```bash
//! # Print the catalog
//! element-manager list --format text
//!
//! # Interactive session against a local mock
//! element-manager mock-api --port 8080 &
//! ELEMENTS_BASE_URL=http://127.0.0.1:8080/objects element-manager shell
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use element_manager_cli::render::load_and_render;
use element_manager_cli::{
    shell, ClientArgs, ClientConfig, ConsoleNotifier, MockApiConfig, OutputFormat,
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "element-manager")]
#[command(version)]
#[command(about = "Browse and edit an object catalog from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog once and print it
    List {
        #[command(flatten)]
        client: ClientArgs,

        /// Output format: json, text, or pretty
        #[arg(long, short = 'o', default_value = "pretty", value_enum)]
        format: OutputFormat,
    },

    /// Interactive session: create, edit and delete elements
    Shell {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Serve a local mock of the catalog API
    MockApi {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short, default_value_t = 8080)]
        port: u16,

        /// Answer writes without storing them
        #[arg(long)]
        no_persist: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { client, format } => cmd_list(client, format).await,
        Commands::Shell { client } => cmd_shell(client).await,
        Commands::MockApi {
            host,
            port,
            no_persist,
        } => {
            element_manager_cli::mock_api::serve(MockApiConfig {
                host,
                port,
                persist_writes: !no_persist,
            })
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_list(client: ClientArgs, format: OutputFormat) -> Result<()> {
    let config = ClientConfig::from(client);
    let notifier = Arc::new(ConsoleNotifier::new(!config.confirm_deletes));
    let mut manager = config.build_manager(notifier)?;

    let output = load_and_render(&mut manager, format).await?;
    println!("{}", output);
    Ok(())
}

async fn cmd_shell(client: ClientArgs) -> Result<()> {
    let config = ClientConfig::from(client);
    let notifier = Arc::new(ConsoleNotifier::new(!config.confirm_deletes));
    let mut manager = config.build_manager(notifier)?;
    shell::run(&mut manager).await
}
