// Entry point of the roster tool.
//
// **Architecture Overview:**
// - `core/` = Business logic (token cache, spreadsheet access, roster rules)
// - `infra/` = Implementations of core traits (Google OAuth2, Sheets REST API)
// - `cli/` = Command-line adapter (argument parsing, text output)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested command

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{AppConfig, CredentialsSource};
use crate::core::auth::TokenManager;
use crate::core::roster::RosterService;
use crate::core::sheets::SpreadsheetManager;
use crate::infra::google::{
    credential_store, http_client, GoogleSheetsClient, GoogleTokenClient, ServiceAccountSigner,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let roster = match build_roster(&config).await {
        Ok(roster) => roster,
        Err(e) => {
            tracing::error!("Startup failed: {:#}", e);
            eprintln!("Startup failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli::run(cli.command, &roster).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("{}", cli::describe_error(&e));
            ExitCode::FAILURE
        }
    }
}

// ========================================================================
// DEPENDENCY INJECTION
// ========================================================================
// Credentials -> signer -> token manager -> spreadsheet manager -> roster.
// Missing or malformed credentials stop the process here, before any
// command runs.
async fn build_roster(config: &AppConfig) -> anyhow::Result<RosterService<GoogleSheetsClient>> {
    let credentials = match &config.credentials {
        CredentialsSource::File(path) => credential_store::load(path)
            .await
            .with_context(|| format!("loading credentials from {}", path.display()))?,
        CredentialsSource::Inline(json) => credential_store::from_json(json)
            .context("parsing GOOGLE_SERVICE_ACCOUNT_JSON")?,
    };

    let http = http_client(config.http_timeout).context("building HTTP client")?;

    let token_client = GoogleTokenClient::new(http.clone(), credentials.token_uri.clone());
    let signer = ServiceAccountSigner::new(credentials);
    let tokens = Arc::new(TokenManager::new(signer, token_client));

    let sheets = SpreadsheetManager::new(
        GoogleSheetsClient::new(http),
        tokens,
        config.spreadsheet_id.clone(),
    );
    tracing::info!(spreadsheet_id = %sheets.spreadsheet_id(), "Spreadsheet manager ready");

    Ok(RosterService::new(sheets))
}
