use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::ConnectorConfig;
use crate::error::ConnectorError;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Check a username or email and password against the application")]
    Login {
        #[arg(help = "Username or email")]
        login: String,
        #[arg(long, help = "Password (falls back to CONNECTOR_PASSWORD)")]
        password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, config: ConnectorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { login, password } => {
            let password = match password.or_else(|| std::env::var("CONNECTOR_PASSWORD").ok()) {
                Some(password) => password,
                None => anyhow::bail!("No password given; pass --password or set CONNECTOR_PASSWORD"),
            };

            let connector = super::connector(config)?;
            match connector.authenticate(&login, &password).await {
                Ok(record) => output_success(
                    &output_format,
                    &format!("Authenticated {}", login),
                    Some(json!({ "account": record.to_json() })),
                ),
                Err(e @ ConnectorError::RemoteClient { .. }) => {
                    output_error(&output_format, &e.to_string(), Some(e.error_code()))?;
                    Err(e.into())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
