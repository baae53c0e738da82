use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config::ConnectorConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the effective configuration with the secret redacted")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, config: ConnectorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let redacted = config.redacted();
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&redacted)?),
                OutputFormat::Text => print!("{}", serde_yaml::to_string(&redacted)?),
            }
            if let Err(e) = config.validate() {
                eprintln!("Warning: {}", e);
            }
            Ok(())
        }
    }
}
