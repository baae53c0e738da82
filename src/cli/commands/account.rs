use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_record, output_records, output_success, parse_filter, read_stdin_json};
use crate::cli::OutputFormat;
use crate::config::ConnectorConfig;
use crate::record::Record;

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "Fetch one account by id")]
    Find {
        #[arg(help = "Account id")]
        id: String,
        #[arg(long, help = "Expansions to include, e.g. customData")]
        include: Vec<String>,
    },

    #[command(about = "Check whether an account exists")]
    Exists {
        #[arg(help = "Account id")]
        id: String,
    },

    #[command(about = "Create account(s) from a JSON object or array on stdin")]
    Create,

    #[command(about = "Update by id or email, or create, from a JSON object on stdin")]
    Upsert,

    #[command(about = "List accounts matching a filter")]
    List {
        #[arg(long, help = "JSON filter: {\"where\": {...}, \"include\": [...], \"limit\": N}")]
        filter: Option<String>,
    },

    #[command(about = "Count accounts matching a filter")]
    Count {
        #[arg(long, help = "JSON filter")]
        filter: Option<String>,
    },

    #[command(about = "Apply fields to every account matching a filter")]
    Update {
        #[arg(long, help = "JSON filter")]
        filter: Option<String>,
        #[arg(long, help = "JSON object of fields to apply")]
        data: String,
    },

    #[command(about = "Delete every account matching a filter")]
    Destroy {
        #[arg(long, help = "JSON filter")]
        filter: Option<String>,
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
}

pub async fn handle(cmd: AccountCommands, config: ConnectorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let connector = super::connector(config)?;

    match cmd {
        AccountCommands::Find { id, include } => {
            let record = connector.find_with(&id, &include).await?;
            output_record(&output_format, &record)
        }
        AccountCommands::Exists { id } => {
            let exists = connector.exists(&id).await?;
            let message = if exists {
                format!("Account {} exists", id)
            } else {
                format!("Account {} does not exist", id)
            };
            output_success(&output_format, &message, Some(json!({ "exists": exists })))
        }
        AccountCommands::Create => match read_stdin_json()? {
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .map(Record::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                let ids = connector.create_many(records).await?;
                output_success(&output_format, &format!("Created {} accounts", ids.len()), Some(json!({ "ids": ids })))
            }
            value => {
                let id = connector.create(Record::from_json(value)?).await?;
                output_success(&output_format, &format!("Created account {}", id), Some(json!({ "id": id })))
            }
        },
        AccountCommands::Upsert => {
            let record = connector.update_or_create(Record::from_json(read_stdin_json()?)?).await?;
            output_record(&output_format, &record)
        }
        AccountCommands::List { filter } => {
            let records = connector.all(parse_filter(filter.as_deref())?).await?;
            output_records(&output_format, &records)
        }
        AccountCommands::Count { filter } => {
            let count = connector.count(parse_filter(filter.as_deref())?).await?;
            output_success(&output_format, &format!("{} accounts", count), Some(json!({ "count": count })))
        }
        AccountCommands::Update { filter, data } => {
            let fields = match serde_json::from_str::<Value>(&data)? {
                Value::Object(fields) => fields,
                _ => {
                    output_error(&output_format, "--data must be a JSON object", Some("VALIDATION_ERROR"))?;
                    anyhow::bail!("invalid --data");
                }
            };
            let updated = connector.update_all(parse_filter(filter.as_deref())?, fields).await?;
            output_success(&output_format, &format!("Updated {} accounts", updated), Some(json!({ "count": updated })))
        }
        AccountCommands::Destroy { filter, yes } => {
            if !yes {
                output_error(&output_format, "Refusing to delete without --yes", Some("CONFIRMATION_REQUIRED"))?;
                anyhow::bail!("deletion not confirmed");
            }
            let deleted = connector.destroy_all(parse_filter(filter.as_deref())?).await?;
            output_success(&output_format, &format!("Deleted {} accounts", deleted), Some(json!({ "count": deleted })))
        }
    }
}
