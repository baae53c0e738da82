use anyhow::Context;
use serde_json::{json, Value};
use std::io::Read;

use crate::cli::OutputFormat;
use crate::filter::FilterData;
use crate::record::Record;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output account records, one line each in text mode
pub fn output_records(output_format: &OutputFormat, records: &[Record]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let items: Vec<Value> = records.iter().map(Record::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "accounts": items }))?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No accounts found");
            }
            for record in records {
                println!("{}", describe_record(record));
            }
        }
    }
    Ok(())
}

pub fn output_record(output_format: &OutputFormat, record: &Record) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record.to_json())?),
        OutputFormat::Text => {
            println!("{}", describe_record(record));
            if let Some(custom_data) = &record.custom_data {
                for (key, value) in custom_data {
                    println!("  {}: {}", key, value);
                }
            }
        }
    }
    Ok(())
}

fn describe_record(record: &Record) -> String {
    let name = [&record.given_name, &record.middle_name, &record.surname]
        .iter()
        .filter_map(|part| part.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}  {}  {}",
        record.id.as_deref().unwrap_or("-"),
        record.email.as_deref().unwrap_or("-"),
        name
    )
}

/// Parse a `--filter` argument; absent means match everything
pub fn parse_filter(filter: Option<&str>) -> anyhow::Result<FilterData> {
    match filter {
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("Invalid filter JSON: {}", raw)),
        None => Ok(FilterData::default()),
    }
}

pub fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    serde_json::from_str(&input).context("stdin is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_argument() {
        let filter = parse_filter(Some(r#"{"where":{"surname":"Lee"},"limit":2}"#)).unwrap();
        assert_eq!(filter.limit, Some(2));
        assert!(parse_filter(None).unwrap().where_clause.is_none());
        assert!(parse_filter(Some("not json")).is_err());
    }

    #[test]
    fn describes_record_on_one_line() {
        let record = Record::from_json(json!({
            "id": "abc",
            "email": "ann@example.com",
            "givenName": "Ann",
            "surname": "Lee"
        }))
        .unwrap();
        assert_eq!(describe_record(&record), "abc  ann@example.com  Ann Lee");
    }
}
