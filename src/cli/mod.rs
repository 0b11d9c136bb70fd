//! Command line interface

use crate::api::{Client, ParamValue, RequestOutcome, ResponseFormat, ResponseMode, UrlParameters};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zoho-crm")]
#[command(about = "A CLI tool for the Zoho CRM API", version)]
pub struct Cli {
    /// Path to a config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call a module method
    Request(RequestArgs),
    /// List the enabled modules and their methods
    Modules,
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct RequestArgs {
    /// Module name, e.g. Leads
    pub module: String,
    /// Method name, e.g. getRecords
    pub method: String,
    /// Extra parameter as key=value, repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
    /// Fetch every page of the result set
    #[arg(long)]
    pub paginate: bool,
    /// Wire format: json or xml
    #[arg(long, default_value = "json")]
    pub format: ResponseFormat,
    /// Output shape: full, records or entity
    #[arg(long)]
    pub mode: Option<ResponseMode>,
    /// Abort pagination after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Parse `key=value`; numeric values are sent as integers
pub fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", input))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", input));
    }
    Ok((key.to_string(), value.to_string()))
}

fn to_parameters(pairs: &[(String, String)]) -> UrlParameters {
    pairs
        .iter()
        .map(|(key, value)| {
            let value = match value.parse::<i64>() {
                Ok(number) => ParamValue::Int(number),
                Err(_) => ParamValue::Str(value.clone()),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Run a request and return its JSON rendering
///
/// With auto-fetch disabled on the client, pagination is driven here so
/// that `--timeout` applies to the whole page loop.
pub async fn run_request(client: &Client, args: RequestArgs) -> Result<serde_json::Value> {
    let params = to_parameters(&args.params);
    let mode = args.mode.unwrap_or(client.preferences().response_mode);

    let outcome = client
        .request_as(mode, &args.module, &args.method, params, args.paginate, args.format)
        .await?;

    let output = match outcome {
        RequestOutcome::Completed(output) => output,
        RequestOutcome::Incomplete { partial, error } => {
            return Err(error).with_context(|| {
                format!("Pagination stopped with {} partial record(s)", partial.len())
            });
        }
        RequestOutcome::Paginator(mut paginator) => {
            match args.timeout {
                Some(secs) => {
                    paginator
                        .fetch_all_with_timeout(std::time::Duration::from_secs(secs))
                        .await
                }
                None => paginator.fetch_all().await,
            }
            .with_context(|| {
                format!(
                    "Pagination stopped after {} page(s) with {} record(s)",
                    paginator.pages_fetched(),
                    paginator.records().len()
                )
            })?;
            paginator.into_aggregated_response()?.transform(mode)
        }
    };

    info!("{} {} returned {} output", args.module, args.method, output.mode());
    Ok(output.to_json())
}

pub fn list_modules(client: &Client) -> serde_json::Value {
    let modules: serde_json::Map<String, serde_json::Value> = client
        .supported_modules()
        .iter()
        .filter_map(|name| client.module(name))
        .map(|module| {
            (
                module.name().to_string(),
                serde_json::Value::from(module.methods().collect::<Vec<_>>()),
            )
        })
        .collect();
    serde_json::Value::Object(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("selectColumns=Leads(Company)"),
            Ok(("selectColumns".to_string(), "Leads(Company)".to_string()))
        );
        assert_eq!(parse_key_value("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_numeric_params_become_integers() {
        let params = to_parameters(&[
            ("toIndex".to_string(), "50".to_string()),
            ("id".to_string(), "abc".to_string()),
        ]);
        assert_eq!(params.get("toIndex"), Some(&ParamValue::Int(50)));
        assert_eq!(params.get("id"), Some(&ParamValue::from("abc")));
    }

    #[test]
    fn test_cli_parses_request() {
        let cli = Cli::try_parse_from([
            "zoho-crm", "request", "Leads", "getRecords", "-p", "toIndex=5", "--paginate",
            "--format", "xml", "--mode", "records",
        ])
        .unwrap();

        match cli.command {
            Commands::Request(args) => {
                assert_eq!(args.module, "Leads");
                assert!(args.paginate);
                assert_eq!(args.format, ResponseFormat::Xml);
                assert_eq!(args.mode, Some(ResponseMode::RecordsArray));
                assert_eq!(args.params.len(), 1);
            }
            _ => panic!("expected request command"),
        }
    }

    #[test]
    fn test_list_modules() {
        let client = Client::new("t").unwrap();
        let modules = list_modules(&client);
        assert!(modules["Users"].as_array().unwrap().contains(&serde_json::json!("getUsers")));
    }
}
