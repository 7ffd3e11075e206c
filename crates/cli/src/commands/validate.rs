//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{GraphBlueprint, HandlerType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    entry: Option<String>,
    station_count: usize,
    edge_count: usize,
    handler_count: usize,
    listener_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    entry: blueprint.entry_station().map(str::to_string),
                    station_count: blueprint.stations.len(),
                    edge_count: blueprint.edges().count(),
                    handler_count: blueprint.stations.iter().map(|s| s.handlers.len()).sum(),
                    listener_count: blueprint.listeners.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &GraphBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    let emits = blueprint
        .stations
        .iter()
        .flat_map(|s| s.handlers.iter())
        .any(|h| h.handler == HandlerType::Emit);

    if blueprint.listeners.is_empty() {
        warnings.push("No listeners configured - emitted messages will be dropped".to_string());
    } else if !emits {
        warnings.push("No emit handler configured - listeners will never be called".to_string());
    }

    for station in &blueprint.stations {
        if station.handlers.is_empty() && !station.sources.is_empty() {
            warnings.push(format!(
                "Station '{}' has sources but no handlers - deliveries are ignored",
                station.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Entry: {}", summary.entry.as_deref().unwrap_or("-"));
            println!("  Stations: {}", summary.station_count);
            println!("  Edges: {}", summary.edge_count);
            println!("  Handlers: {}", summary.handler_count);
            println!("  Listeners: {}", summary.listener_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "does/not/exist.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
[[stations]]
name = "input"

[[stations]]
name = "sink"
sources = ["input"]
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(result.valid);

        let summary = result.summary.unwrap();
        assert_eq!(summary.station_count, 2);
        assert_eq!(summary.edge_count, 1);
        assert_eq!(summary.entry.as_deref(), Some("input"));

        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("'sink'"));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config(
            r#"
[[stations]]
name = "input"
sources = ["ghost"]
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("ghost"));
    }
}
