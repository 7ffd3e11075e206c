//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::GraphBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Graph info for JSON output
#[derive(Serialize)]
struct GraphInfo {
    version: String,
    max_depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<String>,
    stations: Vec<StationInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    listeners: Vec<ListenerInfo>,
}

#[derive(Serialize)]
struct StationInfo {
    name: String,
    sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    handlers: Vec<HandlerInfo>,
}

#[derive(Serialize)]
struct HandlerInfo {
    #[serde(rename = "type")]
    type_tag: String,
    handler: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct ListenerInfo {
    name: String,
    listener_type: String,
    priority: u32,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_graph_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize graph info")?;
        println!("{}", json);
    } else {
        print_graph_info(&blueprint, args);
    }

    Ok(())
}

fn build_graph_info(blueprint: &GraphBlueprint, args: &InfoArgs) -> GraphInfo {
    let stations = blueprint
        .stations
        .iter()
        .map(|s| StationInfo {
            name: s.name.clone(),
            sources: s.sources.clone(),
            handlers: if args.handlers {
                s.handlers
                    .iter()
                    .map(|h| HandlerInfo {
                        type_tag: h.tag().to_string(),
                        handler: h.handler.as_str().to_string(),
                        params: h.params.clone(),
                    })
                    .collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    let listeners = if args.listeners {
        blueprint
            .listeners
            .iter()
            .map(|l| ListenerInfo {
                name: l.name.clone(),
                listener_type: format!("{:?}", l.listener_type),
                priority: l.priority,
            })
            .collect()
    } else {
        Vec::new()
    };

    GraphInfo {
        version: format!("{:?}", blueprint.version),
        max_depth: blueprint.runtime.max_depth,
        entry: blueprint.entry_station().map(str::to_string),
        stations,
        listeners,
    }
}

fn branch(is_last: bool) -> (&'static str, &'static str) {
    if is_last {
        ("└─", "   ")
    } else {
        ("├─", "│  ")
    }
}

fn print_graph_info(blueprint: &GraphBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  PipeFlux Graph Blueprint                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Runtime");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Max depth: {}", blueprint.runtime.max_depth);
    println!(
        "   └─ Entry: {}",
        blueprint.entry_station().unwrap_or("(none)")
    );

    println!("\n🚉 Stations ({})", blueprint.stations.len());
    for (i, station) in blueprint.stations.iter().enumerate() {
        let (prefix, child_prefix) = branch(i == blueprint.stations.len() - 1);

        if station.sources.is_empty() {
            println!("   {} {}", prefix, station.name);
        } else {
            println!("   {} {} ← {}", prefix, station.name, station.sources.join(", "));
        }

        if args.handlers && !station.handlers.is_empty() {
            for (j, handler) in station.handlers.iter().enumerate() {
                let (handler_prefix, _) = branch(j == station.handlers.len() - 1);
                println!(
                    "   {}  {} {} → {}",
                    child_prefix,
                    handler_prefix,
                    handler.tag(),
                    handler.handler.as_str()
                );
            }
        } else {
            println!("   {}  └─ {} handlers", child_prefix, station.handlers.len());
        }
    }

    if args.listeners && !blueprint.listeners.is_empty() {
        println!("\n📤 Listeners ({})", blueprint.listeners.len());
        for (i, listener) in blueprint.listeners.iter().enumerate() {
            let (prefix, _) = branch(i == blueprint.listeners.len() - 1);
            println!(
                "   {} {} ({:?}, priority {})",
                prefix, listener.name, listener.listener_type, listener.priority
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[[stations]]
name = "input"

[[stations]]
name = "shout"
sources = ["input"]
[[stations.handlers]]
handler = "retag"
params = { to = "say" }

[[listeners]]
name = "audit"
listener_type = "log"
priority = 3
"#;

    fn args(handlers: bool, listeners: bool) -> InfoArgs {
        InfoArgs {
            config: "unused.toml".into(),
            json: true,
            handlers,
            listeners,
        }
    }

    #[test]
    fn test_info_respects_flags() {
        let bp = config_loader::ConfigLoader::load_from_str(
            CONFIG,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let brief = build_graph_info(&bp, &args(false, false));
        assert_eq!(brief.stations.len(), 2);
        assert!(brief.stations[1].handlers.is_empty());
        assert!(brief.listeners.is_empty());

        let full = build_graph_info(&bp, &args(true, true));
        assert_eq!(full.entry.as_deref(), Some("input"));
        assert_eq!(full.stations[1].sources, vec!["input"]);
        assert_eq!(full.stations[1].handlers[0].type_tag, "$default");
        assert_eq!(full.stations[1].handlers[0].handler, "retag");
        assert_eq!(full.listeners[0].priority, 3);
    }
}
