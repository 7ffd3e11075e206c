//! Flux Chain Example
//!
//! Builds a small station graph by hand and routes a few messages through it.
//! Optionally loads the graph from a blueprint file instead.
//!
//! Run with: cargo run -p demos --bin flux_chain [graph.toml]

use config_loader::ConfigLoader;
use contracts::Message;
use station::{BuiltinHandlers, Station, StationGraph};
use tokio::sync::mpsc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Some(path) = std::env::args().nth(1) {
        return run_blueprint(&path);
    }

    tracing::info!("Starting Flux Chain Demo");

    // ==== Stage 1: Stations ====
    let input = Station::named("input");
    let upper = Station::named("upper");
    let printer = Station::named("printer");

    upper.add_source(&input);
    printer.add_source(&upper);

    // ==== Stage 2: Handlers ====
    upper.add_handler("say", |mut msg: Message| {
        let shouted = msg.get_str("content").map(str::to_uppercase);
        if let Some(content) = shouted {
            msg.insert("content", content);
        }
        Ok(Some(msg))
    });
    upper.add_default_handler(|msg: Message| Ok(Some(msg.with("note", "untyped input"))));

    printer.add_handler("say", |msg: Message| {
        println!("say     -> {}", msg.get_str("content").unwrap_or(""));
        Ok(None)
    });
    printer.add_default_handler(|msg: Message| {
        println!("default -> {}", msg.to_value());
        Ok(None)
    });

    // ==== Stage 3: Route ====
    input.dispatch(Message::typed("say").with("content", "hello station"))?;
    input.dispatch(Message::new().with("content", "no type here"))?;
    // No handler for this type on `upper`: dropped silently
    input.dispatch(Message::typed("whisper").with("content", "unheard"))?;

    for station in [&input, &upper, &printer] {
        tracing::info!(station = %station.name(), metrics = ?station.metrics(), "Station metrics");
    }
    Ok(())
}

/// Build the graph from a blueprint and print everything its `emit` handlers produce
fn run_blueprint(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(path = %path, "Loading blueprint config");
    let blueprint = ConfigLoader::load_from_path(std::path::Path::new(path))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let graph = StationGraph::from_blueprint(&blueprint, &BuiltinHandlers::with_output(tx))?;
    let entry = graph.entry().ok_or("blueprint has no entry station")?;

    entry.dispatch(Message::typed("say").with("content", "hello blueprint"))?;
    entry.dispatch(Message::new().with("content", "untyped"))?;

    while let Ok(msg) = rx.try_recv() {
        println!("emitted -> {}", msg.to_value());
    }
    Ok(())
}
