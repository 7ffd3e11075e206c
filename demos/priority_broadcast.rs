//! Priority Broadcast Example
//!
//! Registers listeners on three tiers and broadcasts a message. Tier 0
//! listeners run concurrently; tier 5 starts only after both have finished.
//!
//! Run with: cargo run -p demos --bin priority_broadcast

use std::time::Duration;

use contracts::Message;
use dispatcher::{LogListener, PriorityDispatcher, RegisterRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut dispatcher = PriorityDispatcher::new();

    for (name, millis) in [("validate", 30u64), ("enrich", 10)] {
        dispatcher.register(
            RegisterRequest::from_fn(move |msg: Message| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                println!("[p0] {name} done ({:?})", msg.kind());
                Ok(())
            })
            .with_name(name),
        );
    }

    dispatcher.register(
        RegisterRequest::from_sync_fn(|msg| {
            if msg.get("amount").is_none() {
                return Err("amount missing".into());
            }
            Ok(())
        })
        .with_name("audit")
        .with_priority(1),
    );

    dispatcher.register(
        RegisterRequest::new(LogListener::new("console"))
            .with_name("console")
            .with_priority(5),
    );

    let report = dispatcher
        .dispatch(&Message::typed("order").with("id", 42))
        .await;

    for tier in &report.tiers {
        println!(
            "tier {}: {} listener(s), {} failure(s)",
            tier.priority,
            tier.listeners,
            tier.failures.len()
        );
    }
    for failure in report.failures() {
        println!("  {} failed: {}", failure.listener, failure.error);
    }

    if let Err(e) = report.into_result() {
        println!("broadcast finished with errors: {e}");
    }
    Ok(())
}
