//! LogListener - logs message summary via tracing

use contracts::{Listener, ListenerResult, Message};
use tracing::{info, instrument};

/// Listener that logs message summaries for debugging
pub struct LogListener {
    name: String,
}

impl LogListener {
    /// Create a new LogListener with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Listener name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Listener for LogListener {
    #[instrument(name = "log_listener_on_message", skip(self, message), fields(listener = %self.name))]
    async fn on_message(&self, message: &Message) -> ListenerResult {
        info!(
            listener = %self.name,
            type_tag = message.kind().map(|t| t.as_str()).unwrap_or("-"),
            fields = message.payload().len(),
            "Message received"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_listener_accepts_any_message() {
        let listener = LogListener::new("test_log");
        assert!(listener.on_message(&Message::new()).await.is_ok());
        assert!(listener
            .on_message(&Message::typed("say").with("content", "hi"))
            .await
            .is_ok());
    }

    #[test]
    fn test_log_listener_name() {
        assert_eq!(LogListener::new("my_logger").name(), "my_logger");
    }
}
