//! Built-in routing handlers
//!
//! Generic handlers for config-driven graphs. They only move, retag or
//! annotate messages; domain logic belongs to the embedding application.

use tokio::sync::mpsc;
use tracing::{trace, warn};

use contracts::{handler_fn, FluxError, Handler, HandlerConfig, HandlerType, Message};

use crate::graph::HandlerFactory;

/// Factory for [`HandlerType`] handlers.
///
/// `emit` handlers need an output channel; without one they fail to build.
#[derive(Debug, Clone, Default)]
pub struct BuiltinHandlers {
    output: Option<mpsc::UnboundedSender<Message>>,
}

impl BuiltinHandlers {
    /// Factory without an output channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose `emit` handlers send into `output`
    pub fn with_output(output: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            output: Some(output),
        }
    }

    fn required_param<'a>(
        station: &str,
        config: &'a HandlerConfig,
        key: &str,
    ) -> Result<&'a str, FluxError> {
        config.params.get(key).map(String::as_str).ok_or_else(|| {
            FluxError::handler_build(
                station,
                config.handler.as_str(),
                format!("missing param '{key}'"),
            )
        })
    }
}

impl HandlerFactory for BuiltinHandlers {
    fn build(&self, station: &str, config: &HandlerConfig) -> Result<Handler, FluxError> {
        let handler = match config.handler {
            HandlerType::Forward => handler_fn(|msg| Ok(Some(msg))),
            HandlerType::Retag => {
                let to = Self::required_param(station, config, "to")?.to_string();
                handler_fn(move |mut msg| {
                    msg.set_kind(to.as_str());
                    Ok(Some(msg))
                })
            }
            HandlerType::Annotate => {
                let field = Self::required_param(station, config, "field")?.to_string();
                let value = Self::required_param(station, config, "value")?.to_string();
                handler_fn(move |msg| Ok(Some(msg.with(field.clone(), value.clone()))))
            }
            HandlerType::Discard => handler_fn(|_| Ok(None)),
            HandlerType::Emit => {
                let output = self.output.clone().ok_or_else(|| {
                    FluxError::handler_build(station, "emit", "no output channel configured")
                })?;
                let name = station.to_string();
                handler_fn(move |msg| {
                    trace!(station = %name, type_tag = ?msg.kind(), "Emitting message");
                    if output.send(msg).is_err() {
                        warn!(station = %name, "Output channel closed, message dropped");
                    }
                    Ok(None)
                })
            }
        };
        Ok(handler)
    }
}
