//! # Dispatcher
//!
//! 优先级广播模块。
//!
//! 负责：
//! - 按优先级分层注册 listeners
//! - 同层并发调用，层与层之间严格串行
//! - 记录失败的 listener，不中断后续层

pub mod dispatcher;
pub mod error;
pub mod listeners;
pub mod metrics;
pub mod report;
pub mod request;

pub use contracts::{Listener, ListenerResult, Message};
pub use dispatcher::{PriorityDispatcher, create_dispatcher, create_listener};
pub use error::DispatcherError;
pub use listeners::{FileListener, LogListener};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use report::{DispatchReport, ListenerFailure, TierReport};
pub use request::{FnListener, RegisterRequest, SyncFnListener, listener_fn, sync_listener_fn};
