//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 → 站点图 → 优先级分发 e2e 测试

#[cfg(test)]
mod contract_tests {
    use contracts::{Message, TypeTag, DEFAULT_TYPE};
    use serde_json::json;

    #[test]
    fn test_message_wire_format() {
        let msg = Message::typed("say").with("content", "hi");
        assert_eq!(msg.to_value(), json!({ "type": "say", "content": "hi" }));

        let untyped = Message::from_value(json!({ "content": "hi" })).unwrap();
        assert!(untyped.kind().is_none());
        assert_eq!(serde_json::to_string(&untyped).unwrap(), r#"{"content":"hi"}"#);
    }

    #[test]
    fn test_default_tag_is_reserved() {
        assert_eq!(TypeTag::default(), DEFAULT_TYPE);
        assert!(TypeTag::default().is_default());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FluxError, Message};
    use dispatcher::{create_dispatcher, RegisterRequest};
    use station::{BuiltinHandlers, StationGraph};
    use tokio::sync::mpsc;

    const GRAPH: &str = r#"
[runtime]
entry = "input"

[[stations]]
name = "input"

[[stations]]
name = "shout"
sources = ["input"]
[[stations.handlers]]
type = "say"
handler = "retag"
params = { to = "yell" }
[[stations.handlers]]
handler = "annotate"
params = { field = "seen_by", value = "shout" }

[[stations]]
name = "out"
sources = ["shout"]
[[stations.handlers]]
type = "yell"
handler = "emit"
[[stations.handlers]]
handler = "emit"

[[listeners]]
name = "console"
listener_type = "log"
"#;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str, priority: u32) -> RegisterRequest {
        let log = log.clone();
        RegisterRequest::from_fn(move |msg: Message| {
            let log = log.clone();
            async move {
                // Lower tiers sleep so the barrier between tiers is observable
                if priority == 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                let kind = msg.kind().map(|k| k.to_string()).unwrap_or_default();
                log.lock().unwrap().push(format!("{label}:{kind}"));
                Ok(())
            }
        })
        .with_priority(priority)
        .with_name(label)
    }

    /// End-to-end test: TOML -> StationGraph -> emit channel -> PriorityDispatcher
    ///
    /// 验证完整的数据流：
    /// 1. ConfigLoader 解析并校验蓝图
    /// 2. StationGraph 按类型路由、改写并输出消息
    /// 3. PriorityDispatcher 按优先级广播输出消息
    #[tokio::test]
    async fn test_e2e_graph_to_dispatcher() {
        let blueprint = ConfigLoader::load_from_str(GRAPH, ConfigFormat::Toml).unwrap();

        let log = Log::default();
        let mut dispatcher = create_dispatcher(&blueprint.listeners).unwrap();
        dispatcher.register(recorder(&log, "late", 1));
        dispatcher.register(recorder(&log, "early", 0));

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = dispatcher.spawn(rx);

        let graph = StationGraph::from_blueprint(&blueprint, &BuiltinHandlers::with_output(tx))
            .unwrap();
        let entry = graph.entry().unwrap().clone();

        entry.dispatch(Message::typed("say").with("content", "hi")).unwrap();
        entry.dispatch(Message::new().with("content", "plain")).unwrap();
        entry.dispatch(Message::typed("whisper")).unwrap();

        let shout = graph.get("shout").unwrap().metrics();
        assert_eq!(shout.processed, 2);
        assert_eq!(shout.unhandled, 1);

        drop(entry);
        drop(graph);
        let aggregator = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatcher did not drain")
            .unwrap();

        assert_eq!(aggregator.total_messages, 2);
        assert_eq!(aggregator.total_failures, 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["early:yell", "late:yell", "early:$default", "late:$default"]
        );
    }

    #[tokio::test]
    async fn test_listener_failure_does_not_stop_routing() {
        let blueprint = ConfigLoader::load_from_str(GRAPH, ConfigFormat::Toml).unwrap();

        let mut dispatcher = create_dispatcher(&[]).unwrap();
        dispatcher.register(
            RegisterRequest::from_sync_fn(|_| Err("listener down".into())).with_name("flaky"),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = dispatcher.spawn(rx);

        let graph = StationGraph::from_blueprint(&blueprint, &BuiltinHandlers::with_output(tx))
            .unwrap();
        for _ in 0..3 {
            graph.entry().unwrap().dispatch(Message::typed("say")).unwrap();
        }
        drop(graph);

        let aggregator = handle.await.unwrap();
        assert_eq!(aggregator.total_messages, 3);
        assert_eq!(aggregator.messages_with_failures, 3);
        assert_eq!(aggregator.failure_counts.get("flaky"), Some(&3));
    }

    #[tokio::test]
    async fn test_file_listener_archives_emitted_messages() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("out").join("archive.jsonl");
        let config = format!(
            "{GRAPH}\n[[listeners]]\nname = \"archive\"\nlistener_type = \"file\"\npriority = 5\nparams = {{ path = \"{}\" }}\n",
            archive.display()
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let dispatcher = create_dispatcher(&blueprint.listeners).unwrap();
        assert_eq!(dispatcher.priorities(), vec![0, 5]);
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = dispatcher.spawn(rx);

        let graph = StationGraph::from_blueprint(&blueprint, &BuiltinHandlers::with_output(tx))
            .unwrap();
        graph
            .entry()
            .unwrap()
            .dispatch(Message::new().with("content", "plain"))
            .unwrap();
        drop(graph);
        handle.await.unwrap();

        let line = std::fs::read_to_string(&archive).unwrap();
        let archived: Message = serde_json::from_str(line.trim()).unwrap();
        assert!(archived.kind().unwrap().is_default());
        assert_eq!(archived.get_str("seen_by"), Some("shout"));
    }

    #[test]
    fn test_configured_cycle_is_bounded() {
        let config = r#"
[runtime]
max_depth = 16

[[stations]]
name = "ping"
sources = ["pong"]
[[stations.handlers]]
handler = "forward"

[[stations]]
name = "pong"
sources = ["ping"]
[[stations.handlers]]
handler = "forward"
"#;
        let blueprint = ConfigLoader::load_from_str(config, ConfigFormat::Toml).unwrap();
        let graph = StationGraph::from_blueprint(&blueprint, &BuiltinHandlers::new()).unwrap();
        let ping = graph.get("ping").unwrap().clone();

        let err = ping.dispatch(Message::new()).unwrap_err();
        assert!(matches!(err, FluxError::DepthExceeded { depth: 16, .. }));

        drop(graph);
        assert_eq!(ping.source_count(), 0);
        assert_eq!(ping.destination_count(), 0);
    }
}
