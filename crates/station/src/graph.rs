//! StationGraph - assemble stations from a GraphBlueprint

use indexmap::IndexMap;
use tracing::{info, instrument};

use contracts::{FluxError, GraphBlueprint, Handler, HandlerConfig};

use crate::station::Station;

/// Turns a handler configuration into a runnable handler
pub trait HandlerFactory {
    /// Build the handler configured for `station`
    ///
    /// # Errors
    /// Returns `FluxError::HandlerBuild` when parameters are missing or invalid
    fn build(&self, station: &str, config: &HandlerConfig) -> Result<Handler, FluxError>;
}

/// Named stations wired according to a blueprint.
///
/// Every member is isolated when the graph is dropped, so cycles declared in
/// the blueprint do not outlive it.
pub struct StationGraph {
    stations: IndexMap<String, Station>,
    entry: Option<String>,
}

impl StationGraph {
    /// Build stations, handlers and edges from `blueprint`.
    ///
    /// Stations are created in declaration order, so fan-out order follows
    /// the order in which destinations appear in the blueprint.
    #[instrument(
        name = "station_graph_build",
        skip(blueprint, factory),
        fields(stations = blueprint.stations.len())
    )]
    pub fn from_blueprint(
        blueprint: &GraphBlueprint,
        factory: &dyn HandlerFactory,
    ) -> Result<Self, FluxError> {
        let mut stations = IndexMap::with_capacity(blueprint.stations.len());
        for config in &blueprint.stations {
            let station = Station::builder()
                .name(&config.name)
                .max_depth(blueprint.runtime.max_depth)
                .build();
            for handler in &config.handlers {
                station.insert_handler(handler.tag(), factory.build(&config.name, handler)?);
            }
            stations.insert(config.name.clone(), station);
        }

        let graph = Self {
            stations,
            entry: blueprint.entry_station().map(str::to_string),
        };
        for (source, destination) in blueprint.edges() {
            graph.get(destination)?.add_source(graph.get(source)?);
        }

        info!(
            stations = graph.len(),
            edges = graph.edges().len(),
            entry = ?graph.entry,
            "Station graph built"
        );
        Ok(graph)
    }

    /// Look up a station by name
    pub fn get(&self, name: &str) -> Result<&Station, FluxError> {
        self.stations
            .get(name)
            .ok_or_else(|| FluxError::unknown_station(name))
    }

    /// Entry station (explicit `runtime.entry` or the first declared)
    pub fn entry(&self) -> Option<&Station> {
        self.entry.as_deref().and_then(|name| self.stations.get(name))
    }

    /// Stations in declaration order
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// All edges as (source, destination) names
    pub fn edges(&self) -> Vec<(String, String)> {
        self.stations
            .values()
            .flat_map(|station| {
                station
                    .destination_names()
                    .into_iter()
                    .map(move |dest| (station.name().to_string(), dest))
            })
            .collect()
    }

    /// Number of stations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the graph has no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl Drop for StationGraph {
    fn drop(&mut self) {
        for station in self.stations.values() {
            station.isolate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{handler_fn, HandlerType, Message, RuntimeConfig, StationConfig};
    use std::collections::HashMap;

    struct EchoFactory;

    impl HandlerFactory for EchoFactory {
        fn build(&self, station: &str, config: &HandlerConfig) -> Result<Handler, FluxError> {
            match config.handler {
                HandlerType::Forward => {
                    let name = station.to_string();
                    Ok(handler_fn(move |msg| Ok(Some(msg.with("via", name.clone())))))
                }
                other => Err(FluxError::handler_build(station, other.as_str(), "unsupported")),
            }
        }
    }

    fn station(name: &str, sources: &[&str]) -> StationConfig {
        StationConfig {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            handlers: vec![HandlerConfig {
                type_tag: None,
                handler: HandlerType::Forward,
                params: HashMap::new(),
            }],
        }
    }

    fn blueprint(stations: Vec<StationConfig>) -> GraphBlueprint {
        GraphBlueprint {
            version: Default::default(),
            runtime: RuntimeConfig::default(),
            stations,
            listeners: Vec::new(),
        }
    }

    #[test]
    fn test_build_wires_edges() {
        let bp = blueprint(vec![
            station("a", &[]),
            station("b", &["a"]),
            station("c", &["a", "b"]),
        ]);
        let graph = StationGraph::from_blueprint(&bp, &EchoFactory).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.entry().unwrap().name(), "a");
        assert!(graph.get("c").unwrap().has_source(graph.get("b").unwrap()));
        assert_eq!(
            graph.edges(),
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "c".to_string()),
                ("b".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_source_fails() {
        let bp = blueprint(vec![station("a", &["ghost"])]);
        let err = StationGraph::from_blueprint(&bp, &EchoFactory).err().unwrap();
        assert!(matches!(err, FluxError::UnknownStation { ref name } if name == "ghost"));
    }

    #[test]
    fn test_factory_error_is_returned() {
        let mut config = station("a", &[]);
        config.handlers[0].handler = HandlerType::Emit;
        let err = StationGraph::from_blueprint(&blueprint(vec![config]), &EchoFactory)
            .err()
            .unwrap();
        assert!(err.to_string().contains("emit"));
    }

    #[test]
    fn test_drop_isolates_cycles() {
        let bp = blueprint(vec![station("a", &["b"]), station("b", &["a"])]);
        let graph = StationGraph::from_blueprint(&bp, &EchoFactory).unwrap();
        let a = graph.get("a").unwrap().clone();

        drop(graph);
        assert_eq!(a.source_count(), 0);
        assert_eq!(a.destination_count(), 0);
    }

    #[test]
    fn test_cycle_reports_depth_error() {
        let mut bp = blueprint(vec![station("a", &["b"]), station("b", &["a"])]);
        bp.runtime.max_depth = 8;
        let graph = StationGraph::from_blueprint(&bp, &EchoFactory).unwrap();

        let err = graph.entry().unwrap().dispatch(Message::new()).unwrap_err();
        assert!(matches!(err, FluxError::DepthExceeded { depth: 8, .. }));
    }
}
