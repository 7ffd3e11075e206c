//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (`#[validate]` 派生)
//! - station 名称唯一
//! - sources 引用已声明的 station
//! - 同一 station 内类型处理器不重复
//! - 内置处理器参数齐全
//! - entry 指向已声明的 station
//! - listener 名称唯一，file listener 需要 `path`

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{FluxError, GraphBlueprint, HandlerType, ListenerType};

/// 校验 GraphBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    validate_fields(blueprint)?;
    validate_station_names(blueprint)?;
    validate_sources(blueprint)?;
    validate_handlers(blueprint)?;
    validate_entry(blueprint)?;
    validate_listeners(blueprint)?;
    Ok(())
}

/// 派生的字段级校验
fn validate_fields(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    blueprint
        .validate()
        .map_err(|e| FluxError::config_validation("blueprint", e.to_string()))
}

/// 校验 station 名称唯一性
fn validate_station_names(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    let mut seen = HashSet::new();
    for station in &blueprint.stations {
        if !seen.insert(station.name.as_str()) {
            return Err(FluxError::config_validation(
                format!("stations[name={}]", station.name),
                "duplicate station name",
            ));
        }
    }
    Ok(())
}

/// 校验连线引用
fn validate_sources(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    let names: HashSet<_> = blueprint.stations.iter().map(|s| s.name.as_str()).collect();
    for station in &blueprint.stations {
        let mut seen = HashSet::new();
        for source in &station.sources {
            if !names.contains(source.as_str()) {
                return Err(FluxError::config_validation(
                    format!("stations[{}].sources", station.name),
                    format!("source '{source}' is not a declared station"),
                ));
            }
            if !seen.insert(source.as_str()) {
                return Err(FluxError::config_validation(
                    format!("stations[{}].sources", station.name),
                    format!("duplicate source '{source}'"),
                ));
            }
        }
    }
    Ok(())
}

/// 校验处理器：类型不重复，参数齐全
fn validate_handlers(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    for station in &blueprint.stations {
        let mut seen = HashSet::new();
        for handler in &station.handlers {
            let tag = handler.tag();
            let field = format!("stations[{}].handlers[type={}]", station.name, tag);
            if !seen.insert(tag.clone()) {
                return Err(FluxError::config_validation(field, "duplicate handler type"));
            }

            let required: &[&str] = match handler.handler {
                HandlerType::Retag => &["to"],
                HandlerType::Annotate => &["field", "value"],
                HandlerType::Forward | HandlerType::Discard | HandlerType::Emit => &[],
            };
            if let Some(missing) = required.iter().find(|k| !handler.params.contains_key(**k)) {
                return Err(FluxError::config_validation(
                    field,
                    format!("handler '{}' requires param '{missing}'", handler.handler.as_str()),
                ));
            }
        }
    }
    Ok(())
}

/// 校验入口 station 存在
fn validate_entry(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    match blueprint.runtime.entry.as_deref() {
        Some(entry) if blueprint.station(entry).is_none() => Err(FluxError::config_validation(
            "runtime.entry",
            format!("entry station '{entry}' is not declared"),
        )),
        _ => Ok(()),
    }
}

/// 校验 listener 配置
fn validate_listeners(blueprint: &GraphBlueprint) -> Result<(), FluxError> {
    let mut seen = HashSet::new();
    for (idx, listener) in blueprint.listeners.iter().enumerate() {
        if !seen.insert(listener.name.as_str()) {
            return Err(FluxError::config_validation(
                format!("listeners[name={}]", listener.name),
                "duplicate listener name",
            ));
        }
        if listener.listener_type == ListenerType::File && !listener.params.contains_key("path") {
            return Err(FluxError::config_validation(
                format!("listeners[{}].params.path", idx),
                "file listener requires 'path'",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, HandlerConfig, ListenerConfig, RuntimeConfig, StationConfig,
    };
    use std::collections::HashMap;

    fn station(name: &str, sources: &[&str]) -> StationConfig {
        StationConfig {
            name: name.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            handlers: vec![HandlerConfig {
                type_tag: None,
                handler: HandlerType::Forward,
                params: HashMap::new(),
            }],
        }
    }

    fn minimal_blueprint() -> GraphBlueprint {
        GraphBlueprint {
            version: ConfigVersion::V1,
            runtime: RuntimeConfig::default(),
            stations: vec![station("input", &[]), station("output", &["input"])],
            listeners: vec![ListenerConfig {
                name: "audit".into(),
                listener_type: ListenerType::Log,
                priority: 0,
                params: HashMap::new(),
            }],
        }
    }

    fn field_of(err: FluxError) -> String {
        match err {
            FluxError::ConfigValidation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_blueprint() {
        assert!(validate(&minimal_blueprint()).is_ok());
    }

    #[test]
    fn test_field_rules_apply() {
        let mut bp = minimal_blueprint();
        bp.stations.clear();
        assert_eq!(field_of(validate(&bp).unwrap_err()), "blueprint");

        let mut bp = minimal_blueprint();
        bp.runtime.max_depth = 0;
        assert!(validate(&bp).unwrap_err().to_string().contains("max_depth"));
    }

    #[test]
    fn test_duplicate_station_name() {
        let mut bp = minimal_blueprint();
        bp.stations.push(station("input", &[]));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate station name"));
    }

    #[test]
    fn test_unknown_and_duplicate_source() {
        let mut bp = minimal_blueprint();
        bp.stations[1].sources.push("ghost".into());
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("'ghost'"));

        let mut bp = minimal_blueprint();
        bp.stations[1].sources.push("input".into());
        assert!(validate(&bp)
            .unwrap_err()
            .to_string()
            .contains("duplicate source"));
    }

    #[test]
    fn test_self_source_is_allowed() {
        let mut bp = minimal_blueprint();
        bp.stations[0].sources.push("input".into());
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_duplicate_handler_type() {
        let mut bp = minimal_blueprint();
        let extra = bp.stations[0].handlers[0].clone();
        bp.stations[0].handlers.push(extra);
        let err = validate(&bp).unwrap_err();
        assert_eq!(
            field_of(err),
            "stations[input].handlers[type=$default]"
        );
    }

    #[test]
    fn test_handler_params_required() {
        let mut bp = minimal_blueprint();
        bp.stations[0].handlers[0].handler = HandlerType::Annotate;
        bp.stations[0].handlers[0]
            .params
            .insert("field".into(), "volume".into());
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("requires param 'value'"));
    }

    #[test]
    fn test_unknown_entry() {
        let mut bp = minimal_blueprint();
        bp.runtime.entry = Some("nowhere".into());
        assert_eq!(field_of(validate(&bp).unwrap_err()), "runtime.entry");
    }

    #[test]
    fn test_listener_rules() {
        let mut bp = minimal_blueprint();
        bp.listeners.push(bp.listeners[0].clone());
        assert!(validate(&bp)
            .unwrap_err()
            .to_string()
            .contains("duplicate listener name"));

        let mut bp = minimal_blueprint();
        bp.listeners[0].listener_type = ListenerType::File;
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "listeners[0].params.path"
        );
    }
}
