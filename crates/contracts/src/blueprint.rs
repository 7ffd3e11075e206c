//! GraphBlueprint - Config Loader 输出
//!
//! 描述完整的数据流图配置：站点、连线、处理器、优先级监听器。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::TypeTag;

/// 默认环路重入上限
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的数据流图配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GraphBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 运行时设置
    #[serde(default)]
    #[validate(nested)]
    pub runtime: RuntimeConfig,

    /// 站点定义列表 (顺序即创建顺序)
    #[validate(length(min = 1, message = "at least one station is required"), nested)]
    pub stations: Vec<StationConfig>,

    /// 优先级分发器监听器
    #[serde(default)]
    #[validate(nested)]
    pub listeners: Vec<ListenerConfig>,
}

impl GraphBlueprint {
    /// 按名称查找站点
    pub fn station(&self, name: &str) -> Option<&StationConfig> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// 入口站点：显式配置优先，否则取第一个站点
    pub fn entry_station(&self) -> Option<&str> {
        self.runtime
            .entry
            .as_deref()
            .or_else(|| self.stations.first().map(|s| s.name.as_str()))
    }

    /// 所有连线 (source, destination)
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stations.iter().flat_map(|station| {
            station
                .sources
                .iter()
                .map(move |source| (source.as_str(), station.name.as_str()))
        })
    }
}

/// 运行时设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RuntimeConfig {
    /// 环路中允许的最大嵌套重入次数 (环路保护)
    #[serde(default = "default_max_depth")]
    #[validate(range(min = 1, message = "max_depth must be >= 1"))]
    pub max_depth: usize,

    /// `run` 命令的入口站点
    #[serde(default)]
    pub entry: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            entry: None,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// 站点配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationConfig {
    /// 唯一名称
    #[validate(length(min = 1, message = "station name cannot be empty"))]
    pub name: String,

    /// 上游站点名称
    #[serde(default)]
    pub sources: Vec<String>,

    /// 类型处理器
    #[serde(default)]
    #[validate(nested)]
    pub handlers: Vec<HandlerConfig>,
}

/// 处理器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HandlerConfig {
    /// 处理的消息类型 (缺省 = 默认类型)
    #[serde(rename = "type", default)]
    pub type_tag: Option<TypeTag>,

    /// 内置处理器种类
    pub handler: HandlerType,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl HandlerConfig {
    /// 实际注册的类型 (缺省时为默认类型)
    pub fn tag(&self) -> TypeTag {
        self.type_tag.clone().unwrap_or_default()
    }
}

/// 内置处理器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerType {
    /// 原样转发
    Forward,
    /// 改写类型 (参数 `to`)
    Retag,
    /// 写入字段 (参数 `field`, `value`)
    Annotate,
    /// 吞掉消息，不再传播
    Discard,
    /// 发送到输出通道，不再传播
    Emit,
}

impl HandlerType {
    /// 配置中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Retag => "retag",
            Self::Annotate => "annotate",
            Self::Discard => "discard",
            Self::Emit => "emit",
        }
    }
}

/// 监听器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListenerConfig {
    /// 监听器名称
    #[validate(length(min = 1, message = "listener name cannot be empty"))]
    pub name: String,

    /// 监听器类型
    pub listener_type: ListenerType,

    /// 优先级 (升序执行)
    #[serde(default)]
    pub priority: u32,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// 监听器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerType {
    /// 日志输出
    Log,
    /// 文件输出 (JSON Lines)
    File,
}
