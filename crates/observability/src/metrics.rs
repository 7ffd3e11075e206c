//! 数据流指标收集模块
//!
//! 站点处理、投递与优先级分发的运行指标。

use metrics::{counter, histogram};

/// 记录站点处理消息 (找到处理器并执行)
pub fn record_message_processed(station: &str, type_tag: &str) {
    counter!(
        "pipeflux_messages_processed_total",
        "station" => station.to_string(),
        "type" => type_tag.to_string()
    )
    .increment(1);
}

/// 记录站点未找到处理器而丢弃的消息
pub fn record_message_unhandled(station: &str, type_tag: &str) {
    counter!(
        "pipeflux_messages_unhandled_total",
        "station" => station.to_string(),
        "type" => type_tag.to_string()
    )
    .increment(1);
}

/// 记录一次站点间投递
pub fn record_message_delivered(from: &str, to: &str) {
    counter!(
        "pipeflux_messages_delivered_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// 记录一个优先级层完成
pub fn record_tier_completed(priority: u32, listeners: usize, failures: usize) {
    let priority = priority.to_string();
    counter!("pipeflux_tiers_completed_total", "priority" => priority.clone()).increment(1);
    histogram!("pipeflux_tier_listeners", "priority" => priority).record(listeners as f64);
    if failures > 0 {
        counter!("pipeflux_tier_failures_total").increment(failures as u64);
    }
}

/// 记录监听器失败
pub fn record_listener_failure(listener: &str) {
    counter!(
        "pipeflux_listener_failures_total",
        "listener" => listener.to_string()
    )
    .increment(1);
}

/// 记录一次完整分发耗时
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("pipeflux_dispatch_latency_ms").record(latency_ms);
}

/// 分发指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// 分发消息总数
    pub total_messages: u64,

    /// 至少一个监听器失败的消息数
    pub messages_with_failures: u64,

    /// 监听器失败总数
    pub total_failures: u64,

    /// 分发耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各监听器失败次数
    pub failure_counts: std::collections::HashMap<String, u64>,
}

impl DispatchMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update<'a>(&mut self, latency_ms: f64, failed: impl IntoIterator<Item = &'a str>) {
        self.total_messages += 1;
        self.latency_stats.push(latency_ms);

        let mut any_failed = false;
        for listener in failed {
            any_failed = true;
            self.total_failures += 1;
            *self.failure_counts.entry(listener.to_string()).or_insert(0) += 1;
        }
        if any_failed {
            self.messages_with_failures += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_messages: self.total_messages,
            total_failures: self.total_failures,
            messages_with_failures: self.messages_with_failures,
            failure_rate: if self.total_messages > 0 {
                self.messages_with_failures as f64 / self.total_messages as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            listener_failure_counts: self.failure_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_messages: u64,
    pub total_failures: u64,
    pub messages_with_failures: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub listener_failure_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Messages dispatched: {}", self.total_messages)?;
        writeln!(
            f,
            "Messages with failures: {} ({:.2}%)",
            self.messages_with_failures, self.failure_rate
        )?;
        writeln!(f, "Listener failures: {}", self.total_failures)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.listener_failure_counts.is_empty() {
            writeln!(f, "Failures by listener:")?;
            for (listener, count) in &self.listener_failure_counts {
                writeln!(f, "  {}: {}", listener, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
