//! Dispatch outcome reporting

use contracts::BoxError;

use crate::error::DispatcherError;

/// One listener invocation that returned an error
#[derive(Debug)]
pub struct ListenerFailure {
    /// Tier the listener belongs to
    pub priority: u32,
    /// Registration position within the tier
    pub index: usize,
    /// Listener name
    pub listener: String,
    pub error: BoxError,
}

/// Outcome of one priority tier
#[derive(Debug)]
pub struct TierReport {
    pub priority: u32,
    /// Listeners invoked in this tier
    pub listeners: usize,
    pub failures: Vec<ListenerFailure>,
}

/// Outcome of one broadcast, tiers in ascending priority
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub tiers: Vec<TierReport>,
}

impl DispatchReport {
    /// True when every listener succeeded
    pub fn is_success(&self) -> bool {
        self.tiers.iter().all(|tier| tier.failures.is_empty())
    }

    /// All failures in tier order
    pub fn failures(&self) -> impl Iterator<Item = &ListenerFailure> {
        self.tiers.iter().flat_map(|tier| tier.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.tiers.iter().map(|tier| tier.failures.len()).sum()
    }

    /// Total listeners invoked across all tiers
    pub fn listeners_invoked(&self) -> usize {
        self.tiers.iter().map(|tier| tier.listeners).sum()
    }

    /// Turn recorded failures into an error
    pub fn into_result(self) -> Result<Self, DispatcherError> {
        match self.failure_count() {
            0 => Ok(self),
            failed => Err(DispatcherError::ListenerFailures {
                failed,
                report: self,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(priority: u32, listeners: usize, failed: &[usize]) -> TierReport {
        TierReport {
            priority,
            listeners,
            failures: failed
                .iter()
                .map(|&index| ListenerFailure {
                    priority,
                    index,
                    listener: format!("l{index}"),
                    error: "boom".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = DispatchReport::default();
        assert!(report.is_success());
        assert_eq!(report.listeners_invoked(), 0);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_into_result_counts_failures() {
        let report = DispatchReport {
            tiers: vec![tier(0, 2, &[1]), tier(5, 3, &[0, 2])],
        };
        assert!(!report.is_success());
        assert_eq!(report.listeners_invoked(), 5);

        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "3 listener(s) failed during dispatch");
        match err {
            DispatcherError::ListenerFailures { report, .. } => {
                let names: Vec<_> = report.failures().map(|f| f.listener.as_str()).collect();
                assert_eq!(names, vec!["l1", "l0", "l2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
