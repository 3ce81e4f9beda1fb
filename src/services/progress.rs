//! 进度估算服务 - 业务能力层
//!
//! 单样本估算：剩余时间 = 上一个样本的耗时 × 剩余样本数。
//! 结果会比较抖动，但对长批次足够作为参考。

use std::io::Write;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ProgressError;

const BAR_WIDTH: usize = 100;

/// 一次进度更新的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
    /// 没有基准时间时为 `None`
    pub eta: Option<TimeDelta>,
}

impl ProgressReport {
    /// 渲染控制台进度条
    pub fn render(&self) -> String {
        let filled = (self.percent as usize).min(BAR_WIDTH);
        let bar = format!("{}{}", "█".repeat(filled), "-".repeat(BAR_WIDTH - filled));
        let eta = self
            .eta
            .map(format_eta)
            .unwrap_or_else(|| "--h --m --s".to_string());
        format!(
            "|{}| {:.2}% ( {} / {} ) ETA {}",
            bar, self.percent, self.completed, self.total, eta
        )
    }
}

/// 把时长格式化为 `HHh MMm SSs`
pub fn format_eta(duration: TimeDelta) -> String {
    let secs = duration.num_seconds().max(0);
    format!(
        "{:02}h {:02}m {:02}s",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// 进度跟踪器
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_sample: Option<DateTime<Utc>>,
    visible: bool,
}

impl ProgressTracker {
    /// `visible` 为 true 时每次更新都会把进度条写到标准错误
    pub fn new(visible: bool) -> Self {
        Self {
            last_sample: None,
            visible,
        }
    }

    /// 在处理下一个样本之前记录时间
    pub fn sample_time(&mut self) {
        self.sample_time_at(Utc::now());
    }

    pub fn sample_time_at(&mut self, at: DateTime<Utc>) {
        self.last_sample = Some(at);
    }

    /// 更新进度
    pub fn update(&self, completed: usize, total: usize) -> ProgressReport {
        let report = self.update_at(completed, total, Utc::now());
        if self.visible {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r{}", report.render());
            if completed >= total {
                let _ = writeln!(stderr);
            }
            let _ = stderr.flush();
        }
        report
    }

    /// 以给定时刻计算进度
    pub fn update_at(&self, completed: usize, total: usize, now: DateTime<Utc>) -> ProgressReport {
        let percent = if total == 0 {
            100.0
        } else {
            100.0 * completed as f64 / total as f64
        };
        ProgressReport {
            completed,
            total,
            percent,
            eta: self.remaining_at(completed, total, now).ok(),
        }
    }

    /// 估算剩余时间
    pub fn remaining(&self, completed: usize, total: usize) -> Result<TimeDelta, ProgressError> {
        self.remaining_at(completed, total, Utc::now())
    }

    pub fn remaining_at(
        &self,
        completed: usize,
        total: usize,
        now: DateTime<Utc>,
    ) -> Result<TimeDelta, ProgressError> {
        let last = self.last_sample.ok_or(ProgressError::NoBaseline)?;
        let per_sample = (now - last).max(TimeDelta::zero());
        let remaining = i32::try_from(total.saturating_sub(completed)).unwrap_or(i32::MAX);
        Ok(per_sample * remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_update_has_no_eta() {
        let tracker = ProgressTracker::new(false);
        let report = tracker.update_at(0, 10, at(0));
        assert_eq!(report.percent, 0.0);
        assert!(report.eta.is_none());
        assert!(report.render().contains("--h --m --s"));
    }

    #[test]
    fn test_eta_from_last_sample() {
        let mut tracker = ProgressTracker::new(false);
        tracker.sample_time_at(at(0));
        let report = tracker.update_at(4, 10, at(3));
        assert_eq!(report.percent, 40.0);
        assert_eq!(report.eta, Some(TimeDelta::seconds(18)));
        assert!(report.render().contains("40.00% ( 4 / 10 ) ETA 00h 00m 18s"));
    }

    #[test]
    fn test_eta_is_never_negative() {
        let mut tracker = ProgressTracker::new(false);
        tracker.sample_time_at(at(10));
        let eta = tracker.remaining_at(1, 5, at(5)).unwrap();
        assert_eq!(eta, TimeDelta::zero());
    }

    #[test]
    fn test_remaining_without_baseline() {
        let tracker = ProgressTracker::new(false);
        tokio_test::assert_err!(tracker.remaining(0, 3));
    }

    #[test]
    fn test_live_update_after_sample_time() {
        let mut tracker = ProgressTracker::new(false);
        assert!(tracker.update(0, 2).eta.is_none());
        tracker.sample_time();
        let eta = tracker.update(1, 2).eta.unwrap();
        assert!(eta >= TimeDelta::zero());
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(TimeDelta::seconds(3725)), "01h 02m 05s");
        assert_eq!(format_eta(TimeDelta::seconds(0)), "00h 00m 00s");
    }

    #[test]
    fn test_empty_run_is_complete() {
        let tracker = ProgressTracker::new(false);
        let report = tracker.update_at(0, 0, at(0));
        assert_eq!(report.percent, 100.0);
        assert!(report.render().starts_with(&format!("|{}|", "█".repeat(100))));
    }
}
