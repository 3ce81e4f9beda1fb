//! 瞬态元素等待
//!
//! 加载指示器可能在两次轮询之间出现又消失，所以"等它出现"只是尽力而为；
//! "等它消失"才是必须满足的条件。

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FormError;
use crate::infrastructure::{Locator, PageDriver, WaitCondition};

/// 指示器的观测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientOutcome {
    /// 观察到出现并消失
    Observed,
    /// 未观察到出现（已容忍）
    Missed,
}

/// 等待一个瞬态元素先出现、再消失
///
/// - 出现超时：只记录日志
/// - 消失超时：返回 `LoadingIndicatorTimeout`
pub async fn await_transient<D: PageDriver>(
    driver: &D,
    locator: &Locator,
    appear_timeout: Duration,
    vanish_timeout: Duration,
    poll_interval: Duration,
) -> Result<TransientOutcome, FormError> {
    let appeared = driver
        .wait_for(locator, WaitCondition::Visible, appear_timeout, poll_interval)
        .await
        .map_err(FormError::Driver)?;
    if !appeared {
        warn!(
            "⚠️ 加载指示器 {:?} 内未出现，可能已在轮询间隔内完成: {}",
            appear_timeout, locator
        );
    }

    let vanished = driver
        .wait_for(locator, WaitCondition::Invisible, vanish_timeout, poll_interval)
        .await
        .map_err(FormError::Driver)?;
    if !vanished {
        return Err(FormError::LoadingIndicatorTimeout {
            locator: locator.clone(),
            timeout: vanish_timeout,
        });
    }
    debug!("加载指示器已消失: {}", locator);

    Ok(if appeared {
        TransientOutcome::Observed
    } else {
        TransientOutcome::Missed
    })
}
