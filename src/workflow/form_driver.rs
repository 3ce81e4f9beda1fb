//! 表单驱动流程 - 流程层
//!
//! 核心职责：把样本逐个填进远程表单并读回两个结果
//!
//! 状态迁移：
//!
//! ```text
//! Idle → PageLoaded → {Filling → AwaitingResult → ResultCaptured}* → Closed
//!                 ↘ 任一环节出现致命错误 → Error → Closed
//! ```
//!
//! 无论成功还是失败，`run` 返回前都会释放浏览器会话。

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::FormError;
use crate::infrastructure::{Locator, PageDriver, WaitCondition};
use crate::models::{parse_score, Calculator, ResultPair, ResultSet, Sample};
use crate::services::ProgressTracker;
use crate::workflow::sample_ctx::SampleCtx;
use crate::workflow::toggle_state::ToggleState;
use crate::workflow::transient::{await_transient, TransientOutcome};

/// 表单驱动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    PageLoaded,
    Filling,
    AwaitingResult,
    ResultCaptured,
    Error,
    Closed,
}

/// 各类等待的时限
#[derive(Debug, Clone, PartialEq)]
pub struct FormSettings {
    /// 定位输入框、选项和结果元素
    pub element_timeout: Duration,
    /// 等待加载指示器出现（超时可容忍）
    pub indicator_appear_timeout: Duration,
    /// 等待加载指示器消失（超时即失败）
    pub indicator_vanish_timeout: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_secs(10),
            indicator_appear_timeout: Duration::from_millis(500),
            indicator_vanish_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&Config> for FormSettings {
    fn from(config: &Config) -> Self {
        Self {
            element_timeout: Duration::from_secs_f64(config.element_timeout_secs),
            indicator_appear_timeout: Duration::from_millis(config.indicator_appear_ms),
            indicator_vanish_timeout: Duration::from_secs_f64(config.wait_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// 表单驱动
///
/// - 独占一个页面驱动（浏览器会话）
/// - 严格串行处理样本
/// - 不读写文件
pub struct FormDriver<'a, D: PageDriver> {
    driver: D,
    calculator: &'a Calculator,
    settings: FormSettings,
    state: DriverState,
}

impl<'a, D: PageDriver> FormDriver<'a, D> {
    pub fn new(driver: D, calculator: &'a Calculator, settings: FormSettings) -> Self {
        Self {
            driver,
            calculator,
            settings,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// 处理全部样本
    ///
    /// 结果与样本按下标一一对应；出错时不返回部分结果
    pub async fn run(
        &mut self,
        samples: &[Sample],
        progress: &mut ProgressTracker,
    ) -> Result<ResultSet, FormError> {
        let outcome = self.process_all(samples, progress).await;
        if outcome.is_err() {
            self.state = DriverState::Error;
        }

        let closed = self.close().await;
        match (outcome, closed) {
            (Ok(results), Ok(())) => Ok(results),
            (Ok(results), Err(close_err)) => {
                warn!("⚠️ 释放浏览器会话失败（结果已完整）: {}", close_err);
                Ok(results)
            }
            (Err(e), Ok(())) => {
                error!("❌ 运行中止: {}", e);
                Err(e)
            }
            (Err(e), Err(close_err)) => {
                error!("❌ 运行中止: {}", e);
                warn!("⚠️ 释放浏览器会话失败: {}", close_err);
                Err(e)
            }
        }
    }

    async fn process_all(
        &mut self,
        samples: &[Sample],
        progress: &mut ProgressTracker,
    ) -> Result<ResultSet, FormError> {
        let total = samples.len();
        let mut toggles = ToggleState::new();
        let mut results = ResultSet::with_capacity(total);

        self.open().await?;

        for (position, sample) in samples.iter().enumerate() {
            progress.update(position, total);
            progress.sample_time();
            let ctx = SampleCtx::new(position, total);

            let pair = if sample.is_valid() {
                self.fill_sample(sample, &mut toggles).await?;
                let pair = self.await_result(sample).await?;
                debug!("{} 结果: {:?}", ctx, pair);
                pair
            } else {
                debug!("{} 无效样本，跳过", ctx);
                ResultPair::absent()
            };

            debug_assert_eq!(results.len(), position);
            results.push(pair);
        }

        progress.update(total, total);
        Ok(results)
    }

    /// 打开计算器页面并调整缩放
    pub async fn open(&mut self) -> Result<(), FormError> {
        self.expect_state(&[DriverState::Idle], "open")?;

        info!("🌐 打开计算器页面: {}", self.calculator.url);
        self.driver
            .navigate(&self.calculator.url)
            .await
            .map_err(FormError::Driver)?;
        self.driver
            .set_zoom(self.calculator.zoom)
            .await
            .map_err(FormError::Driver)?;

        self.state = DriverState::PageLoaded;
        Ok(())
    }

    /// 填写输入框并切换选项
    ///
    /// 选项只在期望值与上次点击的值不同时才点击
    pub async fn fill_sample(
        &mut self,
        sample: &Sample,
        toggles: &mut ToggleState,
    ) -> Result<(), FormError> {
        self.expect_state(
            &[DriverState::PageLoaded, DriverState::ResultCaptured],
            "fill_sample",
        )?;
        self.state = DriverState::Filling;

        for (field, value) in sample.inputs() {
            let locator = Locator::name(field);
            self.wait_required(&locator, WaitCondition::Present).await?;
            self.driver
                .clear_and_type(&locator, value)
                .await
                .map_err(FormError::Driver)?;
            debug!("已填写 {} = {}", field, value);
        }

        for (field, desired) in sample.toggles() {
            if !toggles.needs_change(field, desired) {
                continue;
            }
            let locator = Locator::toggle(field, desired.as_str());
            self.wait_required(&locator, WaitCondition::Present).await?;
            self.driver
                .activate(&locator)
                .await
                .map_err(FormError::Driver)?;
            toggles.record(field, desired);
            debug!("已点击 {} = {}", field, desired);
        }

        Ok(())
    }

    /// 等待计算完成并读取两个结果
    pub async fn await_result(&mut self, sample: &Sample) -> Result<ResultPair, FormError> {
        self.expect_state(&[DriverState::Filling], "await_result")?;
        self.state = DriverState::AwaitingResult;

        let indicator = Locator::css(&self.calculator.loading_indicator);
        let outcome = await_transient(
            &self.driver,
            &indicator,
            self.settings.indicator_appear_timeout,
            self.settings.indicator_vanish_timeout,
            self.settings.poll_interval,
        )
        .await?;
        if outcome == TransientOutcome::Missed {
            debug!("样本 {} 未观察到加载指示器", sample.index());
        }

        let primary = self.read_score(&self.calculator.primary_result).await?;
        let secondary = self.read_score(&self.calculator.secondary_result).await?;

        self.state = DriverState::ResultCaptured;
        Ok(ResultPair(primary, secondary))
    }

    /// 释放会话，可重复调用
    pub async fn close(&mut self) -> Result<(), FormError> {
        if self.state == DriverState::Closed {
            return Ok(());
        }
        let result = self.driver.close().await.map_err(FormError::Driver);
        self.state = DriverState::Closed;
        result
    }

    async fn read_score(&self, selector: &str) -> Result<Option<f64>, FormError> {
        let locator = Locator::css(selector);
        self.wait_required(&locator, WaitCondition::Visible).await?;
        let text = self
            .driver
            .read_text(&locator)
            .await
            .map_err(FormError::Driver)?;
        parse_score(&text)
    }

    async fn wait_required(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> Result<(), FormError> {
        let found = self
            .driver
            .wait_for(
                locator,
                condition,
                self.settings.element_timeout,
                self.settings.poll_interval,
            )
            .await
            .map_err(FormError::Driver)?;
        if found {
            Ok(())
        } else {
            Err(FormError::ElementTimeout {
                locator: locator.clone(),
                condition,
                timeout: self.settings.element_timeout,
            })
        }
    }

    fn expect_state(
        &self,
        allowed: &[DriverState],
        operation: &'static str,
    ) -> Result<(), FormError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(FormError::InvalidState {
                actual: self.state,
                operation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToggleValue;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Navigate(String),
        Zoom(f64),
        Type(String, String),
        Activate(String),
        Read(String),
        Close,
    }

    #[derive(Debug, Clone, Copy)]
    enum Indicator {
        /// 出现后立即消失
        Flash,
        /// 从未出现
        Never,
        /// 一直不消失
        Stuck,
    }

    struct MockState {
        actions: Vec<Action>,
        missing: Vec<String>,
        indicator: Indicator,
        texts: (String, String),
    }

    /// 按脚本响应的内存页面
    #[derive(Clone)]
    struct MockDriver {
        state: Arc<Mutex<MockState>>,
        indicator_css: String,
        primary_css: String,
        secondary_css: String,
    }

    impl MockDriver {
        fn new(calculator: &Calculator) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState {
                    actions: Vec::new(),
                    missing: Vec::new(),
                    indicator: Indicator::Flash,
                    texts: ("< 5%".to_string(), "12 %".to_string()),
                })),
                indicator_css: calculator.loading_indicator.clone(),
                primary_css: calculator.primary_result.clone(),
                secondary_css: calculator.secondary_result.clone(),
            }
        }

        fn with(self, edit: impl FnOnce(&mut MockState)) -> Self {
            edit(&mut self.state.lock().unwrap());
            self
        }

        fn actions(&self) -> Vec<Action> {
            self.state.lock().unwrap().actions.clone()
        }

        fn log(&self, action: Action) {
            self.state.lock().unwrap().actions.push(action);
        }
    }

    impl PageDriver for MockDriver {
        async fn navigate(&self, url: &str) -> anyhow::Result<()> {
            self.log(Action::Navigate(url.to_string()));
            Ok(())
        }

        async fn set_zoom(&self, zoom: f64) -> anyhow::Result<()> {
            self.log(Action::Zoom(zoom));
            Ok(())
        }

        async fn probe(&self, locator: &Locator, condition: WaitCondition) -> anyhow::Result<bool> {
            let css = locator.to_css();
            let state = self.state.lock().unwrap();
            if css == self.indicator_css {
                return Ok(match (state.indicator, condition) {
                    (Indicator::Flash, _) => true,
                    (Indicator::Never, WaitCondition::Invisible) => true,
                    (Indicator::Never, _) => false,
                    (Indicator::Stuck, WaitCondition::Invisible) => false,
                    (Indicator::Stuck, _) => true,
                });
            }
            let present = !state.missing.contains(&css);
            Ok(match condition {
                WaitCondition::Present | WaitCondition::Visible => present,
                WaitCondition::Invisible => !present,
            })
        }

        async fn clear_and_type(&self, locator: &Locator, text: &str) -> anyhow::Result<()> {
            let field = match locator {
                Locator::Name(name) => name.clone(),
                Locator::Css(css) => css.clone(),
            };
            self.log(Action::Type(field, text.to_string()));
            Ok(())
        }

        async fn activate(&self, locator: &Locator) -> anyhow::Result<()> {
            self.log(Action::Activate(locator.to_css()));
            Ok(())
        }

        async fn read_text(&self, locator: &Locator) -> anyhow::Result<String> {
            let css = locator.to_css();
            self.log(Action::Read(css.clone()));
            let state = self.state.lock().unwrap();
            if css == self.primary_css {
                Ok(state.texts.0.clone())
            } else if css == self.secondary_css {
                Ok(state.texts.1.clone())
            } else {
                anyhow::bail!("unexpected read: {}", css)
            }
        }

        async fn close(&mut self) -> anyhow::Result<()> {
            self.log(Action::Close);
            Ok(())
        }
    }

    fn fast_settings() -> FormSettings {
        FormSettings {
            element_timeout: Duration::from_millis(30),
            indicator_appear_timeout: Duration::from_millis(10),
            indicator_vanish_timeout: Duration::from_millis(30),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn sample(index: usize, valid: bool, sex: ToggleValue) -> Sample {
        Sample::new(
            index,
            valid,
            vec![
                ("age".to_string(), "70".to_string()),
                ("cholesterol".to_string(), "250".to_string()),
                ("hdl_cholesterol".to_string(), "50".to_string()),
                ("systolic_bp".to_string(), "140".to_string()),
            ],
            vec![
                ("sex".to_string(), sex),
                ("smoker".to_string(), ToggleValue::On),
                ("blood_pressure".to_string(), ToggleValue::Off),
            ],
        )
    }

    fn count(actions: &[Action], pred: impl Fn(&Action) -> bool) -> usize {
        actions.iter().filter(|a| pred(a)).count()
    }

    async fn run(
        calculator: &Calculator,
        mock: &MockDriver,
        samples: &[Sample],
    ) -> (Result<ResultSet, FormError>, DriverState) {
        let mut driver = FormDriver::new(mock.clone(), calculator, fast_settings());
        let mut progress = ProgressTracker::new(false);
        let result = driver.run(samples, &mut progress).await;
        (result, driver.state())
    }

    #[tokio::test]
    async fn test_run_fills_and_captures() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let samples = vec![sample(0, true, ToggleValue::On)];

        let (result, state) = run(&calculator, &mock, &samples).await;
        let results = result.unwrap();

        assert_eq!(state, DriverState::Closed);
        assert_eq!(results.as_slice(), &[ResultPair(Some(5.0), Some(12.0))]);

        let actions = mock.actions();
        assert_eq!(actions[0], Action::Navigate(calculator.url.clone()));
        assert_eq!(actions[1], Action::Zoom(0.6));
        assert_eq!(
            actions[2],
            Action::Type("age".to_string(), "70".to_string())
        );
        assert_eq!(
            actions[6],
            Action::Activate("input[name='sex'][value='1']".to_string())
        );
        assert_eq!(actions.last(), Some(&Action::Close));
    }

    #[tokio::test]
    async fn test_repeated_toggle_values_are_not_clicked_again() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let samples = vec![
            sample(0, true, ToggleValue::On),
            sample(1, true, ToggleValue::On),
            sample(2, true, ToggleValue::Off),
        ];

        let (result, _) = run(&calculator, &mock, &samples).await;
        assert_eq!(result.unwrap().len(), 3);

        let actions = mock.actions();
        // 3 个选项首次点击 + 第三个样本切换性别
        assert_eq!(count(&actions, |a| matches!(a, Action::Activate(_))), 4);
        assert_eq!(
            count(&actions, |a| *a
                == Action::Activate("input[name='smoker'][value='1']".to_string())),
            1
        );
        assert_eq!(
            count(&actions, |a| *a
                == Action::Activate("input[name='sex'][value='0']".to_string())),
            1
        );
        // 输入框每次都会重新填写
        assert_eq!(count(&actions, |a| matches!(a, Action::Type(..))), 12);
    }

    #[tokio::test]
    async fn test_invalid_samples_are_skipped() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let samples = vec![
            sample(0, false, ToggleValue::On),
            sample(1, true, ToggleValue::On),
            sample(2, false, ToggleValue::Off),
        ];

        let (result, _) = run(&calculator, &mock, &samples).await;
        let results = result.unwrap();

        assert_eq!(results.len(), samples.len());
        assert!(results.get(0).unwrap().is_absent());
        assert_eq!(results.get(1), Some(&ResultPair(Some(5.0), Some(12.0))));
        assert!(results.get(2).unwrap().is_absent());

        let actions = mock.actions();
        assert_eq!(count(&actions, |a| matches!(a, Action::Type(..))), 4);
        assert_eq!(count(&actions, |a| matches!(a, Action::Read(_))), 2);
    }

    #[tokio::test]
    async fn test_all_invalid_only_opens_and_closes() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let samples = vec![sample(0, false, ToggleValue::On)];

        let (result, _) = run(&calculator, &mock, &samples).await;
        assert!(result.unwrap().get(0).unwrap().is_absent());
        assert_eq!(
            mock.actions(),
            vec![
                Action::Navigate(calculator.url.clone()),
                Action::Zoom(0.6),
                Action::Close,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_input_aborts_and_releases_session() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator)
            .with(|s| s.missing.push("[name='hdl_cholesterol']".to_string()));
        let samples = vec![sample(0, true, ToggleValue::On), sample(1, true, ToggleValue::On)];

        let (result, state) = run(&calculator, &mock, &samples).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            FormError::ElementTimeout { ref locator, .. } if *locator == Locator::name("hdl_cholesterol")
        ));
        assert_eq!(state, DriverState::Closed);
        assert_eq!(mock.actions().last(), Some(&Action::Close));
        assert_eq!(count(&mock.actions(), |a| matches!(a, Action::Read(_))), 0);
    }

    #[tokio::test]
    async fn test_missing_result_element_is_fatal() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let secondary = calculator.secondary_result.clone();
        let mock = MockDriver::new(&calculator).with(|s| s.missing.push(secondary));

        let (result, state) = run(&calculator, &mock, &[sample(0, true, ToggleValue::On)]).await;
        assert!(matches!(
            result,
            Err(FormError::ElementTimeout {
                condition: WaitCondition::Visible,
                ..
            })
        ));
        assert_eq!(state, DriverState::Closed);
    }

    #[tokio::test]
    async fn test_indicator_that_never_appears_is_tolerated() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator).with(|s| s.indicator = Indicator::Never);

        let (result, _) = run(&calculator, &mock, &[sample(0, true, ToggleValue::On)]).await;
        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn test_indicator_that_never_vanishes_is_fatal() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator).with(|s| s.indicator = Indicator::Stuck);

        let (result, state) = run(&calculator, &mock, &[sample(0, true, ToggleValue::On)]).await;
        assert!(matches!(
            result,
            Err(FormError::LoadingIndicatorTimeout { .. })
        ));
        assert_eq!(state, DriverState::Closed);
        assert_eq!(mock.actions().last(), Some(&Action::Close));
    }

    #[tokio::test]
    async fn test_empty_result_text_is_absent() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator)
            .with(|s| s.texts = (String::new(), "< 1%".to_string()));

        let (result, _) = run(&calculator, &mock, &[sample(0, true, ToggleValue::On)]).await;
        assert_eq!(result.unwrap().as_slice(), &[ResultPair(None, Some(1.0))]);
    }

    #[tokio::test]
    async fn test_unreadable_result_is_fatal() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator)
            .with(|s| s.texts = ("N/A".to_string(), "1".to_string()));

        let (result, _) = run(&calculator, &mock, &[sample(0, true, ToggleValue::On)]).await;
        assert!(matches!(result, Err(FormError::UnreadableResult { .. })));
    }

    #[tokio::test]
    async fn test_fill_before_open_is_rejected() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let mut driver = FormDriver::new(mock.clone(), &calculator, fast_settings());
        let mut toggles = ToggleState::new();

        let err = driver
            .fill_sample(&sample(0, true, ToggleValue::On), &mut toggles)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::InvalidState {
                actual: DriverState::Idle,
                ..
            }
        ));
        assert!(mock.actions().is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let calculator = Calculator::builtin("framingham").unwrap();
        let mock = MockDriver::new(&calculator);
        let mut driver = FormDriver::new(mock.clone(), &calculator, fast_settings());

        driver.open().await.unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();

        assert_eq!(driver.state(), DriverState::Closed);
        assert_eq!(count(&mock.actions(), |a| *a == Action::Close), 1);
    }
}
