use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::{Locator, WaitCondition};
use crate::workflow::DriverState;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入/输出路径错误
    #[error("路径错误: {0}")]
    Path(#[from] PathError),
    /// 表格读取错误
    #[error("表格错误: {0}")]
    Extract(#[from] ExtractError),
    /// 表单驱动错误
    #[error("表单错误: {0}")]
    Form(#[from] FormError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 不支持的计算器
    #[error("不支持的计算器: {name} (可选: {available})")]
    UnsupportedCalculator { name: String, available: String },
    /// 结果序列化失败
    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 路径错误
#[derive(Debug, Error)]
pub enum PathError {
    /// 文件不存在
    #[error("文件不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 扩展名不符
    #[error("文件类型无效: {} (需要 .{expected} 文件)", path.display())]
    WrongExtension { path: PathBuf, expected: &'static str },
    /// 参数无效（输出路径）
    #[error("输出路径无效: {} (需要目录或 .{expected} 文件)", path.display())]
    InvalidArgument { path: PathBuf, expected: &'static str },
    /// 写入失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 表格读取错误（文件级，行级问题不会走到这里）
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 表头为空
    #[error("表格为空，缺少表头: {}", path.display())]
    EmptyFile { path: PathBuf },
    /// 缺少必需列
    #[error("缺少必需列 '{column}': {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
    /// 计算器定义解析失败
    #[error("计算器定义解析失败 ({origin}): {source}")]
    CalculatorParseFailed {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    /// 计算器定义不自洽
    #[error("计算器定义无效 ({origin}): {reason}")]
    InvalidCalculator { origin: String, reason: String },
}

/// 表单驱动错误
#[derive(Debug, Error)]
pub enum FormError {
    /// 元素在限定时间内未达到预期状态
    #[error("等待元素超时: {locator} ({condition}, {timeout:?})")]
    ElementTimeout {
        locator: Locator,
        condition: WaitCondition,
        timeout: Duration,
    },
    /// 加载指示器未能在限定时间内消失
    #[error("加载指示器未消失: {locator} ({timeout:?})")]
    LoadingIndicatorTimeout { locator: Locator, timeout: Duration },
    /// 结果文本无法解析
    #[error("无法解析结果文本: '{text}'")]
    UnreadableResult { text: String },
    /// 状态机非法迁移
    #[error("表单状态错误: 当前 {actual:?}，无法执行 {operation}")]
    InvalidState {
        actual: DriverState,
        operation: &'static str,
    },
    /// 底层页面驱动失败
    #[error("页面驱动失败: {0}")]
    Driver(#[source] anyhow::Error),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少必需配置
    #[error("缺少必需配置: {var_name}")]
    Missing { var_name: String },
    /// 数值不合法
    #[error("配置 {var_name} 的值 {value} 不合法: {reason}")]
    InvalidValue {
        var_name: String,
        value: String,
        reason: String,
    },
}

/// 进度估算错误
#[derive(Debug, Error)]
pub enum ProgressError {
    /// 尚未记录样本起始时间
    #[error("尚未记录样本时间，无法估算剩余时间")]
    NoBaseline,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建不支持计算器错误
    pub fn unsupported_calculator(name: impl Into<String>, available: &[&str]) -> Self {
        AppError::UnsupportedCalculator {
            name: name.into(),
            available: available.join(", "),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
