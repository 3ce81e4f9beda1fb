use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// 计算器名称
    pub calculator: String,
    /// 自定义计算器定义（TOML），设置后优先于内置计算器
    pub calculator_file: Option<PathBuf>,
    /// 输入 CSV 文件
    pub input_path: Option<PathBuf>,
    /// 输出目录或 `.json` 文件
    pub output_path: PathBuf,
    /// 调试模式：显示浏览器窗口、输出调试日志
    pub debug: bool,
    /// 等待加载指示器消失的时长（秒）
    pub wait_secs: f64,
    /// 等待加载指示器出现的时长（毫秒）
    pub indicator_appear_ms: u64,
    /// 定位页面元素的超时（秒）
    pub element_timeout_secs: f64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 连接已运行浏览器的调试端口，未设置时自行启动浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 调试模式下的日志文件
    pub log_file: PathBuf,
    /// 是否在终端显示进度条
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calculator: "framingham".to_string(),
            calculator_file: None,
            input_path: None,
            output_path: PathBuf::from("."),
            debug: false,
            wait_secs: 0.5,
            indicator_appear_ms: 500,
            element_timeout_secs: 10.0,
            poll_interval_ms: 100,
            browser_debug_port: None,
            chrome_executable: None,
            log_file: PathBuf::from("death_finder.log"),
            show_progress: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，未设置的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            calculator: var("CALCULATOR").unwrap_or(default.calculator),
            calculator_file: var("CALCULATOR_FILE").map(PathBuf::from),
            input_path: var("INPUT_CSV").map(PathBuf::from),
            output_path: var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.output_path),
            debug: parse_flag("DEBUG", var("DEBUG"))?.unwrap_or(default.debug),
            wait_secs: parse_var("WAIT_SECS", var("WAIT_SECS"), "f64")?
                .unwrap_or(default.wait_secs),
            indicator_appear_ms: parse_var(
                "INDICATOR_APPEAR_MS",
                var("INDICATOR_APPEAR_MS"),
                "u64",
            )?
            .unwrap_or(default.indicator_appear_ms),
            element_timeout_secs: parse_var(
                "ELEMENT_TIMEOUT_SECS",
                var("ELEMENT_TIMEOUT_SECS"),
                "f64",
            )?
            .unwrap_or(default.element_timeout_secs),
            poll_interval_ms: parse_var("POLL_INTERVAL_MS", var("POLL_INTERVAL_MS"), "u64")?
                .unwrap_or(default.poll_interval_ms),
            browser_debug_port: parse_var(
                "BROWSER_DEBUG_PORT",
                var("BROWSER_DEBUG_PORT"),
                "u16",
            )?,
            chrome_executable: var("CHROME_EXECUTABLE").map(PathBuf::from),
            log_file: var("LOG_FILE").map(PathBuf::from).unwrap_or(default.log_file),
            show_progress: parse_flag("SHOW_PROGRESS", var("SHOW_PROGRESS"))?
                .unwrap_or(default.show_progress),
        };
        config.validate()?;
        Ok(config)
    }

    /// 命令行参数覆盖环境变量
    ///
    /// - 位置参数：`<calculator> <csv> [output]`
    /// - `-d` / `--debug`：调试模式
    /// - `--wait <secs>` / `--wait=<secs>`：加载等待时长
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut positionals = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-d" | "--debug" => self.debug = true,
                "--wait" => {
                    let value = args.next().ok_or(ConfigError::Missing {
                        var_name: "--wait".to_string(),
                    })?;
                    self.wait_secs =
                        parse_var("--wait", Some(value), "f64")?.unwrap_or(self.wait_secs);
                }
                flag if flag.starts_with("--wait=") => {
                    let value = flag.trim_start_matches("--wait=").to_string();
                    self.wait_secs =
                        parse_var("--wait", Some(value), "f64")?.unwrap_or(self.wait_secs);
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(ConfigError::InvalidValue {
                        var_name: "args".to_string(),
                        value: flag.to_string(),
                        reason: "未知参数，可用: -d/--debug, --wait <secs>".to_string(),
                    });
                }
                other => positionals.push(other.to_string()),
            }
        }

        let mut positionals = positionals.into_iter();
        if let Some(calculator) = positionals.next() {
            self.calculator = calculator;
        }
        if let Some(input) = positionals.next() {
            self.input_path = Some(PathBuf::from(input));
        }
        if let Some(output) = positionals.next() {
            self.output_path = PathBuf::from(output);
        }

        self.validate()?;
        Ok(self)
    }

    /// 运行前必须提供的输入文件
    pub fn require_input(&self) -> Result<&PathBuf, ConfigError> {
        self.input_path.as_ref().ok_or(ConfigError::Missing {
            var_name: "INPUT_CSV".to_string(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        positive("WAIT_SECS", self.wait_secs)?;
        positive("ELEMENT_TIMEOUT_SECS", self.element_timeout_secs)?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "POLL_INTERVAL_MS".to_string(),
                value: "0".to_string(),
                reason: "轮询间隔必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(var_name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var_name: var_name.to_string(),
            value: value.to_string(),
            reason: "必须是大于 0 的有限数".to_string(),
        })
    }
}

fn parse_var<T: FromStr>(
    var_name: &str,
    raw: Option<String>,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: value.clone(),
                expected_type: expected_type.to_string(),
            })
    })
    .transpose()
}

fn parse_flag(var_name: &str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    raw.map(|value| match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.clone(),
            expected_type: "bool".to_string(),
        }),
    })
    .transpose()
}
