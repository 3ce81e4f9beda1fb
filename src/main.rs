use anyhow::Result;
use death_finder::utils::logging;
use death_finder::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（命令行参数覆盖环境变量）
    let config = Config::from_env()?.with_args(std::env::args().skip(1))?;

    // 初始化日志
    logging::init(config.debug, &config.log_file)?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
