use anyhow::{Context, Result};
use clap::Parser;
use rag_quiz_compare::cli::Cli;
use rag_quiz_compare::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置，命令行参数优先
    let mut config = Config::load().context("加载配置失败")?;
    cli.apply(&mut config);
    config.validate().context("配置无效")?;

    // 初始化日志
    logger::init(config.verbose_logging);

    let app = App::initialize(config).await?;

    if cli.history {
        app.show_history().await
    } else {
        app.run(&cli.paths).await
    }
}
