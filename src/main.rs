//! Guilda - 监督者调度的 HR 助手
//!
//! 入口：初始化日志、加载配置、构建 Dispatcher，并运行命令行对话循环。
//! 命令：`/clear` 清空历史，`/quit` 退出。

use anyhow::Context;
use guilda::config::{load_config, AppConfig};
use guilda::Dispatcher;
use guilda::agent::{FAILURE_MESSAGE, GREETING};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖；输出到 stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let mut dispatcher = Dispatcher::from_config(&cfg);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    say(&mut stdout, &cfg.app.name, GREETING).await?;
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                dispatcher.clear();
                say(&mut stdout, &cfg.app.name, GREETING).await?;
            }
            _ => match dispatcher.submit(input).await {
                Ok(answer) => say(&mut stdout, &cfg.app.name, &answer).await?,
                Err(e) => {
                    tracing::error!(error = %e, "request failed");
                    say(&mut stdout, &cfg.app.name, FAILURE_MESSAGE).await?;
                }
            },
        }
    }

    Ok(())
}

async fn say(stdout: &mut tokio::io::Stdout, name: &str, text: &str) -> anyhow::Result<()> {
    stdout
        .write_all(format!("{}: {}\n\n", name, text).as_bytes())
        .await
        .context("Failed to write output")?;
    stdout.flush().await?;
    Ok(())
}
