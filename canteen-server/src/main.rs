use canteen_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env()?;
    config.ensure_work_dir_structure()?;

    // 3. 日志 (guard 保持到进程退出)
    let log_dir = config.log_dir();
    let _guard = init_logger_with_file(&config.log_level, config.log_json, Some(&log_dir))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.http_port,
        "Canteen server starting"
    );

    // 4. 启动 HTTP 服务器
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
