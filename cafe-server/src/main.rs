use cafe_server::{Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 配置, 日志)
    let config = setup_environment();

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "☕ Cafe server starting..."
    );

    // 2. 启动服务器 (初始化状态、后台任务、HTTP)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
