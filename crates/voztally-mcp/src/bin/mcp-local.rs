use voztally_mcp::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_logging();
    server::serve_stdio().await
}
