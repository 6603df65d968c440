use anyhow::Context;
use voztally_mcp::server::{self, BIND_ADDRESS_VAR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_logging();

    let value = std::env::var(BIND_ADDRESS_VAR).ok();
    let address = server::bind_address(value.as_deref())
        .with_context(|| format!("invalid {BIND_ADDRESS_VAR}: {value:?}"))?;

    server::serve_http(address).await
}
