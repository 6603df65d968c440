use std::io;
use std::net::{AddrParseError, SocketAddr};

use rmcp::transport::{
    StreamableHttpServerConfig, StreamableHttpService,
    streamable_http_server::session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tower_http::cors::CorsLayer;

use crate::McpServer;

/// Env var overriding the HTTP listen address.
pub const BIND_ADDRESS_VAR: &str = "VOZTALLY_BIND_ADDRESS";
/// Env var holding an `env_logger` filter, e.g. `voztally=debug`.
pub const LOG_VAR: &str = "VOZTALLY_LOG";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8056";
/// Route the streamable HTTP service is mounted on.
pub const MCP_PATH: &str = "/mcp";

/// Logs go to stderr so stdout stays free for the stdio transport.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_VAR, "info"))
        .target(env_logger::Target::Stderr)
        .write_style(env_logger::WriteStyle::Never)
        .init();
}

/// Listen address from an optional override, falling back to
/// [`DEFAULT_BIND_ADDRESS`]. Blank overrides count as unset.
pub fn bind_address(value: Option<&str>) -> Result<SocketAddr, AddrParseError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(addr) => addr.parse(),
        None => DEFAULT_BIND_ADDRESS.parse(),
    }
}

pub async fn serve_stdio() -> anyhow::Result<()> {
    log::info!("Starting voztally MCP server on stdio");

    let service = McpServer::new()?.serve(stdio()).await.inspect_err(|e| {
        log::error!("Serve error: {e:?}");
    })?;
    service.waiting().await?;

    Ok(())
}

/// Serves MCP over streamable HTTP at [`MCP_PATH`] until ctrl-c.
pub async fn serve_http(address: SocketAddr) -> anyhow::Result<()> {
    let ct = tokio_util::sync::CancellationToken::new();

    let service = StreamableHttpService::new(
        || McpServer::new().map_err(|e| io::Error::other(format!("voztally MCP init: {e}"))),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    let router = axum::Router::new()
        .nest_service(MCP_PATH, service)
        .layer(CorsLayer::permissive());
    let listener = tokio::net::TcpListener::bind(address).await?;

    log::info!("Serving voztally MCP on http://{}{}", address, MCP_PATH);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
            ct.cancel();
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_defaults() {
        let expected: SocketAddr = DEFAULT_BIND_ADDRESS.parse().unwrap();
        assert_eq!(bind_address(None).unwrap(), expected);
        assert_eq!(bind_address(Some("  ")).unwrap(), expected);
    }

    #[test]
    fn test_bind_address_override() {
        assert_eq!(
            bind_address(Some(" 0.0.0.0:9000 ")).unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_bind_address_rejects_garbage() {
        assert!(bind_address(Some("localhost")).is_err());
        assert!(bind_address(Some("127.0.0.1:99999")).is_err());
    }
}
