mod mcp;
pub mod server;

pub use mcp::McpServer;
