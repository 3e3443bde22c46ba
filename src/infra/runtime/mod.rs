pub mod mcp_transport;
