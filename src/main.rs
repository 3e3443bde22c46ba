use std::process::ExitCode;

use minecraft_mcp_bot::{cli, infra};

#[tokio::main]
async fn main() -> ExitCode {
    infra::logging::init();
    cli::run().await
}
