//! Matpack API server binary.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use matpack_api::config::Config;
use matpack_api::server::Server;
use matpack_core::observability::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let format = if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    };
    init_logging(format);

    tracing::info!(
        http_port = config.http_port,
        debug = config.debug,
        data_root = %config.data_root.display(),
        registry_path = %config.registry_path.display(),
        "Matpack API starting"
    );

    let server = Server::new(config);
    server.serve().await?;

    Ok(())
}
