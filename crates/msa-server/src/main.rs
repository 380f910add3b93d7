use msa_core::logging;
use msa_server::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    logging::init(config.log_format);

    msa_server::server::serve(config).await
}
