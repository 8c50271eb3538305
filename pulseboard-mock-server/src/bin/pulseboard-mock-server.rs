use std::net::SocketAddr;

use anyhow::Context;
use pulseboard_mock_server::MockStore;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Key clients must present as a bearer token
    #[structopt(long, env = "PULSEBOARD_API_KEY")]
    api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let addr = pulseboard_mock_server::spawn(MockStore::new(), opt.api_key, opt.listen).await?;
    tracing::info!("in-memory record store ready on http://{}", addr);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    tracing::info!("shutting down, all records are lost");
    Ok(())
}
