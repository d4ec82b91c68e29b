use std::error::Error;

use configuration::ResponderConfiguration;
use dns_server::Server;
use tracing_subscriber::EnvFilter;

use crate::cli_args::CliArgs;
use crate::responder::Responder;

mod cli_args;
mod records;
mod responder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG=debug 可以看到每个报文
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: CliArgs = argh::from_env();
    let config: ResponderConfiguration = configuration::get_config(args.config)?;

    let responder = Responder::from_config(&config)?;
    tracing::info!("loaded {} static records", responder.records().len());
    match &config.upstream {
        Some(upstream) => tracing::info!("forwarding other names to {}", upstream.server_address),
        None => tracing::info!("no upstream, other names get NXDOMAIN"),
    }

    let server = Server::bind(config.server.bind_address(), move |transaction| responder.handle(transaction)).await?;
    println!("pid: {}", std::process::id());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.stop();
    server.wait().await;

    Ok(())
}
