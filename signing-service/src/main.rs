//! `qs-signing-service`: HTTP front end for delegated QingStor request signing.
//!
//! ```text
//! qs-signing-service --config server_config.yaml --port 9000
//! ```
//!
//! Every configuration key may also be set through a `QS_SIGNER_*` environment variable, e.g.
//! `QS_SIGNER_SECRET_ACCESS_KEY`. `RUST_LOG` takes precedence over `log_level`.

use {
    anyhow::{Context, Result},
    clap::Parser,
    log::info,
    qs_signing_service::{config::CliArgs, serve, Signer, SigningService},
    tokio::net::TcpListener,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = args.load().context("failed to load configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();

    let credentials = config.credentials().context("incomplete credentials")?;
    info!("Signing with access key {}", credentials.access_key_id());
    let service = SigningService::new(Signer::new(credentials));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on {}", listener.local_addr().context("listener has no local address")?);

    serve(listener, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}
