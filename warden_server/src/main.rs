mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use warden_core::{Credential, Enforcer, FileRepository, Location};

use crate::routes::{router, AppState};

/// Policy distribution endpoint for a warden enforcement point.
#[derive(Debug, Parser)]
#[command(name = "warden-server", version = "0.1.0")]
struct Args {
    /// Path of the policy bundle document
    #[arg(long, default_value = "/var/lib/warden/policies.json")]
    policy_repo: PathBuf,

    /// Location this enforcer evaluates at
    #[arg(long, default_value = "default")]
    location: String,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000")]
    addr: SocketAddr,

    /// Name of the credential this enforcer presents as its own identity
    #[arg(long, default_value = "warden")]
    credential_name: String,

    /// Value of the service credential
    #[arg(long, default_value = "warden")]
    credential_value: String,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .compact()
        .init();

    let Args {
        policy_repo,
        location,
        addr,
        credential_name,
        credential_value,
    } = Args::parse();

    let credential = Credential::new(credential_name, credential_value);
    let repository = Arc::new(FileRepository::new(&policy_repo));
    let enforcer = Arc::new(Enforcer::new(
        repository,
        Location::new(location),
        credential,
    ));
    info!(
        "Enforcer at location {} serving policies from {:?}",
        enforcer.location().name,
        policy_repo
    );

    let app = router(AppState { enforcer });

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received, stopping");
}
