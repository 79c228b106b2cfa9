use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler, http::create_app,
    local_store::LocalStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod aggregation;
mod backend;
mod clock;
mod configuration;
mod configuration_handler;
mod confirmed_times;
mod conflict;
mod envelope;
mod error;
mod http;
mod local_store;
mod meetings;
mod participants;
mod permissions;
mod profiles;
mod schedules;
mod slot;
#[cfg(test)]
mod testutils;
mod types;
mod validation;
mod window;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Failed to read .env: {err}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("###################");
    println!("# Meeting Planner #");
    println!("###################");

    let configuration = ConfigurationHandler::parse_arguments();
    if configuration.admin_password().is_none() {
        warn!("No admin password configured, admin access is disabled");
    }

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(?err, "Failed to bind {address}");
            return;
        }
    };
    info!("Accessible at {address}");

    let app = create_app(LocalStore::default(), configuration);

    if let Err(err) = axum::serve(listener, app).await {
        error!(?err, "Server stopped");
    }
}
