//! # Travel Client CLI
//!
//! Thin command-line front end over the `travel_client` library. It restores
//! any remembered session, runs a single command and prints the result as
//! pretty JSON.
//!
//! ## Configuration
//! Settings come from `TRAVEL_*` environment variables or a `.env` file, see
//! [`ClientConfig::from_env`]. Log verbosity follows `RUST_LOG` (default `info`).
//!
//! ## Usage
//! ```bash
//! travel-client login ann@example.com secret123 --remember
//! travel-client whoami
//! travel-client places temple
//! travel-client place <id>
//! travel-client reviews
//! travel-client stats
//! travel-client logout
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use travel_client::listing::PlaceFilter;
use travel_client::models::ReviewQuery;
use travel_client::navigation::RecordingNavigator;
use travel_client::{validation, ClientConfig, ClientError, TravelClient};

const USAGE: &str = "usage: travel-client <login <email> <password> [--remember] | logout | whoami | places [search] | place <id> | reviews | stats>";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting travel client...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let client = TravelClient::new(&config, Arc::new(RecordingNavigator::new()))
        .context("failed to build travel client")?;

    let restored = client.session().initialize().await;
    if restored.authenticated {
        tracing::info!("🔑 Restored remembered session");
    }

    match (command.as_str(), &args[1..]) {
        ("login", [email, password, rest @ ..]) => {
            let remember = rest.iter().any(|a| a == "--remember");
            validation::validate_login(email, password).map_err(user_facing)?;
            client
                .session()
                .login(email, password, remember)
                .await
                .map_err(user_facing)?;
            print_json(&client.session().snapshot().profile)
        }
        ("logout", []) => {
            client.session().logout();
            tracing::info!("👋 Logged out");
            Ok(())
        }
        ("whoami", []) => match client.session().snapshot().profile {
            Some(profile) => print_json(&profile),
            None => bail!("not signed in"),
        },
        ("places", search) => {
            let places = client.places().list().await.map_err(user_facing)?;
            let filter = PlaceFilter {
                search: search.join(" "),
                ..Default::default()
            };
            print_json(&filter.apply(&places))
        }
        ("place", [id]) => print_json(&client.places().get(id).await.map_err(user_facing)?),
        ("reviews", []) => print_json(
            &client
                .reviews()
                .list(&ReviewQuery::default())
                .await
                .map_err(user_facing)?,
        ),
        ("stats", []) => print_json(&client.admin().stats().await.map_err(user_facing)?),
        _ => bail!(USAGE),
    }
}

fn user_facing(err: ClientError) -> anyhow::Error {
    tracing::debug!("command failed: {:?}", err);
    anyhow!(err.user_message())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
