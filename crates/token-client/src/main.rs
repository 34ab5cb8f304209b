//! fetch-token
//!
//! Obtains an access token with the client-credentials grant and prints it
//! to stdout. Logs go to stderr so the output can be captured directly.

use common::secret::ExposeSecret;
use token_client::config::Config;
use token_client::TokenRequester;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        client_id = %config.client_id,
        token_url = %config.token_url,
        http_timeout_seconds = config.http_timeout.as_secs(),
        "Configuration loaded successfully"
    );

    let credentials = config.credentials().map_err(|e| {
        error!("Invalid client credentials: {}", e);
        e
    })?;

    let requester = TokenRequester::with_http_timeout(credentials, config.http_timeout)?;

    match requester.obtain_token().await {
        Ok(Some(token)) => {
            println!("{}", token.secret().expose_secret());
            Ok(())
        }
        Ok(None) => {
            warn!("Authorization server response contained no access token");
            Err("no access token in response".into())
        }
        Err(e) => {
            error!(retryable = e.is_retryable(), "Token request failed: {}", e);
            Err(e.into())
        }
    }
}
