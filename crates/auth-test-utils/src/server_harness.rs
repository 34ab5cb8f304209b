//! Test server harness for E2E testing
//!
//! Provides `TestGuardServer` for spawning the real resource guard router in
//! tests.

use resource_guard::auth::TokenValidator;
use resource_guard::config::Config;
use resource_guard::gate::AuthGate;
use resource_guard::observability::metrics::init_metrics_recorder;
use resource_guard::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Shared Prometheus handle; falls back to an uninstalled recorder when a
/// global one already exists in this process.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the resource guard in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwksServer::start(&[&key]).await;
/// let server = TestGuardServer::spawn(&jwks.jwks_url(), "orders-api").await?;
///
/// let response = reqwest::Client::new()
///     .get(format!("{}/api/v1/protected", server.url()))
///     .bearer_auth(token)
///     .send()
///     .await?;
/// ```
pub struct TestGuardServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestGuardServer {
    /// Spawn a server validating against `jwks_url` (plain HTTP allowed),
    /// with JWKS caching disabled.
    pub async fn spawn(jwks_url: &str, expected_audience: &str) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("JWKS_URL".to_string(), jwks_url.to_string()),
            (
                "EXPECTED_AUDIENCE".to_string(),
                expected_audience.to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWKS_CACHE_TTL_SECONDS".to_string(), "0".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let validator_config = resource_guard::auth::ValidatorConfig::new_insecure_for_tests(
            &config.jwks_url,
            config.expected_audience.clone(),
        )
        .and_then(|c| c.with_leeway(config.jwt_leeway))
        .map_err(|e| anyhow::anyhow!("Failed to create validator config: {}", e))?;

        let validator = TokenValidator::new(validator_config)
            .map_err(|e| anyhow::anyhow!("Failed to create validator: {}", e))?;

        let state = Arc::new(AppState {
            config: config.clone(),
            gate: Arc::new(AuthGate::new(Arc::new(validator))),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestGuardServer {
    fn drop(&mut self) {
        // Abort so the listener is released when the test ends.
        self._handle.abort();
    }
}
