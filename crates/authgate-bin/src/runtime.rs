// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Turns a loaded [`AuthgateConfig`] into a running service:
//!
//! - Signing-secret resolution
//! - Credential store, token codec and the revocation and session purge tasks
//! - Audit reporter
//! - API server with graceful shutdown

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use authgate_api::{
    auth::parse_algorithm, spawn_purge_task, ApiConfig, ApiServer, CorsConfig, TokenCodec,
    TokenConfig,
};
use authgate_config::{
    resolve_signing_secret, AuditSettings, AuthgateConfig, ConfigError, ConfigLoader, EnvSource,
    ProcessEnv, ResolvedSecret, SecretSource, SecretValue, ServerConfig, TokenSettings,
};
use authgate_core::{
    seed_default_users, spawn_session_purge_task, AuditReporter, CredentialStore, HttpAuditSink,
    InMemoryCredentialStore, InMemorySessionStore,
};
use tokio::net::TcpListener;

use crate::commands::generate_secret;
use crate::error::{BinError, BinResult};
use crate::shutdown::{drain_with_timeout, ShutdownCoordinator};

// =============================================================================
// Runtime
// =============================================================================

/// A configured, not yet started, authgate service.
pub struct Runtime {
    config: Arc<AuthgateConfig>,
    secret: ResolvedSecret,
    seed: bool,
    shutdown: ShutdownCoordinator,
}

impl Runtime {
    /// Returns the effective configuration.
    pub fn config(&self) -> &AuthgateConfig {
        &self.config
    }

    /// Returns `true` if default accounts will be seeded.
    pub fn seeds_default_users(&self) -> bool {
        self.seed
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds the credential store, codec, audit reporter and API server.
    pub async fn build_server(&self) -> BinResult<ApiServer> {
        let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());

        if self.seed {
            let seeded = seed_default_users(store.as_ref()).await?;
            info!(count = seeded.len(), "Seeded default accounts");
        }

        let token_config = token_config(&self.config.token, self.secret.value.expose())?;
        let codec = TokenCodec::new(token_config, store)?;
        let audit = audit_reporter(&self.config.audit)?;

        let server = ApiServer::builder()
            .config(api_config(&self.config))
            .codec(codec)
            .audit(audit)
            .sessions(InMemorySessionStore::default())
            .build()?;

        Ok(server)
    }

    /// Binds the configured address and serves until SIGINT/SIGTERM.
    pub async fn run(self) -> BinResult<()> {
        let addr = SocketAddr::new(self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BinError::init(format!("Failed to bind {}: {}", addr, e)))?;

        self.run_on(listener).await
    }

    /// Serves on an already bound listener until shutdown is initiated.
    pub async fn run_on(self, listener: TcpListener) -> BinResult<()> {
        info!(version = authgate_core::VERSION, "Starting authgate");

        let server = self.build_server().await?;
        let state = server.state().clone();
        let purge = spawn_purge_task(
            state.codec().revocations(),
            Duration::from_secs(self.config.server.revocation_purge_interval_secs.max(1)),
        );
        let session_purge = spawn_session_purge_task(
            state.sessions().clone(),
            Duration::from_secs(self.config.session.idle_timeout_secs),
            Duration::from_secs(self.config.session.purge_interval_secs.max(1)),
        );

        let signal = self.shutdown.shutdown_signal();
        let mut server_task = tokio::spawn(server.serve(listener, signal.wait()));

        tokio::select! {
            result = &mut server_task => {
                purge.abort();
                session_purge.abort();
                return flatten(result);
            }
            _ = self.shutdown.wait_for_os_signal() => {}
        }

        let drain = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        info!(drain_secs = drain.as_secs(), "Draining in-flight requests");

        let result = match drain_with_timeout(&mut server_task, drain).await {
            Some(result) => flatten(result),
            None => {
                server_task.abort();
                Ok(())
            }
        };
        purge.abort();
        session_purge.abort();

        let stats = state.orchestrator().audit().stats();
        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            timeouts = stats.timeouts,
            rejected = stats.rejected,
            "Audit delivery summary"
        );
        info!("authgate shutdown complete");

        result
    }
}

fn flatten(
    result: Result<authgate_api::ApiResult<()>, tokio::task::JoinError>,
) -> BinResult<()> {
    match result {
        Ok(inner) => inner.map_err(BinError::from),
        Err(e) => Err(BinError::init(format!("Server task failed: {}", e))),
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Maps token settings onto a codec configuration.
pub fn token_config(settings: &TokenSettings, secret: &str) -> BinResult<TokenConfig> {
    let mut config = TokenConfig::new(secret)
        .with_ttl_minutes(settings.ttl)
        .with_refresh_ttl_minutes(settings.refresh_ttl)
        .with_leeway_secs(u64::try_from(settings.leeway).unwrap_or(0))
        .with_blacklist(settings.blacklist_enabled)
        .with_grace_period_secs(settings.blacklist_grace_period);
    config.issuer = settings.issuer.clone();
    config.algorithm = parse_algorithm(&settings.algorithm.to_uppercase())?;
    Ok(config)
}

/// Builds the audit reporter. Disabled settings yield a reporter that
/// never contacts the network.
pub fn audit_reporter(settings: &AuditSettings) -> BinResult<AuditReporter> {
    if !settings.enabled {
        info!("Audit reporting disabled");
        return Ok(AuditReporter::disabled());
    }

    let timeout = Duration::from_secs(settings.timeout_secs);
    let sink = HttpAuditSink::with_timeout(&settings.service_base_url, timeout)
        .map_err(|e| BinError::init(format!("Failed to create audit sink: {}", e)))?;
    info!(endpoint = sink.endpoint(), "Audit reporting enabled");

    Ok(AuditReporter::new(Arc::new(sink)).with_timeout(timeout))
}

/// Maps the server section onto the API configuration.
pub fn api_config(config: &AuthgateConfig) -> ApiConfig {
    let server: &ServerConfig = &config.server;

    let mut cors = if server.cors.allowed_origins.iter().any(|o| o == "*") {
        CorsConfig::default()
    } else {
        CorsConfig::strict(server.cors.allowed_origins.clone())
    };
    cors.allow_credentials = server.cors.allow_credentials;

    let mut api = ApiConfig::default()
        .with_host(server.host)
        .with_port(server.port)
        .with_base_path(server.base_path.clone())
        .with_session_cookie(config.session.cookie_name.clone())
        .with_cors(cors);
    api.request_timeout_secs = server.request_timeout_secs;
    api.shutdown_timeout_secs = server.shutdown_timeout_secs;
    api.revocation_purge_interval_secs = server.revocation_purge_interval_secs;
    api
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<AuthgateConfig>,
    env: Arc<dyn EnvSource>,
    seed: bool,
    dev_mode: bool,
}

impl RuntimeBuilder {
    /// Creates a builder reading the process environment.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: None,
            env: Arc::new(ProcessEnv),
            seed: false,
            dev_mode: false,
        }
    }

    /// Loads configuration from `path`; a missing file means defaults.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Uses an already loaded configuration.
    pub fn config(mut self, config: AuthgateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the environment used for overrides and the secret.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Seeds default accounts regardless of configuration.
    pub fn seed(mut self, enabled: bool) -> Self {
        self.seed = enabled;
        self
    }

    /// Development mode: implies seeding and tolerates a missing secret.
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Loads configuration and resolves the signing secret.
    pub fn build(self) -> BinResult<Runtime> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::init("No configuration provided"))?;
                let loader = ConfigLoader::new().with_env(EnvHandle(Arc::clone(&self.env)));
                loader
                    .load_or_default(&path)
                    .map_err(|e| BinError::from(e).with_context(format!("loading {}", path.display())))?
            }
        };

        let secret = match resolve_signing_secret(&config.token, self.env.as_ref()) {
            Ok(secret) => secret,
            Err(ConfigError::MissingSecret) if self.dev_mode => {
                warn!("No signing secret configured; using an ephemeral development secret");
                ResolvedSecret {
                    value: SecretValue::new(generate_secret(32)),
                    source: SecretSource::ConfigFile,
                }
            }
            Err(e) => return Err(e.into()),
        };

        let seed = self.seed || self.dev_mode || config.seed.default_users;

        Ok(Runtime {
            config: Arc::new(config),
            secret,
            seed,
            shutdown: ShutdownCoordinator::new(),
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shares one environment between the builder and the loader.
struct EnvHandle(Arc<dyn EnvSource>);

impl EnvSource for EnvHandle {
    fn var(&self, name: &str) -> Option<String> {
        self.0.var(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_config::MapEnv;

    const SECRET: &str = "runtime-test-secret-0123456789abcdef";

    fn env() -> MapEnv {
        MapEnv::new().with("JWT_SECRET", SECRET)
    }

    #[test]
    fn test_builder_requires_config() {
        let result = RuntimeBuilder::new().env(env()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_secret_fails_outside_dev_mode() {
        let result = RuntimeBuilder::new()
            .env(MapEnv::new())
            .config(AuthgateConfig::default())
            .build();
        assert!(matches!(
            result,
            Err(BinError::Config(ConfigError::MissingSecret))
        ));
    }

    #[test]
    fn test_dev_mode_generates_secret_and_seeds() {
        let runtime = RuntimeBuilder::new()
            .env(MapEnv::new())
            .config(AuthgateConfig::default())
            .dev_mode(true)
            .build()
            .unwrap();

        assert!(runtime.seeds_default_users());
        assert!(!runtime.secret.is_weak());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let runtime = RuntimeBuilder::new()
            .env(env())
            .config_path("/nonexistent/authgate.yaml")
            .build()
            .unwrap();

        assert_eq!(runtime.config().server.port, 8080);
        assert_eq!(runtime.secret.source, SecretSource::Environment);
        assert!(!runtime.seeds_default_users());
    }

    #[test]
    fn test_token_config_mapping() {
        let settings = TokenSettings {
            ttl: 15,
            refresh_ttl: 30,
            leeway: 5,
            algorithm: "hs512".to_string(),
            blacklist_grace_period: 10,
            ..TokenSettings::default()
        };

        let config = token_config(&settings, SECRET).unwrap();
        assert_eq!(config.ttl_minutes, 15);
        assert_eq!(config.refresh_ttl_minutes, 30);
        assert_eq!(config.leeway_secs, 5);
        assert_eq!(config.blacklist_grace_period_secs, 10);
        assert_eq!(config.algorithm, parse_algorithm("HS512").unwrap());
    }

    #[test]
    fn test_api_config_mapping() {
        let mut config = AuthgateConfig::default();
        config.server.port = 9100;
        config.server.base_path = "/v1".to_string();
        config.server.cors.allowed_origins = vec!["https://app.example.com".to_string()];
        config.session.cookie_name = "sid".to_string();

        let api = api_config(&config);
        assert_eq!(api.port, 9100);
        assert_eq!(api.route("/auth/login"), "/v1/auth/login");
        assert_eq!(api.session_cookie, "sid");
        assert!(!api.cors.allows_any_origin());
    }

    #[test]
    fn test_disabled_audit_reporter() {
        let settings = AuditSettings {
            enabled: false,
            ..AuditSettings::default()
        };
        let reporter = audit_reporter(&settings).unwrap();
        assert!(!reporter.is_enabled());
    }

    #[tokio::test]
    async fn test_build_server_seeds_accounts() {
        let runtime = RuntimeBuilder::new()
            .env(env())
            .config(AuthgateConfig::default())
            .seed(true)
            .build()
            .unwrap();

        let server = runtime.build_server().await.unwrap();
        let store = server.state().codec().store();
        assert!(store
            .find_by_email("admin@gmail.com")
            .await
            .unwrap()
            .is_some());
    }
}
