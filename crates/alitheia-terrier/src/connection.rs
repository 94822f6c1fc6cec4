//! Session with the Alitheia framework.
//!
//! Holds the web-service client and tracks whether the framework is
//! reachable with the configured unprivileged account.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::AlitheiaClient;
use crate::error::{TerrierError, TerrierResult};
use crate::types::TerrierConfig;

#[derive(Debug, Default)]
struct ConnectionState {
    connected: bool,
    last_error: Option<TerrierError>,
}

/// Connection to one framework instance.
#[derive(Debug)]
pub struct TerrierConnection {
    client: AlitheiaClient,
    config: TerrierConfig,
    state: RwLock<ConnectionState>,
}

impl TerrierConnection {
    /// Build the connection without contacting the framework.
    pub fn new(config: TerrierConfig) -> TerrierResult<Self> {
        let client = AlitheiaClient::new(&config)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: AlitheiaClient, config: TerrierConfig) -> Self {
        Self {
            client,
            config,
            state: RwLock::new(ConnectionState::default()),
        }
    }

    /// Ping the framework and log the unprivileged account in.
    ///
    /// The outcome is remembered: later calls to [`Self::ensure_connected`]
    /// fail fast with the recorded reason until `connect` succeeds.
    pub async fn connect(&self) -> TerrierResult<()> {
        let result = self.try_connect().await;
        let mut state = self.state.write().await;
        match &result {
            Ok(()) => {
                info!(url = %self.client.base_url(), "connected to framework");
                state.connected = true;
                state.last_error = None;
            }
            Err(e) => {
                warn!(url = %self.client.base_url(), error = %e, "failed to connect to framework");
                state.connected = false;
                state.last_error = Some(e.clone());
            }
        }
        result
    }

    async fn try_connect(&self) -> TerrierResult<()> {
        self.client.ping().await?;
        if self.config.user.is_empty() {
            return Ok(());
        }
        if self
            .client
            .login(&self.config.user, &self.config.password)
            .await?
        {
            Ok(())
        } else {
            Err(TerrierError::Unauthorized {
                message: format!("login refused for {}", self.config.user),
            })
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    /// Reason of the last failed connection attempt.
    pub async fn last_error(&self) -> Option<TerrierError> {
        self.state.read().await.last_error.clone()
    }

    /// Fail with `NotConnected` unless a session is established.
    pub async fn ensure_connected(&self) -> TerrierResult<()> {
        let state = self.state.read().await;
        if state.connected {
            return Ok(());
        }
        let reason = state
            .last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "connection not established".to_string());
        debug!(reason = %reason, "rejecting call on closed connection");
        Err(TerrierError::NotConnected { reason })
    }

    /// Log a user in. `Ok(false)` when the credentials are refused.
    pub async fn login_user(&self, user: &str, password: &str) -> TerrierResult<bool> {
        self.ensure_connected().await?;
        let accepted = self.client.login(user, password).await?;
        if accepted {
            info!(user, "user logged in");
        } else {
            debug!(user, "login refused");
        }
        Ok(accepted)
    }

    pub async fn logout_user(&self, user: &str) -> TerrierResult<()> {
        self.ensure_connected().await?;
        self.client.logout(user).await?;
        info!(user, "user logged out");
        Ok(())
    }

    /// Drop the session state; the next call must `connect` again.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.connected = false;
        state.last_error = None;
    }

    pub fn client(&self) -> &AlitheiaClient {
        &self.client
    }

    pub fn config(&self) -> &TerrierConfig {
        &self.config
    }
}
