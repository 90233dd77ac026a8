use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::connector::{Connector, TlsConnector};
use crate::credential::{AuthToken, CredentialVerifier};
use crate::error::{ExchangeError, ExchangeResult};
use crate::session::{SessionCell, SessionState};
use crate::wire::{self, Request, SubmitPayload};

/// Where the seed bank lives and who we are to it.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Authenticated client for the three seed bank exchanges.
///
/// Each call blocks the calling thread for a full connect, write, read-to-EOF
/// cycle; there is no timeout. Calls from different threads run on independent
/// connections, so any ordering between them is the caller's business.
pub struct SeedBankClient {
    config: ClientConfig,
    verifier: CredentialVerifier,
    connector: Arc<dyn Connector>,
    session: SessionCell,
}

impl SeedBankClient {
    pub fn new(config: ClientConfig, verifier: CredentialVerifier) -> Self {
        Self::with_connector(config, verifier, Arc::new(TlsConnector::new()))
    }

    pub fn with_connector(
        config: ClientConfig,
        verifier: CredentialVerifier,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            verifier,
            connector,
            session: SessionCell::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the cached credential and filter.
    pub fn session(&self) -> Arc<SessionState> {
        self.session.load()
    }

    pub fn auth_token(&self) -> Option<AuthToken> {
        self.session.load().token.clone()
    }

    pub fn filter(&self) -> Option<String> {
        self.session.load().filter.clone()
    }

    /// Fetch and verify a fresh credential; returns when it expires.
    pub fn try_authorize(&self) -> ExchangeResult<DateTime<Utc>> {
        let request = Request::authenticate(&self.config.host, &self.config.api_key);
        let body = self.exchange(&request)?;
        let token = self.verifier.verify(&body)?;
        let expires_at = token.expires_at();
        self.session.update(|state| state.token = Some(token));
        info!(target: "seedbank::client", %expires_at, "credential refreshed");
        Ok(expires_at)
    }

    /// Fetch the filter the bank wants searched.
    pub fn try_get_categories(&self) -> ExchangeResult<String> {
        let request = Request::categories(&self.config.host);
        let filter = self.exchange(&request)?;
        self.session.update(|state| state.filter = Some(filter.clone()));
        debug!(target: "seedbank::client", filter = %filter, "filter updated");
        Ok(filter)
    }

    /// Hand `seed` to the bank under the cached credential and filter.
    ///
    /// The reply is the next filter to search. Fails without connecting if no
    /// credential or filter has been negotiated yet.
    pub fn try_submit(&self, seed: i64) -> ExchangeResult<String> {
        let session = self.session.load();
        let token = session
            .token
            .as_ref()
            .ok_or(ExchangeError::MissingSession("credential"))?;
        let filter = session
            .filter
            .as_deref()
            .ok_or(ExchangeError::MissingSession("filter"))?;

        let payload = SubmitPayload::new(token.as_str(), filter, seed);
        let boundary = uuid::Uuid::new_v4().simple().to_string();
        let request = Request::submit(&self.config.host, &payload, &boundary);
        let next = self.exchange(&request)?;

        self.session.update(|state| state.filter = Some(next.clone()));
        info!(target: "seedbank::client", seed, next_filter = %next, "seed submitted");
        Ok(next)
    }

    /// [`Self::try_authorize`] with every failure collapsed to `None`.
    pub fn authorize(&self) -> Option<DateTime<Utc>> {
        self.try_authorize()
            .map_err(|err| log_failure("authorize", &err))
            .ok()
    }

    /// [`Self::try_get_categories`] with every failure collapsed to `None`.
    pub fn get_categories(&self) -> Option<String> {
        self.try_get_categories()
            .map_err(|err| log_failure("get_categories", &err))
            .ok()
    }

    /// [`Self::try_submit`] with every failure collapsed to `None`.
    pub fn submit(&self, seed: i64) -> Option<String> {
        self.try_submit(seed)
            .map_err(|err| log_failure("submit", &err))
            .ok()
    }

    fn exchange(&self, request: &Request) -> ExchangeResult<String> {
        debug!(
            target: "seedbank::client",
            method = request.method(),
            path = request.target().split('?').next().unwrap_or_default(),
            host = %self.config.host,
            port = self.config.port,
            "opening exchange"
        );
        let mut channel = self.connector.connect(&self.config.host, self.config.port)?;
        wire::exchange(channel.as_mut(), request)
    }
}

fn log_failure(operation: &'static str, err: &ExchangeError) {
    warn!(
        target: "seedbank::client",
        operation,
        kind = %err.kind(),
        error = %err,
        "exchange failed"
    );
}

impl fmt::Debug for SeedBankClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedBankClient")
            .field("config", &self.config)
            .field("session", &self.session.load())
            .finish_non_exhaustive()
    }
}
