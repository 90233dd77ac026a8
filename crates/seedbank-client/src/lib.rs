//! Blocking client for the seed bank service.
//!
//! Every exchange opens its own connection, writes one HTTP/1.0-shaped request,
//! and treats everything the remote sends until end-of-stream as the payload.
//! No status line or header parsing happens: the remote is expected to answer with
//! a bare body. An error page would be taken as a payload.
//!
//! Session state (the verified credential and the current filter) is cached on the
//! client and replaced wholesale after each successful exchange. Failed exchanges
//! leave it untouched.

mod client;
mod connector;
mod credential;
mod error;
pub mod mock;
mod session;
pub mod wire;

pub use client::{ClientConfig, SeedBankClient};
pub use connector::{Channel, Connector, PlainConnector, TlsConnector};
pub use credential::{AuthToken, CredentialVerifier, KeyError, CLOCK_SKEW_SECS};
pub use error::{ExchangeError, ExchangeResult, FailureKind};
pub use session::SessionState;
