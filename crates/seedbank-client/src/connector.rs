use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rustls::{
    ClientConfig as TlsConfig, ClientConnection, OwnedTrustAnchor, RootCertStore, ServerName,
    StreamOwned,
};

use crate::error::{ExchangeError, ExchangeResult};

/// A connected byte stream to the seed bank.
pub trait Channel: Read + Write + Send {}

impl<T: Read + Write + Send> Channel for T {}

/// Opens one fresh channel per exchange.
pub trait Connector: Send + Sync {
    fn connect(&self, host: &str, port: u16) -> ExchangeResult<Box<dyn Channel>>;
}

fn open_tcp(host: &str, port: u16) -> ExchangeResult<TcpStream> {
    let stream = TcpStream::connect((host, port)).map_err(|source| ExchangeError::Connection {
        addr: format!("{host}:{port}"),
        source,
    })?;
    stream.set_nodelay(true).ok();
    Ok(stream)
}

/// TLS over TCP, trusting the bundled web PKI roots.
#[derive(Clone)]
pub struct TlsConnector {
    config: Arc<TlsConfig>,
}

impl TlsConnector {
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|anchor| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                anchor.subject,
                anchor.spki,
                anchor.name_constraints,
            )
        }));
        Self::with_roots(roots)
    }

    pub fn with_roots(roots: RootCertStore) -> Self {
        let config = TlsConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TlsConnector {
    fn connect(&self, host: &str, port: u16) -> ExchangeResult<Box<dyn Channel>> {
        let server_name = ServerName::try_from(host).map_err(ExchangeError::channel)?;
        let tcp = open_tcp(host, port)?;
        let conn = ClientConnection::new(Arc::clone(&self.config), server_name)
            .map_err(ExchangeError::channel)?;
        let mut stream = StreamOwned::new(conn, tcp);

        // Finish the handshake now so a bad peer shows up as a channel failure here
        // rather than as a confusing write error later.
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(ExchangeError::channel)?;
        }
        tracing::trace!(
            target: "seedbank::connector",
            host,
            port,
            protocol = ?stream.conn.protocol_version(),
            "tls channel established"
        );
        Ok(Box::new(stream))
    }
}

/// Unencrypted TCP with identical framing, for local harnesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainConnector;

impl Connector for PlainConnector {
    fn connect(&self, host: &str, port: u16) -> ExchangeResult<Box<dyn Channel>> {
        Ok(Box::new(open_tcp(host, port)?))
    }
}

impl<C: Connector + ?Sized> Connector for Arc<C> {
    fn connect(&self, host: &str, port: u16) -> ExchangeResult<Box<dyn Channel>> {
        (**self).connect(host, port)
    }
}
