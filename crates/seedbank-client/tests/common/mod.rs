#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

pub const SIGNING_KEY: &[u8] = include_bytes!("../fixtures/signing_key.pem");
pub const SIGNING_PUB: &[u8] = include_bytes!("../fixtures/signing_pub.pem");
pub const FOREIGN_KEY: &[u8] = include_bytes!("../fixtures/foreign_key.pem");

/// A request as the fixture server saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers each accepted connection with the next canned reply, then closes it.
pub struct FixtureServer {
    addr: SocketAddr,
    requests: Receiver<Captured>,
    handle: Option<JoinHandle<()>>,
}

impl FixtureServer {
    pub fn start<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let replies: Vec<Vec<u8>> = replies.into_iter().map(Into::into).collect();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture addr");
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            for reply in replies {
                let (stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let captured = serve_one(stream, &reply);
                if tx.send(captured).is_err() {
                    return;
                }
            }
        });

        Self {
            addr,
            requests: rx,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn next_request(&self) -> Captured {
        self.requests
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("fixture server saw a request")
    }

    /// Wait for every canned reply to be served; the listener closes afterwards.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("fixture server thread");
        }
    }
}

fn serve_one(stream: TcpStream, reply: &[u8]) -> Captured {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).expect("request body");

    let mut writer = stream;
    writer.write_all(reply).expect("write reply");
    writer.flush().expect("flush reply");

    Captured {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8(body).expect("utf-8 body"),
    }
}

/// A port nothing is listening on.
pub fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind scratch listener");
    listener.local_addr().expect("scratch addr").port()
}

/// A peer that answers every connection in cleartext without any TLS handshake.
pub struct CleartextPeer {
    addr: SocketAddr,
    handle: Option<JoinHandle<usize>>,
}

impl CleartextPeer {
    pub fn start(connections: usize, reply: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind cleartext peer");
        let addr = listener.local_addr().expect("cleartext addr");
        let handle = thread::spawn(move || {
            let mut served = 0;
            for _ in 0..connections {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                let mut hello = [0u8; 1024];
                let _ = stream.read(&mut hello);
                let _ = stream.write_all(reply);
                served += 1;
            }
            served
        });
        Self {
            addr,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of connections the peer accepted.
    pub fn finish(mut self) -> usize {
        self.handle
            .take()
            .map(|handle| handle.join().expect("cleartext peer thread"))
            .unwrap_or(0)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    exp: i64,
}

pub fn signed_token(key: &[u8], ttl_secs: i64) -> String {
    encode(
        &Header::new(Algorithm::ES256),
        &Claims {
            sub: "miner-7",
            exp: Utc::now().timestamp() + ttl_secs,
        },
        &EncodingKey::from_ec_pem(key).expect("signing key"),
    )
    .expect("sign token")
}
