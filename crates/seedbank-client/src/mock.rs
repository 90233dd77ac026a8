//! In-memory connector that plays back canned replies, for tests and dry runs.

use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::connector::{Channel, Connector};
use crate::error::{ExchangeError, ExchangeResult};

#[derive(Debug)]
enum Reply {
    Body(Vec<u8>),
    Refuse,
}

/// Each `connect` consumes the next scripted reply. With the script exhausted,
/// connections are refused.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConnector {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, body: impl Into<Vec<u8>>) -> &Self {
        self.replies.lock().push_back(Reply::Body(body.into()));
        self
    }

    pub fn refuse(&self) -> &Self {
        self.replies.lock().push_back(Reply::Refuse);
        self
    }

    /// Raw bytes written on each channel so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, host: &str, port: u16) -> ExchangeResult<Box<dyn Channel>> {
        match self.replies.lock().pop_front() {
            Some(Reply::Body(body)) => Ok(Box::new(ScriptedChannel {
                reply: Cursor::new(body),
                sent: Vec::new(),
                log: Arc::clone(&self.requests),
            })),
            Some(Reply::Refuse) | None => Err(ExchangeError::Connection {
                addr: format!("{host}:{port}"),
                source: io::ErrorKind::ConnectionRefused.into(),
            }),
        }
    }
}

struct ScriptedChannel {
    reply: Cursor<Vec<u8>>,
    sent: Vec<u8>,
    log: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reply.read(buf)
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedChannel {
    fn drop(&mut self) {
        self.log.lock().push(std::mem::take(&mut self.sent));
    }
}
