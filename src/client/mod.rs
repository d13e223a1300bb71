/*!
Store connection seam.

parse_target -> TargetSpec { Memory | Remote }
Contract types: Mode / ConnectConfig / ConnectionError / Connection /
Subscription.

The console core talks to the store exclusively through the `Connection`
trait. The embedded memory backend (`memory.rs`) is the only in-tree
implementation; remote transports (redis:// / rediss://) are recognized by
the target parser but plug in behind the same trait and are not part of
this tree.
*/

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::console::command::ConsoleCommand;

pub mod memory;
pub mod value;

pub use value::Value;

/// Topology reported by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standalone,
    Cluster,
}

/// Connection identity used for prompt rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Transport-level failure. Command-level error replies are `Value::Error`
/// payloads and never surface here.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("connection closed")]
    Closed,
}

/// One delivery on a subscription stream.
pub type Delivery = Result<Value, ConnectionError>;

/// Contract every store backend implements.
///
/// `db_index` is the authoritative selected-database answer as of the most
/// recently executed command; a cluster may redirect, so callers must read
/// it back instead of trusting the index a command requested.
#[async_trait]
pub trait Connection: Send + Sync {
    fn mode(&self) -> Mode;
    fn config(&self) -> &ConnectConfig;
    fn db_index(&self) -> u32;

    /// Execute one request/response command.
    async fn execute(&self, command: &ConsoleCommand) -> Result<Value, ConnectionError>;

    /// Enter a subscription and return its message stream handle.
    async fn subscribe(&self, command: &ConsoleCommand) -> Result<Subscription, ConnectionError>;
}

/// Stream handle for one subscription. Dropping or closing it detaches the
/// subscriber from the backend; there is no implicit open-ended callback.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl Subscription {
    /// Build a (sender, handle) pair. Backends keep the sender and push
    /// deliveries; a failed send means the handle is gone.
    pub fn channel() -> (mpsc::UnboundedSender<Delivery>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Subscription { rx })
    }

    /// Next delivery, or `None` once the backend side is gone and the
    /// buffer is drained.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Stop accepting new deliveries. Buffered ones remain readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/* ---- Target Parsing ---- */

/// A parsed representation of a user-supplied target string.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    /// Embedded memory store profile.
    Memory { name: Option<String>, db: u32 },
    /// Remote endpoint specified by URL (redis / rediss).
    Remote { original: String, url: Url },
}

impl TargetSpec {
    pub fn is_remote(&self) -> bool {
        matches!(self, TargetSpec::Remote { .. })
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, TargetSpec::Memory { .. })
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Memory { name: Some(name), db } => write!(f, "memory://{name}/{db}"),
            TargetSpec::Memory { name: None, db } => write!(f, "memory:{db}"),
            TargetSpec::Remote { url, .. } => write!(f, "remote: {url}"),
        }
    }
}

/// Attempt to parse a `--target` value into a structured `TargetSpec`.
///
/// Parsing Strategy:
/// 1. Try to parse as URL. redis/rediss -> remote; memory -> embedded
///    profile (`memory:2`, `memory://cache1/2`).
/// 2. Bare `memory` selects the embedded store, database 0.
/// 3. Anything else is treated as `host[:port]` shorthand for a remote
///    endpoint.
pub fn parse_target(raw: &str) -> Result<TargetSpec> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("target string is empty");
    }

    if let Ok(url) = Url::parse(trimmed) {
        match url.scheme() {
            "redis" | "rediss" => {
                if url.host_str().is_none() {
                    bail!("remote target is missing a host");
                }
                return Ok(TargetSpec::Remote {
                    original: raw.to_string(),
                    url,
                });
            }
            "memory" => return memory_profile(&url),
            _ => {
                // Not a store scheme; fall through to host:port handling.
            }
        }
    }

    if trimmed.eq_ignore_ascii_case("memory") {
        return Ok(TargetSpec::Memory { name: None, db: 0 });
    }

    let url = Url::parse(&format!("redis://{trimmed}"))
        .with_context(|| format!("unrecognized target: '{trimmed}'"))?;
    if url.host_str().is_none() {
        bail!("unrecognized target: '{trimmed}'");
    }
    Ok(TargetSpec::Remote {
        original: raw.to_string(),
        url,
    })
}

fn memory_profile(url: &Url) -> Result<TargetSpec> {
    let name = url.host_str().map(|h| h.to_string());
    let raw_db = url.path().trim_start_matches('/');
    let db = if raw_db.is_empty() {
        0
    } else {
        raw_db
            .parse::<u32>()
            .with_context(|| format!("invalid memory database index: '{raw_db}'"))?
    };
    Ok(TargetSpec::Memory { name, db })
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_memory() {
        let spec = parse_target("memory").unwrap();
        assert!(spec.is_memory());
        assert!(matches!(spec, TargetSpec::Memory { name: None, db: 0 }));
    }

    #[test]
    fn connection_error_display() {
        let io = ConnectionError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ));
        assert_eq!(io.to_string(), "i/o failure: broken pipe");
        assert_eq!(
            ConnectionError::Protocol("bad frame".into()).to_string(),
            "protocol violation: bad frame"
        );
        assert_eq!(ConnectionError::Closed.to_string(), "connection closed");
    }

    #[test]
    fn parse_memory_with_db() {
        let spec = parse_target("memory:3").unwrap();
        assert!(matches!(spec, TargetSpec::Memory { name: None, db: 3 }));
    }

    #[test]
    fn parse_memory_profile_url() {
        let spec = parse_target("memory://cache1/2").unwrap();
        match spec {
            TargetSpec::Memory { name, db } => {
                assert_eq!(name.as_deref(), Some("cache1"));
                assert_eq!(db, 2);
            }
            other => panic!("expected memory profile, got {other}"),
        }
    }

    #[test]
    fn parse_memory_bad_db_rejected() {
        let err = parse_target("memory:sixteen").unwrap_err();
        assert!(err.to_string().contains("invalid memory database index"));
    }

    #[test]
    fn parse_remote_url() {
        let spec = parse_target("redis://10.0.0.5:6379/0").unwrap();
        assert!(spec.is_remote());
    }

    #[test]
    fn parse_remote_tls_url() {
        assert!(parse_target("rediss://cache.internal:6380").unwrap().is_remote());
    }

    #[test]
    fn host_port_shorthand_is_remote() {
        let spec = parse_target("10.0.0.5:6379").unwrap();
        assert!(spec.is_remote());
        if let TargetSpec::Remote { url, .. } = spec {
            assert_eq!(url.host_str(), Some("10.0.0.5"));
            assert_eq!(url.port(), Some(6379));
        }
    }

    #[test]
    fn empty_target_rejected() {
        let err = parse_target("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn garbage_target_rejected() {
        assert!(parse_target("not a target at all").is_err());
    }

    #[tokio::test]
    async fn subscription_close_stops_deliveries() {
        let (tx, mut sub) = Subscription::channel();
        tx.send(Ok(Value::Nil)).unwrap();
        sub.close();
        assert!(tx.send(Ok(Value::Nil)).is_err());
        // Buffered delivery is still readable after close.
        assert!(matches!(sub.next().await, Some(Ok(Value::Nil))));
        assert!(sub.next().await.is_none());
    }
}
