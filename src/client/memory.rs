/*!
memory.rs - embedded deterministic store backend.

Split mirrors a shared core + per-session view:
  - `MemoryStore`: databases + pub/sub subscriber registry, shared via Arc
  - `MemoryBackend`: one session attached to a store; owns the selected
    database index and the session's identity/topology

Supported commands:
  PING ECHO SELECT GET SET DEL EXISTS KEYS DBSIZE INCR FLUSHDB PUBLISH
  SUBSCRIBE PSUBSCRIBE SSUBSCRIBE (via the subscription path)

Unknown commands and arity/typing violations come back as `Value::Error`
replies, matching what a real server would put on the wire. In cluster
mode SELECT is rejected and the reported index stays 0.
*/

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

use super::value::Value;
use super::{ConnectConfig, Connection, ConnectionError, Delivery, Mode, Subscription};
use crate::console::command::ConsoleCommand;

/// Number of logical databases, matching the server default.
pub const DATABASE_COUNT: usize = 16;

struct Subscriber {
    channels: Vec<String>,
    patterns: Vec<String>,
    tx: UnboundedSender<Delivery>,
}

/// Shared store state. One per "server"; sessions attach via `Arc`.
pub struct MemoryStore {
    dbs: Mutex<Vec<HashMap<String, String>>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            dbs: Mutex::new(vec![HashMap::new(); DATABASE_COUNT]),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Fan a publish out to matching subscribers, pruning detached ones.
    /// Returns the delivery count, like the server's PUBLISH reply.
    fn publish(&self, channel: &str, payload: &str) -> i64 {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0i64;
        subscribers.retain(|sub| {
            for ch in &sub.channels {
                if ch == channel {
                    if sub.tx.send(Ok(message(channel, payload))).is_err() {
                        return false;
                    }
                    delivered += 1;
                }
            }
            for pattern in &sub.patterns {
                if glob_match(pattern, channel) {
                    if sub.tx.send(Ok(pmessage(pattern, channel, payload))).is_err() {
                        return false;
                    }
                    delivered += 1;
                }
            }
            true
        });
        delivered
    }

    fn register(&self, subscriber: Subscriber) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }
}

/// One session attached to a `MemoryStore`.
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
    config: ConnectConfig,
    mode: Mode,
    selected: AtomicU32,
}

impl MemoryBackend {
    pub fn attach(store: Arc<MemoryStore>, config: ConnectConfig, mode: Mode, db: u32) -> Self {
        // Database addressing is not meaningful cluster-wide.
        let selected = match mode {
            Mode::Standalone => db,
            Mode::Cluster => 0,
        };
        Self {
            store,
            config,
            mode,
            selected: AtomicU32::new(selected),
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> T {
        let mut dbs = self.store.dbs.lock().unwrap_or_else(PoisonError::into_inner);
        let index = self.selected.load(Ordering::Relaxed) as usize;
        f(&mut dbs[index])
    }

    fn select(&self, args: &[String]) -> Value {
        if self.mode == Mode::Cluster {
            return Value::Error("ERR SELECT is not allowed in cluster mode".into());
        }
        let [index] = args else {
            return wrong_args("select");
        };
        match index.parse::<u32>() {
            Ok(n) if (n as usize) < DATABASE_COUNT => {
                self.selected.store(n, Ordering::Relaxed);
                Value::Status("OK".into())
            }
            Ok(_) => Value::Error("ERR DB index is out of range".into()),
            Err(_) => Value::Error("ERR value is not an integer or out of range".into()),
        }
    }

    fn incr(&self, key: &str) -> Value {
        self.with_db(|db| {
            let current = match db.get(key) {
                Some(raw) => match raw.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => {
                        return Value::Error("ERR value is not an integer or out of range".into());
                    }
                },
                None => 0,
            };
            let Some(next) = current.checked_add(1) else {
                return Value::Error("ERR increment or decrement would overflow".into());
            };
            db.insert(key.to_string(), next.to_string());
            Value::Int(next)
        })
    }
}

#[async_trait]
impl Connection for MemoryBackend {
    fn mode(&self) -> Mode {
        self.mode
    }

    fn config(&self) -> &ConnectConfig {
        &self.config
    }

    fn db_index(&self) -> u32 {
        self.selected.load(Ordering::Relaxed)
    }

    async fn execute(&self, command: &ConsoleCommand) -> Result<Value, ConnectionError> {
        let Some(name) = command.name() else {
            return Ok(Value::Error("ERR empty command".into()));
        };
        let verb = name.to_ascii_uppercase();
        let args = command.args();

        Ok(match verb.as_str() {
            "PING" => match args {
                [] => Value::Status("PONG".into()),
                [msg] => Value::Bulk(msg.clone()),
                _ => wrong_args("ping"),
            },
            "ECHO" => match args {
                [msg] => Value::Bulk(msg.clone()),
                _ => wrong_args("echo"),
            },
            "SELECT" => self.select(args),
            "GET" => match args {
                [key] => self.with_db(|db| match db.get(key) {
                    Some(value) => Value::Bulk(value.clone()),
                    None => Value::Nil,
                }),
                _ => wrong_args("get"),
            },
            "SET" => match args {
                [key, value] => {
                    self.with_db(|db| db.insert(key.clone(), value.clone()));
                    Value::Status("OK".into())
                }
                _ => wrong_args("set"),
            },
            "DEL" => {
                if args.is_empty() {
                    wrong_args("del")
                } else {
                    let removed = self.with_db(|db| {
                        args.iter().filter(|key| db.remove(*key).is_some()).count()
                    });
                    Value::Int(removed as i64)
                }
            }
            "EXISTS" => {
                if args.is_empty() {
                    wrong_args("exists")
                } else {
                    let found = self
                        .with_db(|db| args.iter().filter(|key| db.contains_key(*key)).count());
                    Value::Int(found as i64)
                }
            }
            "KEYS" => match args {
                [pattern] => self.with_db(|db| {
                    let mut keys = db
                        .keys()
                        .filter(|key| glob_match(pattern, key))
                        .cloned()
                        .collect::<Vec<_>>();
                    keys.sort();
                    Value::Array(keys.into_iter().map(Value::Bulk).collect())
                }),
                _ => wrong_args("keys"),
            },
            "DBSIZE" => Value::Int(self.with_db(|db| db.len()) as i64),
            "INCR" => match args {
                [key] => self.incr(key),
                _ => wrong_args("incr"),
            },
            "FLUSHDB" => {
                self.with_db(|db| db.clear());
                Value::Status("OK".into())
            }
            "PUBLISH" => match args {
                [channel, payload] => Value::Int(self.store.publish(channel, payload)),
                _ => wrong_args("publish"),
            },
            _ => Value::Error(format!("ERR unknown command '{name}'")),
        })
    }

    async fn subscribe(&self, command: &ConsoleCommand) -> Result<Subscription, ConnectionError> {
        let verb = command
            .name()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let args = command.args();
        if args.is_empty() {
            return Err(ConnectionError::Protocol(format!(
                "wrong number of arguments for '{verb}'"
            )));
        }

        let (tx, subscription) = Subscription::channel();
        let patterned = verb == "psubscribe";
        let mut entry = Subscriber {
            channels: Vec::new(),
            patterns: Vec::new(),
            tx: tx.clone(),
        };
        for (i, target) in args.iter().enumerate() {
            if patterned {
                entry.patterns.push(target.clone());
            } else {
                entry.channels.push(target.clone());
            }
            // Per-channel confirmation, delivered ahead of any message.
            let confirmation = Value::Array(vec![
                Value::Bulk(verb.clone()),
                Value::Bulk(target.clone()),
                Value::Int(i as i64 + 1),
            ]);
            let _ = tx.send(Ok(confirmation));
        }
        self.store.register(entry);
        Ok(subscription)
    }
}

fn wrong_args(verb: &str) -> Value {
    Value::Error(format!("ERR wrong number of arguments for '{verb}' command"))
}

fn message(channel: &str, payload: &str) -> Value {
    Value::Array(vec![
        Value::Bulk("message".into()),
        Value::Bulk(channel.into()),
        Value::Bulk(payload.into()),
    ])
}

fn pmessage(pattern: &str, channel: &str, payload: &str) -> Value {
    Value::Array(vec![
        Value::Bulk("pmessage".into()),
        Value::Bulk(pattern.into()),
        Value::Bulk(channel.into()),
        Value::Bulk(payload.into()),
    ])
}

/// Server-style glob: `*` any run, `?` one character, byte-wise.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(p: &[u8], t: &[u8]) -> bool {
        match p.split_first() {
            None => t.is_empty(),
            Some((&b'*', rest)) => (0..=t.len()).any(|i| inner(rest, &t[i..])),
            Some((&b'?', rest)) => !t.is_empty() && inner(rest, &t[1..]),
            Some((c, rest)) => t.first() == Some(c) && inner(rest, &t[1..]),
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}

/* --------------------------------- Tests ---------------------------------- */
