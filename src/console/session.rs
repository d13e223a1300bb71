//! Session state: selected database, topology, prompt rendering.

use crate::client::{ConnectConfig, Mode};

/// Tracks the session context a console operates in. The selected database
/// index is meaningful only in standalone mode; in cluster mode it mirrors
/// whatever index the connection reports, since routing happens per command.
///
/// Mutated only by the dispatcher, after a command execution confirms a
/// database change. Cannot fail.
#[derive(Debug, Clone)]
pub struct SessionState {
    config: ConnectConfig,
    mode: Mode,
    db_index: u32,
}

impl SessionState {
    pub fn new(config: ConnectConfig, mode: Mode, db_index: u32) -> Self {
        Self {
            config,
            mode,
            db_index,
        }
    }

    pub fn db_index(&self) -> u32 {
        self.db_index
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Record the authoritative index reported back by the connection.
    pub fn record_db_change(&mut self, new_index: u32) {
        self.db_index = new_index;
    }

    /// The one user-visible encoding of session state.
    ///
    /// Cluster prompts carry host/port instead of a database index, because
    /// database addressing is not meaningful cluster-wide.
    pub fn prompt(&self) -> String {
        match self.mode {
            Mode::Cluster => format!(
                "{}({}:{})>",
                self.config.name, self.config.host, self.config.port
            ),
            Mode::Standalone => format!("{}:{}>", self.config.name, self.db_index),
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectConfig {
        ConnectConfig {
            name: "cache1".into(),
            host: "10.0.0.5".into(),
            port: 6379,
        }
    }

    #[test]
    fn standalone_prompt_carries_database_index() {
        let session = SessionState::new(config(), Mode::Standalone, 3);
        assert_eq!(session.prompt(), "cache1:3>");
    }

    #[test]
    fn cluster_prompt_carries_host_and_port() {
        let mut session = SessionState::new(config(), Mode::Cluster, 0);
        assert_eq!(session.prompt(), "cache1(10.0.0.5:6379)>");
        // A mirrored index never leaks into the cluster prompt.
        session.record_db_change(7);
        assert_eq!(session.prompt(), "cache1(10.0.0.5:6379)>");
    }

    #[test]
    fn record_db_change_updates_index() {
        let mut session = SessionState::new(config(), Mode::Standalone, 0);
        session.record_db_change(5);
        assert_eq!(session.db_index(), 5);
        assert_eq!(session.prompt(), "cache1:5>");
    }
}
