/*!
dispatcher.rs - command execution paths + event emission.

One dispatcher per console session. Lifecycle:
  Uninitialized -> Ready   (start(), one-way, announces the connection)
  Ready         -> Ready   (every execute() is a self-loop that may mutate
                            session state and emits one or more events)

Execution policy:
  - subscription verbs: announce streaming mode with one "part" event, then
    forward every delivery from the connection's stream handle
  - everything else: one blocking round-trip; select commands and any
    command under cluster topology re-read the authoritative database index
    and re-emit the prompt

Subscriptions are owned here: each live stream has a forwarder task, and
shutdown() aborts them all, which drops the stream handles and detaches
the subscribers. Teardown cannot leak continuations.
*/

use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::command::{CommandKind, ConsoleCommand};
use super::events::{ConsoleEvent, OutputEvent, PromptUpdate};
use super::session::SessionState;
use crate::client::{Connection, Mode};
use crate::log_debug;

const SUBSCRIBE_BANNER: &str =
    "Switched to pub/sub mode. Close the console to stop listening for messages.";

pub struct Dispatcher {
    connection: Arc<dyn Connection>,
    session: SessionState,
    events: UnboundedSender<ConsoleEvent>,
    feeds: Vec<JoinHandle<()>>,
    ready: bool,
}

impl Dispatcher {
    /// Build a dispatcher over a connection; the returned receiver is the
    /// display surface's end of the event stream.
    pub fn new(connection: Arc<dyn Connection>) -> (Self, UnboundedReceiver<ConsoleEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = SessionState::new(
            connection.config().clone(),
            connection.mode(),
            connection.db_index(),
        );
        (
            Self {
                connection,
                session,
                events,
                feeds: Vec::new(),
                ready: false,
            },
            rx,
        )
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Connection-ready hook. Announces the connection and shows the
    /// initial prompt. One-way; a second call is a no-op.
    pub fn start(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        let banner = match self.session.mode() {
            Mode::Cluster => "Connected to cluster.\n",
            Mode::Standalone => "Connected.\n",
        };
        self.emit(OutputEvent::complete(banner));
        self.emit_prompt(true);
    }

    /// Execute one command line. All outcomes, including failures, surface
    /// as events; the session stays usable afterwards.
    pub async fn execute(&mut self, line: &str) {
        debug_assert!(self.ready, "execute() before start()");

        let command = match ConsoleCommand::parse(line, self.session.db_index()) {
            Ok(command) => command,
            Err(err) => {
                self.emit(OutputEvent::error(format!("Parse error: {err:#}")));
                return;
            }
        };
        if command.is_empty() {
            return;
        }

        log_debug!(
            "dispatching '{}' as {:?} (db {})",
            command,
            command.kind(),
            command.db_index()
        );
        match command.kind() {
            CommandKind::Subscription => self.run_subscription(command).await,
            CommandKind::Select | CommandKind::Generic => self.run_sync(command).await,
        }
    }

    async fn run_subscription(&mut self, command: ConsoleCommand) {
        self.emit(OutputEvent::part(SUBSCRIBE_BANNER));

        let mut subscription = match self.connection.subscribe(&command).await {
            Ok(subscription) => subscription,
            Err(err) => {
                self.emit(OutputEvent::error(format!("Connection error: {err}")));
                return;
            }
        };

        let events = self.events.clone();
        let feed = tokio::spawn(async move {
            while let Some(delivery) = subscription.next().await {
                let event = match delivery {
                    Ok(value) => OutputEvent::part(value.to_display_string()),
                    // A bad delivery does not end the stream.
                    Err(err) => OutputEvent::error(format!("Subscribe error: {err}")),
                };
                if events.send(ConsoleEvent::Output(event)).is_err() {
                    break;
                }
            }
        });
        self.feeds.push(feed);
    }

    async fn run_sync(&mut self, command: ConsoleCommand) {
        let result = match self.connection.execute(&command).await {
            Ok(value) => value,
            Err(err) => {
                self.emit(OutputEvent::error(format!("Connection error: {err}")));
                return;
            }
        };

        if command.is_select() || self.session.mode() == Mode::Cluster {
            // The connection is authoritative: a cluster may have redirected,
            // and a select may have been rejected.
            self.session.record_db_change(self.connection.db_index());
            self.emit_prompt(false);
        }

        self.emit(OutputEvent::complete(result.to_display_string()));
    }

    fn emit(&self, output: OutputEvent) {
        let _ = self.events.send(ConsoleEvent::Output(output));
    }

    fn emit_prompt(&self, show: bool) {
        let _ = self.events.send(ConsoleEvent::Prompt(PromptUpdate {
            text: self.session.prompt(),
            show,
        }));
    }

    /// Cancel all live subscription feeds. Idempotent.
    pub async fn shutdown(&mut self) {
        for feed in self.feeds.drain(..) {
            feed.abort();
            let _ = feed.await;
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for feed in &self.feeds {
            feed.abort();
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */
