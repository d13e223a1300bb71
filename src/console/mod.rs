/*!
Console session core.

Layout:
  src/console/
    mod.rs        (this file: declarations + re-exports)
    command.rs    (ConsoleCommand + CommandKind classification)
    session.rs    (selected database / topology tracking + prompt rendering)
    events.rs     (output + prompt events consumed by the display surface)
    dispatcher.rs (execution paths, event emission, subscription ownership)

Re-exports (public surface expected by main.rs / repl.rs):
  - ConsoleCommand, CommandKind
  - SessionState
  - ConsoleEvent, OutputEvent, OutputKind, PromptUpdate
  - Dispatcher
*/

pub mod command;
pub mod dispatcher;
pub mod events;
pub mod session;

pub use command::{CommandKind, ConsoleCommand};
pub use dispatcher::Dispatcher;
pub use events::{ConsoleEvent, OutputEvent, OutputKind, PromptUpdate};
pub use session::SessionState;
