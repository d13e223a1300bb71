/*!
repl.rs - the display surface.

Line-oriented loop over stdin feeding `Dispatcher::execute`, interleaved
with event rendering so subscription traffic shows up while the loop is
waiting for input.

Output paths:
  - human: plain text, errors in red, prompt echoed after each completed
    command (a prompt update with show=false only replaces the stored
    prompt; show=true appends it immediately)
  - --json: one JSON object per event, nothing else on stdout
*/

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::console::{ConsoleEvent, Dispatcher, OutputKind};
use crate::log_error;
use crate::utils::style::{Role, color};

pub struct ReplOptions {
    pub json: bool,
}

pub async fn run(
    mut dispatcher: Dispatcher,
    mut events: UnboundedReceiver<ConsoleEvent>,
    options: ReplOptions,
) -> Result<()> {
    let mut prompt = String::new();

    if !options.json {
        println!("{}", color(Role::Dim, "Type 'exit' or 'quit' to leave."));
    }
    dispatcher.start();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            delivered = events.recv() => match delivered {
                Some(event) => render_event(event, &mut prompt, options.json),
                None => break,
            },
            read = lines.next_line() => match read? {
                Some(line) => {
                    let input = line.trim();
                    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                        break;
                    }
                    #[cfg(feature = "fault-injection")]
                    crash_on_literal(input);
                    if !input.is_empty() {
                        crate::log_trace!("input: {input}");
                        dispatcher.execute(input).await;
                    }
                }
                None => break, // stdin closed
            },
        }
    }

    dispatcher.shutdown().await;
    Ok(())
}

fn render_event(event: ConsoleEvent, prompt: &mut String, json: bool) {
    if json {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => log_error!("failed to serialize event: {err}"),
        }
        return;
    }

    match event {
        ConsoleEvent::Output(output) => {
            match output.kind {
                OutputKind::Error => print_line(&color(Role::Error, &output.text)),
                _ => print_line(&output.text),
            }
            // Streaming parts keep flowing; everything else hands the line
            // back to the user.
            if output.kind != OutputKind::Part {
                show_prompt(prompt);
            }
        }
        ConsoleEvent::Prompt(update) => {
            *prompt = update.text;
            if update.show {
                show_prompt(prompt);
            }
        }
    }
}

fn print_line(text: &str) {
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
}

fn show_prompt(prompt: &str) {
    if prompt.is_empty() {
        return;
    }
    print!("{} ", color(Role::Prompt, prompt));
    let _ = std::io::stdout().flush();
}

/// Diagnostic crash hook for test harnesses. Exact literal match only,
/// checked before dispatch so it never enters the command path, and only
/// compiled when the feature is requested.
#[cfg(feature = "fault-injection")]
fn crash_on_literal(input: &str) {
    if input == "segfault" {
        log_error!("fault-injection literal received; aborting");
        std::process::abort();
    }
}
