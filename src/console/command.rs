/*!
Command model for one console input line.

Variants (CommandKind):
  select       (SELECT; runs on the synchronous path, drives prompt sync)
  subscription (SUBSCRIBE / PSUBSCRIBE / SSUBSCRIBE; asynchronous path)
  generic      (everything else)

Helpers:
  - parse() / new()
  - kind() / is_select() / is_subscription()
*/

use anyhow::{Context, Result};
use shell_words::split as shell_split;
use std::fmt;

/// Subscription-family verbs, matched case-insensitively on the first token.
const SUBSCRIPTION_VERBS: &[&str] = &["SUBSCRIBE", "PSUBSCRIBE", "SSUBSCRIBE"];

/// Classification of one parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Select,
    Subscription,
    Generic,
}

/// A parsed representation of one input line: the tokenized argument list
/// plus the database index context it was issued against. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommand {
    tokens: Vec<String>,
    db_index: u32,
}

impl ConsoleCommand {
    pub fn new(tokens: Vec<String>, db_index: u32) -> Self {
        Self { tokens, db_index }
    }

    /// Tokenize a raw line with shell-style quoting rules.
    pub fn parse(line: &str, db_index: u32) -> Result<Self> {
        let tokens = shell_split(line).context("failed to tokenize command line")?;
        Ok(Self::new(tokens, db_index))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Command verb (first token), if any.
    pub fn name(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the verb.
    pub fn args(&self) -> &[String] {
        if self.tokens.is_empty() {
            &[]
        } else {
            &self.tokens[1..]
        }
    }

    pub fn db_index(&self) -> u32 {
        self.db_index
    }

    pub fn kind(&self) -> CommandKind {
        let Some(name) = self.name() else {
            return CommandKind::Generic;
        };
        if SUBSCRIPTION_VERBS
            .iter()
            .any(|verb| name.eq_ignore_ascii_case(verb))
        {
            CommandKind::Subscription
        } else if name.eq_ignore_ascii_case("SELECT") {
            CommandKind::Select
        } else {
            CommandKind::Generic
        }
    }

    pub fn is_select(&self) -> bool {
        self.kind() == CommandKind::Select
    }

    pub fn is_subscription(&self) -> bool {
        self.kind() == CommandKind::Subscription
    }
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(ConsoleCommand::parse("SUBSCRIBE ch", 0).unwrap().kind(), CommandKind::Subscription);
        assert_eq!(ConsoleCommand::parse("psubscribe news.*", 0).unwrap().kind(), CommandKind::Subscription);
        assert_eq!(ConsoleCommand::parse("SSubscribe shard", 0).unwrap().kind(), CommandKind::Subscription);
        assert_eq!(ConsoleCommand::parse("select 2", 0).unwrap().kind(), CommandKind::Select);
        assert_eq!(ConsoleCommand::parse("SeLeCt 2", 0).unwrap().kind(), CommandKind::Select);
        assert_eq!(ConsoleCommand::parse("GET key", 0).unwrap().kind(), CommandKind::Generic);
    }

    #[test]
    fn kind_helpers() {
        assert!(ConsoleCommand::parse("subscribe ch", 0).unwrap().is_subscription());
        assert!(ConsoleCommand::parse("select 1", 0).unwrap().is_select());
        let generic = ConsoleCommand::parse("get key", 0).unwrap();
        assert!(!generic.is_select());
        assert!(!generic.is_subscription());
    }

    #[test]
    fn quoted_tokens_stay_whole() {
        let command = ConsoleCommand::parse(r#"set motd "hello world""#, 0).unwrap();
        assert_eq!(command.name(), Some("set"));
        assert_eq!(command.args(), ["motd", "hello world"]);
    }

    #[test]
    fn unbalanced_quote_is_an_error() {
        assert!(ConsoleCommand::parse(r#"get "unterminated"#, 0).is_err());
    }

    #[test]
    fn blank_line_parses_to_empty_command() {
        let command = ConsoleCommand::parse("   ", 3).unwrap();
        assert!(command.is_empty());
        assert_eq!(command.name(), None);
        assert_eq!(command.kind(), CommandKind::Generic);
        assert_eq!(command.db_index(), 3);
    }

    #[test]
    fn display_joins_tokens() {
        let command = ConsoleCommand::new(vec!["get".into(), "key".into()], 0);
        assert_eq!(command.to_string(), "get key");
    }

    #[test]
    fn subscribe_must_be_the_verb_not_an_argument() {
        let command = ConsoleCommand::parse("get subscribe", 0).unwrap();
        assert_eq!(command.kind(), CommandKind::Generic);
    }
}
