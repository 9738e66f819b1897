//! Physical code to command binding table

use crate::command::Command;
use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps physical codes (`KeyW`, `Space`, `Mouse0`, ...) to commands
///
/// Codes follow the DOM `KeyboardEvent.code` names, which are also the
/// `Debug` names of winit's `KeyCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    by_code: BTreeMap<String, Command>,
}

impl Default for Bindings {
    fn default() -> Self {
        let table = [
            ("KeyW", Command::Forward),
            ("KeyS", Command::Backward),
            ("KeyA", Command::Left),
            ("KeyD", Command::Right),
            ("Space", Command::Handbrake),
            ("ShiftLeft", Command::Boost),
            ("KeyC", Command::ChangeCamera),
            ("Escape", Command::Exit),
            ("KeyP", Command::Pause),
        ];
        Self {
            by_code: table
                .into_iter()
                .map(|(code, command)| (code.to_string(), command))
                .collect(),
        }
    }
}

impl Bindings {
    /// An empty table
    pub fn empty() -> Self {
        Self {
            by_code: BTreeMap::new(),
        }
    }

    /// Command bound to a physical code
    pub fn command_for(&self, code: &str) -> Option<Command> {
        self.by_code.get(code).copied()
    }

    /// First code bound to a command
    pub fn code_for(&self, command: Command) -> Option<&str> {
        self.by_code
            .iter()
            .find(|(_, c)| **c == command)
            .map(|(code, _)| code.as_str())
    }

    /// Bind a code, returning the command it was bound to before
    pub fn bind(&mut self, code: impl Into<String>, command: Command) -> Result<Option<Command>> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(InputError::EmptyCode(command.to_string()));
        }
        Ok(self.by_code.insert(code, command))
    }

    /// Bind from string tokens, e.g. from a config file
    pub fn bind_token(&mut self, code: &str, command: &str) -> Result<Option<Command>> {
        let command = command.parse()?;
        self.bind(code, command)
    }

    /// Remove a binding
    pub fn unbind(&mut self, code: &str) -> Option<Command> {
        self.by_code.remove(code)
    }

    /// Iterate bindings in code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Command)> {
        self.by_code.iter().map(|(code, c)| (code.as_str(), *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_command() {
        let bindings = Bindings::default();
        for command in Command::ALL {
            assert!(bindings.code_for(command).is_some(), "{command} unbound");
        }
        assert_eq!(bindings.command_for("KeyP"), Some(Command::Pause));
        assert_eq!(bindings.command_for("ShiftLeft"), Some(Command::Boost));
    }

    #[test]
    fn test_rebind_returns_previous() {
        let mut bindings = Bindings::default();
        let previous = bindings.bind("KeyW", Command::Backward).unwrap();
        assert_eq!(previous, Some(Command::Forward));
        assert_eq!(bindings.command_for("KeyW"), Some(Command::Backward));
    }

    #[test]
    fn test_bind_token() {
        let mut bindings = Bindings::empty();
        bindings.bind_token("ArrowUp", "forward").unwrap();
        assert_eq!(bindings.command_for("ArrowUp"), Some(Command::Forward));
        assert!(bindings.bind_token("ArrowUp", "fly").is_err());
    }

    #[test]
    fn test_empty_code_rejected() {
        let mut bindings = Bindings::empty();
        assert!(matches!(
            bindings.bind("  ", Command::Exit),
            Err(InputError::EmptyCode(_))
        ));
    }
}
