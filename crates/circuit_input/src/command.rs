//! Logical commands

use crate::error::InputError;
use serde::{Deserialize, Serialize};

/// A logical command the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    /// Handbrake while driving, fly down-up in free camera
    Handbrake,
    Boost,
    ChangeCamera,
    Exit,
    Pause,
}

impl Command {
    /// Every command, in table order
    pub const ALL: [Command; 9] = [
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
        Command::Handbrake,
        Command::Boost,
        Command::ChangeCamera,
        Command::Exit,
        Command::Pause,
    ];

    /// String token used in binding tables
    pub fn token(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Handbrake => "handbrake",
            Self::Boost => "boost",
            Self::ChangeCamera => "change-camera",
            Self::Exit => "exit",
            Self::Pause => "pause",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl std::str::FromStr for Command {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Command::ALL
            .into_iter()
            .find(|c| c.token() == normalized)
            .ok_or_else(|| InputError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        for command in Command::ALL {
            assert_eq!(command.token().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_underscore() {
        assert_eq!("Change_Camera".parse::<Command>().unwrap(), Command::ChangeCamera);
        assert_eq!(" PAUSE ".parse::<Command>().unwrap(), Command::Pause);
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(
            "jump".parse::<Command>(),
            Err(InputError::UnknownCommand("jump".to_string()))
        );
    }

    #[test]
    fn test_index_matches_table() {
        for (i, command) in Command::ALL.into_iter().enumerate() {
            assert_eq!(command.index(), i);
        }
    }
}
