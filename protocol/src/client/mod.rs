use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/// One action the player can submit for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    /// `move N`, 1-based move slot
    Move(u8),
    /// `switch N`, 1-based team slot
    Switch(u8),
}

impl Choice {
    pub fn is_move(&self) -> bool {
        matches!(self, Choice::Move(_))
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Choice::Switch(_))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Move(n) => write!(f, "move {}", n),
            Choice::Switch(n) => write!(f, "switch {}", n),
        }
    }
}

impl FromStr for Choice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, slot) = s
            .split_once(' ')
            .ok_or_else(|| ParseError::InvalidFormat(format!("choice '{}'", s)))?;
        let slot: u8 = slot
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidFormat(format!("choice slot '{}'", slot)))?;

        match action {
            "move" => Ok(Choice::Move(slot)),
            "switch" => Ok(Choice::Switch(slot)),
            _ => Err(ParseError::InvalidFormat(format!("choice action '{}'", action))),
        }
    }
}

/// Commands the engine sends to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// /choose CHOICE|RQID
    Choose { choice: String, rqid: Option<u64> },
}

impl ClientCommand {
    /// Serialize command to protocol format
    pub fn to_protocol_string(&self) -> String {
        match self {
            Self::Choose {
                choice,
                rqid: Some(rqid),
            } => format!("/choose {}|{}", choice, rqid),
            Self::Choose { choice, rqid: None } => format!("/choose {}", choice),
        }
    }
}

/// Client message with optional room context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    pub room_id: Option<String>,
    pub command: ClientCommand,
}

impl ClientMessage {
    /// Serialize to wire format: ROOMID|TEXT or |TEXT
    pub fn to_wire_format(&self) -> String {
        let text = self.command.to_protocol_string();
        match &self.room_id {
            Some(room) => format!("{}|{}", room, text),
            None => format!("|{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_display_and_parse() {
        assert_eq!(Choice::Move(2).to_string(), "move 2");
        assert_eq!("switch 4".parse::<Choice>().unwrap(), Choice::Switch(4));
        assert!("team 123".parse::<Choice>().is_err());
        assert!("move".parse::<Choice>().is_err());
    }

    #[test]
    fn test_choose_wire_format() {
        let msg = ClientMessage {
            room_id: Some("battle-gen4randombattle-1".to_string()),
            command: ClientCommand::Choose {
                choice: "move 1".to_string(),
                rqid: Some(7),
            },
        };
        assert_eq!(
            msg.to_wire_format(),
            "battle-gen4randombattle-1|/choose move 1|7"
        );
    }
}
