use std::fmt;

use crate::board::{parse_position, Board, Mark};

pub const DEFAULT_PORT: u16 = 8080;

pub const QUIT: &[u8] = b"QUIT";
pub const RESTART: &[u8] = b"RESTART";

/// A decoded client payload. Matching is by exact, case-sensitive prefix;
/// anything else is read as a move position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(i64),
    Quit,
    Restart,
}

impl Command {
    pub fn parse(payload: &[u8]) -> Self {
        if payload.starts_with(QUIT) {
            Command::Quit
        } else if payload.starts_with(RESTART) {
            Command::Restart
        } else {
            Command::Move(parse_position(payload))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    Role(Mark),
    Board { board: Board, turn: Mark },
    NotYourTurn,
    InvalidMove,
    Winner(Mark),
    Draw,
    PlayerQuit,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Role(mark) => write!(f, "You are Player {mark}"),
            ServerMessage::Board { board, turn } => {
                f.write_str("BOARD\n")?;
                for row in board.rows() {
                    let [a, b, c] = row.map(|cell| cell.as_char());
                    writeln!(f, "{a}|{b}|{c}")?;
                }
                write!(f, "TURN:{turn}")
            }
            ServerMessage::NotYourTurn => f.write_str("Not your turn"),
            ServerMessage::InvalidMove => f.write_str("Invalid move. Try again."),
            ServerMessage::Winner(mark) => write!(f, "WINNER: {mark}"),
            ServerMessage::Draw => f.write_str("DRAW"),
            ServerMessage::PlayerQuit => f.write_str("PLAYER_QUIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_prefixes() {
        assert_eq!(Command::parse(b"QUIT"), Command::Quit);
        assert_eq!(Command::parse(b"QUITTING"), Command::Quit);
        assert_eq!(Command::parse(b"RESTART"), Command::Restart);
        assert_eq!(Command::parse(b"RESTART now"), Command::Restart);
        assert_eq!(Command::parse(b"quit"), Command::Move(0));
        assert_eq!(Command::parse(b"RESTAR"), Command::Move(0));
        assert_eq!(Command::parse(b"7"), Command::Move(7));
    }

    #[test]
    fn test_board_rendering() {
        let mut board = Board::new();
        board.apply(Mark::X, 5).unwrap();
        board.apply(Mark::O, 1).unwrap();

        let message = ServerMessage::Board {
            board,
            turn: Mark::X,
        };
        assert_eq!(message.to_string(), "BOARD\nO| | \n |X| \n | | \nTURN:X");
    }

    #[test]
    fn test_notice_texts() {
        assert_eq!(ServerMessage::Role(Mark::X).to_string(), "You are Player X");
        assert_eq!(ServerMessage::Role(Mark::O).to_string(), "You are Player O");
        assert_eq!(ServerMessage::NotYourTurn.to_string(), "Not your turn");
        assert_eq!(
            ServerMessage::InvalidMove.to_string(),
            "Invalid move. Try again."
        );
        assert_eq!(ServerMessage::Winner(Mark::O).to_string(), "WINNER: O");
        assert_eq!(ServerMessage::Draw.to_string(), "DRAW");
        assert_eq!(ServerMessage::PlayerQuit.to_string(), "PLAYER_QUIT");
    }
}
