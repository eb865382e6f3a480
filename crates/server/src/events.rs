use std::net::SocketAddr;

use noughts::{Board, Mark, Outcome};

#[derive(Debug, Clone)]
pub enum ServerEvent {
    Listening {
        addr: SocketAddr,
    },
    PeerAdmitted {
        seat: Mark,
        addr: SocketAddr,
    },
    HandshakeRejected {
        addr: SocketAddr,
        reason: String,
    },
    SeatVacated {
        seat: Mark,
        reason: VacateReason,
    },
    GameStarted,
    MoveAccepted {
        seat: Mark,
        position: i64,
    },
    BoardChanged {
        board: Board,
        turn: Mark,
    },
    GameOver {
        outcome: Outcome,
    },
    Restarted,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacateReason {
    Disconnected,
    Quit,
    WriteFailed,
    Shutdown,
}

impl VacateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VacateReason::Disconnected => "disconnected",
            VacateReason::Quit => "quit",
            VacateReason::WriteFailed => "dropped after a failed write",
            VacateReason::Shutdown => "closed on shutdown",
        }
    }
}
