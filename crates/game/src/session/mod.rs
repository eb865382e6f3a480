//! Two-seat game session.
//!
//! `Session` owns the board, the turn and both seats. It performs no I/O:
//! every operation returns [`Effects`] describing which messages go to which
//! seat and which connections were released, and the caller carries them out.
//! The connection handle type `C` is opaque to the session.

mod seat;

use crate::board::{Board, Mark, Outcome};
use crate::net::{Command, ServerMessage};

pub use seat::SeatSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPlayer1,
    AwaitingPlayer2,
    InProgress,
    Terminal(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub seat: Mark,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    GameStarted,
    MoveAccepted { seat: Mark, position: i64 },
    GameOver(Outcome),
    Restarted,
}

#[derive(Debug)]
pub struct Effects<C> {
    pub deliveries: Vec<Delivery>,
    pub released: Vec<(Mark, C)>,
    pub transitions: Vec<Transition>,
}

impl<C> Effects<C> {
    pub fn new() -> Self {
        Self {
            deliveries: Vec::new(),
            released: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty() && self.released.is_empty() && self.transitions.is_empty()
    }

    #[cfg(test)]
    pub fn messages_for(&self, seat: Mark) -> Vec<ServerMessage> {
        self.deliveries
            .iter()
            .filter(|d| d.seat == seat)
            .map(|d| d.message)
            .collect()
    }

    fn send(&mut self, seat: Mark, message: ServerMessage) {
        self.deliveries.push(Delivery { seat, message });
    }
}

impl<C> Default for Effects<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Session<C> {
    board: Board,
    turn: Mark,
    outcome: Outcome,
    seats: [SeatSlot<C>; 2],
}

impl<C> Session<C> {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Mark::X,
            outcome: Outcome::InProgress,
            seats: [SeatSlot::new(), SeatSlot::new()],
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn state(&self) -> SessionState {
        if !self.is_occupied(Mark::X) {
            SessionState::AwaitingPlayer1
        } else if !self.is_occupied(Mark::O) {
            SessionState::AwaitingPlayer2
        } else if self.outcome.is_terminal() {
            SessionState::Terminal(self.outcome)
        } else {
            SessionState::InProgress
        }
    }

    pub fn is_occupied(&self, seat: Mark) -> bool {
        self.seat(seat).is_occupied()
    }

    pub fn is_full(&self) -> bool {
        Mark::ALL.iter().all(|&seat| self.is_occupied(seat))
    }

    /// The seat a newly admitted peer would take; X is filled before O.
    pub fn vacant_seat(&self) -> Option<Mark> {
        Mark::ALL.into_iter().find(|&seat| !self.is_occupied(seat))
    }

    pub fn connection(&self, seat: Mark) -> Option<&C> {
        self.seat(seat).connection()
    }

    pub fn connection_mut(&mut self, seat: Mark) -> Option<&mut C> {
        self.seats[seat.index()].connection_mut()
    }

    pub fn find_seat(&self, mut predicate: impl FnMut(&C) -> bool) -> Option<Mark> {
        Mark::ALL
            .into_iter()
            .find(|&seat| self.connection(seat).is_some_and(&mut predicate))
    }

    pub fn restart_requested(&self, seat: Mark) -> bool {
        self.seat(seat).restart_requested()
    }

    /// Seats `connection` in the vacant seat. Once both seats are filled a
    /// fresh game starts. Hands the connection back if no seat is free.
    pub fn admit(&mut self, connection: C) -> Result<(Mark, Effects<C>), C> {
        let Some(seat) = self.vacant_seat() else {
            return Err(connection);
        };

        self.seats[seat.index()].occupy(connection);
        self.clear_restart_requests();

        let mut effects = Effects::new();
        effects.send(seat, ServerMessage::Role(seat));

        if self.is_full() {
            self.reset_game();
            self.broadcast(&mut effects, self.board_snapshot());
            effects.transitions.push(Transition::GameStarted);
        }

        Ok((seat, effects))
    }

    /// Empties `seat` without notifying anyone. The board and the other seat
    /// are left as they are until the seat is filled again.
    pub fn vacate(&mut self, seat: Mark) -> Option<C> {
        let connection = self.seats[seat.index()].vacate();
        self.clear_restart_requests();
        connection
    }

    pub fn handle(&mut self, seat: Mark, payload: &[u8]) -> Effects<C> {
        self.dispatch(seat, Command::parse(payload))
    }

    pub fn dispatch(&mut self, seat: Mark, command: Command) -> Effects<C> {
        match command {
            Command::Quit => self.on_quit(seat),
            Command::Restart => self.on_restart(seat),
            Command::Move(position) => self.on_move(seat, position),
        }
    }

    fn on_quit(&mut self, seat: Mark) -> Effects<C> {
        let mut effects = Effects::new();

        let other = seat.opponent();
        if self.is_occupied(other) {
            effects.send(other, ServerMessage::PlayerQuit);
        }

        if let Some(connection) = self.vacate(seat) {
            effects.released.push((seat, connection));
        }

        effects
    }

    fn on_restart(&mut self, seat: Mark) -> Effects<C> {
        let mut effects = Effects::new();
        self.seats[seat.index()].request_restart();

        let agreed = Mark::ALL
            .iter()
            .all(|&s| self.is_occupied(s) && self.restart_requested(s));
        if agreed {
            self.reset_game();
            self.broadcast(&mut effects, self.board_snapshot());
            effects.transitions.push(Transition::Restarted);
        }

        effects
    }

    fn on_move(&mut self, seat: Mark, position: i64) -> Effects<C> {
        let mut effects = Effects::new();

        match self.state() {
            SessionState::InProgress => {}
            state => {
                log::debug!("Ignoring move {} from {} while {:?}", position, seat, state);
                return effects;
            }
        }

        if seat != self.turn {
            effects.send(seat, ServerMessage::NotYourTurn);
            return effects;
        }

        if let Err(rejection) = self.board.apply(seat, position) {
            log::debug!("Rejected move from {}: {}", seat, rejection);
            effects.send(seat, ServerMessage::InvalidMove);
            return effects;
        }

        effects
            .transitions
            .push(Transition::MoveAccepted { seat, position });

        self.outcome = self.board.evaluate();
        match self.outcome {
            Outcome::InProgress => {
                self.turn = self.turn.opponent();
                self.broadcast(&mut effects, self.board_snapshot());
            }
            Outcome::Win(mark) => {
                self.broadcast(&mut effects, self.board_snapshot());
                self.broadcast(&mut effects, ServerMessage::Winner(mark));
                effects.transitions.push(Transition::GameOver(self.outcome));
            }
            Outcome::Draw => {
                self.broadcast(&mut effects, self.board_snapshot());
                self.broadcast(&mut effects, ServerMessage::Draw);
                effects.transitions.push(Transition::GameOver(self.outcome));
            }
        }

        effects
    }

    fn seat(&self, seat: Mark) -> &SeatSlot<C> {
        &self.seats[seat.index()]
    }

    fn reset_game(&mut self) {
        self.board.reset();
        self.turn = Mark::X;
        self.outcome = Outcome::InProgress;
        self.clear_restart_requests();
    }

    fn clear_restart_requests(&mut self) {
        for slot in &mut self.seats {
            slot.clear_restart();
        }
    }

    fn board_snapshot(&self) -> ServerMessage {
        ServerMessage::Board {
            board: self.board,
            turn: self.turn,
        }
    }

    fn broadcast(&self, effects: &mut Effects<C>, message: ServerMessage) {
        for seat in Mark::ALL {
            if self.is_occupied(seat) {
                effects.send(seat, message);
            }
        }
    }
}

impl<C> Default for Session<C> {
    fn default() -> Self {
        Self::new()
    }
}
