pub mod board;
pub mod net;
pub mod session;

pub use board::{parse_position, Board, Cell, Mark, MoveRejection, Outcome};
pub use net::{
    accept_token, encode_masked_text, encode_text, negotiate, read_frame, read_unmasked_frame,
    write_text, Command, Frame, FrameError, HandshakeError, Opcode, ServerMessage, DEFAULT_PORT,
    MAX_PAYLOAD_SIZE,
};
pub use session::{Delivery, Effects, Session, SessionState, Transition};
