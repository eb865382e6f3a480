mod frame;
mod handshake;
mod message;

pub use frame::{
    apply_mask, encode_masked_text, encode_text, read_frame, read_unmasked_frame, write_text,
    Frame, FrameError, Opcode, FIN_TEXT, MAX_INLINE_LEN, MAX_PAYLOAD_SIZE,
};
pub use handshake::{
    accept_token, extract_key, negotiate, upgrade_response, HandshakeError,
    HANDSHAKE_BUFFER_SIZE, KEY_HEADER, WEBSOCKET_GUID,
};
pub use message::{Command, ServerMessage, DEFAULT_PORT, QUIT, RESTART};
