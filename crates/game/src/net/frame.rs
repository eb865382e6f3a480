use std::borrow::Cow;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// FIN bit set, text opcode.
pub const FIN_TEXT: u8 = 0x81;
pub const MAX_INLINE_LEN: usize = 125;
pub const MAX_PAYLOAD_SIZE: usize = 1 << 20;

const LEN_16: u8 = 126;
const LEN_64: u8 = 127;
const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_BITS: u8 = 0x0F;
const LEN_BITS: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Reserved(u8),
}

impl From<u8> for Opcode {
    fn from(bits: u8) -> Self {
        match bits & OPCODE_BITS {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            other => Opcode::Reserved(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,
    #[error("frame payload of {len} bytes exceeds limit of {limit}")]
    PayloadTooLarge { len: u64, limit: usize },
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskKey {
    Always,
    IfFlagged,
}

pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

/// Reads one client-to-server frame. A mask key is always consumed since
/// clients are required to mask, whether or not the mask bit is set.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    read_frame_with(reader, limit, MaskKey::Always).await
}

/// Reads one server-to-client frame, as seen by a client. Such frames are
/// unmasked; a key is consumed only if the mask bit says one is present.
pub async fn read_unmasked_frame<R>(reader: &mut R, limit: usize) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    read_frame_with(reader, limit, MaskKey::IfFlagged).await
}

async fn read_frame_with<R>(reader: &mut R, limit: usize, mask: MaskKey) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    if let Err(e) = reader.read_exact(&mut header).await {
        return Err(match e.kind() {
            io::ErrorKind::UnexpectedEof => FrameError::Closed,
            _ => FrameError::Io(e),
        });
    }

    let fin = header[0] & FIN_BIT != 0;
    let opcode = Opcode::from(header[0]);
    let masked = header[1] & MASK_BIT != 0;

    let len = match header[1] & LEN_BITS {
        LEN_16 => {
            let mut extended = [0u8; 2];
            reader.read_exact(&mut extended).await?;
            u64::from(u16::from_be_bytes(extended))
        }
        LEN_64 => {
            let mut extended = [0u8; 8];
            reader.read_exact(&mut extended).await?;
            u64::from_be_bytes(extended)
        }
        short => u64::from(short),
    };

    if len > limit as u64 {
        return Err(FrameError::PayloadTooLarge { len, limit });
    }

    let key = if mask == MaskKey::Always || masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    if let Some(key) = key {
        apply_mask(&mut payload, key);
    }

    Ok(Frame {
        fin,
        opcode,
        payload,
    })
}

fn encode_frame(first: u8, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 14);
    out.push(first);

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    match payload.len() {
        len if len <= MAX_INLINE_LEN => out.push(mask_bit | len as u8),
        len if len <= u16::MAX as usize => {
            out.push(mask_bit | LEN_16);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        len => {
            out.push(mask_bit | LEN_64);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }

    match mask {
        Some(key) => {
            out.extend_from_slice(&key);
            let start = out.len();
            out.extend_from_slice(payload);
            apply_mask(&mut out[start..], key);
        }
        None => out.extend_from_slice(payload),
    }

    out
}

/// Builds an unmasked, single-fragment text frame.
pub fn encode_text(text: &str) -> Vec<u8> {
    encode_frame(FIN_TEXT, text.as_bytes(), None)
}

/// Builds a masked text frame the way a client would send it.
pub fn encode_masked_text(text: &str, key: [u8; 4]) -> Vec<u8> {
    encode_frame(FIN_TEXT, text.as_bytes(), Some(key))
}

pub async fn write_text<W>(writer: &mut W, text: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_text(text)).await?;
    writer.flush().await?;
    Ok(())
}
