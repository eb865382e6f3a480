use std::io;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
pub const KEY_HEADER: &str = "Sec-WebSocket-Key: ";
pub const HANDSHAKE_BUFFER_SIZE: usize = 2048;

const LINE_END: &[u8] = b"\r\n";

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("connection closed before upgrade request")]
    Closed,
    #[error("upgrade request has no Sec-WebSocket-Key header")]
    MissingKey,
    #[error("Sec-WebSocket-Key header is not terminated")]
    UnterminatedKey,
    #[error("upgrade request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

pub fn accept_token(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

pub fn extract_key(request: &[u8]) -> Result<String, HandshakeError> {
    let start = find(request, KEY_HEADER.as_bytes()).ok_or(HandshakeError::MissingKey)?
        + KEY_HEADER.len();
    let len = find(&request[start..], LINE_END).ok_or(HandshakeError::UnterminatedKey)?;
    Ok(String::from_utf8_lossy(&request[start..start + len]).into_owned())
}

pub fn upgrade_response(accept: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\r\n"
    )
}

/// Admits a peer by answering its upgrade request. The request must arrive
/// in a single read; a key split across reads is rejected. Returns the
/// accept token that was sent.
pub async fn negotiate<S>(stream: &mut S) -> Result<String, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = [0u8; HANDSHAKE_BUFFER_SIZE];
    let len = stream.read(&mut buffer).await?;
    if len == 0 {
        return Err(HandshakeError::Closed);
    }

    let key = extract_key(&buffer[..len])?;
    let accept = accept_token(&key);

    stream.write_all(upgrade_response(&accept).as_bytes()).await?;
    stream.flush().await?;

    Ok(accept)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
