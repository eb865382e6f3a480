use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use noughts::{read_frame, write_text, Frame, FrameError, ServerMessage};

pub type PeerId = u64;

#[derive(Debug)]
pub enum PeerEvent {
    Frame { peer: PeerId, frame: Frame },
    Closed { peer: PeerId, error: FrameError },
}

#[derive(Debug)]
pub struct Peer {
    pub id: PeerId,
    pub addr: SocketAddr,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

impl Peer {
    pub fn spawn(
        id: PeerId,
        addr: SocketAddr,
        stream: TcpStream,
        max_payload: usize,
        events: UnboundedSender<PeerEvent>,
    ) -> Self {
        let (read_half, writer) = stream.into_split();
        let reader = tokio::spawn(read_loop(id, read_half, max_payload, events));
        Self {
            id,
            addr,
            writer,
            reader,
        }
    }

    pub async fn send(&mut self, message: &ServerMessage) -> Result<(), FrameError> {
        let text = message.to_string();
        log::debug!("-> {} {:?}", self.addr, text);
        write_text(&mut self.writer, &text).await
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    peer: PeerId,
    mut reader: OwnedReadHalf,
    max_payload: usize,
    events: UnboundedSender<PeerEvent>,
) {
    loop {
        match read_frame(&mut reader, max_payload).await {
            Ok(frame) => {
                if events.send(PeerEvent::Frame { peer, frame }).is_err() {
                    break;
                }
            }
            Err(error) => {
                let _ = events.send(PeerEvent::Closed { peer, error });
                break;
            }
        }
    }
}
