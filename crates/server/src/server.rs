use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use noughts::{negotiate, Effects, HandshakeError, Mark, Session, Transition};

use crate::config::ServerConfig;
use crate::events::{ServerEvent, VacateReason};
use crate::peer::{Peer, PeerEvent, PeerId};

pub struct GameServer {
    listener: TcpListener,
    config: ServerConfig,
    session: Session<Peer>,
    peer_tx: UnboundedSender<PeerEvent>,
    peer_rx: UnboundedReceiver<PeerEvent>,
    next_peer_id: PeerId,
    events: Option<UnboundedSender<ServerEvent>>,
}

impl GameServer {
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        Ok(Self {
            listener,
            config,
            session: Session::new(),
            peer_tx,
            peer_rx,
            next_peer_id: 1,
            events: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session(&self) -> &Session<Peer> {
        &self.session
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if let Ok(addr) = self.local_addr() {
            self.emit(ServerEvent::Listening { addr });
        }
        log::info!("Waiting for Player X...");

        loop {
            let accepting = self.session.vacant_seat().is_some();

            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept(), if accepting => match accepted {
                    Ok((stream, addr)) => self.admit(stream, addr).await,
                    Err(e) => {
                        log::warn!("Accept failed: {}", e);
                        self.emit(ServerEvent::Error {
                            message: format!("Accept failed: {}", e),
                        });
                    }
                },
                Some(event) = self.peer_rx.recv() => self.handle_peer_event(event).await,
            }
        }

        self.shutdown_connections();
    }

    pub fn shutdown_connections(&mut self) {
        for seat in Mark::ALL {
            if self.session.is_occupied(seat) {
                self.release(seat, VacateReason::Shutdown);
            }
        }
    }

    async fn admit(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        let negotiated = match self.config.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, negotiate(&mut stream))
                .await
                .unwrap_or(Err(HandshakeError::Timeout)),
            None => negotiate(&mut stream).await,
        };

        if let Err(e) = negotiated {
            log::warn!("Rejected connection from {}: {}", addr, e);
            self.emit(ServerEvent::HandshakeRejected {
                addr,
                reason: e.to_string(),
            });
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
        }

        let id = self.next_peer_id;
        self.next_peer_id += 1;
        let peer = Peer::spawn(
            id,
            addr,
            stream,
            self.config.max_payload,
            self.peer_tx.clone(),
        );

        match self.session.admit(peer) {
            Ok((seat, effects)) => {
                log::info!("Player {} connected from {}", seat, addr);
                self.emit(ServerEvent::PeerAdmitted { seat, addr });
                self.apply(effects).await;
                if let Some(next) = self.session.vacant_seat() {
                    log::info!("Waiting for Player {}...", next);
                }
            }
            Err(peer) => {
                log::warn!("No free seat for {}", peer.addr);
            }
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Frame { peer, frame } => {
                let Some(seat) = self.seat_of(peer) else {
                    return;
                };
                if frame.payload.is_empty() {
                    log::info!("Player {} sent an empty frame", seat);
                    self.release(seat, VacateReason::Disconnected);
                    return;
                }
                log::debug!("<- Player {} {:?}", seat, frame.text());
                let effects = self.session.handle(seat, &frame.payload);
                self.apply(effects).await;
            }
            PeerEvent::Closed { peer, error } => {
                let Some(seat) = self.seat_of(peer) else {
                    return;
                };
                log::info!("Player {} connection lost: {}", seat, error);
                self.release(seat, VacateReason::Disconnected);
            }
        }
    }

    async fn apply(&mut self, effects: Effects<Peer>) {
        if effects.is_empty() {
            return;
        }
        let Effects {
            deliveries,
            released,
            transitions,
        } = effects;

        let mut failed: Vec<Mark> = Vec::new();
        for delivery in deliveries {
            if failed.contains(&delivery.seat) {
                continue;
            }
            let Some(peer) = self.session.connection_mut(delivery.seat) else {
                continue;
            };
            if let Err(e) = peer.send(&delivery.message).await {
                log::warn!("Failed to send to Player {}: {}", delivery.seat, e);
                failed.push(delivery.seat);
            }
        }

        for (seat, peer) in released {
            log::info!("Player {} quit", seat);
            drop(peer);
            self.emit(ServerEvent::SeatVacated {
                seat,
                reason: VacateReason::Quit,
            });
            log::info!("Waiting for new Player {}...", seat);
        }

        if !transitions.is_empty() {
            for transition in transitions {
                self.report(transition);
            }
            self.emit(ServerEvent::BoardChanged {
                board: *self.session.board(),
                turn: self.session.turn(),
            });
        }

        for seat in failed {
            self.release(seat, VacateReason::WriteFailed);
        }
    }

    fn report(&self, transition: Transition) {
        let event = match transition {
            Transition::GameStarted => {
                log::info!("Both players connected, game started");
                ServerEvent::GameStarted
            }
            Transition::MoveAccepted { seat, position } => {
                log::info!("Player {} played {}", seat, position);
                ServerEvent::MoveAccepted { seat, position }
            }
            Transition::GameOver(outcome) => {
                log::info!("Game over: {:?}", outcome);
                ServerEvent::GameOver { outcome }
            }
            Transition::Restarted => {
                log::info!("Both players requested restart");
                ServerEvent::Restarted
            }
        };
        self.emit(event);
    }

    fn release(&mut self, seat: Mark, reason: VacateReason) {
        if let Some(peer) = self.session.vacate(seat) {
            log::info!("Player {} ({}) {}", seat, peer.addr, reason.as_str());
            self.emit(ServerEvent::SeatVacated { seat, reason });
        }
    }

    fn seat_of(&self, id: PeerId) -> Option<Mark> {
        self.session.find_seat(|peer| peer.id == id)
    }

    fn emit(&self, event: ServerEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
