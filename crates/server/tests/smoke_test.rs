// End-to-end tests against a live server bound to an OS-assigned port. Each
// client is a plain TCP socket speaking the upgrade handshake and masked
// frames, the way a browser would.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use noughts::{accept_token, encode_masked_text, read_unmasked_frame, MAX_PAYLOAD_SIZE};
use noughts_server::{GameServer, ServerConfig, ServerEvent};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

struct Client {
    stream: TcpStream,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET / HTTP/1.1\r\n\
             Host: {addr}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {KEY}\r\n\
             Sec-WebSocket-Version: 13\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        while !response.ends_with(b"\r\n\r\n") {
            let mut byte = [0u8; 1];
            let n = timeout(RECV_TIMEOUT, stream.read(&mut byte))
                .await
                .expect("handshake response timed out")
                .unwrap();
            assert_eq!(n, 1, "server closed during handshake");
            response.push(byte[0]);
        }

        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains(&format!("Sec-WebSocket-Accept: {}\r\n", accept_token(KEY))));

        Self { stream }
    }

    async fn send(&mut self, text: &str) {
        let frame = encode_masked_text(text, [0x12, 0x34, 0x56, 0x78]);
        self.stream.write_all(&frame).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        let frame = timeout(
            RECV_TIMEOUT,
            read_unmasked_frame(&mut self.stream, MAX_PAYLOAD_SIZE),
        )
        .await
        .expect("no message from server")
        .unwrap();
        frame.text().into_owned()
    }

    async fn expect_closed(&mut self) {
        let mut byte = [0u8; 1];
        let n = timeout(RECV_TIMEOUT, self.stream.read(&mut byte))
            .await
            .expect("server did not close the connection")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}

fn local_config() -> ServerConfig {
    ServerConfig {
        bind: String::from("127.0.0.1"),
        port: 0,
        ..Default::default()
    }
}

async fn start_server() -> SocketAddr {
    start_server_with(local_config()).await
}

async fn start_server_with(config: ServerConfig) -> SocketAddr {
    let server = GameServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

fn board(rows: [&str; 3], turn: char) -> String {
    format!("BOARD\n{}\n{}\n{}\nTURN:{}", rows[0], rows[1], rows[2], turn)
}

const EMPTY: [&str; 3] = [" | | ", " | | ", " | | "];

async fn start_game(addr: SocketAddr) -> (Client, Client) {
    let mut x = Client::connect(addr).await;
    assert_eq!(x.recv().await, "You are Player X");

    let mut o = Client::connect(addr).await;
    assert_eq!(o.recv().await, "You are Player O");

    assert_eq!(x.recv().await, board(EMPTY, 'X'));
    assert_eq!(o.recv().await, board(EMPTY, 'X'));
    (x, o)
}

#[tokio::test]
async fn test_opening_moves_and_invalid_move() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    x.send("5").await;
    let centre = board([" | | ", " |X| ", " | | "], 'O');
    assert_eq!(x.recv().await, centre);
    assert_eq!(o.recv().await, centre);

    o.send("5").await;
    assert_eq!(o.recv().await, "Invalid move. Try again.");

    o.send("1").await;
    let next = board(["O| | ", " |X| ", " | | "], 'X');
    assert_eq!(x.recv().await, next);
    assert_eq!(o.recv().await, next);
}

#[tokio::test]
async fn test_out_of_turn_is_private() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    x.send("1").await;
    let after_x = board(["X| | ", " | | ", " | | "], 'O');
    assert_eq!(x.recv().await, after_x);
    assert_eq!(o.recv().await, after_x);

    x.send("2").await;
    assert_eq!(x.recv().await, "Not your turn");

    o.send("not a number").await;
    assert_eq!(o.recv().await, "Invalid move. Try again.");

    o.send("2").await;
    let after_o = board(["X|O| ", " | | ", " | | "], 'X');
    assert_eq!(x.recv().await, after_o);
    assert_eq!(o.recv().await, after_o);
}

#[tokio::test]
async fn test_win_then_restart() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    for (mover, position) in [("x", "1"), ("o", "4"), ("x", "2"), ("o", "5")] {
        match mover {
            "x" => x.send(position).await,
            _ => o.send(position).await,
        }
        x.recv().await;
        o.recv().await;
    }

    x.send("3").await;
    let final_board = board(["X|X|X", "O|O| ", " | | "], 'X');
    for client in [&mut x, &mut o] {
        assert_eq!(client.recv().await, final_board);
        assert_eq!(client.recv().await, "WINNER: X");
    }

    o.send("9").await;
    x.send("RESTART").await;
    o.send("RESTART").await;

    assert_eq!(x.recv().await, board(EMPTY, 'X'));
    assert_eq!(o.recv().await, board(EMPTY, 'X'));
}

#[tokio::test]
async fn test_draw() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    for (n, position) in ["1", "2", "3", "5", "4", "6", "8", "7"].into_iter().enumerate() {
        if n % 2 == 0 {
            x.send(position).await;
        } else {
            o.send(position).await;
        }
        x.recv().await;
        o.recv().await;
    }

    x.send("9").await;
    let full = board(["X|O|X", "X|O|O", "O|X|X"], 'X');
    for client in [&mut x, &mut o] {
        assert_eq!(client.recv().await, full);
        assert_eq!(client.recv().await, "DRAW");
    }
}

#[tokio::test]
async fn test_disconnect_and_replacement() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    x.send("5").await;
    x.recv().await;
    o.recv().await;

    drop(x);

    let mut replacement = Client::connect(addr).await;
    assert_eq!(replacement.recv().await, "You are Player X");
    assert_eq!(replacement.recv().await, board(EMPTY, 'X'));
    assert_eq!(o.recv().await, board(EMPTY, 'X'));
}

#[tokio::test]
async fn test_quit_notifies_and_refills() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    o.send("QUIT").await;
    assert_eq!(x.recv().await, "PLAYER_QUIT");
    o.expect_closed().await;

    let mut replacement = Client::connect(addr).await;
    assert_eq!(replacement.recv().await, "You are Player O");
    assert_eq!(replacement.recv().await, board(EMPTY, 'X'));
    assert_eq!(x.recv().await, board(EMPTY, 'X'));
}

#[tokio::test]
async fn test_empty_frame_vacates_seat() {
    let addr = start_server().await;
    let (mut x, mut o) = start_game(addr).await;

    x.send("5").await;
    x.recv().await;
    o.recv().await;

    x.send("").await;
    x.expect_closed().await;

    let mut replacement = Client::connect(addr).await;
    assert_eq!(replacement.recv().await, "You are Player X");
    assert_eq!(replacement.recv().await, board(EMPTY, 'X'));
    assert_eq!(o.recv().await, board(EMPTY, 'X'));
}

#[tokio::test]
async fn test_oversize_frame_vacates_seat() {
    let addr = start_server_with(ServerConfig {
        max_payload: 16,
        ..local_config()
    })
    .await;
    let (mut x, mut o) = start_game(addr).await;

    o.send(&"9".repeat(64)).await;
    o.expect_closed().await;

    let mut replacement = Client::connect(addr).await;
    assert_eq!(replacement.recv().await, "You are Player O");
    assert_eq!(replacement.recv().await, board(EMPTY, 'X'));
    assert_eq!(x.recv().await, board(EMPTY, 'X'));
}

#[tokio::test]
async fn test_idle_handshake_times_out() {
    let addr = start_server_with(ServerConfig {
        handshake_timeout: Some(Duration::from_millis(200)),
        ..local_config()
    })
    .await;

    let mut idle = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 64];
    let n = timeout(RECV_TIMEOUT, idle.read(&mut buf))
        .await
        .expect("idle connection was not closed")
        .unwrap_or(0);
    assert_eq!(n, 0);

    let mut x = Client::connect(addr).await;
    assert_eq!(x.recv().await, "You are Player X");
}

#[tokio::test]
async fn test_bad_handshake_is_rejected() {
    let addr = start_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut buf = [0u8; 64];
    let n = timeout(RECV_TIMEOUT, stream.read(&mut buf))
        .await
        .expect("rejected connection was not closed")
        .unwrap_or(0);
    assert_eq!(n, 0);

    let mut x = Client::connect(addr).await;
    assert_eq!(x.recv().await, "You are Player X");
}

#[tokio::test]
async fn test_events_are_reported() {
    let mut server = GameServer::bind(local_config()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let mut events = server.subscribe();
    tokio::spawn(server.run());

    let (mut x, mut o) = start_game(addr).await;
    x.send("5").await;
    x.recv().await;
    o.recv().await;

    let mut seen = Vec::new();
    while seen.len() < 6 {
        let event = timeout(RECV_TIMEOUT, events.recv())
            .await
            .expect("missing server event")
            .unwrap();
        seen.push(event);
    }

    assert!(matches!(seen[0], ServerEvent::Listening { .. }));
    assert!(matches!(seen[1], ServerEvent::PeerAdmitted { seat: noughts::Mark::X, .. }));
    assert!(matches!(seen[2], ServerEvent::PeerAdmitted { seat: noughts::Mark::O, .. }));
    assert!(matches!(seen[3], ServerEvent::GameStarted));
    assert!(matches!(seen[4], ServerEvent::BoardChanged { .. }));
    assert!(matches!(
        seen[5],
        ServerEvent::MoveAccepted {
            seat: noughts::Mark::X,
            position: 5
        }
    ));
}
