use tokio::io::{AsyncReadExt, AsyncWriteExt};

use noughts::{
    encode_masked_text, encode_text, negotiate, read_frame, read_unmasked_frame, write_text,
    FrameError, Opcode, MAX_PAYLOAD_SIZE,
};

const MASK: [u8; 4] = [0xa1, 0x07, 0x5c, 0xe3];

fn payload_of(len: usize) -> String {
    (0..len)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

#[tokio::test]
async fn test_masked_round_trip_all_length_forms() {
    for len in [0, 10, 125, 126, 65535, 70000] {
        let text = payload_of(len);
        let bytes = encode_masked_text(&text, MASK);

        let frame = read_frame(&mut &bytes[..], MAX_PAYLOAD_SIZE).await.unwrap();
        assert!(frame.fin);
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.payload.len(), len);
        assert_eq!(frame.text(), text);
    }
}

#[tokio::test]
async fn test_server_frames_read_back_unmasked() {
    for len in [0, 125, 126, 70000] {
        let text = payload_of(len);
        let bytes = encode_text(&text);
        assert_eq!(bytes[1] & 0x80, 0, "server frames must not be masked");

        let frame = read_unmasked_frame(&mut &bytes[..], MAX_PAYLOAD_SIZE)
            .await
            .unwrap();
        assert_eq!(frame.text(), text);
    }
}

#[tokio::test]
async fn test_consecutive_frames_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    let writer = tokio::spawn(async move {
        for text in ["5", "RESTART", "QUIT"] {
            client
                .write_all(&encode_masked_text(text, MASK))
                .await
                .unwrap();
        }
    });

    for expected in ["5", "RESTART", "QUIT"] {
        let frame = read_frame(&mut server, MAX_PAYLOAD_SIZE).await.unwrap();
        assert_eq!(frame.text(), expected);
    }

    writer.await.unwrap();
    assert!(matches!(
        read_frame(&mut server, MAX_PAYLOAD_SIZE).await,
        Err(FrameError::Closed)
    ));
}

#[tokio::test]
async fn test_handshake_then_frames() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    client
        .write_all(
            b"GET / HTTP/1.1\r\n\
              Host: localhost\r\n\
              Upgrade: websocket\r\n\
              Connection: Upgrade\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
              Sec-WebSocket-Version: 13\r\n\r\n",
        )
        .await
        .unwrap();

    let accept = negotiate(&mut server).await.unwrap();
    assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");

    let mut response = Vec::new();
    while !response.ends_with(b"\r\n\r\n") {
        let mut byte = [0u8; 1];
        client.read_exact(&mut byte).await.unwrap();
        response.push(byte[0]);
    }
    let response = String::from_utf8(response).unwrap();
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));

    write_text(&mut server, "You are Player X").await.unwrap();
    let frame = read_unmasked_frame(&mut client, MAX_PAYLOAD_SIZE)
        .await
        .unwrap();
    assert_eq!(frame.text(), "You are Player X");

    client
        .write_all(&encode_masked_text("7", MASK))
        .await
        .unwrap();
    let frame = read_frame(&mut server, MAX_PAYLOAD_SIZE).await.unwrap();
    assert_eq!(frame.text(), "7");
}
