use std::sync::Arc;

use battleship_server::transport::tcp::TcpTransport;
use battleship_server::{GameServer, MemoryStore, ServerConfig, Transport, BOARD_SIZE};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;

#[tokio::test]
async fn test_records_are_split_on_newlines() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut transport = TcpTransport::new(socket);
        let mut seen = Vec::new();
        while let Some(record) = transport.recv().await.unwrap() {
            seen.push(record);
        }
        seen
    });

    let mut raw = TcpStream::connect(addr).await?;
    // two records in one write, one split across writes, blank lines ignored
    raw.write_all(b"{\"a\":1}\n{\"b\":2}\r\n\n{\"c\":").await?;
    raw.flush().await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    raw.write_all(b"3}\n").await?;
    raw.shutdown().await?;

    let seen = server.await?;
    assert_eq!(seen, vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
    Ok(())
}

#[tokio::test]
async fn test_oversized_record_is_rejected() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut transport = TcpTransport::with_config(socket, Duration::from_secs(5), 16);
        transport.recv().await
    });

    let mut raw = TcpStream::connect(addr).await?;
    let mut record = vec![b'x'; 64];
    record.push(b'\n');
    // the server may hang up before reading it all
    let _ = raw.write_all(&record).await;

    let err = server.await?.unwrap_err();
    assert!(err.to_string().contains("Message too large"));
    Ok(())
}

#[tokio::test]
async fn test_eof_inside_record_is_an_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut transport = TcpTransport::new(socket);
        transport.recv().await
    });

    let mut raw = TcpStream::connect(addr).await?;
    raw.write_all(b"{\"action\":").await?;
    raw.shutdown().await?;

    assert!(server.await?.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tcp_game_handshake() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = Arc::new(GameServer::new(
        ServerConfig::default(),
        Arc::new(MemoryStore::new(BOARD_SIZE)),
    ));
    tokio::spawn(Arc::clone(&server).serve(listener));

    let mut p1 = TcpTransport::connect(addr).await?;
    p1.send(r#"{"action":"create_game","player_id":10}"#).await?;
    let ack: Value = serde_json::from_str(&p1.recv().await?.unwrap())?;
    assert_eq!(ack["status"], "success");
    let game_id = ack["game_id"].as_u64().unwrap();
    let state: Value = serde_json::from_str(&p1.recv().await?.unwrap())?;
    assert_eq!(state["action"], "game_state");

    let mut p2 = TcpTransport::connect(addr).await?;
    p2.send(&format!(
        r#"{{"action":"join_game","game_id":{},"player_id":20}}"#,
        game_id
    ))
    .await?;
    let ack: Value = serde_json::from_str(&p2.recv().await?.unwrap())?;
    assert_eq!(ack["game_status"], "setup");

    let joined: Value = serde_json::from_str(&p1.recv().await?.unwrap())?;
    assert_eq!(joined["action"], "player_joined");
    assert_eq!(joined["player_id"], 20);

    p1.close().await?;
    loop {
        let record: Value = serde_json::from_str(&p2.recv().await?.unwrap())?;
        if record["action"] == "player_left" {
            assert_eq!(record["player_id"], 10);
            break;
        }
    }
    Ok(())
}
