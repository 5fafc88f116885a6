//! Duplex record transports.
//!
//! A transport carries one JSON record per frame in each direction. The
//! server owns the transport inside the connection task and races `recv`
//! against outbound room traffic, so `recv` must be cancellation safe.

use crate::protocol::ServerMessage;

#[async_trait::async_trait]
pub trait Transport: Send {
    /// Send one record.
    async fn send(&mut self, record: &str) -> anyhow::Result<()>;

    /// Receive the next record, `None` once the peer has closed the connection.
    async fn recv(&mut self) -> anyhow::Result<Option<String>>;

    /// Close the sending side so the peer observes end of stream.
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Encode and send a server record.
    async fn send_message(&mut self, msg: &ServerMessage) -> anyhow::Result<()> {
        let record = msg.to_record()?;
        self.send(&record).await
    }
}

pub mod in_memory;
pub mod tcp;
