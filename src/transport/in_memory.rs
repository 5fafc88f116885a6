use tokio::sync::mpsc;

use crate::transport::Transport;

/// Channel-backed transport, used for tests and in-process play.
pub struct InMemoryTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(tx1),
                rx: rx2,
            },
            Self {
                tx: Some(tx2),
                rx: rx1,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, record: &str) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Transport is shut down"))?;
        tx.send(record.to_string())
            .map_err(|_| anyhow::anyhow!("Connection closed by peer"))
    }

    async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.tx = None;
        Ok(())
    }
}
