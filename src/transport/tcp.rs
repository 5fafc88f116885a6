use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::Transport;

/// Default timeout for a single send (30 seconds).
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum record size (64 KiB) to prevent excessive memory allocation.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Newline-delimited JSON records over TCP.
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pending: Vec<u8>,
    send_timeout: Duration,
    max_record_len: usize,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_SEND_TIMEOUT, MAX_RECORD_LEN)
    }

    pub fn with_config(stream: TcpStream, send_timeout: Duration, max_record_len: usize) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer: write,
            pending: Vec::new(),
            send_timeout,
            max_record_len,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Pop one complete record out of the pending buffer.
    fn take_record(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("Read error: {}", e),
    }
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("Write error: {}", e),
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, record: &str) -> anyhow::Result<()> {
        if record.len() > self.max_record_len {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                record.len(),
                self.max_record_len
            ));
        }
        let mut data = Vec::with_capacity(record.len() + 1);
        data.extend_from_slice(record.as_bytes());
        data.push(b'\n');

        timeout(self.send_timeout, self.writer.write_all(&data))
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.send_timeout))?
            .map_err(write_error)
    }

    async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_record() {
                // blank keep-alive lines
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                return String::from_utf8(line)
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("Record is not valid UTF-8"));
            }
            if self.pending.len() > self.max_record_len {
                return Err(anyhow::anyhow!(
                    "Message too large: more than {} bytes without a record separator",
                    self.max_record_len
                ));
            }

            // Bytes read before a cancellation stay in `pending`.
            let budget = (self.max_record_len + 1 - self.pending.len()) as u64;
            let read = (&mut self.reader)
                .take(budget)
                .read_until(b'\n', &mut self.pending)
                .await
                .map_err(read_error)?;
            if read == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Err(anyhow::anyhow!("Connection closed in the middle of a record"));
            }
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await.map_err(write_error)
    }
}
