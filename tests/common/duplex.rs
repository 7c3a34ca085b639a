//! In-memory connector, for tests that run on paused time.

use async_trait::async_trait;
use parking_lot::Mutex;
use slirc_bridge::config::IrcConfig;
use slirc_bridge::irc::{Connector, Session, spawn_session};
use slirc_wire::ProtocolError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

/// Hands out in-memory connections; the far ends are [`DuplexPeer`]s.
#[derive(Default)]
pub struct DuplexConnector {
    ends: Mutex<Vec<DuplexStream>>,
}

impl DuplexConnector {
    /// Prepare one connection and return its server side.
    pub fn prepare(&self) -> DuplexPeer {
        let (client, server) = tokio::io::duplex(64 * 1024);
        self.ends.lock().insert(0, client);
        let (read, write) = tokio::io::split(server);
        DuplexPeer {
            lines: BufReader::new(read).lines(),
            write,
        }
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, _config: &IrcConfig) -> Result<Session, ProtocolError> {
        let io = self.ends.lock().pop().ok_or_else(|| {
            ProtocolError::Io(std::io::Error::other("no prepared connection"))
        })?;
        let (sink, stream) = slirc_wire::framed(io);
        Ok(spawn_session(sink, stream))
    }
}

pub struct DuplexPeer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    write: WriteHalf<DuplexStream>,
}

impl DuplexPeer {
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.write.write_all(line.as_bytes()).await?;
        self.write.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Next line from the bridge, or `None` if it closed.
    pub async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Skip lines until one equal to `wanted`.
    pub async fn expect_line(&mut self, wanted: &str) -> anyhow::Result<()> {
        while let Some(line) = self.next_line().await? {
            if line == wanted {
                return Ok(());
            }
        }
        anyhow::bail!("connection closed before {wanted:?}")
    }
}
