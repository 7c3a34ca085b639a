//! Scripted IRC server.

use std::time::Duration;

use slirc_wire::Message;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use super::STEP;

/// Listens for the bridge's IRC connections.
pub struct FakeIrcServer {
    listener: TcpListener,
}

impl FakeIrcServer {
    pub async fn bind() -> anyhow::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind("127.0.0.1:0").await?,
        })
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|a| a.port())
            .expect("listener has an address")
    }

    /// Wait for the next connection.
    pub async fn accept(&self) -> anyhow::Result<IrcPeer> {
        let (stream, _) = timeout(STEP, self.listener.accept()).await??;
        let (read, write) = stream.into_split();
        Ok(IrcPeer {
            reader: BufReader::new(read),
            writer: BufWriter::new(write),
        })
    }
}

/// One accepted connection, seen from the server side.
pub struct IrcPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl IrcPeer {
    /// Send a raw line; CRLF is appended.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next message from the bridge.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(STEP).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end().parse()?)
    }

    /// Skip messages until one with `command` arrives.
    pub async fn expect(&mut self, command: &str) -> anyhow::Result<Message> {
        loop {
            let msg = self.recv().await?;
            if msg.command == command {
                return Ok(msg);
            }
        }
    }

    /// Answer NICK/USER with a welcome and an empty MOTD, then wait for the
    /// bridge to join `channel`.
    pub async fn welcome(&mut self, nick: &str, channel: &str) -> anyhow::Result<()> {
        self.expect("USER").await?;
        self.send_raw(&format!(":irc.test 001 {nick} :Welcome")).await?;
        self.send_raw(&format!(":irc.test 422 {nick} :MOTD File is missing"))
            .await?;
        let join = self.expect("JOIN").await?;
        anyhow::ensure!(join.arg(0) == Some(channel), "unexpected join {join}");
        self.send_raw(&format!(":{nick}!bot@host JOIN {channel}"))
            .await?;
        Ok(())
    }
}
