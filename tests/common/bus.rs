//! Scripted Redis server speaking just enough RESP for pub/sub.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::STEP;

type Frames = mpsc::UnboundedSender<Vec<u8>>;

struct Subscriber {
    channel: String,
    frames: Frames,
}

#[derive(Default)]
struct Shared {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Shared {
    /// Push a pub/sub message to every subscriber of `channel`.
    fn deliver(&self, channel: &str, payload: &str) -> usize {
        let frame = format!("*3\r\n{}{}{}", bulk("message"), bulk(channel), bulk(payload));
        self.subscribers
            .lock()
            .iter()
            .filter(|s| s.channel == channel)
            .filter(|s| s.frames.send(frame.clone().into_bytes()).is_ok())
            .count()
    }
}

fn bulk(s: &str) -> String {
    format!("${}\r\n{s}\r\n", s.len())
}

/// Reply to SUBSCRIBE or UNSUBSCRIBE.
fn confirmation(kind: &str, channel: &str, count: usize) -> Vec<u8> {
    format!("*3\r\n{}{}:{count}\r\n", bulk(kind), bulk(channel)).into_bytes()
}

pub struct FakeRedis {
    port: u16,
    shared: Arc<Shared>,
    published: mpsc::UnboundedReceiver<(String, String)>,
}

impl FakeRedis {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let shared = Arc::new(Shared::default());
        let (published_tx, published) = mpsc::unbounded_channel();

        let state = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&state), published_tx.clone()));
            }
        });

        Ok(Self {
            port,
            shared,
            published,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait until someone subscribes to `channel`.
    pub async fn subscribed(&self, channel: &str) -> anyhow::Result<()> {
        timeout(STEP, async {
            while !self.shared.subscribers.lock().iter().any(|s| s.channel == channel) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?;
        Ok(())
    }

    /// PUBLISH `value` to `channel`. Returns the number of receivers.
    pub fn publish(&self, channel: &str, value: &Value) -> usize {
        self.shared.deliver(channel, &value.to_string())
    }

    /// Next PUBLISH from the bridge.
    pub async fn next_published(&mut self) -> anyhow::Result<(String, Value)> {
        let (channel, payload) = timeout(STEP, self.published.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("redis server stopped"))?;
        Ok((channel, serde_json::from_str(&payload)?))
    }
}

async fn serve(
    stream: TcpStream,
    shared: Arc<Shared>,
    published: mpsc::UnboundedSender<(String, String)>,
) {
    let (read, mut write) = stream.into_split();
    let (frames, mut outgoing) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(frame) = outgoing.recv().await {
            if write.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let mut reader = BufReader::new(read);
    while let Ok(Some(args)) = read_command(&mut reader).await {
        let Some(name) = args.first() else {
            continue;
        };
        let reply = match name.to_ascii_uppercase().as_str() {
            "SUBSCRIBE" => {
                for (i, channel) in args[1..].iter().enumerate() {
                    shared.subscribers.lock().push(Subscriber {
                        channel: channel.clone(),
                        frames: frames.clone(),
                    });
                    let _ = frames.send(confirmation("subscribe", channel, i + 1));
                }
                continue;
            }
            "UNSUBSCRIBE" => {
                shared
                    .subscribers
                    .lock()
                    .retain(|s| !(s.frames.same_channel(&frames) && args[1..].contains(&s.channel)));
                for channel in &args[1..] {
                    let _ = frames.send(confirmation("unsubscribe", channel, 0));
                }
                continue;
            }
            "PUBLISH" if args.len() == 3 => {
                let receivers = shared.deliver(&args[1], &args[2]);
                let _ = published.send((args[1].clone(), args[2].clone()));
                format!(":{receivers}\r\n").into_bytes()
            }
            "PING" => b"+PONG\r\n".to_vec(),
            _ => b"+OK\r\n".to_vec(),
        };
        let _ = frames.send(reply);
    }

    shared
        .subscribers
        .lock()
        .retain(|s| !s.frames.same_channel(&frames));
}

/// One command as an array of bulk strings.
async fn read_command(reader: &mut BufReader<OwnedReadHalf>) -> anyhow::Result<Option<Vec<String>>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let Some(count) = line.trim_end().strip_prefix('*') else {
        return Ok(Some(line.split_whitespace().map(str::to_owned).collect()));
    };
    let count: usize = count.parse()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await?;
        let len: usize = line
            .trim_end()
            .strip_prefix('$')
            .ok_or_else(|| anyhow::anyhow!("expected bulk string, got {line:?}"))?
            .parse()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(String::from_utf8(buf)?);
    }
    Ok(Some(args))
}
