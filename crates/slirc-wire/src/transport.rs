//! Client transports: plain TCP and TLS, framed with [`IrcCodec`].

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::IrcCodec;
use crate::error::{self, ProtocolError};
use crate::message::Message;

/// Write half of a framed connection.
pub type MessageSink = Pin<Box<dyn Sink<Message, Error = ProtocolError> + Send>>;

/// Read half of a framed connection.
pub type MessageStream = Pin<Box<dyn Stream<Item = error::Result<Message>> + Send>>;

/// TLS settings for [`Transport::connect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Wrap the connection in TLS.
    pub enabled: bool,
    /// Verify the server certificate against the system roots.
    pub verify: bool,
}

/// A connected, framed IRC client stream.
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP.
    Tcp {
        /// Framed stream.
        framed: Framed<TcpStream, IrcCodec>,
    },
    /// TLS over TCP.
    ClientTls {
        /// Framed stream.
        framed: Framed<TlsStream<TcpStream>, IrcCodec>,
    },
}

impl Transport {
    /// Open a connection to `host:port`, upgrading to TLS when asked.
    pub async fn connect(host: &str, port: u16, tls: TlsOptions) -> error::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        if !tls.enabled {
            debug!(host, port, "connected (plain)");
            return Ok(Self::Tcp {
                framed: Framed::new(stream, IrcCodec::new()),
            });
        }

        let connector = TlsConnector::from(Arc::new(client_config(tls.verify)));
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
            ProtocolError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let stream = connector.connect(server_name, stream).await?;
        debug!(host, port, verify = tls.verify, "connected (tls)");

        Ok(Self::ClientTls {
            framed: Framed::new(stream, IrcCodec::new()),
        })
    }

    /// Split into independently owned write and read halves.
    pub fn into_split(self) -> (MessageSink, MessageStream) {
        match self {
            Transport::Tcp { framed } => split(framed),
            Transport::ClientTls { framed } => split(framed),
        }
    }
}

/// Frame an arbitrary byte stream and split it.
pub fn framed<S>(io: S) -> (MessageSink, MessageStream)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    split(Framed::new(io, IrcCodec::new()))
}

fn split<S>(framed: Framed<S, IrcCodec>) -> (MessageSink, MessageStream)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (sink, stream) = framed.split();
    (Box::pin(sink), Box::pin(stream))
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

fn client_config(verify: bool) -> ClientConfig {
    if verify {
        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for cert in native.certs {
            if let Err(e) = roots.add(cert) {
                warn!("Failed to add root cert: {}", e);
            }
        }
        for e in &native.errors {
            warn!("Error loading native certs: {}", e);
        }
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    } else {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth()
    }
}

/// Accepts every server certificate. Only used when verification is off.
#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_framed_duplex_round_trip() {
        let (client, server) = tokio::io::duplex(1024);
        let (mut sink, mut stream) = framed(client);
        let (server_read, mut server_write) = tokio::io::split(server);

        sink.send(Message::nick("bridgebot")).await.unwrap();
        let mut lines = BufReader::new(server_read).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "NICK bridgebot");

        server_write.write_all(b"PING :x\r\n").await.unwrap();
        let msg = stream.next().await.unwrap().unwrap();
        assert_eq!(msg.command, "PING");
    }

    #[test]
    fn test_tls_options_default_is_plain() {
        let opts = TlsOptions::default();
        assert!(!opts.enabled);
        assert!(!opts.verify);
    }
}
