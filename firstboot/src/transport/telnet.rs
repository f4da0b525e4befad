//! Telnet transport over TCP.
//!
//! Option negotiation is refused wholesale: every `DO` is answered with
//! `WONT` and every `WILL` with `DONT`, which leaves console servers in
//! plain NVT line mode. Subnegotiations are discarded.

use bytes::Bytes;
use log::{debug, trace};
use memchr::{memchr, memchr_iter};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use super::config::TelnetConfig;
use crate::error::{ConnectionError, Result};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Data,
    Iac,
    Option(u8),
    Sub,
    SubIac,
}

/// Incremental telnet command decoder.
///
/// Keeps its state between reads so commands split across TCP segments
/// are handled.
#[derive(Debug, Default)]
struct TelnetCodec {
    state: State,
}

impl TelnetCodec {
    /// Decode raw socket bytes into application data, appending any
    /// negotiation replies to `replies`.
    fn decode(&mut self, mut input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        while !input.is_empty() {
            if self.state == State::Data {
                match memchr(IAC, input) {
                    Some(pos) => {
                        push_data(data, &input[..pos]);
                        self.state = State::Iac;
                        input = &input[pos + 1..];
                    }
                    None => {
                        push_data(data, input);
                        input = &[];
                    }
                }
            } else {
                self.step(input[0], data, replies);
                input = &input[1..];
            }
        }
    }

    fn step(&mut self, byte: u8, data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        self.state = match (self.state, byte) {
            (State::Data, IAC) => State::Iac,
            (State::Data, b) => {
                push_data(data, &[b]);
                State::Data
            }
            (State::Iac, IAC) => {
                data.push(IAC);
                State::Data
            }
            (State::Iac, DO | DONT | WILL | WONT) => State::Option(byte),
            (State::Iac, SB) => State::Sub,
            (State::Iac, _) => State::Data,
            (State::Option(DO), option) => {
                trace!("telnet: refusing DO {}", option);
                replies.extend_from_slice(&[IAC, WONT, option]);
                State::Data
            }
            (State::Option(WILL), option) => {
                trace!("telnet: refusing WILL {}", option);
                replies.extend_from_slice(&[IAC, DONT, option]);
                State::Data
            }
            (State::Option(_), _) => State::Data,
            (State::Sub, IAC) => State::SubIac,
            (State::Sub, _) => State::Sub,
            (State::SubIac, SE) => State::Data,
            (State::SubIac, _) => State::Sub,
        };
    }
}

/// NUL padding after CR carries no information for prompt matching.
fn push_data(data: &mut Vec<u8>, chunk: &[u8]) {
    data.extend(chunk.iter().copied().filter(|&b| b != 0));
}

/// Escape IAC bytes in outgoing data.
fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 2);
    let mut last = 0;
    for pos in memchr_iter(IAC, data) {
        out.extend_from_slice(&data[last..=pos]);
        out.push(IAC);
        last = pos + 1;
    }
    out.extend_from_slice(&data[last..]);
    out
}

/// Telnet transport over any async byte stream (TCP in production).
pub struct TelnetTransport<S = TcpStream> {
    stream: S,
    codec: TelnetCodec,
    /// Negotiation replies waiting to be flushed.
    pending: Vec<u8>,
    read_buf: Vec<u8>,
    eof: bool,
}

impl TelnetTransport<TcpStream> {
    /// Open a TCP connection to the console line.
    pub async fn connect(config: &TelnetConfig) -> Result<Self> {
        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| ConnectionError::ConnectTimeout {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout,
        })?
        .map_err(|source| ConnectionError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        stream.set_nodelay(true).map_err(ConnectionError::Io)?;
        debug!("Telnet connected to {}", config.socket_addr());

        Ok(Self::from_stream(stream, config.read_size))
    }
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream.
    pub fn from_stream(stream: S, read_size: usize) -> Self {
        Self {
            stream,
            codec: TelnetCodec::default(),
            pending: Vec::new(),
            read_buf: vec![0; read_size.max(1)],
            eof: false,
        }
    }

    async fn flush_replies(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.stream
            .write_all(&self.pending)
            .await
            .map_err(ConnectionError::Io)?;
        self.pending.clear();
        Ok(())
    }
}

impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.eof {
            return Err(ConnectionError::Closed.into());
        }
        self.flush_replies().await?;
        self.stream
            .write_all(&encode(data))
            .await
            .map_err(ConnectionError::Io)?;
        self.stream.flush().await.map_err(ConnectionError::Io)?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            if self.eof {
                return Ok(None);
            }
            self.flush_replies().await?;

            let n = self
                .stream
                .read(&mut self.read_buf)
                .await
                .map_err(ConnectionError::Io)?;
            if n == 0 {
                debug!("Telnet peer closed the stream");
                self.eof = true;
                return Ok(None);
            }

            let mut data = Vec::with_capacity(n);
            self.codec
                .decode(&self.read_buf[..n], &mut data, &mut self.pending);
            // Replies go out on the next read or write so the data is never
            // held behind an await point.
            if !data.is_empty() {
                return Ok(Some(Bytes::from(data)));
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.eof
    }

    async fn close(mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .map_err(ConnectionError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn decode_all(input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut codec = TelnetCodec::default();
        let mut data = Vec::new();
        let mut replies = Vec::new();
        codec.decode(input, &mut data, &mut replies);
        (data, replies)
    }

    #[test]
    fn test_plain_data_passes_through() {
        let (data, replies) = decode_all(b"Router>");
        assert_eq!(data, b"Router>");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_refuses_do_and_will() {
        let (data, replies) = decode_all(&[IAC, DO, 1, b'a', IAC, WILL, 3, b'b']);
        assert_eq!(data, b"ab");
        assert_eq!(replies, vec![IAC, WONT, 1, IAC, DONT, 3]);
    }

    #[test]
    fn test_ignores_wont_and_dont() {
        let (data, replies) = decode_all(&[IAC, WONT, 1, IAC, DONT, 3, b'x']);
        assert_eq!(data, b"x");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_escaped_iac_is_data() {
        let (data, _) = decode_all(&[b'a', IAC, IAC, b'b']);
        assert_eq!(data, vec![b'a', IAC, b'b']);
    }

    #[test]
    fn test_subnegotiation_is_discarded() {
        let (data, replies) = decode_all(&[b'a', IAC, SB, 24, 1, IAC, SE, b'b']);
        assert_eq!(data, b"ab");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_command_split_across_reads() {
        let mut codec = TelnetCodec::default();
        let mut data = Vec::new();
        let mut replies = Vec::new();
        codec.decode(&[b'a', IAC], &mut data, &mut replies);
        codec.decode(&[DO], &mut data, &mut replies);
        codec.decode(&[24, b'b'], &mut data, &mut replies);
        assert_eq!(data, b"ab");
        assert_eq!(replies, vec![IAC, WONT, 24]);
    }

    #[test]
    fn test_nul_padding_is_stripped() {
        let (data, _) = decode_all(b"line\r\0next");
        assert_eq!(data, b"line\rnext");
    }

    #[test]
    fn test_encode_doubles_iac() {
        assert_eq!(encode(b"plain"), b"plain");
        assert_eq!(encode(&[1, IAC, 2]), vec![1, IAC, IAC, 2]);
    }

    #[tokio::test]
    async fn test_reply_flushed_before_next_write() {
        let mock = Builder::new()
            .read(&[IAC, DO, 1, b'R', b'>'])
            .write(&[IAC, WONT, 1])
            .write(b"en\n")
            .build();
        let mut transport = TelnetTransport::from_stream(mock, 64);

        let chunk = transport.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"R>");

        transport.write_all(b"en\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_negotiation_only_read_continues() {
        let mock = Builder::new()
            .read(&[IAC, WILL, 1])
            .write(&[IAC, DONT, 1])
            .read(b"login:")
            .build();
        let mut transport = TelnetTransport::from_stream(mock, 64);

        let chunk = transport.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"login:");
    }

    #[tokio::test]
    async fn test_eof_marks_transport_dead() {
        let mock = Builder::new().read(b"bye").build();
        let mut transport = TelnetTransport::from_stream(mock, 64);

        assert!(transport.read_chunk().await.unwrap().is_some());
        assert!(transport.read_chunk().await.unwrap().is_none());
        assert!(!transport.is_alive());
        assert!(matches!(
            transport.write_all(b"x").await,
            Err(crate::Error::Connection(ConnectionError::Closed))
        ));
    }
}
