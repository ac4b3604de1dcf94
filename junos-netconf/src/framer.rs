use crate::error::TransportError;
use log::debug;
use memmem::{Searcher, TwoWaySearcher};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const NETCONF_1_0_TERMINATOR: &str = "]]>]]>";

const READ_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// base:1.0, messages end with `]]>]]>`.
    EndOfMessage,
    /// base:1.1, see [RFC6242 4.2](https://www.rfc-editor.org/rfc/rfc6242#section-4.2).
    Chunked,
}

/// Reads and writes whole NETCONF messages on a byte channel.
///
/// Bytes read past the end of a message stay buffered for the next one, so
/// switching to chunked framing right after the hello loses nothing.
pub(crate) struct Framer<T> {
    channel: T,
    read_buffer: Vec<u8>,
    framing: Framing,
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Framer<T> {
    pub(crate) fn new(channel: T) -> Self {
        Framer {
            channel,
            read_buffer: Vec::new(),
            framing: Framing::EndOfMessage,
        }
    }

    pub(crate) fn upgrade(&mut self) {
        self.framing = Framing::Chunked;
    }

    pub(crate) fn framing(&self) -> Framing {
        self.framing
    }

    pub(crate) fn channel_mut(&mut self) -> &mut T {
        &mut self.channel
    }

    pub(crate) async fn read_message(&mut self) -> Result<String, TransportError> {
        let message = match self.framing {
            Framing::EndOfMessage => self.read_until_terminator().await?,
            Framing::Chunked => self.read_chunks().await?,
        };
        Ok(String::from_utf8_lossy(&message).trim().to_string())
    }

    pub(crate) async fn write_message(&mut self, message: &str) -> Result<(), TransportError> {
        debug!("Sending message:\n{}", message);
        match self.framing {
            Framing::EndOfMessage => {
                self.channel.write_all(message.as_bytes()).await?;
                self.channel
                    .write_all(NETCONF_1_0_TERMINATOR.as_bytes())
                    .await?;
            }
            Framing::Chunked => {
                let header = format!("\n#{}\n", message.len());
                self.channel.write_all(header.as_bytes()).await?;
                self.channel.write_all(message.as_bytes()).await?;
                self.channel.write_all(b"\n##\n").await?;
            }
        }
        self.channel.flush().await?;
        Ok(())
    }

    async fn read_until_terminator(&mut self) -> Result<Vec<u8>, TransportError> {
        let search = TwoWaySearcher::new(NETCONF_1_0_TERMINATOR.as_bytes());
        let mut searched = 0;
        let position = loop {
            if let Some(position) = search.search_in(&self.read_buffer[searched..]) {
                break searched + position;
            }
            // a terminator may straddle the next read
            searched = self
                .read_buffer
                .len()
                .saturating_sub(NETCONF_1_0_TERMINATOR.len() - 1);
            self.read_more().await?;
        };
        let message = self.read_buffer[..position].to_vec();
        self.read_buffer
            .drain(..position + NETCONF_1_0_TERMINATOR.len());
        Ok(message)
    }

    async fn read_chunks(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut message = Vec::new();
        while let Some(size) = self.read_chunk_header().await? {
            self.fill(size).await?;
            message.extend(self.read_buffer.drain(..size));
        }
        Ok(message)
    }

    /// Returns the size of the next chunk, or `None` at end-of-chunks. Sizes
    /// are limited to 4294967295 (RFC 6242).
    async fn read_chunk_header(&mut self) -> Result<Option<usize>, TransportError> {
        self.expect(b'\n').await?;
        self.expect(b'#').await?;

        let mut byte = self.next_byte().await?;
        if byte == b'#' {
            self.expect(b'\n').await?;
            return Ok(None);
        }
        if !(b'1'..=b'9').contains(&byte) {
            return Err(malformed('1', byte));
        }

        let mut size = 0u32;
        while byte != b'\n' {
            if !byte.is_ascii_digit() {
                return Err(malformed('0', byte));
            }
            size = size
                .checked_mul(10)
                .and_then(|size| size.checked_add(u32::from(byte - b'0')))
                .ok_or_else(|| malformed('\n', byte))?;
            byte = self.next_byte().await?;
        }
        Ok(Some(size as usize))
    }

    async fn expect(&mut self, expected: u8) -> Result<(), TransportError> {
        let actual = self.next_byte().await?;
        if actual == expected {
            Ok(())
        } else {
            Err(malformed(expected.into(), actual))
        }
    }

    async fn next_byte(&mut self) -> Result<u8, TransportError> {
        self.fill(1).await?;
        Ok(self.read_buffer.remove(0))
    }

    async fn fill(&mut self, len: usize) -> Result<(), TransportError> {
        while self.read_buffer.len() < len {
            self.read_more().await?;
        }
        Ok(())
    }

    async fn read_more(&mut self) -> Result<(), TransportError> {
        let mut buffer = [0u8; READ_SIZE];
        let read = self.channel.read(&mut buffer).await?;
        if read == 0 {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "channel closed in the middle of a message",
            )));
        }
        self.read_buffer.extend_from_slice(&buffer[..read]);
        Ok(())
    }
}

fn malformed(expected: char, actual: u8) -> TransportError {
    TransportError::MalformedChunk {
        expected,
        actual: actual.into(),
    }
}
