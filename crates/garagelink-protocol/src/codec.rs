//! Tokio codec for controller link framing.
//!
//! [`LinkCodec`] is a thin adapter over [`StreamParser`] implementing
//! Tokio's [`Decoder`] and [`Encoder`] traits, so the link can be driven
//! through `tokio_util::codec::Framed` when the transport is an async byte
//! stream (a PTY in tests, a TCP-attached serial bridge in deployment).
//!
//! ```text
//! byte stream -> Decoder -> InboundMessage
//! OutboundCommand -> Encoder -> byte stream (SOF/LEN/CHK envelope)
//! ```
//!
//! # Error Handling
//!
//! Recoverable stream problems (corrupt frame, overflow) surface as
//! `Err(..)` items; the codec keeps its internal state and the caller may
//! continue polling the stream afterwards — the parser has already
//! resynchronized. A frame that parses but decodes to an unknown kind or
//! invalid payload is reported the same way.
//!
//! # Usage
//!
//! ```no_run
//! use futures::StreamExt;
//! use tokio_util::codec::FramedRead;
//! use garagelink_protocol::LinkCodec;
//!
//! # async fn example(port: impl tokio::io::AsyncRead + Unpin) {
//! let mut framed = FramedRead::new(port, LinkCodec::new());
//! while let Some(result) = framed.next().await {
//!     match result {
//!         Ok(msg) => println!("controller: {msg}"),
//!         Err(e) if e.is_recoverable() => eprintln!("link noise: {e}"),
//!         Err(e) => panic!("link failed: {e}"),
//!     }
//! }
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{InboundMessage, OutboundCommand, StreamEvent, StreamParser};
use garagelink_core::{Error, Result};

/// Tokio codec adapting [`StreamParser`] to async byte streams.
#[derive(Debug, Default)]
pub struct LinkCodec {
    parser: StreamParser,
}

impl LinkCodec {
    /// Create a new codec with a fresh parser.
    pub fn new() -> Self {
        Self {
            parser: StreamParser::new(),
        }
    }
}

impl Decoder for LinkCodec {
    type Item = InboundMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<InboundMessage>> {
        // Hand everything to the parser; it owns buffering from here.
        if !src.is_empty() {
            let bytes = src.split();
            self.parser.feed(&bytes);
        }

        match self.parser.next_event() {
            Some(StreamEvent::Frame(frame)) => InboundMessage::try_from(&frame).map(Some),
            Some(StreamEvent::Error(error)) => Err(error),
            None => Ok(None),
        }
    }
}

impl Encoder<OutboundCommand> for LinkCodec {
    type Error = Error;

    fn encode(&mut self, cmd: OutboundCommand, dst: &mut BytesMut) -> Result<()> {
        cmd.to_frame().write_wire(dst);
        Ok(())
    }
}
