//! Stream parser for controller link frames.
//!
//! This module provides a stateful parser capable of handling partial
//! frames from the serial link. The parser accumulates bytes in an internal
//! buffer across [`feed`](StreamParser::feed) calls and extracts complete
//! frames using the SOF/KIND/LEN/CHK envelope.
//!
//! A UART delivers whatever bytes happen to sit in the FIFO at poll time:
//! a single `feed()` may carry a partial frame, a complete frame, several
//! frames, or noise. The parser handles all cases and surfaces recoverable
//! decode problems as in-stream events:
//!
//! - bad checksum or implausible length — the anchoring SOF byte is
//!   dropped, the parser rescans for the next SOF, and one `FrameError`
//!   event is queued per corrupt run (not per discarded byte);
//! - too many bytes discarded without finding a single valid frame — the
//!   link is stuck, the buffer is cleared, and a `FrameOverflow` event is
//!   queued.
//!
//! # Usage
//!
//! ```
//! use garagelink_protocol::{StreamParser, StreamEvent};
//!
//! let mut parser = StreamParser::new();
//! parser.feed(&[0x02, 0x82, 0x01, 0x55]);
//! parser.feed(&[0x82 ^ 0x01 ^ 0x55]); // checksum arrives on a later tick
//!
//! match parser.next_event() {
//!     Some(StreamEvent::Frame(frame)) => assert_eq!(frame.kind(), 0x82),
//!     other => panic!("expected a frame, got {other:?}"),
//! }
//! ```

use bytes::BytesMut;
use garagelink_core::{
    Error,
    constants::{FRAME_OVERHEAD, MAX_PAYLOAD_LEN, START_BYTE},
};
use std::collections::VecDeque;

use crate::frame::{Frame, xor_checksum};

/// Bytes discarded without a valid frame before the link counts as stuck.
///
/// The envelope is at most [`MAX_PAYLOAD_LEN`]` + `[`FRAME_OVERHEAD`] bytes,
/// so discarding this much without one successful decode means framing has
/// been lost entirely (or the peer is flooding garbage). The buffer is then
/// reset wholesale and a `FrameOverflow` is signaled.
const MAX_DESYNC_BYTES: usize = 1024;

/// Initial buffer capacity for incoming serial data.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Initial capacity for the event queue.
///
/// One scheduler tick rarely carries more than a couple of frames; this
/// avoids reallocation during burst traffic.
const INITIAL_EVENT_QUEUE_CAPACITY: usize = 4;

/// Output of the parser: either a complete frame or a recoverable error.
///
/// Errors are delivered in-stream, in order, so a caller that logs them
/// sees exactly where in the byte sequence the corruption happened.
#[derive(Debug)]
pub enum StreamEvent {
    /// A complete, checksum-verified frame.
    Frame(Frame),

    /// A recoverable decode problem (`FrameError` or `FrameOverflow`).
    /// The parser has already resynchronized; no caller action is needed
    /// beyond logging.
    Error(Error),
}

/// Stateful parser turning a raw byte stream into [`StreamEvent`]s.
///
/// The internal buffer persists between `feed()` calls, so frames split
/// across scheduler ticks at arbitrary byte boundaries reassemble
/// correctly.
///
/// # Resynchronization
///
/// The envelope is length-prefixed, so a corrupt LEN or CHK byte would
/// otherwise desynchronize every following frame. On a validation failure
/// the parser discards exactly one byte (the SOF it was anchored on) and
/// rescans; bytes before the next SOF are dropped as noise. Consecutive
/// failures are coalesced into a single `FrameError` event until a valid
/// frame restores synchronization.
///
/// # Example
///
/// ```
/// use garagelink_protocol::{StreamParser, StreamEvent};
///
/// let mut parser = StreamParser::new();
///
/// // Noise, then a complete QueryStatus frame
/// parser.feed(&[0xFF, 0x00, 0x02, 0x42, 0x00, 0x42]);
///
/// assert!(matches!(parser.next_event(), Some(StreamEvent::Frame(_))));
/// assert!(parser.next_event().is_none());
/// ```
#[derive(Debug, Default)]
pub struct StreamParser {
    /// Accumulation buffer; persists across feed calls.
    buffer: BytesMut,

    /// Queue of events ready for extraction.
    events: VecDeque<StreamEvent>,

    /// Bytes discarded since the last successfully decoded frame.
    discarded: usize,

    /// Whether a `FrameError` has already been queued for the current
    /// desync run.
    in_desync: bool,
}

impl StreamParser {
    /// Create a new parser with preallocated buffers.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            events: VecDeque::with_capacity(INITIAL_EVENT_QUEUE_CAPACITY),
            discarded: 0,
            in_desync: false,
        }
    }

    /// Feed bytes from the serial link into the parser.
    ///
    /// Appends to the internal buffer and extracts as many complete frames
    /// (and error events) as the data allows. A partial trailing frame
    /// stays buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        while self.try_extract() {}

        if self.discarded > MAX_DESYNC_BYTES {
            let size = self.discarded + self.buffer.len();
            self.buffer.clear();
            self.discarded = 0;
            self.in_desync = false;
            self.events
                .push_back(StreamEvent::Error(Error::FrameOverflow { size }));
        }
    }

    /// Extract the next event if one is ready.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.pop_front()
    }

    /// Number of events ready for extraction.
    #[must_use]
    pub fn events_available(&self) -> usize {
        self.events.len()
    }

    /// Number of bytes currently buffered (partial frame data).
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all buffered bytes, queued events, and desync tracking.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.events.clear();
        self.discarded = 0;
        self.in_desync = false;
    }

    /// Iterator draining all currently queued events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = StreamEvent> + '_ {
        self.events.drain(..)
    }

    /// Try to extract one frame from the buffer.
    ///
    /// Returns `true` if progress was made (an event was queued or bytes
    /// were discarded), `false` when more data is needed.
    fn try_extract(&mut self) -> bool {
        // Anchor on the next SOF; everything before it is line noise.
        let Some(sof) = self.buffer.iter().position(|&b| b == START_BYTE) else {
            self.discarded += self.buffer.len();
            self.buffer.clear();
            return false;
        };
        if sof > 0 {
            let _ = self.buffer.split_to(sof);
            self.discarded += sof;
        }

        // Need at least SOF + KIND + LEN to know the frame size.
        if self.buffer.len() < 3 {
            return false;
        }

        let kind = self.buffer[1];
        let len = self.buffer[2] as usize;

        if len > MAX_PAYLOAD_LEN {
            self.resync(format!(
                "implausible payload length {len} for kind 0x{kind:02X}"
            ));
            return true;
        }

        let total = len + FRAME_OVERHEAD;
        if self.buffer.len() < total {
            return false;
        }

        let payload = &self.buffer[3..3 + len];
        let expected = xor_checksum(kind, payload);
        let actual = self.buffer[total - 1];

        if expected != actual {
            self.resync(format!(
                "checksum mismatch for kind 0x{kind:02X}: expected 0x{expected:02X}, got 0x{actual:02X}"
            ));
            return true;
        }

        let frame = Frame::new(kind, payload).expect("length validated above");
        let _ = self.buffer.split_to(total);
        self.discarded = 0;
        self.in_desync = false;
        self.events.push_back(StreamEvent::Frame(frame));
        true
    }

    /// Drop the SOF byte the parser was anchored on and rescan.
    ///
    /// Queues one `FrameError` at the start of a desync run; further
    /// failures before the next valid frame are counted but not re-signaled.
    fn resync(&mut self, reason: String) {
        let _ = self.buffer.split_to(1);
        self.discarded += 1;
        if !self.in_desync {
            self.in_desync = true;
            self.events
                .push_back(StreamEvent::Error(Error::FrameError { reason }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagelink_core::constants::{KIND_ACK, KIND_POSITION_REPORT, KIND_QUERY_STATUS};

    /// Test helper: build a complete wire frame.
    fn wire(kind: u8, payload: &[u8]) -> Vec<u8> {
        Frame::new(kind, payload).unwrap().to_wire().to_vec()
    }

    fn expect_frame(parser: &mut StreamParser) -> Frame {
        match parser.next_event() {
            Some(StreamEvent::Frame(frame)) => frame,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    fn expect_error(parser: &mut StreamParser) -> Error {
        match parser.next_event() {
            Some(StreamEvent::Error(error)) => error,
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_frame_single_feed() {
        let mut parser = StreamParser::new();
        parser.feed(&wire(KIND_POSITION_REPORT, &[0x55]));

        assert_eq!(parser.events_available(), 1);
        let frame = expect_frame(&mut parser);
        assert_eq!(frame.kind(), KIND_POSITION_REPORT);
        assert_eq!(frame.payload(), &[0x55]);
    }

    #[test]
    fn test_partial_frame_multiple_feeds() {
        let mut parser = StreamParser::new();
        let data = wire(KIND_ACK, &[0x01, 0x01, 0x07]);

        parser.feed(&data[..2]);
        assert!(parser.next_event().is_none());

        parser.feed(&data[2..5]);
        assert!(parser.next_event().is_none());

        parser.feed(&data[5..]);
        let frame = expect_frame(&mut parser);
        assert_eq!(frame.kind(), KIND_ACK);
    }

    #[test]
    fn test_byte_by_byte_feeding() {
        let mut parser = StreamParser::new();
        for &byte in &wire(KIND_ACK, &[0x02, 0x00, 0x2A]) {
            parser.feed(&[byte]);
        }

        assert_eq!(parser.events_available(), 1);
        let frame = expect_frame(&mut parser);
        assert_eq!(frame.payload(), &[0x02, 0x00, 0x2A]);
    }

    #[test]
    fn test_multiple_frames_in_single_feed() {
        let mut parser = StreamParser::new();
        let mut data = wire(KIND_POSITION_REPORT, &[0x01]);
        data.extend(wire(KIND_POSITION_REPORT, &[0x52]));
        data.extend(wire(KIND_QUERY_STATUS, &[]));

        parser.feed(&data);

        assert_eq!(parser.events_available(), 3);
        assert_eq!(expect_frame(&mut parser).payload(), &[0x01]);
        assert_eq!(expect_frame(&mut parser).payload(), &[0x52]);
        assert_eq!(expect_frame(&mut parser).kind(), KIND_QUERY_STATUS);
    }

    #[test]
    fn test_three_frames_split_at_every_boundary() {
        // Three valid frames split across two feed calls at an arbitrary
        // byte boundary must produce exactly three frames, in order.
        let mut data = wire(KIND_POSITION_REPORT, &[0x55]);
        data.extend(wire(KIND_ACK, &[0x02, 0x01, 0x09]));
        data.extend(wire(KIND_POSITION_REPORT, &[0x01]));

        for split in 0..=data.len() {
            let mut parser = StreamParser::new();
            parser.feed(&data[..split]);
            parser.feed(&data[split..]);

            assert_eq!(parser.events_available(), 3, "split at {split}");
            assert_eq!(expect_frame(&mut parser).payload(), &[0x55]);
            assert_eq!(expect_frame(&mut parser).kind(), KIND_ACK);
            assert_eq!(expect_frame(&mut parser).payload(), &[0x01]);
        }
    }

    #[test]
    fn test_noise_before_frame_discarded() {
        let mut parser = StreamParser::new();
        let mut data = vec![0xFF, 0x13, 0x37];
        data.extend(wire(KIND_QUERY_STATUS, &[]));

        parser.feed(&data);

        assert_eq!(parser.events_available(), 1);
        assert_eq!(expect_frame(&mut parser).kind(), KIND_QUERY_STATUS);
    }

    #[test]
    fn test_bad_checksum_signaled_and_recovered() {
        // Malformed frame between two valid frames: both valid frames
        // decode, one FrameError is signaled, no panic.
        let mut data = wire(KIND_POSITION_REPORT, &[0x55]);
        let mut corrupt = wire(KIND_ACK, &[0x01, 0x01, 0x03]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF; // break the checksum
        data.extend(corrupt);
        data.extend(wire(KIND_POSITION_REPORT, &[0x01]));

        let mut parser = StreamParser::new();
        parser.feed(&data);

        assert_eq!(expect_frame(&mut parser).payload(), &[0x55]);
        let err = expect_error(&mut parser);
        assert!(matches!(err, Error::FrameError { .. }), "{err}");
        assert_eq!(expect_frame(&mut parser).payload(), &[0x01]);
        assert!(parser.next_event().is_none());
    }

    #[test]
    fn test_implausible_length_resyncs() {
        let mut parser = StreamParser::new();
        // LEN = 0xF0 is far above MAX_PAYLOAD_LEN
        let mut data = vec![START_BYTE, KIND_ACK, 0xF0];
        data.extend(wire(KIND_QUERY_STATUS, &[]));

        parser.feed(&data);

        assert!(matches!(
            expect_error(&mut parser),
            Error::FrameError { .. }
        ));
        assert_eq!(expect_frame(&mut parser).kind(), KIND_QUERY_STATUS);
    }

    #[test]
    fn test_desync_run_coalesced_into_one_error() {
        // Several corrupt frames in a row produce a single FrameError for
        // the whole run, then the next valid frame restores sync.
        let mut corrupt = wire(KIND_ACK, &[0x01, 0x01, 0x03]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;

        let mut parser = StreamParser::new();
        let mut data = Vec::new();
        for _ in 0..5 {
            data.extend(&corrupt);
        }
        data.extend(wire(KIND_QUERY_STATUS, &[]));

        parser.feed(&data);

        assert!(matches!(
            expect_error(&mut parser),
            Error::FrameError { .. }
        ));
        assert_eq!(expect_frame(&mut parser).kind(), KIND_QUERY_STATUS);
        assert!(parser.next_event().is_none());
    }

    #[test]
    fn test_stuck_link_signals_overflow() {
        let mut parser = StreamParser::new();

        // A flood of SOF bytes never produces a valid frame; once the
        // discard budget is exhausted the parser declares the link stuck.
        parser.feed(&vec![START_BYTE; 2 * MAX_DESYNC_BYTES]);

        assert!(matches!(
            expect_error(&mut parser),
            Error::FrameError { .. }
        ));
        let err = expect_error(&mut parser);
        assert!(matches!(err, Error::FrameOverflow { .. }), "{err}");
        assert_eq!(parser.buffered_len(), 0);
        assert!(parser.next_event().is_none());

        // Parser accepts new frames after the reset.
        parser.feed(&wire(KIND_QUERY_STATUS, &[]));
        assert_eq!(parser.events_available(), 1);
    }

    #[test]
    fn test_pure_noise_flood_signals_overflow() {
        let mut parser = StreamParser::new();
        parser.feed(&vec![0xFF; 2 * MAX_DESYNC_BYTES]);

        let err = expect_error(&mut parser);
        assert!(matches!(err, Error::FrameOverflow { .. }), "{err}");
        assert!(parser.next_event().is_none());
    }

    #[test]
    fn test_sof_inside_corrupt_frame_recovers_following_frame() {
        // A corrupt frame whose claimed payload region swallows the next
        // frame's SOF: after resync the embedded frame still decodes.
        let good = wire(KIND_POSITION_REPORT, &[0x52]);
        let mut data = vec![START_BYTE, KIND_ACK, 0x03]; // claims 3 payload bytes
        data.extend(&good);

        let mut parser = StreamParser::new();
        parser.feed(&data);

        assert!(matches!(
            expect_error(&mut parser),
            Error::FrameError { .. }
        ));
        assert_eq!(expect_frame(&mut parser).payload(), &[0x52]);
    }

    #[test]
    fn test_clear_resets_parser() {
        let mut parser = StreamParser::new();
        parser.feed(&[START_BYTE, KIND_ACK]);
        assert!(parser.buffered_len() > 0);

        parser.clear();
        assert_eq!(parser.buffered_len(), 0);
        assert_eq!(parser.events_available(), 0);

        parser.feed(&wire(KIND_QUERY_STATUS, &[]));
        assert_eq!(parser.events_available(), 1);
    }

    #[test]
    fn test_drain_events() {
        let mut parser = StreamParser::new();
        let mut data = wire(KIND_POSITION_REPORT, &[0x01]);
        data.extend(wire(KIND_POSITION_REPORT, &[0x52]));
        parser.feed(&data);

        let events: Vec<_> = parser.drain_events().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(parser.events_available(), 0);
    }

    #[test]
    fn test_short_noise_never_queues_events() {
        let mut parser = StreamParser::new();
        parser.feed(&[0xFF, 0x7E, 0x10, 0x99]);

        assert_eq!(parser.events_available(), 0);
        assert_eq!(parser.buffered_len(), 0);
    }
}
