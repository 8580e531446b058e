pub mod codec;
pub mod frame;
pub mod message;
pub mod stream_parser;

pub use codec::LinkCodec;
pub use frame::{Frame, xor_checksum};
pub use message::{InboundMessage, OutboundCommand};
pub use stream_parser::{StreamEvent, StreamParser};
