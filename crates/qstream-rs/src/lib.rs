//! A packetized streaming protocol for transports that carry one small
//! frame at a time, such as a sequence of displayed QR symbols captured
//! by a camera.
//!
//! Payloads are chunked into checksummed, sequence-numbered packets; the
//! [`Sender`] walks them (serving retransmit requests first) and the
//! [`Receiver`] reassembles them in order, reporting progress and
//! completion through callbacks. Packets are opaque bytes to the symbol
//! codec carrying them.
//!
//! # Examples
//!
//! ```
//! use qstream_rs::{Receiver, Sender, DEFAULT_CHUNK_SIZE};
//!
//! let payload = vec![42u8; 5000];
//! let mut tx = Sender::new(&payload, DEFAULT_CHUNK_SIZE, 10.0).unwrap();
//! let mut rx = Receiver::new();
//! while let Some(packet) = tx.next() {
//!     rx.on_frame(&packet.to_bytes());
//! }
//! assert_eq!(rx.reassemble().unwrap(), payload);
//! ```

mod crc16;
mod error;
mod packet;
mod receiver;
mod sender;

pub use crc16::crc16;
pub use error::StreamError;
pub use packet::{Flags, Packet};
pub use receiver::{FrameOutcome, Progress, Reason, Receiver};
pub use sender::{Sender, SenderEvent, StopHandle, DEFAULT_CHUNK_SIZE};
