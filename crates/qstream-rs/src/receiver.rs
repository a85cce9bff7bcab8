//! The receive side: frames in, reassembled payload out.
//!
//! Each `on_frame` call is a complete transaction against the receiver
//! state; bad frames are reported and skipped, never thrown.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::packet::Packet;

/// Why a frame was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Not parseable as a data packet: short, bad magic, or bad header.
    Invalid,
    /// The payload checksum failed.
    Checksum,
    /// A retransmit request reached the data receiver.
    Nack,
    /// The packet disagreed with the established stream length.
    TotalMismatch,
}

/// The per-frame verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub accepted: bool,
    pub reason: Option<Reason>,
    pub seq: Option<u16>,
}

impl FrameOutcome {
    fn accepted(seq: u16) -> Self {
        Self {
            accepted: true,
            reason: None,
            seq: Some(seq),
        }
    }

    fn rejected(reason: Reason, seq: Option<u16>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            seq,
        }
    }
}

/// A progress report, emitted after every newly accepted packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub received: usize,
    pub total: usize,
    pub missing: Vec<u16>,
}

/// Collects packets by sequence number until the stream completes.
#[derive(Default)]
pub struct Receiver {
    packets: BTreeMap<u16, Vec<u8>>,
    total: Option<u16>,
    checksum_errors: BTreeSet<u16>,
    completed: bool,
    on_progress: Option<Box<dyn FnMut(&Progress)>>,
    on_complete: Option<Box<dyn FnMut(&[u8])>>,
}

impl Receiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a progress callback, fired before any completion
    /// callback.
    pub fn on_progress(&mut self, callback: impl FnMut(&Progress) + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    /// Registers a completion callback; it fires at most once per
    /// session, with the reassembled payload.
    pub fn on_complete(&mut self, callback: impl FnMut(&[u8]) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Ingests one captured frame.
    pub fn on_frame(&mut self, frame: &[u8]) -> FrameOutcome {
        let packet = match Packet::from_bytes(frame) {
            Ok(packet) => packet,
            Err(StreamError::ChecksumMismatch { seq }) => {
                debug!("checksum failure on packet {seq}");
                self.checksum_errors.insert(seq);
                return FrameOutcome::rejected(Reason::Checksum, Some(seq));
            }
            Err(_) => return FrameOutcome::rejected(Reason::Invalid, None),
        };
        if packet.is_nack() {
            // Retransmit requests belong to the sender side.
            return FrameOutcome::rejected(Reason::Nack, Some(packet.seq));
        }

        // The first good packet fixes the stream length; later packets
        // must agree.
        match self.total {
            None => {
                if packet.total == 0 || packet.seq >= packet.total {
                    return FrameOutcome::rejected(Reason::Invalid, Some(packet.seq));
                }
                self.total = Some(packet.total);
            }
            Some(total) => {
                if packet.total != total {
                    return FrameOutcome::rejected(Reason::TotalMismatch, Some(packet.seq));
                }
                if packet.seq >= total {
                    return FrameOutcome::rejected(Reason::Invalid, Some(packet.seq));
                }
            }
        }

        let seq = packet.seq;
        if self.packets.contains_key(&seq) {
            // Duplicate delivery is idempotent.
            return FrameOutcome::accepted(seq);
        }
        self.packets.insert(seq, packet.payload);
        debug!(
            "packet {seq} accepted ({}/{})",
            self.packets.len(),
            self.total.unwrap_or(0)
        );

        let progress = self.progress();
        if let Some(callback) = self.on_progress.as_mut() {
            callback(&progress);
        }
        if progress.received == progress.total && !self.completed {
            self.completed = true;
            info!("stream complete: {} packet(s)", progress.total);
            let payload = self.assemble();
            if let Some(callback) = self.on_complete.as_mut() {
                callback(&payload);
            }
        }
        FrameOutcome::accepted(seq)
    }

    /// The stream length, once any packet has established it.
    pub fn total(&self) -> Option<u16> {
        self.total
    }

    /// Count of distinct packets received.
    pub fn received(&self) -> usize {
        self.packets.len()
    }

    /// Sequence numbers observed only as checksum failures.
    pub fn checksum_errors(&self) -> &BTreeSet<u16> {
        &self.checksum_errors
    }

    /// Every sequence number still outstanding, ascending.
    pub fn missing_sequences(&self) -> Vec<u16> {
        match self.total {
            None => Vec::new(),
            Some(total) => (0..total)
                .filter(|seq| !self.packets.contains_key(seq))
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The payload, concatenated in ascending sequence order, once the
    /// stream is complete.
    pub fn reassemble(&self) -> Option<Vec<u8>> {
        self.completed.then(|| self.assemble())
    }

    /// A retransmit request for the current missing set, or `None` when
    /// nothing is known to be missing.
    pub fn nack(&self) -> Option<Packet> {
        let missing = self.missing_sequences();
        (!missing.is_empty()).then(|| Packet::nack(&missing))
    }

    /// Drops all stream state; registered callbacks stay.
    pub fn reset(&mut self) {
        self.packets.clear();
        self.total = None;
        self.checksum_errors.clear();
        self.completed = false;
    }

    fn progress(&self) -> Progress {
        Progress {
            received: self.packets.len(),
            total: usize::from(self.total.unwrap_or(0)),
            missing: self.missing_sequences(),
        }
    }

    fn assemble(&self) -> Vec<u8> {
        self.packets.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Flags;

    fn frame(seq: u16, total: u16, payload: &[u8]) -> Vec<u8> {
        Packet::new(seq, total, Flags::empty(), payload.to_vec()).to_bytes()
    }

    #[test]
    fn accepts_and_tracks_missing() {
        let mut rx = Receiver::new();
        let outcome = rx.on_frame(&frame(1, 3, b"b"));
        assert_eq!(outcome, FrameOutcome::accepted(1));
        assert_eq!(rx.total(), Some(3));
        assert_eq!(rx.missing_sequences(), vec![0, 2]);
        assert!(!rx.is_complete());
    }

    #[test]
    fn duplicate_is_idempotent() {
        let mut rx = Receiver::new();
        rx.on_frame(&frame(0, 2, b"x"));
        let again = rx.on_frame(&frame(0, 2, b"x"));
        assert!(again.accepted);
        assert_eq!(rx.received(), 1);
    }

    #[test]
    fn invalid_magic_and_truncation_are_invalid() {
        let mut rx = Receiver::new();
        assert_eq!(
            rx.on_frame(b"XX123456789"),
            FrameOutcome::rejected(Reason::Invalid, None)
        );
        assert_eq!(
            rx.on_frame(b"QS"),
            FrameOutcome::rejected(Reason::Invalid, None)
        );
    }

    #[test]
    fn corrupted_frame_lands_in_checksum_errors() {
        let mut rx = Receiver::new();
        let mut bytes = frame(2, 4, b"payload");
        let last = bytes.len() - 1;
        bytes[last] ^= 0x10;
        let outcome = rx.on_frame(&bytes);
        assert_eq!(outcome, FrameOutcome::rejected(Reason::Checksum, Some(2)));
        assert!(rx.checksum_errors().contains(&2));
        // Still recoverable: a clean retransmit completes the set.
        rx.on_frame(&frame(2, 4, b"payload"));
        assert_eq!(rx.received(), 1);
    }

    #[test]
    fn total_is_first_reception_wins() {
        let mut rx = Receiver::new();
        rx.on_frame(&frame(0, 4, b"a"));
        let outcome = rx.on_frame(&frame(1, 9, b"b"));
        assert_eq!(
            outcome,
            FrameOutcome::rejected(Reason::TotalMismatch, Some(1))
        );
        assert_eq!(rx.total(), Some(4));
        assert_eq!(rx.received(), 1);
    }

    #[test]
    fn callbacks_fire_in_order_and_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut rx = Receiver::new();
        let progress_log = Rc::clone(&log);
        rx.on_progress(move |p| {
            progress_log
                .borrow_mut()
                .push(format!("progress {}/{}", p.received, p.total));
        });
        let complete_log = Rc::clone(&log);
        rx.on_complete(move |payload| {
            complete_log
                .borrow_mut()
                .push(format!("complete {}", payload.len()));
        });

        rx.on_frame(&frame(1, 2, b"bb"));
        rx.on_frame(&frame(0, 2, b"aa"));
        rx.on_frame(&frame(0, 2, b"aa")); // duplicate, no callbacks
        assert_eq!(
            log.borrow().as_slice(),
            ["progress 1/2", "progress 2/2", "complete 4"]
        );
        assert_eq!(rx.reassemble().unwrap(), b"aabb".to_vec());
    }

    #[test]
    fn reset_clears_stream_state() {
        let mut rx = Receiver::new();
        rx.on_frame(&frame(0, 1, b"z"));
        assert!(rx.is_complete());
        rx.reset();
        assert_eq!(rx.total(), None);
        assert_eq!(rx.received(), 0);
        assert!(!rx.is_complete());
        assert_eq!(rx.reassemble(), None);
    }

    #[test]
    fn progress_serializes_for_ui_transport() {
        let progress = Progress {
            received: 2,
            total: 6,
            missing: vec![0, 3, 4, 5],
        };
        let json = serde_json::to_string(&progress).unwrap();
        let back: Progress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
        let outcome = serde_json::to_value(FrameOutcome::rejected(Reason::Checksum, Some(3)))
            .unwrap();
        assert_eq!(outcome["reason"], "checksum");
    }
}
