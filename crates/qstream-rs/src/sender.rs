//! The transmit side: chunks a payload into packets and hands them out
//! one per display frame.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::error::StreamError;
use crate::packet::{Flags, Packet};

/// Default payload bytes per packet.
pub const DEFAULT_CHUNK_SIZE: usize = 1800;

/// An event handed to the [`Sender::run`] sink.
#[derive(Debug)]
pub enum SenderEvent<'a> {
    /// A packet is due for display.
    Frame {
        packet: &'a Packet,
        seq: u16,
        total: u16,
    },
    /// The monotonic walk and the retransmit queue are both exhausted.
    Complete,
}

/// Cooperative stop switch for a running sender; cloneable and
/// thread-safe so a UI can flip it while [`Sender::run`] sleeps.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Prevents further scheduled emissions; the in-flight frame is not
    /// interrupted.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Splits a payload into flagged packets and walks them in order, serving
/// retransmit requests first.
pub struct Sender {
    packets: Vec<Packet>,
    index: usize,
    retransmit: VecDeque<u16>,
    fps: f32,
    running: Arc<AtomicBool>,
}

impl Sender {
    /// Partitions `payload` into `ceil(len / chunk_size)` packets (an
    /// empty payload still ships one, so the stream exists on the wire).
    /// The first packet carries [`Flags::FIRST`], the last
    /// [`Flags::LAST`].
    ///
    /// Fails if the chunk count would not fit a 16-bit sequence number.
    /// Panics if `chunk_size` is zero or `fps` is not positive.
    pub fn new(payload: &[u8], chunk_size: usize, fps: f32) -> Result<Self, StreamError> {
        assert!(chunk_size > 0, "Chunk size must be positive");
        assert!(fps > 0.0, "Frame rate must be positive");
        let chunks = payload.len().div_ceil(chunk_size).max(1);
        if chunks > usize::from(u16::MAX) {
            return Err(StreamError::TooManyChunks {
                chunks,
                max: usize::from(u16::MAX),
            });
        }
        let total = chunks as u16;
        let packets = (0..chunks)
            .map(|i| {
                let start = i * chunk_size;
                let end = payload.len().min(start + chunk_size);
                let mut flags = Flags::empty();
                if i == 0 {
                    flags = flags.with(Flags::FIRST);
                }
                if i == chunks - 1 {
                    flags = flags.with(Flags::LAST);
                }
                Packet::new(i as u16, total, flags, payload[start..end].to_vec())
            })
            .collect();
        debug!("sender ready: {chunks} packet(s)");
        Ok(Self {
            packets,
            index: 0,
            retransmit: VecDeque::new(),
            fps,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Number of packets in the stream.
    pub fn total(&self) -> u16 {
        self.packets.len() as u16
    }

    /// The next packet to display: the retransmit queue drains first,
    /// then the monotonic walk resumes. `None` once both are exhausted.
    pub fn next(&mut self) -> Option<Packet> {
        while let Some(seq) = self.retransmit.pop_front() {
            if let Some(packet) = self.packets.get(usize::from(seq)) {
                return Some(packet.clone());
            }
            // Out-of-range requests are dropped.
        }
        let packet = self.packets.get(self.index)?.clone();
        self.index += 1;
        Some(packet)
    }

    /// Queues sequence numbers for retransmission, in FIFO order;
    /// duplicates are allowed.
    pub fn request_retransmit(&mut self, seqs: &[u16]) {
        self.retransmit.extend(seqs.iter().copied());
    }

    /// Rewinds the monotonic walk and clears the retransmit queue.
    pub fn reset(&mut self) {
        self.index = 0;
        self.retransmit.clear();
        self.running.store(true, Ordering::Relaxed);
    }

    /// Seconds between frames, from the construction-time frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.fps)
    }

    /// A switch that makes a concurrent [`run`](Self::run) wind down.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Stops a run at the next frame boundary; [`reset`](Self::reset)
    /// re-arms it.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Convenience runner: emits every remaining packet through `sink` at
    /// the configured frame rate, sleeping between frames, and finishes
    /// with [`SenderEvent::Complete`]. Returns `true` if it ran to
    /// completion, `false` if stopped.
    ///
    /// The core stays clockless: callers that want their own pacing drive
    /// [`next`](Self::next) directly.
    pub fn run<F: for<'a> FnMut(SenderEvent<'a>)>(&mut self, mut sink: F) -> bool {
        self.running.store(true, Ordering::Relaxed);
        loop {
            if !self.running.load(Ordering::Relaxed) {
                debug!("sender stopped at index {}", self.index);
                return false;
            }
            let total = self.total();
            match self.next() {
                Some(packet) => {
                    sink(SenderEvent::Frame {
                        seq: packet.seq,
                        total,
                        packet: &packet,
                    });
                    std::thread::sleep(self.frame_interval());
                }
                None => {
                    info!("sender complete: {} packet(s) emitted", total);
                    sink(SenderEvent::Complete);
                    return true;
                }
            }
        }
    }
}
