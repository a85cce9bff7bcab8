//! Sender/receiver end-to-end scenarios: out-of-order delivery,
//! duplication, corruption, and retransmission.

use qstream_rs::{Receiver, Sender, DEFAULT_CHUNK_SIZE};
use rand::Rng;

fn random_payload(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.random()).collect()
}

fn shuffled(mut items: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut rng = rand::rng();
    for i in (1..items.len()).rev() {
        items.swap(i, rng.random_range(0..=i));
    }
    items
}

#[test]
fn ten_kilobytes_chunks_into_six_packets() {
    let payload = random_payload(10_000);
    let mut tx = Sender::new(&payload, DEFAULT_CHUNK_SIZE, 10.0).unwrap();
    assert_eq!(tx.total(), 6);

    let mut frames = Vec::new();
    while let Some(packet) = tx.next() {
        frames.push(packet);
    }
    assert_eq!(frames.len(), 6);
    assert!(frames[0].flags.contains(qstream_rs::Flags::FIRST));
    assert!(frames[5].flags.contains(qstream_rs::Flags::LAST));
    for packet in &frames[..5] {
        assert_eq!(packet.payload.len(), 1800);
    }
    assert_eq!(frames[5].payload.len(), 1000);

    // Deliver as [0, 2, 4, 1, 3, 5].
    let mut rx = Receiver::new();
    for &i in &[0usize, 2, 4, 1, 3, 5] {
        assert!(rx.on_frame(&frames[i].to_bytes()).accepted);
    }
    assert_eq!(rx.reassemble().unwrap(), payload);
}

#[test]
fn corruption_then_retransmission_recovers() {
    let payload = random_payload(4_321);
    let mut tx = Sender::new(&payload, 1000, 10.0).unwrap();
    let frames: Vec<_> = std::iter::from_fn(|| tx.next()).collect();
    assert_eq!(frames.len(), 5);

    let mut rx = Receiver::new();
    for (i, packet) in frames.iter().enumerate() {
        let mut bytes = packet.to_bytes();
        if i == 2 {
            let last = bytes.len() - 1;
            bytes[last] ^= 0xFF;
            let outcome = rx.on_frame(&bytes);
            assert!(!outcome.accepted);
            assert_eq!(outcome.seq, Some(2));
        } else {
            assert!(rx.on_frame(&bytes).accepted);
        }
    }
    assert!(rx.checksum_errors().contains(&2));
    assert_eq!(rx.missing_sequences(), vec![2]);
    assert!(!rx.is_complete());

    // The receiver asks, the sender answers.
    let nack = rx.nack().unwrap();
    tx.request_retransmit(&nack.parse_nack().unwrap());
    let resend = tx.next().unwrap();
    assert_eq!(resend.seq, 2);
    assert!(rx.on_frame(&resend.to_bytes()).accepted);
    assert_eq!(rx.reassemble().unwrap(), payload);
}

#[test]
fn shuffled_duplicated_delivery_completes_once() {
    let payload = random_payload(9_999);
    let mut tx = Sender::new(&payload, 500, 10.0).unwrap();
    let frames: Vec<Vec<u8>> =
        std::iter::from_fn(|| tx.next()).map(|p| p.to_bytes()).collect();

    // Every frame twice, in random order.
    let mut doubled = frames.clone();
    doubled.extend(frames.clone());
    let deliveries = shuffled(doubled);

    use std::cell::RefCell;
    use std::rc::Rc;
    let completions: Rc<RefCell<usize>> = Rc::default();
    let counter = Rc::clone(&completions);
    let mut rx = Receiver::new();
    rx.on_complete(move |_| *counter.borrow_mut() += 1);
    for bytes in &deliveries {
        assert!(rx.on_frame(bytes).accepted);
    }
    assert_eq!(*completions.borrow(), 1);
    assert_eq!(rx.reassemble().unwrap(), payload);
}

#[test]
fn missing_set_matches_the_complement() {
    let payload = random_payload(2_600);
    let mut tx = Sender::new(&payload, 200, 10.0).unwrap();
    let frames: Vec<_> = std::iter::from_fn(|| tx.next()).collect();
    assert_eq!(frames.len(), 13);

    let keep: Vec<usize> = vec![0, 1, 5, 8, 12];
    let mut rx = Receiver::new();
    for &i in &keep {
        rx.on_frame(&frames[i].to_bytes());
    }
    let expected: Vec<u16> = (0..13u16)
        .filter(|s| !keep.contains(&usize::from(*s)))
        .collect();
    assert_eq!(rx.missing_sequences(), expected);
}

#[test]
fn progress_reports_walk_to_completion() {
    let payload = random_payload(900);
    let mut tx = Sender::new(&payload, 300, 10.0).unwrap();

    use std::cell::RefCell;
    use std::rc::Rc;
    let reports: Rc<RefCell<Vec<(usize, usize, usize)>>> = Rc::default();
    let sink = Rc::clone(&reports);
    let mut rx = Receiver::new();
    rx.on_progress(move |p| {
        sink.borrow_mut().push((p.received, p.total, p.missing.len()));
    });
    while let Some(packet) = tx.next() {
        rx.on_frame(&packet.to_bytes());
    }
    assert_eq!(
        reports.borrow().as_slice(),
        [(1, 3, 2), (2, 3, 1), (3, 3, 0)]
    );
}
