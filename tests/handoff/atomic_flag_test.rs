/*!
 * Atomic Flag Gate Integration Tests
 *
 * Includes a checksum property test across randomized publish/claim timing
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::{Duration, Instant};
use thread_handoff::{AtomicFlagGate, Backoff, BackoffConfig, WaitError};

/// Wide payload so a torn read would be visible in the checksum
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    seq: u64,
    words: [u64; 16],
    checksum: u64,
}

impl Frame {
    fn new(seq: u64, rng: &mut StdRng) -> Self {
        let mut words = [0u64; 16];
        for word in words.iter_mut() {
            *word = rng.gen();
        }
        let checksum = Self::checksum_of(seq, &words);
        Self {
            seq,
            words,
            checksum,
        }
    }

    fn checksum_of(seq: u64, words: &[u64; 16]) -> u64 {
        words
            .iter()
            .fold(seq.wrapping_mul(0x9E37_79B9_7F4A_7C15), |acc, w| {
                acc.rotate_left(7) ^ w
            })
    }

    fn is_intact(&self) -> bool {
        self.checksum == Self::checksum_of(self.seq, &self.words)
    }
}

fn jitter(rng: &mut StdRng) {
    match rng.gen_range(0..4) {
        0 => {}
        1 => std::hint::spin_loop(),
        2 => thread::yield_now(),
        _ => thread::sleep(Duration::from_micros(rng.gen_range(0..20))),
    }
}

fn run_rounds(rounds: u64, seed: u64) {
    let (mut publisher, mut claimer) = AtomicFlagGate::<Frame>::channel();

    let producer = thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(seed);
        for seq in 0..rounds {
            let frame = Frame::new(seq, &mut rng);
            jitter(&mut rng);
            publisher.publish(frame);
        }
    });

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut expected = 0;
    while expected < rounds {
        jitter(&mut rng);
        if let Some(frame) = claimer.try_claim() {
            assert!(frame.is_intact(), "torn payload at seq {}", frame.seq);
            assert_eq!(frame.seq, expected);
            expected += 1;
        }
    }

    producer.join().unwrap();
    assert_eq!(claimer.try_claim(), None);
}

#[test]
fn test_vector_payload_handoff() {
    let (mut publisher, mut claimer) = AtomicFlagGate::<Vec<i32>>::channel();

    let claim = thread::spawn(move || loop {
        if let Some(values) = claimer.try_claim() {
            return values;
        }
        std::hint::spin_loop();
    });

    let values: Vec<i32> = (0..10).map(|i| i * i).collect();
    publisher.publish(values);

    let claimed = claim.join().unwrap();
    assert_eq!(claimed.len(), 10);
    assert_eq!(claimed, (0..10).map(|i| i * i).collect::<Vec<_>>());
}

#[test]
fn test_many_rounds_stay_intact() {
    run_rounds(2_000, 0xC0FFEE);
}

#[test]
fn test_poll_claim_until_deadline() {
    let (mut publisher, mut claimer) =
        AtomicFlagGate::<u32>::channel_with(BackoffConfig::low_latency());

    let start = Instant::now();
    let result = claimer.poll_claim_until(start + Duration::from_millis(20));
    assert!(matches!(result, Err(WaitError::Timeout(_))));

    publisher.publish(9);
    let value = claimer
        .poll_claim_until(Instant::now() + Duration::from_secs(5))
        .unwrap();
    assert_eq!(value, 9);
}

#[test]
fn test_poll_claim_waits_out_a_late_publisher() {
    let (mut publisher, mut claimer) = AtomicFlagGate::<u32>::channel();
    let cap = Duration::from_millis(5);

    let start = Instant::now();
    let handle = thread::spawn(move || {
        let value = claimer.poll_claim(cap);
        (value, Instant::now())
    });

    thread::sleep(Duration::from_millis(100));
    let published_at = Instant::now();
    publisher.publish(17);

    let (value, claimed_at) = handle.join().unwrap();
    assert_eq!(value, 17);
    assert!(claimed_at.duration_since(start) >= Duration::from_millis(100));
    // One capped nap plus scheduling slack
    assert!(claimed_at.duration_since(published_at) < cap + Duration::from_millis(250));
}

#[test]
fn test_capped_backoff_sleeps_within_cap() {
    let cap = Duration::from_millis(2);
    let mut backoff = Backoff::capped(cap);

    let start = Instant::now();
    while !backoff.is_sleeping() {
        backoff.snooze();
    }
    for _ in 0..60 {
        backoff.snooze();
    }
    let elapsed = start.elapsed();

    // 60 sleep steps: doubling from 1µs reaches the cap after 11 steps
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn test_zero_cap_poll_claim_still_yields() {
    let (mut publisher, mut claimer) = AtomicFlagGate::<u32>::channel();
    let handle = thread::spawn(move || claimer.poll_claim(Duration::ZERO));

    thread::sleep(Duration::from_millis(20));
    publisher.publish(3);
    assert_eq!(handle.join().unwrap(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_claimed_frames_are_never_torn(seed in any::<u64>(), rounds in 50u64..400) {
        run_rounds(rounds, seed);
    }
}
