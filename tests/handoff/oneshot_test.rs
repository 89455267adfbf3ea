/*!
 * One-Shot Signal Integration Tests
 */

use pretty_assertions::assert_eq;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use thread_handoff::{spawn_signalled, OneShotSignal, ResolvedAs, SignalError};

#[test]
fn test_three_readers_receive_same_value() {
    let signal = OneShotSignal::<i32>::new();
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let consumer = signal.consumer();
            thread::spawn(move || consumer.get())
        })
        .collect();

    let producer = signal.producer();
    producer.set(42).unwrap();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), Ok(42));
    }
}

#[test]
fn test_second_set_returns_broken_contract() {
    let (producer, consumer) = OneShotSignal::<i32>::channel();

    assert!(producer.set(42).is_ok());
    let err = producer.set(7).unwrap_err();
    assert_eq!(err.previous, ResolvedAs::Value);

    assert_eq!(consumer.get(), Ok(42));
}

#[test]
fn test_set_error_after_set_is_rejected() {
    let (producer, consumer) = OneShotSignal::<i32, String>::channel();
    producer.set(1).unwrap();

    assert!(producer.set_error("late".to_string()).is_err());
    assert!(producer.is_resolved());
    assert_eq!(consumer.get(), Ok(1));
}

#[test]
fn test_readers_before_and_after_resolution_agree() {
    const EARLY: usize = 6;
    const LATE: usize = 6;

    let (producer, consumer) = OneShotSignal::<Arc<Vec<u8>>>::channel();
    let start = Arc::new(Barrier::new(EARLY + 1));

    let early: Vec<_> = (0..EARLY)
        .map(|_| {
            let consumer = consumer.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                consumer.get()
            })
        })
        .collect();

    start.wait();
    thread::sleep(Duration::from_millis(20));
    let payload = Arc::new(vec![1, 2, 3]);
    producer.set(payload.clone()).unwrap();

    let late: Vec<_> = (0..LATE)
        .map(|_| {
            let consumer = consumer.clone();
            thread::spawn(move || consumer.get())
        })
        .collect();

    for handle in early.into_iter().chain(late) {
        let value = handle.join().unwrap().unwrap();
        assert!(Arc::ptr_eq(&value, &payload));
    }
}

#[test]
fn test_error_is_reraised_to_every_reader() {
    let (producer, consumer) = OneShotSignal::<u8, String>::channel();
    producer.set_error("disk on fire".to_string()).unwrap();

    for _ in 0..3 {
        assert_eq!(
            consumer.get(),
            Err(SignalError::Failed("disk on fire".to_string()))
        );
    }
}

#[test]
fn test_dropped_producer_unblocks_waiters() {
    let (producer, consumer) = OneShotSignal::<u8>::channel();
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let consumer = consumer.clone();
            thread::spawn(move || consumer.get())
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    drop(producer);

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Err(SignalError::BrokenPromise));
    }
}

#[test]
fn test_start_barrier() {
    // A void signal used as a start gate for several workers
    let (go, ready) = OneShotSignal::<()>::channel();
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let ready = ready.clone();
            thread::spawn(move || {
                ready.wait();
                i * 2
            })
        })
        .collect();

    go.set(()).unwrap();
    let total: i32 = workers.into_iter().map(|w| w.join().unwrap()).sum();
    assert_eq!(total, 12);
}

#[test]
fn test_spawn_signalled_outcomes() {
    let ok = spawn_signalled("ok-task", || Ok::<_, String>(21 * 2)).unwrap();
    let failed = spawn_signalled("failing-task", || Err::<u32, _>("nope".to_string())).unwrap();

    let observer = ok.consumer().clone();
    assert_eq!(ok.join(), Ok(42));
    assert_eq!(observer.try_get(), Some(Ok(42)));
    assert_eq!(failed.join(), Err(SignalError::Failed("nope".to_string())));
}
