/*!
 * Handoff Demo - Main Entry Point
 *
 * Runs each handoff strategy through a small producer/consumer scenario:
 * - Condition gate readiness flag with several waiters
 * - One-shot value shared by three readers, then a rejected second set
 * - Atomic flag handoff of a vector payload
 */

use anyhow::{ensure, Context, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

use thread_handoff::{
    init_tracing, spawn_signalled, AtomicFlagGate, ConditionGate, HandoffConfig, HandoffKind,
    HandoffProfile, OneShotSignal, WaitSpan, WakeMode,
};

const WAITERS: usize = 4;

fn main() -> Result<()> {
    init_tracing();

    let config = HandoffConfig::from_env().context("loading HANDOFF_CONFIG")?;
    for (label, profile) in [
        ("one-time", HandoffProfile::one_time()),
        ("repeated", HandoffProfile::repeated()),
        ("hot-path", HandoffProfile::hot_path()),
    ] {
        info!(profile = label, strategy = config.select(&profile).name(), "Strategy selection");
    }

    condition_gate_demo()?;
    oneshot_demo()?;
    atomic_flag_demo(&config)?;

    info!("All handoff demos completed");
    Ok(())
}

fn condition_gate_demo() -> Result<()> {
    let gate = Arc::new(ConditionGate::new(false));

    let waiters: Vec<_> = (0..WAITERS)
        .map(|i| {
            let gate = gate.clone();
            thread::Builder::new()
                .name(format!("gate-waiter-{i}"))
                .spawn(move || {
                    let _span = WaitSpan::new(HandoffKind::Condition);
                    gate.wait_until_with(|ready| *ready, |ready| *ready)
                })
        })
        .collect::<std::io::Result<_>>()?;

    thread::sleep(Duration::from_millis(20));
    let woken = gate.notify(|ready| *ready = true, WakeMode::All);
    info!(woken = woken.count(), "Condition gate signalled");

    for waiter in waiters {
        let observed = waiter
            .join()
            .map_err(|_| anyhow::anyhow!("gate waiter panicked"))?;
        ensure!(observed, "waiter observed a stale state");
    }
    Ok(())
}

fn oneshot_demo() -> Result<()> {
    let signal = OneShotSignal::<i32>::new();
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let consumer = signal.consumer();
            thread::spawn(move || {
                let _span = WaitSpan::new(HandoffKind::OneShot);
                consumer.get()
            })
        })
        .collect();

    let producer = signal.producer();
    producer.set(42)?;
    if let Err(e) = producer.set(7) {
        info!(error = %e, "Second set rejected as expected");
    } else {
        error!("Second set was accepted");
        anyhow::bail!("one-shot signal accepted a second value");
    }

    for reader in readers {
        let value = reader
            .join()
            .map_err(|_| anyhow::anyhow!("one-shot reader panicked"))??;
        ensure!(value == 42, "reader saw {value}");
    }

    let task = spawn_signalled("answer", || Ok::<_, String>(6 * 7))?;
    let answer = task.join()?;
    info!(answer, "Signalled task finished");
    Ok(())
}

fn atomic_flag_demo(config: &HandoffConfig) -> Result<()> {
    let (mut publisher, mut claimer) = AtomicFlagGate::<Vec<i32>>::channel_with(config.backoff);

    let max_sleep = config.backoff.max_sleep;
    let claim = thread::spawn(move || {
        let _span = WaitSpan::new(HandoffKind::AtomicFlag);
        claimer.poll_claim(max_sleep)
    });

    publisher.publish((0..10).collect());
    let payload = claim
        .join()
        .map_err(|_| anyhow::anyhow!("flag claimer panicked"))?;
    ensure!(payload == (0..10).collect::<Vec<_>>(), "payload corrupted");
    info!(len = payload.len(), "Atomic flag payload claimed");
    Ok(())
}
