//! End-to-end behavior against real child processes.

#![cfg(unix)]

mod common;

use pidguard_core::{RecordStatus, SignalKind};
use pidguard_runtime::{current_pid, sweep_directory};
use tokio_test::{assert_err, assert_ok};

use common::{exited_pid, os_store, read, scratch, spawn_sleeper};

#[tokio::test]
async fn terminate_recorded_child() {
    let s = scratch("child.pid");
    let store = os_store(&s.path).await;
    let mut sleeper = spawn_sleeper();

    assert_ok!(store.write(sleeper.pid).await);
    assert_eq!(read(&s.path), format!("{}\n", sleeper.pid));
    assert!(assert_ok!(store.running().await));

    assert_ok!(store.kill(SignalKind::Term).await);
    // Signalling leaves the record alone
    assert!(s.path.exists());

    let status = sleeper.child.wait().await.expect("wait child");
    assert!(!status.success());

    assert!(!assert_ok!(store.running().await));
    assert_ok!(store.delete().await);
    assert!(!s.path.exists());
}

#[tokio::test]
async fn exited_process_is_stale() {
    let s = scratch("gone.pid");
    let dead = exited_pid().await;
    std::fs::write(&s.path, dead.to_string()).expect("seed");
    let store = os_store(&s.path).await;

    assert!(!assert_ok!(store.running().await));
    assert_eq!(assert_ok!(store.status().await), RecordStatus::Stale(dead));
    assert!(assert_err!(store.kill(SignalKind::Term).await).is_process_not_found());

    let me = current_pid().expect("own pid");
    assert_ok!(store.write(me).await);
    assert_eq!(read(&s.path), format!("{me}\n"));
}

#[tokio::test]
async fn live_child_blocks_other_claims() {
    let s = scratch("busy.pid");
    let store = os_store(&s.path).await;
    let first = spawn_sleeper();
    let second = spawn_sleeper();

    assert_ok!(store.write(first.pid).await);
    let err = assert_err!(store.write(second.pid).await);

    assert!(err.is_already_running());
    assert_eq!(read(&s.path), format!("{}\n", first.pid));
}

#[tokio::test]
async fn concurrent_live_writers_have_one_winner() {
    let s = scratch("race.pid");
    let store = os_store(&s.path).await;
    let sleepers: Vec<_> = (0..6).map(|_| spawn_sleeper()).collect();

    let tasks: Vec<_> = sleepers
        .iter()
        .map(|sleeper| {
            let store = store.clone();
            let pid = sleeper.pid;
            tokio::spawn(async move { (pid, store.write(pid).await) })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        let (pid, result) = task.await.expect("join");
        match result {
            Ok(()) => winners.push(pid),
            Err(e) => assert!(e.is_already_running(), "unexpected error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(read(&s.path), format!("{}\n", winners[0]));
}

#[tokio::test]
async fn inspect_describes_live_child() {
    let s = scratch("child.pid");
    let store = os_store(&s.path).await;
    let sleeper = spawn_sleeper();
    assert_ok!(store.write(sleeper.pid).await);

    let snapshot = assert_ok!(store.inspect().await);

    assert_eq!(snapshot.status, RecordStatus::Live(sleeper.pid));
    let process = snapshot.process.expect("process details");
    assert!(process.name.contains("sleep"));
}

#[tokio::test]
async fn sweep_reaps_dead_and_keeps_live() {
    let s = scratch("live.pid");
    let sleeper = spawn_sleeper();
    let dead = exited_pid().await;
    std::fs::write(&s.path, sleeper.pid.to_record()).expect("seed live");
    let stale = s.dir.path().join("stale.pid");
    std::fs::write(&stale, dead.to_record()).expect("seed stale");

    let report = assert_ok!(sweep_directory(s.dir.path()).await);

    assert_eq!(report.live, vec![s.path.clone()]);
    assert_eq!(report.reaped, vec![(stale.clone(), dead)]);
    assert!(s.path.exists());
    assert!(!stale.exists());
}

#[tokio::test]
async fn unknown_signal_name_is_rejected() {
    let s = scratch("child.pid");
    let store = os_store(&s.path).await;
    let sleeper = spawn_sleeper();
    assert_ok!(store.write(sleeper.pid).await);

    let err = assert_err!(store.kill_named("SIGBOGUS").await);
    assert!(matches!(err, pidguard_core::PidStoreError::UnsupportedSignal(_)));
    assert_ok!(store.kill_named("term").await);
}

#[tokio::test]
async fn unreaped_child_is_stale_and_unsignallable() {
    let s = scratch("zombie.pid");
    let store = os_store(&s.path).await;
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let zombie = common::pid(child.id());
    std::fs::write(&s.path, zombie.to_record()).expect("seed");

    // The child exits but is not waited on, leaving it a zombie
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(10);
    while assert_ok!(store.running().await) && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert!(!assert_ok!(store.running().await));
    assert_eq!(assert_ok!(store.status().await), RecordStatus::Stale(zombie));
    assert!(assert_err!(store.kill(SignalKind::Term).await).is_process_not_found());
    assert_eq!(read(&s.path), zombie.to_record());

    child.wait().expect("reap true");
}
