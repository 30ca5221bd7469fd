//! Record protocol against the real filesystem, with a scripted process table.

mod common;

use std::sync::Arc;

use pidguard_core::testing::FakeProcessControl;
use pidguard_core::{PidStore, PidStoreConfig, RecordFilePort, RecordStatus, SignalKind};
use pidguard_runtime::FsRecordFile;
use tokio_test::{assert_err, assert_ok};

use common::{pid, read, scratch};

async fn store(path: &std::path::Path, control: Arc<FakeProcessControl>) -> PidStore {
    PidStore::open(
        &PidStoreConfig::new(path),
        Arc::new(FsRecordFile::new()),
        control,
    )
    .await
    .expect("open store")
}

fn hidden_entries(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect()
}

#[tokio::test]
async fn live_owner_lifecycle() {
    let s = scratch("app.pid");
    let control = Arc::new(FakeProcessControl::with_alive([pid(4821)]));
    let store = store(&s.path, control.clone()).await;

    assert!(!assert_ok!(store.running().await));
    assert_ok!(store.write(pid(4821)).await);
    assert_eq!(read(&s.path), "4821\n");
    assert!(assert_ok!(store.running().await));

    assert_ok!(store.kill(SignalKind::Term).await);
    assert_eq!(control.delivered(), vec![(pid(4821), SignalKind::Term)]);
    assert_eq!(read(&s.path), "4821\n");

    assert_ok!(store.delete().await);
    assert!(!s.path.exists());
    assert!(!assert_ok!(store.running().await));
    assert!(hidden_entries(s.dir.path()).is_empty());
}

#[tokio::test]
async fn stale_record_is_reclaimed() {
    let s = scratch("app.pid");
    std::fs::write(&s.path, "99999").expect("seed");
    let control = Arc::new(FakeProcessControl::new());
    let store = store(&s.path, control).await;

    assert!(!assert_ok!(store.running().await));
    let err = assert_err!(store.kill(SignalKind::Term).await);
    assert!(err.is_process_not_found());

    assert_ok!(store.write(pid(1234)).await);
    assert_eq!(read(&s.path), "1234\n");
    assert!(hidden_entries(s.dir.path()).is_empty());
}

#[tokio::test]
async fn live_record_is_not_overwritten() {
    let s = scratch("app.pid");
    let control = Arc::new(FakeProcessControl::with_alive([pid(10), pid(20)]));
    let store = store(&s.path, control).await;

    assert_ok!(store.write(pid(10)).await);
    let err = assert_err!(store.write(pid(20)).await);

    assert!(err.is_already_running());
    assert_eq!(read(&s.path), "10\n");
}

#[tokio::test]
async fn corrupt_record_reports_and_survives_reads() {
    let s = scratch("app.pid");
    std::fs::write(&s.path, "not a pid\n").expect("seed");
    let store = store(&s.path, Arc::new(FakeProcessControl::new())).await;

    assert!(assert_err!(store.running().await).is_corrupt_record());
    assert!(assert_err!(store.kill(SignalKind::Hup).await).is_corrupt_record());
    assert_eq!(read(&s.path), "not a pid\n");

    // A claim replaces it
    assert_ok!(store.write(pid(7)).await);
    assert_eq!(read(&s.path), "7\n");
}

#[tokio::test]
async fn reap_only_when_enabled() {
    let s = scratch("app.pid");
    std::fs::write(&s.path, "55\n").expect("seed");
    let control = Arc::new(FakeProcessControl::new());

    let plain = store(&s.path, control.clone()).await;
    assert!(!assert_ok!(plain.running().await));
    assert!(s.path.exists());

    let reaping = PidStore::open(
        &PidStoreConfig::new(&s.path).with_reap_stale(true),
        Arc::new(FsRecordFile::new()),
        control,
    )
    .await
    .expect("open store");
    assert!(!assert_ok!(reaping.running().await));
    assert!(!s.path.exists());
}

#[tokio::test]
async fn status_and_inspect() {
    let s = scratch("app.pid");
    let control = Arc::new(FakeProcessControl::with_alive([pid(3)]));
    let store = store(&s.path, control.clone()).await;

    assert_eq!(assert_ok!(store.status().await), RecordStatus::Absent);
    assert_ok!(store.write(pid(3)).await);
    assert_eq!(assert_ok!(store.status().await), RecordStatus::Live(pid(3)));

    let snapshot = assert_ok!(store.inspect().await);
    assert_eq!(snapshot.status, RecordStatus::Live(pid(3)));
    assert!(snapshot.written_at.is_some());
    assert_eq!(snapshot.process.map(|p| p.name), Some("fake-3".to_string()));

    control.set_dead(pid(3));
    assert_eq!(assert_ok!(store.status().await), RecordStatus::Stale(pid(3)));
}

#[tokio::test]
async fn release_ignores_foreign_record() {
    let s = scratch("app.pid");
    let control = Arc::new(FakeProcessControl::with_alive([pid(1), pid(2)]));
    let store = store(&s.path, control).await;

    assert_ok!(store.write(pid(1)).await);
    assert!(!assert_ok!(store.release(pid(2)).await));
    assert_eq!(read(&s.path), "1\n");
    assert!(assert_ok!(store.release(pid(1)).await));
    assert!(!s.path.exists());
}

#[tokio::test]
async fn concurrent_claims_on_absent_path_have_one_winner() {
    let s = scratch("app.pid");
    let contenders: Vec<u32> = (100..116).collect();
    let control = Arc::new(FakeProcessControl::with_alive(
        contenders.iter().copied().map(pid),
    ));
    let store = store(&s.path, control).await;

    let tasks: Vec<_> = contenders
        .iter()
        .map(|&raw| {
            let store = store.clone();
            tokio::spawn(async move { (raw, store.write(pid(raw)).await) })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        let (raw, result) = task.await.expect("join");
        match result {
            Ok(()) => winners.push(raw),
            Err(e) => assert!(e.is_already_running(), "unexpected error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(read(&s.path), format!("{}\n", winners[0]));
    assert!(hidden_entries(s.dir.path()).is_empty());
}

#[tokio::test]
async fn delete_twice_is_fine() {
    let s = scratch("app.pid");
    let files = FsRecordFile::new();
    assert_ok!(files.create_exclusive(&s.path, "9\n").await);
    let store = store(&s.path, Arc::new(FakeProcessControl::new())).await;

    assert_ok!(store.delete().await);
    assert_ok!(store.delete().await);
    assert!(!s.path.exists());
}
