//! In-memory fakes of the ports.
//!
//! `MemoryRecordFile` can run a one-shot hook right before a chosen
//! operation, which is how tests stage another process acting between two
//! steps of the claim protocol.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Liveness, Pid, ProcessDetails, SignalKind};
use crate::ports::{ClaimOutcome, ControlError, ProcessControlPort, RecordFilePort};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Operations of [`RecordFilePort`], used to target hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOp {
    Create,
    Read,
    Take,
    Restore,
    Remove,
    Modified,
}

/// Mutable view of the fake filesystem handed to hooks.
#[derive(Debug, Default)]
pub struct MemoryDir {
    files: HashMap<PathBuf, (String, DateTime<Utc>)>,
}

impl MemoryDir {
    pub fn put(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .insert(path.into(), (content.into(), Utc::now()));
    }

    pub fn delete(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|(content, _)| content.as_str())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }
}

type Hook = Box<dyn FnOnce(&mut MemoryDir) -> io::Result<()> + Send>;

/// In-memory [`RecordFilePort`].
#[derive(Default)]
pub struct MemoryRecordFile {
    dir: Mutex<MemoryDir>,
    hooks: Mutex<Vec<(MemoryOp, Hook)>>,
    calls: Mutex<Vec<MemoryOp>>,
}

impl MemoryRecordFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn put(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        lock(&self.dir).put(path, content);
    }

    /// Current content of a file.
    pub fn get(&self, path: &Path) -> Option<String> {
        lock(&self.dir).get(path).map(ToString::to_string)
    }

    /// All paths currently present.
    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.dir).paths()
    }

    /// Run `hook` right before the next `op`. An `Err` from the hook
    /// becomes the result of that operation.
    pub fn before_next<F>(&self, op: MemoryOp, hook: F)
    where
        F: FnOnce(&mut MemoryDir) -> io::Result<()> + Send + 'static,
    {
        lock(&self.hooks).push((op, Box::new(hook)));
    }

    /// Make the next `op` fail with `kind`.
    pub fn fail_next(&self, op: MemoryOp, kind: io::ErrorKind) {
        self.before_next(op, move |_| Err(io::Error::new(kind, "injected failure")));
    }

    /// Operations performed so far, in order.
    pub fn calls(&self) -> Vec<MemoryOp> {
        lock(&self.calls).clone()
    }

    fn enter(&self, op: MemoryOp) -> io::Result<MutexGuard<'_, MemoryDir>> {
        lock(&self.calls).push(op);
        let hook = {
            let mut hooks = lock(&self.hooks);
            hooks
                .iter()
                .position(|(target, _)| *target == op)
                .map(|index| hooks.remove(index).1)
        };
        let mut dir = lock(&self.dir);
        if let Some(hook) = hook {
            hook(&mut dir)?;
        }
        Ok(dir)
    }
}

#[async_trait]
impl RecordFilePort for MemoryRecordFile {
    async fn create_exclusive(&self, path: &Path, content: &str) -> io::Result<ClaimOutcome> {
        let mut dir = self.enter(MemoryOp::Create)?;
        if dir.get(path).is_some() {
            return Ok(ClaimOutcome::Exists);
        }
        dir.put(path, content);
        Ok(ClaimOutcome::Created)
    }

    async fn read(&self, path: &Path) -> io::Result<Option<String>> {
        let dir = self.enter(MemoryOp::Read)?;
        Ok(dir.get(path).map(ToString::to_string))
    }

    async fn take(&self, path: &Path, tomb: &Path) -> io::Result<bool> {
        let mut dir = self.enter(MemoryOp::Take)?;
        match dir.files.remove(path) {
            Some(entry) => {
                dir.files.insert(tomb.to_path_buf(), entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, tomb: &Path, path: &Path) -> io::Result<bool> {
        let mut dir = self.enter(MemoryOp::Restore)?;
        if dir.files.contains_key(path) {
            return Ok(false);
        }
        let entry = dir
            .files
            .get(tomb)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "tombstone missing"))?;
        dir.files.insert(path.to_path_buf(), entry);
        Ok(true)
    }

    async fn remove(&self, path: &Path) -> io::Result<bool> {
        let mut dir = self.enter(MemoryOp::Remove)?;
        Ok(dir.delete(path))
    }

    async fn modified(&self, path: &Path) -> io::Result<Option<DateTime<Utc>>> {
        let dir = self.enter(MemoryOp::Modified)?;
        Ok(dir.files.get(path).map(|(_, at)| *at))
    }
}

/// In-memory [`ProcessControlPort`] with a mutable set of live PIDs.
#[derive(Debug, Default)]
pub struct FakeProcessControl {
    alive: Mutex<HashSet<Pid>>,
    protected: Mutex<HashSet<Pid>>,
    delivered: Mutex<Vec<(Pid, SignalKind)>>,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A control where exactly `pids` are alive.
    pub fn with_alive(pids: impl IntoIterator<Item = Pid>) -> Self {
        let control = Self::default();
        lock(&control.alive).extend(pids);
        control
    }

    pub fn set_alive(&self, pid: Pid) {
        lock(&self.alive).insert(pid);
    }

    pub fn set_dead(&self, pid: Pid) {
        lock(&self.alive).remove(&pid);
    }

    /// Signals to `pid` fail with `PermissionDenied`.
    pub fn protect(&self, pid: Pid) {
        lock(&self.protected).insert(pid);
    }

    /// Signals delivered so far, in order.
    pub fn delivered(&self) -> Vec<(Pid, SignalKind)> {
        lock(&self.delivered).clone()
    }
}

#[async_trait]
impl ProcessControlPort for FakeProcessControl {
    async fn probe(&self, pid: Pid) -> io::Result<Liveness> {
        Ok(if lock(&self.alive).contains(&pid) {
            Liveness::Alive
        } else {
            Liveness::Dead
        })
    }

    async fn signal(&self, pid: Pid, signal: SignalKind) -> Result<(), ControlError> {
        if !lock(&self.alive).contains(&pid) {
            return Err(ControlError::NoSuchProcess);
        }
        if lock(&self.protected).contains(&pid) {
            return Err(ControlError::PermissionDenied);
        }
        lock(&self.delivered).push((pid, signal));
        Ok(())
    }

    async fn describe(&self, pid: Pid) -> Option<ProcessDetails> {
        lock(&self.alive).contains(&pid).then(|| ProcessDetails {
            name: format!("fake-{pid}"),
            executable: None,
            started_at: None,
        })
    }
}
