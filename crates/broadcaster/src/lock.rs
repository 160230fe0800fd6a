//! Cross-process advisory lock around the radio.
//!
//! The lock is a file at a well-known path. Whoever creates it owns the radio
//! until they delete it. A lock file whose modification time is older than the
//! staleness threshold belongs to a crashed holder and is reclaimed.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use alert_core::Shutdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LockError;

/// Default lock location, shared with any other sender on this host.
pub const DEFAULT_LOCK_PATH: &str = "/tmp/meshtastic_send.lock";

/// Age after which a lock file is considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Wait between attempts while another holder owns the lock.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Identity written into the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    /// PID of the owning process.
    pub owner_pid: u32,
    /// When the lock was taken.
    pub acquired_at: DateTime<Utc>,
}

impl LockToken {
    /// A token for the current process.
    pub fn current() -> Self {
        Self {
            owner_pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }
}

/// File-backed mutual exclusion for the transport.
#[derive(Debug, Clone)]
pub struct SendLock {
    path: PathBuf,
    stale_after: Duration,
    retry_delay: Duration,
}

impl SendLock {
    /// Lock at `path` with default staleness and retry timings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stale_after: DEFAULT_STALE_AFTER,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the staleness threshold.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Set the delay between contended attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Lock file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is ours, reclaiming stale locks on the way.
    ///
    /// Contention is waited out with an interruptible sleep; a shutdown
    /// request ends the wait with [`LockError::Interrupted`].
    pub async fn acquire(&self, shutdown: &Shutdown) -> Result<SendLockGuard<'_>, LockError> {
        loop {
            if shutdown.is_triggered() {
                return Err(LockError::Interrupted);
            }

            match self.try_create() {
                Ok(token) => {
                    debug!(path = %self.path.display(), pid = token.owner_pid, "Send lock acquired");
                    return Ok(SendLockGuard { lock: self, token });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(self.io_error(e)),
            }

            match self.age() {
                Ok(Some(age)) if age > self.stale_after => {
                    warn!(path = %self.path.display(), age_secs = age.as_secs(), "Stale lock detected. Removing it.");
                    self.release()?;
                    continue;
                }
                Ok(Some(_)) => {
                    info!("Another process is using the Meshtastic node. Waiting...");
                }
                // Released between our create attempt and the stat.
                Ok(None) => continue,
                Err(e) => return Err(self.io_error(e)),
            }

            if !shutdown.sleep(self.retry_delay).await {
                return Err(LockError::Interrupted);
            }
        }
    }

    /// Delete the lock file if present. Idempotent.
    pub fn release(&self) -> Result<(), LockError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Owner recorded in the current lock file, if any and readable.
    pub fn holder(&self) -> Option<LockToken> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn try_create(&self) -> std::io::Result<LockToken> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;

        let token = LockToken::current();
        let body = serde_json::to_vec(&token)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        file.write_all(&body)?;
        Ok(token)
    }

    /// Distance between now and the modification time; `None` if the file is gone.
    ///
    /// A future mtime counts by its distance too, so a lock stamped far ahead
    /// by a skewed clock still goes stale.
    fn age(&self) -> std::io::Result<Option<Duration>> {
        let modified = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let now = SystemTime::now();
        Ok(Some(match now.duration_since(modified) {
            Ok(age) => age,
            Err(ahead) => ahead.duration(),
        }))
    }

    fn io_error(&self, source: std::io::Error) -> LockError {
        LockError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Held lock; the file is removed when the guard is dropped.
#[derive(Debug)]
pub struct SendLockGuard<'a> {
    lock: &'a SendLock,
    token: LockToken,
}

impl SendLockGuard<'_> {
    /// The token written into the lock file.
    pub fn token(&self) -> &LockToken {
        &self.token
    }
}

impl Drop for SendLockGuard<'_> {
    fn drop(&mut self) {
        match self.lock.release() {
            Ok(()) => debug!(path = %self.lock.path.display(), "Send lock released"),
            Err(e) => warn!("Failed to release send lock: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backdate(path: &Path, by: Duration) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SendLock::new(dir.path().join("send.lock"));

        {
            let guard = lock.acquire(&Shutdown::never()).await.unwrap();
            assert_eq!(guard.token().owner_pid, std::process::id());
            assert!(lock.path().exists());
            assert_eq!(lock.holder().unwrap().owner_pid, std::process::id());
        }

        assert!(!lock.path().exists());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SendLock::new(dir.path().join("send.lock"));

        lock.release().unwrap();
        lock.release().unwrap();
    }

    #[tokio::test]
    async fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.lock");
        std::fs::write(&path, "12345").unwrap();
        backdate(&path, Duration::from_secs(600));

        let lock = SendLock::new(&path).with_retry_delay(Duration::from_secs(3600));
        let guard = tokio::time::timeout(Duration::from_secs(5), lock.acquire(&Shutdown::never()))
            .await
            .expect("stale lock must not block")
            .unwrap();

        assert_eq!(guard.token().owner_pid, std::process::id());
    }

    #[tokio::test]
    async fn test_far_future_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.lock");
        std::fs::write(&path, "12345").unwrap();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(3600)).unwrap();
        drop(file);

        let lock = SendLock::new(&path).with_retry_delay(Duration::from_secs(3600));
        let guard = tokio::time::timeout(Duration::from_secs(5), lock.acquire(&Shutdown::never()))
            .await
            .expect("skewed lock must not block")
            .unwrap();

        assert_eq!(guard.token().owner_pid, std::process::id());
    }

    #[tokio::test]
    async fn test_slightly_future_lock_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.lock");
        std::fs::write(&path, "12345").unwrap();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(30)).unwrap();
        drop(file);

        let lock = SendLock::new(&path).with_retry_delay(Duration::from_secs(3600));
        let waited = tokio::time::timeout(Duration::from_millis(200), lock.acquire(&Shutdown::never())).await;

        assert!(waited.is_err());
        assert!(path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_lock_waits_for_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.lock");
        std::fs::write(&path, "12345").unwrap();

        let holder_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            std::fs::remove_file(holder_path).unwrap();
        });

        let lock = SendLock::new(&path);
        let start = tokio::time::Instant::now();
        let guard = lock.acquire(&Shutdown::never()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(lock.holder().unwrap(), *guard.token());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_wait() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("send.lock");
        std::fs::write(&path, "12345").unwrap();

        let (trigger, shutdown) = Shutdown::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.trigger();
        });

        let lock = SendLock::new(&path);
        let result = lock.acquire(&shutdown).await;

        assert!(matches!(result, Err(LockError::Interrupted)));
        // Someone else's lock is left alone.
        assert!(path.exists());
    }
}
