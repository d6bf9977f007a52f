//! File-backed subscriber registry.
//!
//! Every mutation is funneled through one worker task that owns the
//! membership set and the log file handle, so appends never interleave.
//! Enumeration reads bypass the worker and copy the shared order list.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use ratecast_core::error::{RatecastError, Result};
use ratecast_core::traits::SubscriberRegistry;
use ratecast_core::types::Appended;

use crate::memory::{MemberSet, SharedOrder};

/// Tuning knobs for [`FileRegistry`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryOptions {
    /// Call `fdatasync` after every line. Off by default; each line is still
    /// flushed to the OS before the append returns.
    pub sync_writes: bool,
}

/// A pending append waiting for the worker.
struct AppendRequest {
    email: String,
    reply: oneshot::Sender<Result<Appended>>,
}

/// Durable, deduplicating subscriber registry backed by a text file.
///
/// # File Format
///
/// ```text
/// foo@mail.com\n
/// bar@my.notmail.org\n
/// foo@mail.com\n      <- repeats are logged, replay keeps the first
/// ```
///
/// One raw address per line, no header, no escaping. Blank lines are
/// ignored on replay.
///
/// # Concurrency
///
/// [`append`](Self::append) hands the request to the worker over a
/// single-slot channel and waits on a private reply channel. The worker
/// updates memory first and then writes the line; a failed write is
/// reported but the in-memory acceptance stands for the rest of the
/// process lifetime.
pub struct FileRegistry {
    /// Path to the backing file
    path: PathBuf,
    /// Enumeration order, shared with the worker
    order: SharedOrder,
    /// Hand-off to the worker; `None` once closed
    handoff: Mutex<Option<mpsc::Sender<AppendRequest>>>,
    /// Worker task; taken by `close`
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileRegistry {
    /// Opens (creating if absent) the registry at `path` and replays it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, RegistryOptions::default()).await
    }

    /// Opens the registry with explicit options.
    ///
    /// # Errors
    /// [`RatecastError::RegistryInit`] if the file cannot be opened or its
    /// contents cannot be read as UTF-8 lines.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open_with(path: impl AsRef<Path>, options: RegistryOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let init_error = |source: io::Error| RatecastError::RegistryInit {
            path: path.clone(),
            source,
        };

        let mut log = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(init_error)?;

        let Replay {
            emails,
            unterminated,
        } = replay(&mut log).await.map_err(init_error)?;
        let replayed = emails.len();
        let members = MemberSet::from_replay(emails);

        if unterminated {
            warn!("Last line has no terminator; it will be closed before the next append");
        }

        info!(
            lines = replayed,
            subscribers = members.len(),
            "Loaded subscribers from file"
        );

        let order = members.shared_order();
        let (handoff, requests) = mpsc::channel(1);
        let worker = Worker {
            path: path.clone(),
            members,
            log,
            sync_writes: options.sync_writes,
            needs_newline: unterminated,
        };
        let handle = tokio::spawn(worker.run(requests));

        Ok(Self {
            path,
            order,
            handoff: Mutex::new(Some(handoff)),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Records `email` and writes it to the log.
    ///
    /// Returns [`Appended::Existing`] if the address was already a member.
    /// A line is written either way.
    ///
    /// # Errors
    /// - [`RatecastError::RegistryPersistence`] if the write failed. The
    ///   address is nevertheless a member from now on.
    /// - [`RatecastError::RegistryClosed`] after [`close`](Self::close).
    pub async fn append(&self, email: &str) -> Result<Appended> {
        let handoff = self
            .handoff
            .lock()
            .clone()
            .ok_or(RatecastError::RegistryClosed)?;

        let (reply, outcome) = oneshot::channel();
        handoff
            .send(AppendRequest {
                email: email.to_string(),
                reply,
            })
            .await
            .map_err(|_| RatecastError::RegistryClosed)?;

        outcome.await.map_err(|_| RatecastError::RegistryClosed)?
    }

    /// Returns all members in first-accepted order.
    ///
    /// The result is a copy; later appends do not show up in it.
    pub fn list(&self) -> Vec<String> {
        self.order.read().clone()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.order.read().len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.order.read().is_empty()
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.handoff.lock().is_none()
    }

    /// Stops the worker and releases the file handle.
    ///
    /// Appends already handed off are completed first. Calling this twice
    /// is a no-op.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn close(&self) -> Result<()> {
        drop(self.handoff.lock().take());

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            handle.await.map_err(|e| {
                RatecastError::IoError(io::Error::new(io::ErrorKind::Other, e.to_string()))
            })?;
            info!(subscribers = self.len(), "Registry closed");
        }

        Ok(())
    }
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        // The worker exits by itself once the last sender is gone.
        if self.worker.get_mut().is_some() {
            debug!(path = %self.path.display(), "FileRegistry dropped without close");
        }
    }
}

#[async_trait]
impl SubscriberRegistry for FileRegistry {
    async fn append(&self, email: &str) -> Result<Appended> {
        FileRegistry::append(self, email).await
    }

    fn list(&self) -> Vec<String> {
        FileRegistry::list(self)
    }

    fn len(&self) -> usize {
        FileRegistry::len(self)
    }

    async fn close(&self) -> Result<()> {
        FileRegistry::close(self).await
    }
}

/// Contents of the log at open time.
struct Replay {
    /// Non-empty lines, terminators stripped
    emails: Vec<String>,
    /// The file is non-empty and its last byte is not `\n`
    unterminated: bool,
}

/// Reads every non-empty line of the log.
async fn replay(log: &mut File) -> io::Result<Replay> {
    let mut reader = BufReader::new(log);
    let mut emails = Vec::new();
    let mut unterminated = false;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        unterminated = !line.ends_with('\n');

        let email = line.strip_suffix('\n').unwrap_or(&line);
        let email = email.strip_suffix('\r').unwrap_or(email);
        if !email.is_empty() {
            emails.push(email.to_string());
        }
    }

    Ok(Replay {
        emails,
        unterminated,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Sole owner of the membership set and the log handle.
struct Worker {
    path: PathBuf,
    members: MemberSet,
    log: File,
    sync_writes: bool,
    /// The log may end mid-line; terminate it before the next entry.
    needs_newline: bool,
}

impl Worker {
    async fn run(mut self, mut requests: mpsc::Receiver<AppendRequest>) {
        debug!(path = %self.path.display(), "Registry worker started");

        while let Some(request) = requests.recv().await {
            let outcome = self.process(request.email).await;
            // The caller may have given up; the write stands regardless.
            let _ = request.reply.send(outcome);
        }

        debug!(path = %self.path.display(), "Registry worker stopped");
    }

    async fn process(&mut self, email: String) -> Result<Appended> {
        let existed = !self.members.insert(&email);

        if let Err(source) = self.write_line(&email).await {
            warn!(
                email = %email,
                existed,
                error = %source,
                "Subscriber accepted in memory but not persisted"
            );
            return Err(RatecastError::RegistryPersistence {
                email,
                existed,
                source,
            });
        }

        debug!(email = %email, existed, "Subscriber line written");
        Ok(if existed {
            Appended::Existing
        } else {
            Appended::New
        })
    }

    async fn write_line(&mut self, email: &str) -> io::Result<()> {
        let mut line = String::with_capacity(email.len() + 2);
        if self.needs_newline {
            line.push('\n');
        }
        line.push_str(email);
        line.push('\n');

        // A failed write may leave a partial line behind.
        if let Err(e) = self.write_and_flush(line.as_bytes()).await {
            self.needs_newline = true;
            return Err(e);
        }
        self.needs_newline = false;

        if self.sync_writes {
            self.log.sync_data().await?;
        }
        Ok(())
    }

    async fn write_and_flush(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.log.write_all(bytes).await?;
        self.log.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_new_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");

        let registry = FileRegistry::open(&path).await.unwrap();
        assert!(registry.is_empty());
        assert!(path.exists());
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_first_append_is_new_then_existing() {
        let dir = tempdir().unwrap();
        let registry = FileRegistry::open(dir.path().join("subscribers.txt"))
            .await
            .unwrap();

        assert_eq!(registry.append("foo@mail.com").await.unwrap(), Appended::New);
        assert_eq!(
            registry.append("foo@mail.com").await.unwrap(),
            Appended::Existing
        );
        assert_eq!(
            registry.append("foo@mail.com").await.unwrap(),
            Appended::Existing
        );
        assert_eq!(registry.list(), vec!["foo@mail.com"]);
    }

    #[tokio::test]
    async fn test_every_append_writes_a_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");

        let registry = FileRegistry::open(&path).await.unwrap();
        registry.append("foo@mail.com").await.unwrap();
        registry.append("bar@mail.com").await.unwrap();
        registry.append("foo@mail.com").await.unwrap();
        registry.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "foo@mail.com\nbar@mail.com\nfoo@mail.com\n");
    }

    #[tokio::test]
    async fn test_list_preserves_acceptance_order() {
        let dir = tempdir().unwrap();
        let registry = FileRegistry::open(dir.path().join("subscribers.txt"))
            .await
            .unwrap();

        for email in ["c@x.io", "a@x.io", "b@x.io", "a@x.io"] {
            registry.append(email).await.unwrap();
        }

        assert_eq!(registry.list(), vec!["c@x.io", "a@x.io", "b@x.io"]);
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_restart_restores_membership_and_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");

        {
            let registry = FileRegistry::open(&path).await.unwrap();
            registry.append("e1@mail.com").await.unwrap();
            registry.append("e2@mail.com").await.unwrap();
            registry.close().await.unwrap();
        }

        let registry = FileRegistry::open(&path).await.unwrap();
        assert_eq!(registry.list(), vec!["e1@mail.com", "e2@mail.com"]);
        assert_eq!(
            registry.append("e1@mail.com").await.unwrap(),
            Appended::Existing
        );
    }

    #[tokio::test]
    async fn test_replay_skips_blank_lines_and_repeats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        tokio::fs::write(&path, "a@x.io\n\nb@x.io\r\na@x.io\n\n")
            .await
            .unwrap();

        let registry = FileRegistry::open(&path).await.unwrap();
        assert_eq!(registry.list(), vec!["a@x.io", "b@x.io"]);
        assert_eq!(registry.append("b@x.io").await.unwrap(), Appended::Existing);
        assert_eq!(registry.append("c@x.io").await.unwrap(), Appended::New);
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_closed_before_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        tokio::fs::write(&path, "a@x.io").await.unwrap();

        let registry = FileRegistry::open(&path).await.unwrap();
        assert_eq!(registry.list(), vec!["a@x.io"]);
        assert_eq!(registry.append("b@x.io").await.unwrap(), Appended::New);
        assert_eq!(registry.append("c@x.io").await.unwrap(), Appended::New);
        registry.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "a@x.io\nb@x.io\nc@x.io\n");

        let registry = FileRegistry::open(&path).await.unwrap();
        assert_eq!(registry.list(), vec!["a@x.io", "b@x.io", "c@x.io"]);
    }

    #[tokio::test]
    async fn test_terminated_file_gets_no_extra_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        tokio::fs::write(&path, "a@x.io\n").await.unwrap();

        let registry = FileRegistry::open(&path).await.unwrap();
        registry.append("b@x.io").await.unwrap();
        registry.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "a@x.io\nb@x.io\n");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_member_and_terminates_next_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        tokio::fs::write(&path, "").await.unwrap();

        let members = MemberSet::new();
        let order = members.shared_order();
        let mut worker = Worker {
            path: path.clone(),
            members,
            // Read-only handle: every write fails.
            log: File::open(&path).await.unwrap(),
            sync_writes: false,
            needs_newline: false,
        };

        let err = worker.process("foo@mail.com".into()).await.unwrap_err();
        assert!(matches!(
            err,
            RatecastError::RegistryPersistence { existed: false, .. }
        ));

        let err = worker.process("foo@mail.com".into()).await.unwrap_err();
        assert!(matches!(
            err,
            RatecastError::RegistryPersistence { existed: true, .. }
        ));

        assert!(worker.members.contains("foo@mail.com"));
        assert_eq!(*order.read(), vec!["foo@mail.com".to_string()]);
        assert!(worker.needs_newline);

        // Once the file is writable again the next line starts fresh.
        worker.log = OpenOptions::new().append(true).open(&path).await.unwrap();
        assert_eq!(
            worker.process("bar@mail.com".into()).await.unwrap(),
            Appended::New
        );
        assert!(!worker.needs_newline);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "\nbar@mail.com\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_accept_once() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(
            FileRegistry::open(dir.path().join("subscribers.txt"))
                .await
                .unwrap(),
        );

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.append("race@mail.com").await })
            })
            .collect();

        let outcomes = futures::future::join_all(tasks).await;
        let new_count = outcomes
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(|outcome| *outcome == Appended::New)
            .count();

        assert_eq!(new_count, 1);
        assert_eq!(registry.list(), vec!["race@mail.com"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_during_appends_is_consistent() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(
            FileRegistry::open(dir.path().join("subscribers.txt"))
                .await
                .unwrap(),
        );

        let writer = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for i in 0..100 {
                    registry.append(&format!("user{}@mail.com", i)).await.unwrap();
                }
            })
        };

        let mut last_len = 0;
        while !writer.is_finished() {
            let snapshot = registry.list();
            assert!(snapshot.len() >= last_len);
            for (i, email) in snapshot.iter().enumerate() {
                assert_eq!(email, &format!("user{}@mail.com", i));
            }
            last_len = snapshot.len();
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(registry.len(), 100);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let dir = tempdir().unwrap();
        let registry = FileRegistry::open(dir.path().join("subscribers.txt"))
            .await
            .unwrap();
        registry.append("foo@mail.com").await.unwrap();

        tokio_test::assert_ok!(registry.close().await);
        tokio_test::assert_ok!(registry.close().await);
        assert!(registry.is_closed());

        let err = registry.append("bar@mail.com").await.unwrap_err();
        assert!(matches!(err, RatecastError::RegistryClosed));
        assert_eq!(registry.list(), vec!["foo@mail.com"]);
    }

    #[tokio::test]
    async fn test_sync_writes_option() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");

        let registry = FileRegistry::open_with(&path, RegistryOptions { sync_writes: true })
            .await
            .unwrap();
        registry.append("foo@mail.com").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "foo@mail.com\n");
    }

    #[tokio::test]
    async fn test_directory_path_is_init_error() {
        let dir = tempdir().unwrap();

        let result = FileRegistry::open(dir.path()).await;
        assert!(matches!(result, Err(RatecastError::RegistryInit { .. })));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_init_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        tokio::fs::write(&path, [0x66, 0x6f, 0xff, 0x0a]).await.unwrap();

        let result = FileRegistry::open(&path).await;
        assert!(matches!(result, Err(RatecastError::RegistryInit { .. })));
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let dir = tempdir().unwrap();
        let registry: Arc<dyn SubscriberRegistry> = Arc::new(
            FileRegistry::open(dir.path().join("subscribers.txt"))
                .await
                .unwrap(),
        );

        assert_eq!(registry.append("foo@mail.com").await.unwrap(), Appended::New);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        registry.close().await.unwrap();
    }
}
