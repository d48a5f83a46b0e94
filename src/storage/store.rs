//! Content store
//!
//! Holds users, roles, tickets, replies, terms and pages in one snapshot
//! behind a `RwLock`. When the store was opened from a file, several
//! processes may share that file: every mutation takes a `<file>.lock`
//! lock file, re-reads the YAML, applies the change and writes the whole
//! snapshot back. Reads reload the snapshot whenever the file on disk has
//! changed since it was last seen.

use crate::auth::RoleRegistry;
use crate::core::{Page, PageId, Reply, ReplyId, TermId, Ticket, TicketId, Term, User, UserId};
use crate::error::{Result, TickeficError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// How long a writer waits for another process to release the lock file
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);
/// A lock file older than this was left behind by a crashed process
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// Last identifier handed out per record kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub ticket: u64,
    pub reply: u64,
    pub user: u64,
    pub term: u64,
    pub page: u64,
}

impl Counters {
    fn bump(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    pub fn next_ticket(&mut self) -> TicketId {
        TicketId(Self::bump(&mut self.ticket))
    }

    pub fn next_reply(&mut self) -> ReplyId {
        ReplyId(Self::bump(&mut self.reply))
    }

    pub fn next_user(&mut self) -> UserId {
        UserId(Self::bump(&mut self.user))
    }

    pub fn next_term(&mut self) -> TermId {
        TermId(Self::bump(&mut self.term))
    }

    pub fn next_page(&mut self) -> PageId {
        PageId(Self::bump(&mut self.page))
    }
}

/// Everything the store persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub counters: Counters,
    #[serde(default = "RoleRegistry::with_builtin_roles")]
    pub roles: RoleRegistry,
    #[serde(default)]
    pub users: BTreeMap<UserId, User>,
    #[serde(default)]
    pub tickets: BTreeMap<TicketId, Ticket>,
    #[serde(default)]
    pub replies: BTreeMap<ReplyId, Reply>,
    #[serde(default)]
    pub terms: BTreeMap<TermId, Term>,
    #[serde(default)]
    pub pages: BTreeMap<PageId, Page>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            counters: Counters::default(),
            roles: RoleRegistry::with_builtin_roles(),
            users: BTreeMap::new(),
            tickets: BTreeMap::new(),
            replies: BTreeMap::new(),
            terms: BTreeMap::new(),
            pages: BTreeMap::new(),
        }
    }
}

/// Identifies one version of the data file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Option<Self>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(Self {
                modified: meta.modified()?,
                len: meta.len(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug)]
struct Loaded {
    snapshot: Snapshot,
    stamp: Option<FileStamp>,
}

/// Lock file held for the duration of one write, removed on drop
#[derive(Debug)]
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    fn lock_path(data_file: &Path) -> PathBuf {
        let mut name = OsString::from(data_file.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn acquire(data_file: &Path) -> Result<Self> {
        let path = Self::lock_path(data_file);
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // The pid is informational only
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self { path });
                },
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Self::is_stale(&path) {
                        warn!(path = %path.display(), "removing stale lock file");
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if started.elapsed() >= LOCK_TIMEOUT {
                        return Err(TickeficError::DataFileBusy(data_file.to_path_buf()));
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                },
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn is_stale(path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > STALE_LOCK_AGE)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

/// Read the data file, or `None` when it does not exist yet
fn load(path: &Path) -> Result<Option<Loaded>> {
    // Stamp first so a concurrent replace is picked up on the next read
    let Some(stamp) = FileStamp::of(path)? else {
        return Ok(None);
    };
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = serde_yaml::from_str(&content)?;
    Ok(Some(Loaded {
        snapshot,
        stamp: Some(stamp),
    }))
}

#[derive(Debug)]
pub struct ContentStore {
    state: RwLock<Loaded>,
    path: Option<PathBuf>,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ContentStore {
    /// Store that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Loaded {
                snapshot: Snapshot::default(),
                stamp: None,
            }),
            path: None,
        }
    }

    /// Open the store backed by `path`, loading it if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let loaded = if let Some(loaded) = load(&path)? {
            info!(
                path = %path.display(),
                tickets = loaded.snapshot.tickets.len(),
                users = loaded.snapshot.users.len(),
                "loaded data file"
            );
            loaded
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            debug!(path = %path.display(), "starting with an empty data file");
            Loaded {
                snapshot: Snapshot::default(),
                stamp: None,
            }
        };
        Ok(Self {
            state: RwLock::new(loaded),
            path: Some(path),
        })
    }

    /// `open` when a data file is configured, `in_memory` otherwise
    pub fn open_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the current snapshot
    pub fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T> {
        self.refresh()?;
        let state = self.state.read()?;
        Ok(f(&state.snapshot))
    }

    /// Run `f` against a mutable snapshot and persist the result
    ///
    /// For a file-backed store `f` sees the file as it is on disk, with the
    /// lock file held until the result has been written back. If `f` fails
    /// nothing is written back and the in-memory snapshot is left as it was.
    pub fn write<T>(&self, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let mut state = self.state.write()?;
        let Some(path) = &self.path else {
            let mut next = state.snapshot.clone();
            let value = f(&mut next)?;
            state.snapshot = next;
            return Ok(value);
        };

        let _lock = FileLock::acquire(path)?;
        let mut next = match load(path)? {
            Some(current) => current.snapshot,
            None => state.snapshot.clone(),
        };
        let value = f(&mut next)?;
        let stamp = Self::persist(path, &next)?;
        *state = Loaded {
            snapshot: next,
            stamp,
        };
        Ok(value)
    }

    /// Reload the snapshot if another process changed the file
    fn refresh(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let on_disk = FileStamp::of(path)?;
        if on_disk.is_none() || on_disk == self.state.read()?.stamp {
            return Ok(());
        }
        let mut state = self.state.write()?;
        if FileStamp::of(path)? == state.stamp {
            return Ok(());
        }
        if let Some(loaded) = load(path)? {
            debug!(path = %path.display(), "data file changed on disk, reloading");
            *state = loaded;
        }
        Ok(())
    }

    fn persist(path: &Path, snapshot: &Snapshot) -> Result<Option<FileStamp>> {
        let yaml = serde_yaml::to_string(snapshot)?;
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)?;
        fs::rename(&tmp, path)?;
        FileStamp::of(path)
    }
}
