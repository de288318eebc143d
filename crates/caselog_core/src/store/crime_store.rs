//! Store implementation: serial worker plus snapshot publishing.
//!
//! # Responsibility
//! - Serialize every storage operation through one background worker.
//! - Publish fresh query snapshots to observers after each committed write.
//! - Answer blocking snapshot reads through the same ordered queue.
//!
//! # Invariants
//! - Writes execute in exactly submission order, one at a time.
//! - A snapshot read enqueued after a write observes that write.
//! - Write failures are logged and never retried.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::crime::{Crime, CrimeId};
use crate::repo::crime_repo::{CrimeRepository, RepoError, RepoResult, SqliteCrimeRepository};
use crate::store::subscription::{Subscription, TopicKey};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{error, info};
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Database bootstrap failed while opening the store.
    Db(DbError),
    /// The data-access layer rejected an operation.
    Repo(RepoError),
    /// The worker is no longer running; the store has shut down.
    Disconnected,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Disconnected => write!(f, "crime store worker is no longer running"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Disconnected => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub(crate) enum Command {
    Insert(Crime),
    Update(Crime),
    Delete(CrimeId),
    ListCrimes {
        reply: Sender<RepoResult<Vec<Crime>>>,
    },
    GetCrime {
        id: CrimeId,
        reply: Sender<RepoResult<Option<Crime>>>,
    },
    WatchAll {
        snapshots: Sender<Vec<Crime>>,
        reply: Sender<RepoResult<u64>>,
    },
    WatchCrime {
        id: CrimeId,
        snapshots: Sender<Option<Crime>>,
        reply: Sender<RepoResult<u64>>,
    },
    Unsubscribe {
        key: TopicKey,
        subscriber: u64,
    },
    Shutdown,
}

/// Owner of persistence access and write serialization.
///
/// Constructed explicitly and shared by reference (or `Arc`) with the screen
/// models; there is no ambient global instance in this crate. Dropping the
/// store lets every pending write finish, then stops the worker.
pub struct CrimeStore {
    commands: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl CrimeStore {
    /// Opens a store over a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::start(open_db(path)?)
    }

    /// Opens a store over a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::start(open_db_in_memory()?)
    }

    fn start(conn: Connection) -> StoreResult<Self> {
        // Fail construction on an unusable schema instead of surfacing it
        // later from the worker.
        SqliteCrimeRepository::try_new(&conn)?;

        let (commands, inbox) = unbounded();
        let worker = thread::spawn(move || run_worker(conn, inbox));

        Ok(Self {
            commands,
            worker: Some(worker),
        })
    }

    /// Enqueues an insert. Fire and forget: storage failures are logged on
    /// the worker, not returned here.
    pub fn add_crime(&self, crime: Crime) -> StoreResult<()> {
        self.send(Command::Insert(crime))
    }

    /// Enqueues an update by the record's identity.
    pub fn update_crime(&self, crime: Crime) -> StoreResult<()> {
        self.send(Command::Update(crime))
    }

    /// Enqueues a hard delete by identity.
    pub fn delete_crime(&self, id: CrimeId) -> StoreResult<()> {
        self.send(Command::Delete(id))
    }

    /// Reads the current all-crimes snapshot through the ordered queue.
    pub fn list_crimes(&self) -> StoreResult<Vec<Crime>> {
        let (reply, response) = bounded(1);
        self.send(Command::ListCrimes { reply })?;
        wait_reply(response)
    }

    /// Reads one record by identity; a missing record is `Ok(None)`.
    pub fn get_crime(&self, id: CrimeId) -> StoreResult<Option<Crime>> {
        let (reply, response) = bounded(1);
        self.send(Command::GetCrime { id, reply })?;
        wait_reply(response)
    }

    /// Subscribes to the all-crimes stream.
    ///
    /// The current snapshot is delivered first; a fresh one follows every
    /// committed write.
    pub fn crimes(&self) -> StoreResult<Subscription<Vec<Crime>>> {
        let (snapshots, updates) = unbounded();
        let (reply, response) = bounded(1);
        self.send(Command::WatchAll { snapshots, reply })?;
        let subscriber = wait_reply(response)?;
        Ok(Subscription::new(
            TopicKey::AllCrimes,
            subscriber,
            updates,
            self.commands.clone(),
        ))
    }

    /// Subscribes to a single record's stream; an absent record publishes
    /// `None`.
    pub fn crime(&self, id: CrimeId) -> StoreResult<Subscription<Option<Crime>>> {
        let (snapshots, updates) = unbounded();
        let subscriber = self.watch_crime_with(id, snapshots)?;
        Ok(Subscription::new(
            TopicKey::Crime(id),
            subscriber,
            updates,
            self.commands.clone(),
        ))
    }

    /// Registers a caller-owned sender on a per-record stream.
    ///
    /// Used by the detail screen model to re-point one downstream channel at
    /// a new identity without its observer resubscribing.
    pub(crate) fn watch_crime_with(
        &self,
        id: CrimeId,
        snapshots: Sender<Option<Crime>>,
    ) -> StoreResult<u64> {
        let (reply, response) = bounded(1);
        self.send(Command::WatchCrime {
            id,
            snapshots,
            reply,
        })?;
        wait_reply(response)
    }

    pub(crate) fn unwatch_crime(&self, id: CrimeId, subscriber: u64) {
        let _ = self.commands.send(Command::Unsubscribe {
            key: TopicKey::Crime(id),
            subscriber,
        });
    }

    fn send(&self, command: Command) -> StoreResult<()> {
        self.commands
            .send(command)
            .map_err(|_| StoreError::Disconnected)
    }
}

fn wait_reply<T>(response: Receiver<RepoResult<T>>) -> StoreResult<T> {
    response
        .recv()
        .map_err(|_| StoreError::Disconnected)?
        .map_err(StoreError::Repo)
}

impl Drop for CrimeStore {
    fn drop(&mut self) {
        // Shutdown queues behind pending writes; none are cancelled.
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Registered observers of one query, keyed by subscriber id.
struct Watchers<T> {
    entries: Vec<(u64, Sender<T>)>,
}

impl<T: Clone> Watchers<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add(&mut self, subscriber: u64, sender: Sender<T>) {
        self.entries.push((subscriber, sender));
    }

    fn remove(&mut self, subscriber: u64) {
        self.entries.retain(|(id, _)| *id != subscriber);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sends a snapshot to every observer, discarding hung-up ones.
    fn publish(&mut self, snapshot: &T) {
        self.entries
            .retain(|(_, sender)| sender.send(snapshot.clone()).is_ok());
    }
}

fn run_worker(conn: Connection, inbox: Receiver<Command>) {
    info!("event=store_worker module=store status=start");

    let repo = match SqliteCrimeRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            error!("event=store_worker module=store status=error error={err}");
            return;
        }
    };

    let mut next_subscriber: u64 = 0;
    let mut all_watchers: Watchers<Vec<Crime>> = Watchers::new();
    let mut crime_watchers: HashMap<CrimeId, Watchers<Option<Crime>>> = HashMap::new();

    while let Ok(command) = inbox.recv() {
        match command {
            Command::Insert(crime) => {
                let id = crime.id;
                let outcome = write("crime_insert", id, || {
                    repo.insert_crime(&crime).map(|_| ())
                });
                if outcome {
                    publish_after_write(&repo, &mut all_watchers, &mut crime_watchers, id);
                }
            }
            Command::Update(crime) => {
                let id = crime.id;
                let outcome = write("crime_update", id, || repo.update_crime(&crime));
                if outcome {
                    publish_after_write(&repo, &mut all_watchers, &mut crime_watchers, id);
                }
            }
            Command::Delete(id) => {
                let outcome = write("crime_delete", id, || repo.delete_crime(id));
                if outcome {
                    publish_after_write(&repo, &mut all_watchers, &mut crime_watchers, id);
                }
            }
            Command::ListCrimes { reply } => {
                let _ = reply.send(repo.list_crimes());
            }
            Command::GetCrime { id, reply } => {
                let _ = reply.send(repo.get_crime(id));
            }
            Command::WatchAll { snapshots, reply } => match repo.list_crimes() {
                Ok(snapshot) => {
                    let subscriber = next_subscriber;
                    next_subscriber += 1;
                    let _ = snapshots.send(snapshot);
                    all_watchers.add(subscriber, snapshots);
                    let _ = reply.send(Ok(subscriber));
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            Command::WatchCrime {
                id,
                snapshots,
                reply,
            } => match repo.get_crime(id) {
                Ok(snapshot) => {
                    let subscriber = next_subscriber;
                    next_subscriber += 1;
                    let _ = snapshots.send(snapshot);
                    crime_watchers
                        .entry(id)
                        .or_insert_with(Watchers::new)
                        .add(subscriber, snapshots);
                    let _ = reply.send(Ok(subscriber));
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            Command::Unsubscribe { key, subscriber } => match key {
                TopicKey::AllCrimes => all_watchers.remove(subscriber),
                TopicKey::Crime(id) => {
                    if let Some(watchers) = crime_watchers.get_mut(&id) {
                        watchers.remove(subscriber);
                        if watchers.is_empty() {
                            crime_watchers.remove(&id);
                        }
                    }
                }
            },
            Command::Shutdown => break,
        }
    }

    info!("event=store_worker module=store status=stop");
}

/// Runs one write, logs its outcome, and reports whether it committed.
fn write(event: &str, id: CrimeId, operation: impl FnOnce() -> RepoResult<()>) -> bool {
    let started_at = Instant::now();
    match operation() {
        Ok(()) => {
            info!(
                "event={event} module=store status=ok id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            true
        }
        Err(err) => {
            error!(
                "event={event} module=store status=error id={id} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            false
        }
    }
}

/// Republishes the snapshots a committed write may have changed.
fn publish_after_write(
    repo: &SqliteCrimeRepository<'_>,
    all_watchers: &mut Watchers<Vec<Crime>>,
    crime_watchers: &mut HashMap<CrimeId, Watchers<Option<Crime>>>,
    affected: CrimeId,
) {
    if !all_watchers.is_empty() {
        match repo.list_crimes() {
            Ok(snapshot) => all_watchers.publish(&snapshot),
            Err(err) => {
                error!("event=crime_snapshot module=store status=error query=all error={err}")
            }
        }
    }

    let mut prune = false;
    if let Some(watchers) = crime_watchers.get_mut(&affected) {
        match repo.get_crime(affected) {
            Ok(snapshot) => watchers.publish(&snapshot),
            Err(err) => error!(
                "event=crime_snapshot module=store status=error query=by_id id={affected} error={err}"
            ),
        }
        prune = watchers.is_empty();
    }
    if prune {
        crime_watchers.remove(&affected);
    }
}
