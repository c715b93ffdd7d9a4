//! The asynchronous cache contract.
//!
//! A [`Cache`] owns its backend through a dedicated worker task fed by an
//! unbounded command channel. The channel is the single sequential execution
//! context the ordering guarantee rests on: every operation enqueues its
//! command *when called* (not when first polled), so operations submitted
//! against one cache instance execute in submission order, and a fetch
//! submitted after a store for the same key observes the stored value.
//!
//! The returned futures only carry results back. Where a caller awaits one
//! is its own business (the reply context); dropping one discards the result
//! but never cancels the already-submitted operation.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::codec::{self, Codec};
use crate::key::CacheKey;

enum Command {
    Write {
        key: CacheKey,
        bytes: Vec<u8>,
        done: oneshot::Sender<()>,
    },
    Read {
        key: CacheKey,
        reply: oneshot::Sender<Option<Vec<u8>>>,
    },
    Remove {
        key: CacheKey,
        done: oneshot::Sender<()>,
    },
    Clear {
        done: oneshot::Sender<()>,
    },
}

/// An asynchronous key-addressed cache for items encodable via [`Codec`].
///
/// Clones share the worker and therefore the ordering domain; independent
/// instances are fully independent. All failure inside the cache degrades to
/// "absent" or a no-op and is reported only through `tracing`.
pub struct Cache<T: Codec> {
    tx: mpsc::UnboundedSender<Command>,
    _stored: PhantomData<fn() -> T>,
}

impl<T: Codec> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _stored: PhantomData,
        }
    }
}

impl<T: Codec> Cache<T> {
    /// Create a cache owning the given backend.
    ///
    /// Spawns the worker task, so this must be called within a Tokio
    /// runtime. The worker exits when the last handle is dropped.
    pub fn new(backend: impl Backend) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(backend, rx));

        Self {
            tx,
            _stored: PhantomData,
        }
    }

    /// Enqueue a write of `item` under `key`, replacing any previous entry.
    ///
    /// If the item cannot be encoded, nothing is stored and the returned
    /// [`Completion`] resolves immediately. Backend failures are logged by
    /// the worker and never surfaced. Awaiting the completion is optional.
    pub fn store(&self, item: &T, key: &CacheKey) -> Completion {
        let (done, rx) = oneshot::channel();

        match item.encode() {
            Some(bytes) => self.submit(Command::Write {
                key: key.clone(),
                bytes,
                done,
            }),
            None => {
                warn!(key = key.name(), "item could not be encoded; nothing stored");
                let _ = done.send(());
            }
        }

        Completion { rx }
    }

    /// Enqueue a write of an ordered sequence of items as one entry.
    pub fn store_all(&self, items: &[T], key: &CacheKey) -> Completion {
        let (done, rx) = oneshot::channel();

        match codec::encode_many(items) {
            Some(bytes) => self.submit(Command::Write {
                key: key.clone(),
                bytes,
                done,
            }),
            None => {
                warn!(key = key.name(), "items could not be encoded; nothing stored");
                let _ = done.send(());
            }
        }

        Completion { rx }
    }

    /// Enqueue a read for `key`.
    ///
    /// Resolves to `None` for a missing entry, a backend failure, or bytes
    /// that no longer decode — the caller cannot tell these apart by design.
    pub fn fetch(&self, key: &CacheKey) -> Lookup<T> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Read {
            key: key.clone(),
            reply,
        });

        Lookup {
            rx,
            _item: PhantomData,
        }
    }

    /// Enqueue a read of an item sequence stored with
    /// [`store_all`](Cache::store_all).
    pub fn fetch_all(&self, key: &CacheKey) -> LookupAll<T> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Read {
            key: key.clone(),
            reply,
        });

        LookupAll {
            rx,
            _item: PhantomData,
        }
    }

    /// Enqueue a delete for `key`. An absent key is not an error.
    pub fn remove(&self, key: &CacheKey) -> Completion {
        let (done, rx) = oneshot::channel();
        self.submit(Command::Remove {
            key: key.clone(),
            done,
        });

        Completion { rx }
    }

    /// Enqueue a delete of every entry.
    ///
    /// Participates in submission order like any other operation: entries
    /// stored before the call are gone once the completion resolves, stores
    /// submitted after it land in the emptied cache.
    pub fn clear_all(&self) -> Completion {
        let (done, rx) = oneshot::channel();
        self.submit(Command::Clear { done });

        Completion { rx }
    }

    fn submit(&self, command: Command) {
        // A closed channel means the runtime is tearing down; the command's
        // reply sender is dropped with it and the caller sees a no-op.
        if self.tx.send(command).is_err() {
            debug!("cache worker is gone; operation dropped");
        }
    }
}

async fn run_worker(mut backend: impl Backend, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Write { key, bytes, done } => {
                if let Err(e) = backend.write(&key, bytes).await {
                    warn!(key = key.name(), error = %e, "store failed");
                }
                let _ = done.send(());
            }
            Command::Read { key, reply } => {
                let bytes = match backend.read(&key).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(key = key.name(), error = %e, "fetch failed");
                        None
                    }
                };
                let _ = reply.send(bytes);
            }
            Command::Remove { key, done } => {
                if let Err(e) = backend.remove(&key).await {
                    warn!(key = key.name(), error = %e, "remove failed");
                }
                let _ = done.send(());
            }
            Command::Clear { done } => {
                if let Err(e) = backend.clear().await {
                    warn!(error = %e, "clear failed");
                }
                let _ = done.send(());
            }
        }
    }
}

/// Resolves once a store, remove, or clear has been applied (or failed and
/// been logged). The operation runs whether or not this is awaited.
pub struct Completion {
    rx: oneshot::Receiver<()>,
}

impl Completion {
    /// Explicitly discard the result. The operation still runs; this only
    /// says the caller does not care when it finishes.
    pub fn detach(self) {}
}

impl Future for Completion {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // A dropped sender (worker gone) counts as done: the operation
        // degraded to a no-op.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

/// Resolves to the item stored for a key, or `None`.
pub struct Lookup<T> {
    rx: oneshot::Receiver<Option<Vec<u8>>>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Codec> Future for Lookup<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(Some(bytes))) => Poll::Ready(T::decode(&bytes)),
            Poll::Ready(_) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Resolves to the item sequence stored for a key, or `None`.
pub struct LookupAll<T> {
    rx: oneshot::Receiver<Option<Vec<u8>>>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Codec> Future for LookupAll<T> {
    type Output = Option<Vec<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Vec<T>>> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(Some(bytes))) => Poll::Ready(codec::decode_many(&bytes)),
            Poll::Ready(_) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
