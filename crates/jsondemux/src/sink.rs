//! Per-field rendezvous objects between the lexer and downstream consumers.
//!
//! Two variants exist. A [`SingleSink`] resolves exactly once, releasing
//! every task awaiting it. A [`StreamSink`] appends fragments to a grow-only
//! log that fans out to any number of [`StreamIter`] cursors, including
//! cursors created after the stream already closed, which replay the full
//! sequence.
//!
//! All mutation happens synchronously inside the demultiplexer's `feed_*`
//! calls; waiters are released through a [`Notify`], which schedules their
//! wake-ups instead of running them inline, so terminating a sink never
//! re-enters the lexer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::error::DemuxError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ------------------------------------------------------------------------
// Single
// ------------------------------------------------------------------------

#[derive(Debug)]
enum SingleState<T> {
    Pending,
    Resolved(T),
    Failed(DemuxError),
}

#[derive(Debug)]
struct SingleShared<T> {
    state: Mutex<SingleState<T>>,
    notify: Notify,
}

/// A sink that resolves to one value exactly once.
///
/// Any number of tasks may await the same sink; they all observe the same
/// value or error, and awaiting after the sink is terminal returns
/// immediately. Cloning the sink clones the handle, not the state.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use jsondemux::{SingleSink, Value};
///
/// let sink: SingleSink<Value> = SingleSink::new();
/// sink.resolve(Value::Integer(7)).unwrap();
/// assert_eq!(sink.value().await.unwrap(), Value::Integer(7));
/// # }
/// ```
#[derive(Debug)]
pub struct SingleSink<T> {
    shared: Arc<SingleShared<T>>,
}

impl<T> Clone for SingleSink<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for SingleSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleSink<T> {
    /// Creates a pending sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SingleShared {
                state: Mutex::new(SingleState::Pending),
                notify: Notify::new(),
            }),
        }
    }

    /// Resolves the sink, releasing all awaiters with `value`.
    ///
    /// # Errors
    ///
    /// [`DemuxError::AlreadyTerminal`] if the sink was resolved or failed
    /// before.
    pub fn resolve(&self, value: T) -> Result<(), DemuxError> {
        {
            let mut state = lock(&self.shared.state);
            if !matches!(*state, SingleState::Pending) {
                return Err(DemuxError::AlreadyTerminal);
            }
            *state = SingleState::Resolved(value);
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Fails the sink, releasing all awaiters with `error`.
    ///
    /// # Errors
    ///
    /// [`DemuxError::AlreadyTerminal`] if the sink was resolved or failed
    /// before.
    pub fn fail(&self, error: DemuxError) -> Result<(), DemuxError> {
        {
            let mut state = lock(&self.shared.state);
            if !matches!(*state, SingleState::Pending) {
                return Err(DemuxError::AlreadyTerminal);
            }
            *state = SingleState::Failed(error);
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Returns `true` once the sink has resolved or failed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(*lock(&self.shared.state), SingleState::Pending)
    }
}

impl<T: Clone> SingleSink<T> {
    /// Non-blocking snapshot: `None` while pending, the outcome otherwise.
    #[must_use]
    pub fn try_value(&self) -> Option<Result<T, DemuxError>> {
        match &*lock(&self.shared.state) {
            SingleState::Pending => None,
            SingleState::Resolved(v) => Some(Ok(v.clone())),
            SingleState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Waits until the sink is terminal and returns its outcome.
    ///
    /// # Errors
    ///
    /// The error the sink was failed with.
    pub async fn value(&self) -> Result<T, DemuxError> {
        loop {
            // Register interest before checking so a terminal transition
            // between the check and the await is not missed.
            let notified = self.shared.notify.notified();
            if let Some(outcome) = self.try_value() {
                return outcome;
            }
            notified.await;
        }
    }
}

// ------------------------------------------------------------------------
// Stream
// ------------------------------------------------------------------------

#[derive(Debug)]
struct StreamState<T> {
    log: Vec<T>,
    /// `None` while open, `Some(Ok(()))` after `close`, `Some(Err(_))` after
    /// `fail`.
    terminal: Option<Result<(), DemuxError>>,
}

#[derive(Debug)]
struct StreamShared<T> {
    state: Mutex<StreamState<T>>,
    notify: Notify,
}

/// A sink that emits an ordered, replayable sequence of fragments.
///
/// Fragments accumulate in a grow-only log; every [`StreamIter`] walks the
/// log from its own cursor, so iterators attached after the stream closed
/// still observe the complete sequence. Memory is proportional to the total
/// fragment count.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use jsondemux::StreamSink;
///
/// let sink: StreamSink<String> = StreamSink::new();
/// sink.push("he".to_owned()).unwrap();
/// sink.push("llo".to_owned()).unwrap();
/// sink.close().unwrap();
///
/// let mut out = String::new();
/// let mut iter = sink.iter();
/// while let Some(fragment) = iter.next().await {
///     out.push_str(&fragment.unwrap());
/// }
/// assert_eq!(out, "hello");
/// # }
/// ```
#[derive(Debug)]
pub struct StreamSink<T> {
    shared: Arc<StreamShared<T>>,
}

impl<T> Clone for StreamSink<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for StreamSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StreamSink<T> {
    /// Creates an open, empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(StreamShared {
                state: Mutex::new(StreamState {
                    log: Vec::new(),
                    terminal: None,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Appends a fragment and wakes blocked iterators.
    ///
    /// # Errors
    ///
    /// [`DemuxError::AlreadyTerminal`] if the stream is closed or failed.
    pub fn push(&self, fragment: T) -> Result<(), DemuxError> {
        {
            let mut state = lock(&self.shared.state);
            if state.terminal.is_some() {
                return Err(DemuxError::AlreadyTerminal);
            }
            state.log.push(fragment);
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Marks the stream complete; iterators terminate after draining.
    ///
    /// # Errors
    ///
    /// [`DemuxError::AlreadyTerminal`] if the stream is closed or failed.
    pub fn close(&self) -> Result<(), DemuxError> {
        self.terminate(Ok(()))
    }

    /// Marks the stream failed; iterators observe `error` after draining the
    /// fragments pushed before the failure.
    ///
    /// # Errors
    ///
    /// [`DemuxError::AlreadyTerminal`] if the stream is closed or failed.
    pub fn fail(&self, error: DemuxError) -> Result<(), DemuxError> {
        self.terminate(Err(error))
    }

    fn terminate(&self, terminal: Result<(), DemuxError>) -> Result<(), DemuxError> {
        {
            let mut state = lock(&self.shared.state);
            if state.terminal.is_some() {
                return Err(DemuxError::AlreadyTerminal);
            }
            state.terminal = Some(terminal);
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    /// Returns `true` once the stream has closed or failed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        lock(&self.shared.state).terminal.is_some()
    }

    /// A cursor over the fragment log, starting from the first fragment.
    #[must_use]
    pub fn iter(&self) -> StreamIter<T> {
        StreamIter {
            shared: Arc::clone(&self.shared),
            cursor: 0,
            done: false,
        }
    }
}

impl<T: Clone> StreamSink<T> {
    /// Non-blocking snapshot of all fragments pushed so far.
    #[must_use]
    pub fn fragments(&self) -> Vec<T> {
        lock(&self.shared.state).log.clone()
    }
}

/// An asynchronous cursor over a [`StreamSink`]'s fragment log.
///
/// At the live tail the cursor suspends until the stream grows or
/// terminates. After a failure the error is yielded once, then the cursor is
/// exhausted.
#[derive(Debug)]
pub struct StreamIter<T> {
    shared: Arc<StreamShared<T>>,
    cursor: usize,
    done: bool,
}

impl<T: Clone> StreamIter<T> {
    /// Waits for the next fragment.
    ///
    /// Returns `None` once the stream closed and all fragments were
    /// delivered, and `Some(Err(_))` exactly once if the stream failed.
    pub async fn next(&mut self) -> Option<Result<T, DemuxError>> {
        if self.done {
            return None;
        }
        loop {
            let notified = self.shared.notify.notified();
            {
                let state = lock(&self.shared.state);
                if self.cursor < state.log.len() {
                    let fragment = state.log[self.cursor].clone();
                    self.cursor += 1;
                    return Some(Ok(fragment));
                }
                match &state.terminal {
                    Some(Ok(())) => {
                        self.done = true;
                        return None;
                    }
                    Some(Err(error)) => {
                        self.done = true;
                        return Some(Err(error.clone()));
                    }
                    None => {}
                }
            }
            notified.await;
        }
    }
}
