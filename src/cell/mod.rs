// vim: set ai et ts=4 sw=4 sts=4:
//! Value containers with a "value changed" signal.
//!
//! A `Cell<T>` is a shared handle; clones refer to the same value. Any number of threads
//! may write and read a cell concurrently. Recomputations of a derived cell are serialised
//! and read their sources only once they hold the cell, so after the last source write has
//! propagated the derived value matches its sources. Observers run on the writing thread
//! with no internal lock held; `Cell::changes` hands notifications over a channel instead
//! for consumers that want to react on their own thread.

mod observers;

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use crossbeam::channel::{self, Receiver};
use parking_lot::{Condvar, Mutex};

use super::error::CellError;
use self::observers::Observers;

pub use self::observers::{Observable, Observer, SubscriptionId};

/// How a derived cell learns that its sources changed.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Propagation {
    /// Recompute as soon as any source signals a change.
    Push,
    /// Recompute only when `refresh` is called.
    Pull,
}

enum Kind<T> {
    Manual,
    Deferred,
    Derived {
        propagation: Propagation,
        compute: Box<dyn Fn() -> T + Send + Sync>,
        links: Vec<Link>,
    },
    Future,
    ReadOnly(Cell<T>),
}

/// Subscription a push-derived cell holds on one of its sources.
struct Link {
    source: Box<dyn Observable>,
    id: SubscriptionId,
}

struct State<T> {
    // None only for an unbound future, or a derived cell under construction
    value: Option<T>,
    dirty: bool,
    broadcast: Option<T>,
}

struct Inner<T> {
    kind: Kind<T>,
    state: Mutex<State<T>>,
    bound: Condvar,
    // held across compute and store of a derived cell
    recompute: Mutex<()>,
    observers: Mutex<Observers>,
}

impl<T> Inner<T> {
    fn new(kind: Kind<T>, value: Option<T>, broadcast: Option<T>) -> Self {
        Inner {
            kind,
            state: Mutex::new(State { value, dirty: false, broadcast }),
            bound: Condvar::new(),
            recompute: Mutex::new(()),
            observers: Mutex::new(Observers::default()),
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Kind::Derived { links, .. } = &self.kind {
            for link in links {
                link.source.unsubscribe(link.id);
            }
        }
    }
}

pub struct Cell<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Cell { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Cell<T>
    where T: Clone + PartialEq + Send + 'static
{
    /// A plain writable cell.
    pub fn new(value: T) -> Self {
        Self::with_kind(Kind::Manual, Some(value), None)
    }

    /// A writable cell whose writes are only announced by `broadcast_change`.
    pub fn deferred(value: T) -> Self {
        let broadcast = Some(value.clone());
        Self::with_kind(Kind::Deferred, Some(value), broadcast)
    }

    /// An unbound single-assignment cell. Reads block until the first write.
    pub fn future() -> Self {
        Self::with_kind(Kind::Future, None, None)
    }

    /// A read-only cell computed by `compute`, which reads whatever cells it captures.
    ///
    /// With `Propagation::Push` the cell subscribes to every cell in `sources` and
    /// recomputes whenever one of them changes; with `Propagation::Pull` `sources` is
    /// ignored and the value is only recomputed by `refresh`. `compute` runs once right
    /// away, after the subscriptions are in place, so it must not read an unbound future.
    pub fn derived<F>(sources: Vec<Box<dyn Observable>>, propagation: Propagation, compute: F) -> Self
        where F: Fn() -> T + Send + Sync + 'static
    {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner<T>>| {
            let links = match propagation {
                Propagation::Pull => Vec::new(),
                Propagation::Push => sources.into_iter().map(|source| {
                    let weak = Weak::clone(weak);
                    let id = source.subscribe_observer(Arc::new(move || {
                        // sources only hold a weak handle, a dropped cell just stops listening
                        if let Some(inner) = weak.upgrade() {
                            Cell { inner }.recompute();
                        }
                    }));
                    Link { source, id }
                }).collect(),
            };
            let kind = Kind::Derived { propagation, compute: Box::new(compute), links };
            Inner::new(kind, None, None)
        });
        let cell = Cell { inner };
        cell.recompute();
        cell
    }

    /// Single-source derived cell.
    pub fn map<U, F>(&self, propagation: Propagation, f: F) -> Cell<U>
        where U: Clone + PartialEq + Send + 'static,
              F: Fn(T) -> U + Send + Sync + 'static
    {
        let source = self.clone();
        let sources: Vec<Box<dyn Observable>> = vec![Box::new(self.clone())];
        Cell::derived(sources, propagation, move || f(source.get()))
    }

    /// A view of this cell that forwards value and signal but rejects writes.
    pub fn readonly(&self) -> Self {
        Self::with_kind(Kind::ReadOnly(self.clone()), None, None)
    }

    fn with_kind(kind: Kind<T>, value: Option<T>, broadcast: Option<T>) -> Self {
        Cell { inner: Arc::new(Inner::new(kind, value, broadcast)) }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.inner.kind {
            Kind::Manual   => "manual",
            Kind::Deferred => "deferred",
            Kind::Derived { propagation: Propagation::Push, .. } => "derived (push)",
            Kind::Derived { propagation: Propagation::Pull, .. } => "derived (pull)",
            Kind::Future   => "future",
            Kind::ReadOnly(_) => "readonly",
        }
    }

    // ------------------------------------------------

    /// Current value. Blocks while this is an unbound future.
    pub fn get(&self) -> T {
        if let Kind::ReadOnly(target) = &self.inner.kind {
            return target.get();
        }
        let mut state = self.inner.state.lock();
        loop {
            if let Some(value) = &state.value {
                return value.clone();
            }
            self.inner.bound.wait(&mut state);
        }
    }

    /// Current value, or `None` for an unbound future.
    pub fn try_get(&self) -> Option<T> {
        match &self.inner.kind {
            Kind::ReadOnly(target) => target.try_get(),
            _                      => self.inner.state.lock().value.clone(),
        }
    }

    /// Like `get`, but gives up on an unbound future after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        if let Kind::ReadOnly(target) = &self.inner.kind {
            return target.get_timeout(timeout);
        }
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while state.value.is_none() {
            if self.inner.bound.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.value.clone()
    }

    pub fn is_bound(&self) -> bool {
        self.try_get().is_some()
    }

    pub fn set(&self, value: T) -> Result<(), CellError> {
        match &self.inner.kind {
            Kind::Manual => {
                self.store(value);
                Ok(())
            }
            Kind::Deferred => {
                let mut state = self.inner.state.lock();
                state.value = Some(value);
                state.dirty = true;
                Ok(())
            }
            Kind::Future => {
                {
                    let mut state = self.inner.state.lock();
                    if state.value.is_some() {
                        return Err(CellError::AlreadyBound);
                    }
                    state.value = Some(value);
                }
                self.inner.bound.notify_all();
                self.notify();
                Ok(())
            }
            Kind::Derived { .. } => Err(CellError::Derived),
            Kind::ReadOnly(_)    => Err(CellError::ReadOnly),
        }
    }

    /// Recomputes a derived cell. No-op for writable cells.
    pub fn refresh(&self) -> Result<(), CellError> {
        match &self.inner.kind {
            Kind::Manual | Kind::Deferred => Ok(()),
            Kind::Derived { .. } => {
                self.recompute();
                Ok(())
            }
            Kind::Future           => Err(CellError::CannotRefreshFuture),
            Kind::ReadOnly(target) => target.refresh(),
        }
    }

    /// Fires the signal of a deferred cell if its value differs from the one seen at the
    /// previous broadcast. Returns whether it fired.
    pub fn broadcast_change(&self) -> Result<bool, CellError> {
        match &self.inner.kind {
            Kind::Deferred    => {}
            Kind::ReadOnly(_) => return Err(CellError::ReadOnly),
            _                 => return Err(CellError::NotDeferred),
        }
        let changed = {
            let mut state = self.inner.state.lock();
            let state = &mut *state;
            let changed = state.dirty && state.value != state.broadcast;
            if changed {
                state.broadcast = state.value.clone();
            }
            state.dirty = false;
            changed
        };
        if changed {
            self.notify();
        }
        Ok(changed)
    }

    /// Whether a deferred cell has been written since its last broadcast.
    pub fn is_dirty(&self) -> bool {
        self.inner.state.lock().dirty
    }

    // ------------------------------------------------

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
        where F: Fn() + Send + Sync + 'static
    {
        self.subscribe_observer(Arc::new(observer))
    }

    /// Subscribes a channel that receives `()` for every change.
    pub fn changes(&self) -> (SubscriptionId, Receiver<()>) {
        let (tx, rx) = channel::unbounded();
        let id = self.subscribe(move || {
            // the receiver may be gone already; the subscription is then simply inert
            let _ = tx.send(());
        });
        (id, rx)
    }

    pub fn observer_count(&self) -> usize {
        match &self.inner.kind {
            Kind::ReadOnly(target) => target.observer_count(),
            _                      => self.inner.observers.lock().len(),
        }
    }

    // ------------------------------------------------

    fn recompute(&self) {
        if let Kind::Derived { compute, .. } = &self.inner.kind {
            let changed = {
                // sources are read only once the guard is held, so the last recompute to
                // get the guard sees the latest source values
                let _guard = self.inner.recompute.lock();
                self.replace(compute())
            };
            if changed {
                self.notify();
            }
        }
    }

    /// Stores `value` if it differs from the current one, then fires the signal.
    fn store(&self, value: T) -> bool {
        let changed = self.replace(value);
        if changed {
            self.notify();
        }
        changed
    }

    fn replace(&self, value: T) -> bool {
        let mut state = self.inner.state.lock();
        if state.value.as_ref() == Some(&value) {
            return false;
        }
        state.value = Some(value);
        true
    }

    fn notify(&self) {
        let observers = self.inner.observers.lock().snapshot();
        for observer in observers {
            observer();
        }
    }
}

impl<T> Observable for Cell<T>
    where T: Clone + PartialEq + Send + 'static
{
    fn subscribe_observer(&self, observer: Observer) -> SubscriptionId {
        match &self.inner.kind {
            Kind::ReadOnly(target) => target.subscribe_observer(observer),
            _                      => self.inner.observers.lock().add(observer),
        }
    }
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match &self.inner.kind {
            Kind::ReadOnly(target) => target.unsubscribe(id),
            _                      => self.inner.observers.lock().remove(id),
        }
    }
}

impl<T> fmt::Debug for Cell<T>
    where T: Clone + PartialEq + Send + fmt::Debug + 'static
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
         .field("kind", &self.kind_name())
         .field("value", &self.try_get())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use proptest::prelude::*;

    fn counter<T>(cell: &Cell<T>) -> Arc<AtomicUsize>
        where T: Clone + PartialEq + Send + 'static
    {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_observer = Arc::clone(&hits);
        cell.subscribe(move || { hits_in_observer.fetch_add(1, Ordering::SeqCst); });
        hits
    }
    fn hits(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }

    #[test]
    fn manual_fires_only_on_change() {
        let cell = Cell::new(1);
        let fired = counter(&cell);
        cell.set(1).unwrap();
        assert_eq!(hits(&fired), 0);
        cell.set(2).unwrap();
        assert_eq!(hits(&fired), 1);
        assert_eq!(cell.get(), 2);
        cell.refresh().unwrap();
        assert_eq!(hits(&fired), 1);
    }

    #[test]
    fn absent_equals_absent() {
        let cell: Cell<Option<u8>> = Cell::new(None);
        let fired = counter(&cell);
        cell.set(None).unwrap();
        assert_eq!(hits(&fired), 0);
        cell.set(Some(3)).unwrap();
        cell.set(None).unwrap();
        assert_eq!(hits(&fired), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let cell = Cell::new(0);
        let (id, rx) = cell.changes();
        cell.set(1).unwrap();
        assert!(cell.unsubscribe(id));
        assert!(!cell.unsubscribe(id));
        cell.set(2).unwrap();
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(cell.observer_count(), 0);
    }

    #[test]
    fn push_derived_follows_sources() {
        let a = Cell::new(2);
        let b = Cell::new(3);
        let (ra, rb) = (a.clone(), b.clone());
        let sources: Vec<Box<dyn Observable>> = vec![Box::new(a.clone()), Box::new(b.clone())];
        let sum = Cell::derived(sources, Propagation::Push, move || ra.get() + rb.get());
        let fired = counter(&sum);
        assert_eq!(sum.get(), 5);
        a.set(4).unwrap();
        assert_eq!(sum.get(), 7);
        a.set(5).unwrap();
        assert_eq!(sum.get(), 8);
        b.set(2).unwrap();
        assert_eq!(sum.get(), 7);
        assert_eq!(hits(&fired), 3);
        assert_eq!(sum.set(1), Err(CellError::Derived));
        assert!(CellError::Derived.is_invalid_operation());
    }

    #[test]
    fn push_derived_suppresses_equal_results() {
        let source = Cell::new(1);
        let odd = source.map(Propagation::Push, |v| v % 2 == 1);
        let fired = counter(&odd);
        // recomputed, still odd
        source.set(3).unwrap();
        assert!(odd.get());
        assert_eq!(hits(&fired), 0);
        source.set(4).unwrap();
        assert!(!odd.get());
        assert_eq!(hits(&fired), 1);
        odd.refresh().unwrap();
        assert_eq!(hits(&fired), 1);
    }

    #[test]
    fn concurrent_recomputes_settle_on_latest_source() {
        let source = Cell::new(0);
        let reader = source.clone();
        let mirror = source.map(Propagation::Push, move |_| {
            let v = reader.get();
            if v == 1 {
                // the computation for the older write finishes last
                thread::sleep(Duration::from_millis(200));
            }
            v
        });
        let slow_writer = {
            let source = source.clone();
            thread::spawn(move || source.set(1).unwrap())
        };
        thread::sleep(Duration::from_millis(50));
        source.set(2).unwrap();
        slow_writer.join().unwrap();
        assert_eq!(source.get(), 2);
        assert_eq!(mirror.get(), 2);
    }

    #[test]
    fn derived_sees_writes_made_during_its_first_computation() {
        let source = Cell::new(0);
        let reader = source.clone();
        let writer = Arc::new(Mutex::new(None));
        let writer_in_compute = Arc::clone(&writer);
        let mirror = source.map(Propagation::Push, move |_| {
            let v = reader.get();
            let mut slot = writer_in_compute.lock();
            if slot.is_none() {
                let source = reader.clone();
                *slot = Some(thread::spawn(move || source.set(5).unwrap()));
                thread::sleep(Duration::from_millis(50));
            }
            v
        });
        let handle = writer.lock().take();
        handle.expect("writer spawned").join().unwrap();
        assert_eq!(mirror.get(), 5);
    }

    #[test]
    fn pull_derived_waits_for_refresh() {
        let source = Cell::new(1);
        let doubled = source.map(Propagation::Pull, |v| v * 2);
        let fired = counter(&doubled);
        source.set(5).unwrap();
        assert_eq!(doubled.get(), 2);
        doubled.refresh().unwrap();
        assert_eq!(doubled.get(), 10);
        doubled.refresh().unwrap();
        assert_eq!(hits(&fired), 1);
        assert_eq!(source.observer_count(), 0);
    }

    #[test]
    fn dropped_derived_cell_unsubscribes() {
        let source = Cell::new(1);
        let parity = source.map(Propagation::Push, |v| v % 2 == 0);
        assert_eq!(source.observer_count(), 1);
        source.set(2).unwrap();
        assert!(parity.get());
        drop(parity);
        assert_eq!(source.observer_count(), 0);
        source.set(3).unwrap();
    }

    #[test]
    fn deferred_batches_writes() {
        let cell = Cell::deferred("a".to_string());
        let fired = counter(&cell);
        cell.set("b".to_string()).unwrap();
        cell.set("c".to_string()).unwrap();
        assert!(cell.is_dirty());
        assert_eq!(hits(&fired), 0);
        assert_eq!(cell.get(), "c");
        assert_eq!(cell.broadcast_change(), Ok(true));
        assert!(!cell.is_dirty());
        assert_eq!(cell.broadcast_change(), Ok(false));
        assert_eq!(hits(&fired), 1);

        // written but back to the broadcast value: nothing to announce
        cell.set("d".to_string()).unwrap();
        cell.set("c".to_string()).unwrap();
        assert_eq!(cell.broadcast_change(), Ok(false));
        assert_eq!(hits(&fired), 1);
        assert_eq!(Cell::new(0).broadcast_change(), Err(CellError::NotDeferred));
    }

    #[test]
    fn future_blocks_until_bound() {
        let future: Cell<u32> = Cell::future();
        assert_eq!(future.try_get(), None);
        assert_eq!(future.get_timeout(Duration::from_millis(10)), None);

        let readers = (0..3).map(|_| {
            let future = future.clone();
            thread::spawn(move || future.get())
        }).collect::<Vec<_>>();
        thread::sleep(Duration::from_millis(20));
        future.set(42).unwrap();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), 42);
        }

        assert_eq!(future.set(7), Err(CellError::AlreadyBound));
        assert!(!CellError::AlreadyBound.is_invalid_operation());
        assert_eq!(future.get(), 42);
        assert_eq!(future.refresh(), Err(CellError::CannotRefreshFuture));
    }

    #[test]
    fn future_signals_its_binding() {
        let future: Cell<Option<u8>> = Cell::future();
        let fired = counter(&future);
        future.set(None).unwrap();
        assert!(future.is_bound());
        assert_eq!(hits(&fired), 1);
    }

    #[test]
    fn readonly_forwards_everything_but_writes() {
        let cell = Cell::new(1);
        let view = cell.readonly();
        let fired = counter(&view);
        cell.set(2).unwrap();
        assert_eq!(view.get(), 2);
        assert_eq!(hits(&fired), 1);
        assert_eq!(view.set(3), Err(CellError::ReadOnly));
        assert_eq!(view.broadcast_change(), Err(CellError::ReadOnly));
        assert_eq!(cell.get(), 2);
        assert_eq!(view.kind_name(), "readonly");
        assert_eq!(Cell::<u8>::future().readonly().refresh(), Err(CellError::CannotRefreshFuture));
    }

    #[test]
    fn notifications_cross_threads() {
        let cell = Cell::new(0u64);
        let (_, rx) = cell.changes();
        let writer = {
            let cell = cell.clone();
            thread::spawn(move || {
                for i in 1..=10 {
                    cell.set(i).unwrap();
                }
            })
        };
        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        writer.join().unwrap();
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn debug_shows_kind_and_value() {
        assert_eq!(format!("{:?}", Cell::new(3)), "Cell { kind: \"manual\", value: Some(3) }");
        assert_eq!(format!("{:?}", Cell::<u8>::future()), "Cell { kind: \"future\", value: None }");
    }

    proptest! {
        #[test]
        fn fires_once_per_actual_change(writes in prop::collection::vec(0u8..3, 0..20)) {
            let cell = Cell::new(0u8);
            let fired = counter(&cell);
            let mut previous = 0u8;
            let mut expected = 0;
            for value in writes {
                if value != previous { expected += 1; }
                previous = value;
                cell.set(value).unwrap();
            }
            prop_assert_eq!(hits(&fired), expected);
        }
    }
}
