// vim: set ai et ts=4 sts=4 sw=4:
use std::sync::Arc;

/// Callback run whenever a cell's value changes. Carries no payload; observers read
/// the cell themselves.
pub type Observer = Arc<dyn Fn() + Send + Sync>;

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct SubscriptionId(u64);

/// Something with a "value changed" signal.
pub trait Observable: Send + Sync {
    fn subscribe_observer(&self, observer: Observer) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Observer)>,
}

impl Observers {
    pub fn add(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    /// Copy of the current observer list, so callbacks can run without the lock held.
    pub fn snapshot(&self) -> Vec<Observer> {
        self.entries.iter().map(|(_, observer)| Arc::clone(observer)).collect()
    }
}
