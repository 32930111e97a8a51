//! Minimal single-threaded listener registry.
//!
//! Used for auth-state callbacks and route-change notifications. Listeners
//! are invoked in subscription order.

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered set of callbacks receiving `&T`.
pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<dyn Fn(&T)>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn Fn(&T)>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    /// Returns `false` when `id` was not registered (or already removed).
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn notify(&self, value: &T) {
        for (_, listener) in &self.entries {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Listeners;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notifies_in_order_and_supports_removal() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::<u32>::new();

        let first_seen = Rc::clone(&seen);
        let first = listeners.add(Box::new(move |value| first_seen.borrow_mut().push(*value)));
        let second_seen = Rc::clone(&seen);
        listeners.add(Box::new(move |value| {
            second_seen.borrow_mut().push(*value * 10)
        }));

        listeners.notify(&1);
        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));
        listeners.notify(&2);

        assert_eq!(*seen.borrow(), vec![1, 10, 20]);
        assert_eq!(listeners.len(), 1);
    }
}
