use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

type Callback = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SubscriberKey(u64);

#[derive(Default)]
struct Table {
    next_key: u64,
    // Keys are handed out in increasing order, so iteration is registration order.
    callbacks: BTreeMap<SubscriberKey, Callback>,
}

/// The set of callbacks interested in one query's state changes.
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    table: Rc<RefCell<Table>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self, callback: impl Fn() + 'static) -> Unsubscribe {
        let mut table = self.table.borrow_mut();
        let key = SubscriberKey(table.next_key);
        table.next_key += 1;
        table.callbacks.insert(key, Rc::new(callback));

        Unsubscribe {
            table: Rc::downgrade(&self.table),
            key: Cell::new(Some(key)),
        }
    }

    /// Calls every subscriber once, in registration order.
    ///
    /// Callbacks may subscribe, unsubscribe or read query state. A callback that is
    /// removed while the round is running is skipped, one that is added waits for
    /// the next round.
    pub(crate) fn notify(&self) {
        let keys: Vec<SubscriberKey> = self.table.borrow().callbacks.keys().copied().collect();
        for key in keys {
            let callback = self.table.borrow().callbacks.get(&key).cloned();
            if let Some(callback) = callback {
                callback();
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.borrow().callbacks.len()
    }
}

/// Removes one subscription from a query.
///
/// Returned by [`QueryRecord::subscribe`](crate::QueryRecord::subscribe).
/// Only the first call to [`unsubscribe`](Self::unsubscribe) has an effect.
/// Dropping the handle does *not* unsubscribe.
#[must_use = "dropping an Unsubscribe leaves the callback registered"]
pub struct Unsubscribe {
    table: Weak<RefCell<Table>>,
    key: Cell<Option<SubscriberKey>>,
}

impl Unsubscribe {
    /// Removes the callback. Returns true if this call removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(key) = self.key.take() else {
            return false;
        };
        match self.table.upgrade() {
            Some(table) => table.borrow_mut().callbacks.remove(&key).is_some(),
            None => false,
        }
    }

    /// Returns true until [`unsubscribe`](Self::unsubscribe) has been called.
    pub fn is_subscribed(&self) -> bool {
        self.key.get().is_some()
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("key", &self.key.get())
            .finish()
    }
}
