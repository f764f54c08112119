//! Broadcast signals for registry observers
//!
//! Synchronous multicast: every observer registered on a [`Signal`] is
//! invoked in registration order before `emit` returns. Observers may be
//! added or removed at any time between emissions.

/// Token identifying one registered observer, returned by
/// [`Signal::subscribe`] and consumed by [`Signal::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

struct Observer<T> {
    token: u64,
    callback: Box<dyn FnMut(&T)>,
}

/// Synchronous multicast channel carrying values of type `T`.
pub struct Signal<T> {
    observers: Vec<Observer<T>>,
    next_token: u64,
}

impl<T> Signal<T> {
    /// Create a signal with no observers.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            next_token: 0,
        }
    }

    /// Register an observer; it will be invoked on every emission until
    /// unsubscribed.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let token = self.next_token;
        self.next_token += 1;
        self.observers.push(Observer {
            token,
            callback: Box::new(callback),
        });
        Subscription(token)
    }

    /// Remove a previously registered observer. Returns `false` when the
    /// subscription is unknown (e.g. already unsubscribed).
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.observers.len();
        self.observers
            .retain(|observer| observer.token != subscription.0);
        self.observers.len() != before
    }

    /// Invoke every observer in registration order.
    pub fn emit(&mut self, value: &T) {
        for observer in &mut self.observers {
            (observer.callback)(value);
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn observers_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::new();

        let first = Rc::clone(&seen);
        signal.subscribe(move |value: &u32| first.borrow_mut().push(("first", *value)));
        let second = Rc::clone(&seen);
        signal.subscribe(move |value: &u32| second.borrow_mut().push(("second", *value)));

        signal.emit(&5);

        assert_eq!(*seen.borrow(), vec![("first", 5), ("second", 5)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0u32));
        let mut signal: Signal<()> = Signal::new();

        let counter = Rc::clone(&count);
        let subscription = signal.subscribe(move |()| *counter.borrow_mut() += 1);

        signal.emit(&());
        assert!(signal.unsubscribe(subscription));
        assert!(!signal.unsubscribe(subscription));
        signal.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(signal.observer_count(), 0);
    }
}
