//! Observable game state
//!
//! Subscribers watch a value derived from the state, either through a
//! selector closure or by field name. A subscriber runs once on subscribe
//! (unless told not to) and afterwards only when its derived value changes.
//!
//! Callbacks receive the state by shared reference and cannot write back to
//! the store; anything that reacts by changing the game does so through its
//! own channel (see `MainScene`'s end-of-game check).

use serde::Serialize;
use serde_json::Value;

use crate::error::{BlastError, Result};

/// Subscription options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Invoke the callback with the current value right away
    pub fire_immediately: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            fire_immediately: true,
        }
    }
}

impl SubscribeOptions {
    /// Only notify on later changes
    pub fn deferred() -> Self {
        Self {
            fire_immediately: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<S> = Box<dyn FnMut(&S)>;

pub struct Store<S> {
    state: S,
    subscribers: Vec<(SubscriptionId, Subscriber<S>)>,
    next_id: u64,
}

impl<S: std::fmt::Debug> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<S: 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Watch `selector(state)`, calling `callback` with the new value whenever it changes
    pub fn subscribe<T, F, C>(&mut self, selector: F, mut callback: C, options: SubscribeOptions) -> SubscriptionId
    where
        T: PartialEq + 'static,
        F: Fn(&S) -> T + 'static,
        C: FnMut(&T, &S) + 'static,
    {
        let mut cached = selector(&self.state);
        if options.fire_immediately {
            callback(&cached, &self.state);
        }

        let subscriber = move |state: &S| {
            let value = selector(state);
            if value != cached {
                cached = value;
                callback(&cached, state);
            }
        };

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Mutate the state, then notify subscribers whose value changed
    pub fn set_state(&mut self, update: impl FnOnce(&mut S)) {
        update(&mut self.state);
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.state);
        }
    }
}

impl<S: Serialize + 'static> Store<S> {
    /// Watch a single field by its serialized name
    pub fn subscribe_field<C>(&mut self, field: &str, callback: C, options: SubscribeOptions) -> Result<SubscriptionId>
    where
        C: FnMut(&Value, &S) + 'static,
    {
        let snapshot = serde_json::to_value(&self.state)?;
        if snapshot.get(field).is_none() {
            return Err(BlastError::UnknownField(field.to_string()));
        }

        let field = field.to_string();
        let selector = move |state: &S| {
            serde_json::to_value(state)
                .ok()
                .and_then(|v| v.get(&field).cloned())
                .unwrap_or(Value::Null)
        };
        Ok(self.subscribe(selector, callback, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Default, Serialize)]
    struct Counters {
        scores: u32,
        steps: i32,
    }

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(&T, &Counters) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &T, _: &Counters| sink.borrow_mut().push(value.clone()))
    }

    #[test]
    fn test_selector_fires_immediately_then_on_change() {
        let mut store = Store::new(Counters::default());
        let (seen, callback) = recorder::<u32>();
        store.subscribe(|s| s.scores, callback, SubscribeOptions::default());
        assert_eq!(*seen.borrow(), vec![0]);

        store.set_state(|s| s.steps = 4);
        assert_eq!(*seen.borrow(), vec![0]);

        store.set_state(|s| s.scores = 2);
        store.set_state(|s| s.scores = 2);
        assert_eq!(*seen.borrow(), vec![0, 2]);
    }

    #[test]
    fn test_deferred_subscription() {
        let mut store = Store::new(Counters::default());
        let (seen, callback) = recorder::<bool>();
        store.subscribe(|s| s.scores >= 3, callback, SubscribeOptions::deferred());
        assert!(seen.borrow().is_empty());

        store.set_state(|s| s.scores = 2);
        assert!(seen.borrow().is_empty());
        store.set_state(|s| s.scores = 5);
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn test_field_subscription() {
        let mut store = Store::new(Counters { scores: 0, steps: 3 });
        let (seen, callback) = recorder::<Value>();
        store.subscribe_field("steps", callback, SubscribeOptions::default()).unwrap();

        store.set_state(|s| s.steps -= 1);
        store.set_state(|s| s.scores += 1);
        assert_eq!(*seen.borrow(), vec![Value::from(3), Value::from(2)]);
    }

    #[test]
    fn test_unknown_field() {
        let mut store = Store::new(Counters::default());
        let err = store
            .subscribe_field("lives", |_, _| {}, SubscribeOptions::default())
            .unwrap_err();
        assert!(matches!(err, BlastError::UnknownField(ref f) if f == "lives"));
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = Store::new(Counters::default());
        let (seen, callback) = recorder::<u32>();
        let id = store.subscribe(|s| s.scores, callback, SubscribeOptions::deferred());
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_state(|s| s.scores = 9);
        assert!(seen.borrow().is_empty());
        assert_eq!(store.subscriber_count(), 0);
    }
}
