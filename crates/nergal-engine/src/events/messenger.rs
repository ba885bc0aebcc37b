use std::collections::{BTreeMap, HashMap};

use super::message::{Event, Message};

/// Identifies one subscriber across all of its subscriptions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecipientId(u32);

pub type Callback = Box<dyn FnMut(&Message)>;

/// Event registry with explicit subscribe/unsubscribe.
///
/// Recipients are served in registration order. A recipient subscribed both to
/// an event and to everything receives each message once, through its
/// event-specific callback.
#[derive(Default)]
pub struct Messenger {
    next_id: u32,
    by_event: HashMap<Event, BTreeMap<RecipientId, Callback>>,
    catch_all: BTreeMap<RecipientId, Callback>,
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("next_id", &self.next_id)
            .field("events", &self.by_event.keys().collect::<Vec<_>>())
            .field("catch_all", &self.catch_all.len())
            .finish()
    }
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self) -> RecipientId {
        let id = RecipientId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Replaces any earlier callback `id` had for `event`.
    pub fn subscribe(
        &mut self,
        event: Event,
        id: RecipientId,
        callback: impl FnMut(&Message) + 'static,
    ) {
        self.by_event
            .entry(event)
            .or_default()
            .insert(id, Box::new(callback));
    }

    pub fn subscribe_all(&mut self, id: RecipientId, callback: impl FnMut(&Message) + 'static) {
        self.catch_all.insert(id, Box::new(callback));
    }

    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&mut self, event: Event, id: RecipientId) -> bool {
        let Some(subs) = self.by_event.get_mut(&event) else {
            return false;
        };
        let removed = subs.remove(&id).is_some();
        if subs.is_empty() {
            self.by_event.remove(&event);
        }
        removed
    }

    /// Drops every subscription held by `id`, including the catch-all one.
    pub fn unsubscribe_all(&mut self, id: RecipientId) {
        self.by_event.retain(|_, subs| {
            subs.remove(&id);
            !subs.is_empty()
        });
        self.catch_all.remove(&id);
    }

    pub fn is_subscribed(&self, event: Event, id: RecipientId) -> bool {
        self.catch_all.contains_key(&id)
            || self
                .by_event
                .get(&event)
                .is_some_and(|subs| subs.contains_key(&id))
    }

    /// Delivers `message` and returns the number of callbacks invoked.
    ///
    /// Event subscribers and catch-all subscribers are merged by recipient id.
    pub fn trigger(&mut self, message: &Message) -> usize {
        let mut specific = self.by_event.get_mut(&message.event).map(|subs| subs.iter_mut().peekable());
        let mut general = self.catch_all.iter_mut().peekable();
        let mut served = 0;

        loop {
            let next_specific = specific.as_mut().and_then(|it| it.peek().map(|(id, _)| **id));
            let next_general = general.peek().map(|(id, _)| **id);

            let next = match (next_specific, next_general) {
                (None, None) => break,
                (Some(s), Some(g)) if g < s => general.next(),
                (Some(s), Some(g)) => {
                    if s == g {
                        general.next();
                    }
                    specific.as_mut().and_then(Iterator::next)
                }
                (Some(_), None) => specific.as_mut().and_then(Iterator::next),
                (None, Some(_)) => general.next(),
            };
            let Some((_, callback)) = next else { break };
            callback(message);
            served += 1;
        }

        log::trace!("{:?} delivered to {} recipient(s)", message.event, served);
        served
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::Payload;

    fn recorder() -> (Rc<RefCell<Vec<Message>>>, impl FnMut(&Message) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |m: &Message| sink.borrow_mut().push(*m))
    }

    #[test]
    fn delivers_only_to_matching_event() {
        let mut m = Messenger::new();
        let id = m.register();
        let (log, cb) = recorder();
        m.subscribe(Event::WindowResized, id, cb);

        assert_eq!(m.trigger(&Message::new(Event::ToggleDebug)), 0);
        assert_eq!(m.trigger(&Message::resized(640, 480)), 1);

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].payload, Payload::Size { width: 640, height: 480 });
    }

    #[test]
    fn catch_all_and_specific_deliver_once() {
        let mut m = Messenger::new();
        let id = m.register();
        let (specific, cb) = recorder();
        let (all, cb_all) = recorder();
        m.subscribe(Event::Collision, id, cb);
        m.subscribe_all(id, cb_all);

        assert_eq!(m.trigger(&Message::new(Event::Collision)), 1);
        assert_eq!(specific.borrow().len(), 1);
        assert!(all.borrow().is_empty());

        m.trigger(&Message::new(Event::Selected));
        assert_eq!(all.borrow().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut m = Messenger::new();
        let a = m.register();
        let b = m.register();
        let (log_a, cb_a) = recorder();
        let (log_b, cb_b) = recorder();
        m.subscribe(Event::Created, a, cb_a);
        m.subscribe(Event::Created, b, cb_b);

        assert!(m.unsubscribe(Event::Created, a));
        assert!(!m.unsubscribe(Event::Created, a));
        m.trigger(&Message::with_payload(Event::Created, Payload::Entity(7)));

        assert!(log_a.borrow().is_empty());
        assert_eq!(log_b.borrow().len(), 1);
    }

    #[test]
    fn unsubscribe_all_removes_everything() {
        let mut m = Messenger::new();
        let id = m.register();
        let (log, cb) = recorder();
        let (_, cb_all) = recorder();
        m.subscribe(Event::Destroyed, id, cb);
        m.subscribe_all(id, cb_all);
        assert!(m.is_subscribed(Event::Collision, id));

        m.unsubscribe_all(id);
        assert!(!m.is_subscribed(Event::Destroyed, id));
        assert_eq!(m.trigger(&Message::new(Event::Destroyed)), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn recipients_are_served_in_registration_order() {
        let mut m = Messenger::new();
        let first = m.register();
        let second = m.register();
        let third = m.register();

        let order = Rc::new(RefCell::new(Vec::new()));
        for (id, specific) in [(third, true), (first, false), (second, true)] {
            let order = order.clone();
            let cb = move |_: &Message| order.borrow_mut().push(id);
            if specific {
                m.subscribe(Event::VisibilityChanged, id, cb);
            } else {
                m.subscribe_all(id, cb);
            }
        }

        assert_eq!(m.trigger(&Message::new(Event::VisibilityChanged)), 3);
        assert_eq!(*order.borrow(), vec![first, second, third]);
    }
}
