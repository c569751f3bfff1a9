//! Lifecycle event dispatch
//!
//! Controllers report six lifecycle events. Each event is delivered first to
//! the handlers registered for that controller and event, then to the single
//! observer, so one place can see every event in firing order.

use std::fmt;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ids::ControllerId;

/// Lifecycle events, in the order they are checked after a progress update
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerEvent {
    /// Total progress left 0 moving forward
    Start,
    /// Total progress reached 1
    Complete,
    /// Total progress left 1 moving backward
    ReverseStart,
    /// Total progress reached 0
    ReverseComplete,
    /// Iteration number changed
    Repeat,
    /// Total progress changed
    Update,
}

impl ControllerEvent {
    pub const ALL: [ControllerEvent; 6] = [
        ControllerEvent::Start,
        ControllerEvent::Complete,
        ControllerEvent::ReverseStart,
        ControllerEvent::ReverseComplete,
        ControllerEvent::Repeat,
        ControllerEvent::Update,
    ];
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerEvent::Start => "start",
            ControllerEvent::Complete => "complete",
            ControllerEvent::ReverseStart => "reverse-start",
            ControllerEvent::ReverseComplete => "reverse-complete",
            ControllerEvent::Repeat => "repeat",
            ControllerEvent::Update => "update",
        };
        f.write_str(name)
    }
}

/// Snapshot handed to handlers when an event fires
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventContext {
    pub id: ControllerId,
    pub event: ControllerEvent,
    /// Total progress after the update
    pub total_progress: f64,
    /// Iteration-local progress after the update
    pub progress: f64,
    pub iteration: u64,
}

/// Event handler function type
pub type EventHandler = Box<dyn Fn(&EventContext) + Send + Sync>;

/// Receives every event fired by every controller of an animator
pub trait ControllerObserver {
    fn on_event(&mut self, ctx: &EventContext);
}

impl<F> ControllerObserver for F
where
    F: FnMut(&EventContext),
{
    fn on_event(&mut self, ctx: &EventContext) {
        self(ctx)
    }
}

/// Observer that records `(controller, event)` pairs in firing order
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<(ControllerId, ControllerEvent)>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(ControllerId, ControllerEvent)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events fired by one controller, in order
    pub fn events_for(&self, id: ControllerId) -> Vec<ControllerEvent> {
        self.entries()
            .into_iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, event)| event)
            .collect()
    }

    /// How many times `event` fired for `id`
    pub fn count(&self, id: ControllerId, event: ControllerEvent) -> usize {
        self.events_for(id).iter().filter(|e| **e == event).count()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl ControllerObserver for EventLog {
    fn on_event(&mut self, ctx: &EventContext) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((ctx.id, ctx.event));
        }
    }
}

/// Dispatches events to registered handlers
pub struct EventDispatcher {
    handlers: FxHashMap<(ControllerId, ControllerEvent), SmallVec<[EventHandler; 1]>>,
    observer: Option<Box<dyn ControllerObserver>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            observer: None,
        }
    }

    /// Register an event handler for a controller and event type
    pub fn register<F>(&mut self, id: ControllerId, event: ControllerEvent, handler: F)
    where
        F: Fn(&EventContext) + Send + Sync + 'static,
    {
        self.handlers
            .entry((id, event))
            .or_default()
            .push(Box::new(handler));
    }

    /// Install the observer, returning the previous one
    pub fn set_observer(
        &mut self,
        observer: Box<dyn ControllerObserver>,
    ) -> Option<Box<dyn ControllerObserver>> {
        self.observer.replace(observer)
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn ControllerObserver>> {
        self.observer.take()
    }

    /// Drop every handler registered for `id`
    pub fn remove(&mut self, id: ControllerId) {
        self.handlers.retain(|(owner, _), _| *owner != id);
    }

    pub fn has_handlers(&self, id: ControllerId, event: ControllerEvent) -> bool {
        self.handlers
            .get(&(id, event))
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Dispatch an event to the registered handlers, then the observer
    pub fn dispatch(&mut self, ctx: &EventContext) {
        if let Some(handlers) = self.handlers.get(&(ctx.id, ctx.event)) {
            for handler in handlers {
                handler(ctx);
            }
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(ctx);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ctx(id: ControllerId, event: ControllerEvent) -> EventContext {
        EventContext {
            id,
            event,
            total_progress: 0.5,
            progress: 0.5,
            iteration: 0,
        }
    }

    #[test]
    fn test_handlers_then_observer() {
        let mut ids: SlotMap<ControllerId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());

        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();

        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(a, ControllerEvent::Start, move |ctx| {
            calls_clone.lock().unwrap().push(ctx.event);
        });
        let log = EventLog::new();
        dispatcher.set_observer(Box::new(log.clone()));

        dispatcher.dispatch(&ctx(a, ControllerEvent::Start));
        dispatcher.dispatch(&ctx(b, ControllerEvent::Start));
        dispatcher.dispatch(&ctx(a, ControllerEvent::Complete));

        assert_eq!(*calls.lock().unwrap(), vec![ControllerEvent::Start]);
        assert_eq!(
            log.events_for(a),
            vec![ControllerEvent::Start, ControllerEvent::Complete]
        );
        assert_eq!(log.count(b, ControllerEvent::Start), 1);
    }

    #[test]
    fn test_remove_handlers() {
        let mut ids: SlotMap<ControllerId, ()> = SlotMap::with_key();
        let a = ids.insert(());

        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(a, ControllerEvent::Repeat, |_| {});
        assert!(dispatcher.has_handlers(a, ControllerEvent::Repeat));
        dispatcher.remove(a);
        assert!(!dispatcher.has_handlers(a, ControllerEvent::Repeat));
    }

    #[test]
    fn test_closure_observer() {
        let mut ids: SlotMap<ControllerId, ()> = SlotMap::with_key();
        let a = ids.insert(());

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = seen.clone();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.set_observer(Box::new(move |_: &EventContext| {
            *seen_clone.lock().unwrap() += 1;
        }));
        dispatcher.dispatch(&ctx(a, ControllerEvent::Update));
        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
