//! # DOM Events
//!
//! Event objects, per-node listener lists and dispatch through the capture,
//! target and bubble phases.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Node, NodeId};

/// Event dispatch phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// State shared by every event kind.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type (e.g., "click", "mousedown").
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the event was dispatched by the user agent.
    pub is_trusted: bool,
    phase: Cell<EventPhase>,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles,
            cancelable,
            is_trusted: false,
            phase: Cell::new(EventPhase::None),
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    pub fn new_trusted(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        Self {
            is_trusted: true,
            ..Self::new(event_type, bubbles, cancelable)
        }
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop the event from reaching further nodes on its path.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Also skip the remaining listeners on the current node.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Mouse event data.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseEventData {
    pub client_x: f64,
    pub client_y: f64,
    /// Which mouse button triggered the event.
    pub button: i16,
    pub ctrl_key: bool,
    pub shift_key: bool,
}

/// Focus event data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusEventData {
    /// Element losing (or gaining) focus at the same time.
    pub related_target: Option<NodeId>,
}

/// DOM event with type-specific data.
#[derive(Debug, Clone)]
pub enum DomEvent {
    Generic(Event),
    Mouse(Event, MouseEventData),
    Focus(Event, FocusEventData),
}

impl DomEvent {
    /// Get the base event.
    pub fn event(&self) -> &Event {
        match self {
            DomEvent::Generic(e) | DomEvent::Mouse(e, _) | DomEvent::Focus(e, _) => e,
        }
    }

    /// Create a trusted mouse event. Every mouse event used here bubbles.
    pub fn mouse(event_type: &str, data: MouseEventData) -> Self {
        DomEvent::Mouse(Event::new_trusted(event_type, true, true), data)
    }

    /// Create a trusted focus event; `focusin`/`focusout` bubble, `focus`/`blur` do not.
    pub fn focus(event_type: &str, data: FocusEventData) -> Self {
        let bubbles = matches!(event_type, "focusin" | "focusout");
        DomEvent::Focus(Event::new_trusted(event_type, bubbles, false), data)
    }

    pub fn generic(event_type: &str, bubbles: bool) -> Self {
        DomEvent::Generic(Event::new_trusted(event_type, bubbles, false))
    }
}

/// Options for adding an event listener.
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove after the first invocation.
    pub once: bool,
    /// Adding a listener with a key already present for the same event type
    /// replaces the earlier one, so wiring code can run more than once.
    pub key: Option<&'static str>,
}

impl ListenerOptions {
    pub fn keyed(key: &'static str) -> Self {
        Self {
            key: Some(key),
            ..Default::default()
        }
    }
}

/// An event listener callback.
pub type EventListenerCallback = Box<dyn Fn(&DomEvent) + 'static>;

struct EventListener {
    callback: Rc<dyn Fn(&DomEvent)>,
    options: ListenerOptions,
    id: u64,
}

/// Listener lists for one node, keyed by event type.
#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<HashMap<String, Vec<EventListener>>>,
    next_id: Cell<u64>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventListenerCallback,
        options: ListenerOptions,
    ) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let mut listeners = self.listeners.borrow_mut();
        let list = listeners.entry(event_type.to_string()).or_default();
        if let Some(key) = options.key {
            list.retain(|l| l.options.key != Some(key));
        }
        list.push(EventListener {
            callback: Rc::from(callback),
            options,
            id,
        });
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .get(event_type)
            .map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.listener_count(event_type) > 0
    }

    /// Run the listeners registered for `phase`.
    ///
    /// Callbacks are collected first and run with no borrow held, so a
    /// listener may add listeners to the node it runs on.
    fn invoke(&self, event: &DomEvent, phase: EventPhase) {
        let event_type = event.event().event_type.as_str();
        let to_run: Vec<(u64, bool, Rc<dyn Fn(&DomEvent)>)> = {
            let listeners = self.listeners.borrow();
            let Some(list) = listeners.get(event_type) else {
                return;
            };
            list.iter()
                .filter(|l| match phase {
                    EventPhase::Capturing => l.options.capture,
                    EventPhase::AtTarget => true,
                    EventPhase::Bubbling => !l.options.capture,
                    EventPhase::None => false,
                })
                .map(|l| (l.id, l.options.once, Rc::clone(&l.callback)))
                .collect()
        };

        for (id, once, callback) in to_run {
            if once {
                if let Some(list) = self.listeners.borrow_mut().get_mut(event_type) {
                    list.retain(|l| l.id != id);
                }
            }
            callback(event);
            if event.event().immediate_propagation_stopped() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("event_types", &self.listeners.borrow().len())
            .finish()
    }
}

/// Event dispatcher for propagating events through the DOM tree.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch an event to `target`. `ancestors` are ordered from the root
    /// down to the target's parent.
    ///
    /// Returns false if a listener called `prevent_default`.
    pub fn dispatch(event: &DomEvent, target: &Rc<Node>, ancestors: &[Rc<Node>]) -> bool {
        let base = event.event();
        base.target.set(Some(target.id));

        base.phase.set(EventPhase::Capturing);
        for node in ancestors {
            if base.propagation_stopped() {
                break;
            }
            base.current_target.set(Some(node.id));
            node.event_target.invoke(event, EventPhase::Capturing);
        }

        if !base.propagation_stopped() {
            base.phase.set(EventPhase::AtTarget);
            base.current_target.set(Some(target.id));
            target.event_target.invoke(event, EventPhase::AtTarget);
        }

        if base.bubbles {
            base.phase.set(EventPhase::Bubbling);
            for node in ancestors.iter().rev() {
                if base.propagation_stopped() {
                    break;
                }
                base.current_target.set(Some(node.id));
                node.event_target.invoke(event, EventPhase::Bubbling);
            }
        }

        base.phase.set(EventPhase::None);
        base.current_target.set(None);

        !base.default_prevented()
    }
}
