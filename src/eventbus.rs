use crate::device::DeviceId;
use crate::event::{InputEvent, InputKind};

/// Trait for reacting to input events from any device.
pub trait InputListener: Send {
    fn on_input(&mut self, event: &InputEvent);
}

impl<F> InputListener for F
where
    F: FnMut(&InputEvent) + Send,
{
    fn on_input(&mut self, event: &InputEvent) {
        self(event)
    }
}

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    AxisOnly,
    ButtonsOnly,
    PointersOnly,
    GesturesOnly,
    DeviceChanges,
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    pub fn matches(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::AxisOnly => event.kind().is_axis(),
            EventFilter::ButtonsOnly => event.kind().is_button(),
            EventFilter::PointersOnly => matches!(event.kind(), InputKind::Pointer(_)),
            EventFilter::GesturesOnly => matches!(event.kind(), InputKind::Gesture(_)),
            EventFilter::DeviceChanges => matches!(event.kind(), InputKind::DeviceChanged { .. }),
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Handle returned by [`InputEventBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener with its filter and control flags.
struct ListenerEntry {
    id: ListenerId,
    listener: Box<dyn InputListener>,
    enabled: bool,
    filter: EventFilter,
    device: Option<DeviceId>,
}

/// Fans a tick's events out to listeners, in registration order.
#[derive(Default)]
pub struct InputEventBus {
    next_id: u64,
    listeners: Vec<ListenerEntry>,
}

impl InputEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. With `device` set, only that device's events reach it.
    pub fn add_listener(
        &mut self,
        listener: impl InputListener + 'static,
        filter: EventFilter,
        device: Option<DeviceId>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(ListenerEntry {
            id,
            listener: Box::new(listener),
            enabled: true,
            filter,
            device,
        });
        id
    }

    fn entry_mut(&mut self, id: ListenerId) -> Option<&mut ListenerEntry> {
        self.listeners.iter_mut().find(|e| e.id == id)
    }

    pub fn enable(&mut self, id: ListenerId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&mut self, id: ListenerId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.enabled = false;
        }
    }

    pub fn is_enabled(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|e| e.id == id && e.enabled)
    }

    /// Returns `false` if the listener was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|e| e.id != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn emit(&mut self, event: &InputEvent) {
        for entry in &mut self.listeners {
            if !entry.enabled {
                continue;
            }
            if let Some(wanted) = &entry.device {
                if event.device().id() != wanted {
                    continue;
                }
            }
            if entry.filter.matches(event) {
                entry.listener.on_input(event);
            }
        }
    }

    /// Emits a batch of events to matching listeners.
    pub fn emit_all(&mut self, events: &[InputEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}
