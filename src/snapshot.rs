//! Per-tick snapshot of device states.
//!
//! [`Snapshot`] is an owned, read-only view of every registered device's
//! [`DeviceState`] as of the end of the last [`InputManager::update`](crate::manager::InputManager::update).
//! It is cheap to clone for fan-out to multiple consumers and it is what virtual buttons
//! are evaluated against.
//!
//! # Semantics
//! - Keys are [`DeviceId`]s; iteration follows device registration order.
//! - A snapshot never polls devices. To refresh, run another `update` and take a new one.
//! - A removed device disappears from the snapshot in the tick it is removed.
//!
//! ```ignore
//! for (id, state) in snap.iter() {
//!     println!("{id}: LX={:.2} A={}", state.get_axis(0), state.get_button(0));
//! }
//! ```

use crate::binding::DeviceSelector;
use crate::device::DeviceId;
use crate::state::DeviceState;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    order: Vec<DeviceId>,
    states: HashMap<DeviceId, DeviceState>,
}

impl Snapshot {
    /// Build a snapshot from `(id, state)` pairs, keeping their order.
    ///
    /// Useful for evaluating bindings without a manager (tests, replays).
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = (DeviceId, DeviceState)>,
    {
        let mut snap = Self::default();
        for (id, state) in states {
            snap.insert(id, state);
        }
        snap
    }

    #[inline]
    pub fn get(&self, id: &DeviceId) -> Option<&DeviceState> {
        self.states.get(id)
    }

    /// Iterate `(id, state)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &DeviceState)> {
        self.order
            .iter()
            .filter_map(|id| self.states.get(id).map(|s| (id, s)))
    }

    /// Resolve a selector to a device state. `None` if nothing matches.
    pub fn select(&self, selector: &DeviceSelector) -> Option<&DeviceState> {
        match selector {
            DeviceSelector::Id(id) => self.get(id),
            DeviceSelector::First(capability) => self
                .iter()
                .map(|(_, s)| s)
                .find(|s| s.has(*capability)),
            DeviceSelector::Nth { capability, index } => self
                .iter()
                .map(|(_, s)| s)
                .filter(|s| s.has(*capability))
                .nth(*index),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn insert(&mut self, id: DeviceId, state: DeviceState) {
        if self.states.insert(id.clone(), state).is_none() {
            self.order.push(id);
        }
    }

    pub(crate) fn remove(&mut self, id: &DeviceId) -> Option<DeviceState> {
        self.order.retain(|d| d != id);
        self.states.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &DeviceId) -> Option<&mut DeviceState> {
        self.states.get_mut(id)
    }

    pub(crate) fn states_mut(&mut self) -> impl Iterator<Item = &mut DeviceState> {
        self.states.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Capability;

    #[test]
    fn selectors_follow_registration_order() {
        let snap = Snapshot::from_states([
            (DeviceId::from("kbd"), DeviceState::new(vec![Capability::Keyboard])),
            (DeviceId::from("pad1"), DeviceState::new(vec![Capability::GameController])),
            (DeviceId::from("pad0"), DeviceState::new(vec![Capability::GameController])),
        ]);

        let ids: Vec<_> = snap.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["kbd", "pad1", "pad0"]);

        let first = snap.select(&DeviceSelector::First(Capability::GameController));
        assert!(std::ptr::eq(first.unwrap(), snap.get(&"pad1".into()).unwrap()));

        let second = snap.select(&DeviceSelector::Nth {
            capability: Capability::GameController,
            index: 1,
        });
        assert!(std::ptr::eq(second.unwrap(), snap.get(&"pad0".into()).unwrap()));

        assert!(snap
            .select(&DeviceSelector::First(Capability::Sensor))
            .is_none());
    }

    #[test]
    fn removal_drops_order_entry() {
        let mut snap = Snapshot::from_states([(DeviceId::from("a"), DeviceState::default())]);
        assert!(snap.remove(&"a".into()).is_some());
        assert!(snap.is_empty());
        assert_eq!(snap.iter().count(), 0);
    }
}
