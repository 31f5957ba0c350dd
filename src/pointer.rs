//! Pointer contacts and the per-device contact tracker.
//!
//! A [`Contact`] is one finger/pen/cursor across its begin-move-end lifecycle. The
//! [`PointerTracker`] keeps the live contacts of one device in the order they began and
//! turns raw contact samples into [`PointerEvent`]s:
//! - `Began` registers the contact and reports it;
//! - `Moved` reports position and delta (nothing if the contact did not move);
//! - `Ended`/`Cancelled` report a final event, then the contact is forgotten.
//!
//! Samples that reference an id the tracker never saw begin are dropped.

use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    Began,
    Moved,
    Ended,
    /// The platform lost the contact (palm rejection, focus loss, ...).
    Cancelled,
}

impl ContactPhase {
    pub fn is_final(self) -> bool {
        matches!(self, ContactPhase::Ended | ContactPhase::Cancelled)
    }
}

/// One tracked contact, also used as the raw contact sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable for the contact's lifetime; may be reused afterwards.
    pub id: u32,
    pub position: Vec2,
    pub phase: ContactPhase,
    /// Sample time on the same clock as [`InputManager::update`](crate::manager::InputManager::update).
    pub time: Duration,
}

impl Contact {
    pub fn new(id: u32, position: Vec2, phase: ContactPhase, time: Duration) -> Self {
        Self {
            id,
            position,
            phase,
            time,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub pointer_type: PointerType,
    pub contact_id: u32,
    pub position: Vec2,
    /// Movement since the previous event for this contact.
    pub delta: Vec2,
    pub phase: ContactPhase,
    pub time: Duration,
}

#[derive(Clone, Debug)]
pub struct PointerTracker {
    pointer_type: PointerType,
    live: Vec<Contact>,
}

impl PointerTracker {
    pub fn new(pointer_type: PointerType) -> Self {
        Self {
            pointer_type,
            live: Vec::new(),
        }
    }

    pub fn pointer_type(&self) -> PointerType {
        self.pointer_type
    }

    /// Live contacts in the order they began.
    pub fn contacts(&self) -> &[Contact] {
        &self.live
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.live.iter().any(|c| c.id == id)
    }

    pub fn sample(&mut self, sample: Contact) -> Option<PointerEvent> {
        let existing = self.live.iter().position(|c| c.id == sample.id);

        match (sample.phase, existing) {
            (ContactPhase::Began, None) => {
                self.live.push(sample);
                Some(self.event(&sample, Vec2::ZERO, ContactPhase::Began))
            }
            // Platform re-announced a contact we already track; treat as movement.
            (ContactPhase::Began, Some(i)) | (ContactPhase::Moved, Some(i)) => {
                let prev = self.live[i].position;
                let delta = sample.position - prev;
                self.live[i].position = sample.position;
                self.live[i].time = sample.time;
                self.live[i].phase = ContactPhase::Moved;
                if delta == Vec2::ZERO {
                    return None;
                }
                Some(self.event(&sample, delta, ContactPhase::Moved))
            }
            (phase, Some(i)) => {
                let prev = self.live.remove(i);
                let delta = sample.position - prev.position;
                Some(self.event(&sample, delta, phase))
            }
            (_, None) => {
                tracing::trace!(contact = sample.id, phase = ?sample.phase, "dropping sample for unknown contact");
                None
            }
        }
    }

    /// End every live contact with `Cancelled` (device lost focus or is going away).
    pub fn cancel_all(&mut self, time: Duration) -> Vec<PointerEvent> {
        let live = std::mem::take(&mut self.live);
        live.into_iter()
            .map(|c| PointerEvent {
                pointer_type: self.pointer_type,
                contact_id: c.id,
                position: c.position,
                delta: Vec2::ZERO,
                phase: ContactPhase::Cancelled,
                time,
            })
            .collect()
    }

    fn event(&self, sample: &Contact, delta: Vec2, phase: ContactPhase) -> PointerEvent {
        PointerEvent {
            pointer_type: self.pointer_type,
            contact_id: sample.id,
            position: sample.position,
            delta,
            phase,
            time: sample.time,
        }
    }
}
