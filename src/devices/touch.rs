//! Touch surface device. Raw samples are [`Contact`]s straight from the platform.

use crate::device::{Capability, Device, DeviceId, PollCtx};
use crate::error::DeviceFault;
use crate::event::InputKind;
use crate::metadata::DeviceMeta;
use crate::pointer::{Contact, PointerTracker, PointerType};
use crate::sample::{SampleQueue, SampleSender};

pub struct TouchDevice {
    id: DeviceId,
    name: String,
    queue: SampleQueue<Contact>,
    tracker: PointerTracker,
}

impl TouchDevice {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            queue: SampleQueue::new(),
            tracker: PointerTracker::new(PointerType::Touch),
        }
    }

    pub fn sender(&self) -> SampleSender<Contact> {
        self.queue.sender()
    }

    pub fn contacts(&self) -> &[Contact] {
        self.tracker.contacts()
    }
}

impl Device for TouchDevice {
    fn poll(&mut self, _ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        Ok(self
            .queue
            .drain()
            .into_iter()
            .filter_map(|contact| self.tracker.sample(contact))
            .map(InputKind::Pointer)
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Pointer]
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::named(self.name.clone())
    }
}
