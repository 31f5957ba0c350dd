use crate::event::{InputEvent, InputKind};
use crate::eventbus::InputListener;
use tracing::{debug, trace};

/// Listener that traces every event it receives.
///
/// Pointer moves are logged at `trace` to keep `debug` output readable.
#[derive(Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }
}

impl InputListener for Logger {
    fn on_input(&mut self, event: &InputEvent) {
        let device = event.device().id();
        match event.kind() {
            InputKind::Pointer(p) if !p.phase.is_final() && p.delta != crate::math::Vec2::ZERO => {
                trace!(%device, seq = event.seq(), kind = ?event.kind(), "input");
            }
            kind => debug!(%device, seq = event.seq(), time = ?event.time(), ?kind, "input"),
        }
    }
}
