//! Keyboard device.
//!
//! Keys are tracked by [`ButtonTracker`]s keyed on [`Key`]; a key that is reported down
//! several times in a row (OS auto-repeat) produces a single `Pressed`.

use crate::device::{Capability, Device, DeviceId, PollCtx};
use crate::error::DeviceFault;
use crate::event::{ChannelDesc, InputKind};
use crate::metadata::DeviceMeta;
use crate::sample::{SampleQueue, SampleSender};
use crate::state::ButtonTracker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

macro_rules! keys {
    ($($name:ident = $code:expr),* $(,)?) => {
        /// Physical key. The discriminant is the button index used in
        /// [`DeviceState`](crate::state::DeviceState) and bindings.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum Key {
            $($name = $code),*
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$name => stringify!($name)),*
                }
            }
        }
    };
}

keys! {
    Backspace = 8, Tab = 9, Enter = 13, Pause = 19, CapsLock = 20, Escape = 27, Space = 32,
    PageUp = 33, PageDown = 34, End = 35, Home = 36,
    Left = 37, Up = 38, Right = 39, Down = 40,
    Insert = 45, Delete = 46,
    D0 = 48, D1 = 49, D2 = 50, D3 = 51, D4 = 52, D5 = 53, D6 = 54, D7 = 55, D8 = 56, D9 = 57,
    A = 65, B = 66, C = 67, D = 68, E = 69, F = 70, G = 71, H = 72, I = 73, J = 74, K = 75,
    L = 76, M = 77, N = 78, O = 79, P = 80, Q = 81, R = 82, S = 83, T = 84, U = 85, V = 86,
    W = 87, X = 88, Y = 89, Z = 90,
    NumPad0 = 96, NumPad1 = 97, NumPad2 = 98, NumPad3 = 99, NumPad4 = 100,
    NumPad5 = 101, NumPad6 = 102, NumPad7 = 103, NumPad8 = 104, NumPad9 = 105,
    F1 = 112, F2 = 113, F3 = 114, F4 = 115, F5 = 116, F6 = 117,
    F7 = 118, F8 = 119, F9 = 120, F10 = 121, F11 = 122, F12 = 123,
    LeftShift = 160, RightShift = 161, LeftCtrl = 162, RightCtrl = 163, LeftAlt = 164, RightAlt = 165,
}

impl Key {
    /// Button index of this key.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Key> {
        Key::ALL.iter().copied().find(|k| k.code() == code)
    }
}

/// Raw keyboard sample pushed by the platform.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyboardSample {
    Down(Key),
    Up(Key),
    /// Composed text (after layout/IME processing).
    Text(String),
    /// Full set of keys currently held. Keys not listed are treated as released,
    /// which is how platforms that poll a key bitmap report state.
    AllDown(Vec<Key>),
}

pub struct KeyboardDevice {
    id: DeviceId,
    name: String,
    queue: SampleQueue<KeyboardSample>,
    keys: BTreeMap<Key, ButtonTracker>,
}

impl KeyboardDevice {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            queue: SampleQueue::new(),
            keys: BTreeMap::new(),
        }
    }

    pub fn sender(&self) -> SampleSender<KeyboardSample> {
        self.queue.sender()
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys.get(&key).is_some_and(ButtonTracker::is_down)
    }

    fn sample_key(&mut self, key: Key, down: bool, out: &mut Vec<InputKind>) {
        if let Some(edge) = self.keys.entry(key).or_default().sample(down) {
            out.push(InputKind::Key { key, edge });
        }
    }
}

impl Device for KeyboardDevice {
    fn poll(&mut self, _ctx: &PollCtx) -> Result<Vec<InputKind>, DeviceFault> {
        let mut out = Vec::new();
        for sample in self.queue.drain() {
            match sample {
                KeyboardSample::Down(key) => self.sample_key(key, true, &mut out),
                KeyboardSample::Up(key) => self.sample_key(key, false, &mut out),
                KeyboardSample::Text(text) => {
                    if !text.is_empty() {
                        out.push(InputKind::TextInput { text });
                    }
                }
                KeyboardSample::AllDown(held) => {
                    let known: Vec<Key> = self.keys.keys().copied().collect();
                    for key in known {
                        if !held.contains(&key) {
                            self.sample_key(key, false, &mut out);
                        }
                    }
                    for key in held {
                        self.sample_key(key, true, &mut out);
                    }
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Keyboard]
    }

    fn describe(&self) -> Vec<ChannelDesc> {
        Key::ALL
            .iter()
            .map(|k| ChannelDesc::button(k.code(), k.name()))
            .collect()
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::named(self.name.clone())
    }
}
