//! Virtual buttons and binding profiles.
//!
//! A [`VirtualButton`] is an immutable expression tree that composes physical controls
//! into one scalar. Evaluation is a pure function of a [`Snapshot`]:
//! - a button leaf yields `1.0` / `0.0`, an axis leaf its analog value;
//! - `Any` is the maximum of its children, `All` the minimum;
//! - `Negate`, `Scale` and friends are affine or clamping transforms;
//! - a reference to a device that is missing from the snapshot yields `0.0`.
//!
//! A [`BindingProfile`] names a list of virtual buttons (actions) and resolves all of them
//! at once into a [`BindingOutput`].

use crate::device::{Capability, DeviceId};
use crate::devices::keyboard::Key;
use crate::devices::mouse::MouseButton;
use crate::snapshot::Snapshot;
use crate::state::DeviceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which device a control reference reads from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceSelector {
    /// A specific device.
    Id(DeviceId),
    /// The first registered device with this capability.
    First(Capability),
    /// The `index`-th registered device with this capability.
    Nth { capability: Capability, index: usize },
}

/// Axis, button or hat control type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlType {
    Axis,
    Button,
    /// Reads `1.0` while the hat points in `direction` (`0..7`).
    Hat { direction: i16 },
}

/// Identifies an axis, button or hat on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlPath {
    pub control_type: ControlType,
    pub index: u16,
}

impl ControlPath {
    pub fn button(index: u16) -> Self {
        Self {
            control_type: ControlType::Button,
            index,
        }
    }

    pub fn axis(index: u16) -> Self {
        Self {
            control_type: ControlType::Axis,
            index,
        }
    }

    pub fn hat(index: u16, direction: i16) -> Self {
        Self {
            control_type: ControlType::Hat { direction },
            index,
        }
    }

    fn read(&self, state: &DeviceState) -> f32 {
        match self.control_type {
            ControlType::Axis => state.get_axis(self.index),
            ControlType::Button => bool_value(state.get_button(self.index)),
            ControlType::Hat { direction } => bool_value(state.get_hat(self.index) == direction),
        }
    }
}

#[inline]
fn bool_value(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Composable binding expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VirtualButton {
    Control {
        device: DeviceSelector,
        control: ControlPath,
    },
    /// Logical OR: maximum of the children (`0.0` when empty).
    Any(Vec<VirtualButton>),
    /// Logical AND: minimum of the children (`0.0` when empty).
    All(Vec<VirtualButton>),
    Negate(Box<VirtualButton>),
    /// `input * scale + offset`.
    Scale {
        input: Box<VirtualButton>,
        scale: f32,
        offset: f32,
    },
    /// `positive - negative`, e.g. two keys driving one axis.
    TwoWay {
        positive: Box<VirtualButton>,
        negative: Box<VirtualButton>,
    },
    /// Turns an analog value into a button: `1.0` when `input > threshold`.
    Threshold {
        input: Box<VirtualButton>,
        threshold: f32,
    },
    /// Values with magnitude below `deadzone` read as `0.0`.
    Deadzone {
        input: Box<VirtualButton>,
        deadzone: f32,
    },
}

impl VirtualButton {
    pub fn control(device: DeviceSelector, control: ControlPath) -> Self {
        VirtualButton::Control { device, control }
    }

    /// A key on the first keyboard.
    pub fn key(key: Key) -> Self {
        Self::control(
            DeviceSelector::First(Capability::Keyboard),
            ControlPath::button(key.code()),
        )
    }

    /// A button on the first mouse.
    pub fn mouse_button(button: MouseButton) -> Self {
        Self::control(
            DeviceSelector::First(Capability::Mouse),
            ControlPath::button(button.index()),
        )
    }

    /// A button on the `pad`-th game controller.
    pub fn gamepad_button(pad: usize, button: u16) -> Self {
        Self::control(
            DeviceSelector::Nth {
                capability: Capability::GameController,
                index: pad,
            },
            ControlPath::button(button),
        )
    }

    /// An axis on the `pad`-th game controller.
    pub fn gamepad_axis(pad: usize, axis: u16) -> Self {
        Self::control(
            DeviceSelector::Nth {
                capability: Capability::GameController,
                index: pad,
            },
            ControlPath::axis(axis),
        )
    }

    pub fn any(children: impl IntoIterator<Item = VirtualButton>) -> Self {
        VirtualButton::Any(children.into_iter().collect())
    }

    pub fn all(children: impl IntoIterator<Item = VirtualButton>) -> Self {
        VirtualButton::All(children.into_iter().collect())
    }

    pub fn negate(self) -> Self {
        VirtualButton::Negate(Box::new(self))
    }

    pub fn scale(self, scale: f32, offset: f32) -> Self {
        VirtualButton::Scale {
            input: Box::new(self),
            scale,
            offset,
        }
    }

    pub fn two_way(positive: VirtualButton, negative: VirtualButton) -> Self {
        VirtualButton::TwoWay {
            positive: Box::new(positive),
            negative: Box::new(negative),
        }
    }

    pub fn threshold(self, threshold: f32) -> Self {
        VirtualButton::Threshold {
            input: Box::new(self),
            threshold,
        }
    }

    pub fn deadzone(self, deadzone: f32) -> Self {
        VirtualButton::Deadzone {
            input: Box::new(self),
            deadzone,
        }
    }

    /// Evaluate against a snapshot. Pure: same snapshot, same value.
    pub fn evaluate(&self, snapshot: &Snapshot) -> f32 {
        match self {
            VirtualButton::Control { device, control } => snapshot
                .select(device)
                .map_or(0.0, |state| control.read(state)),
            VirtualButton::Any(children) => children
                .iter()
                .map(|c| c.evaluate(snapshot))
                .reduce(f32::max)
                .unwrap_or(0.0),
            VirtualButton::All(children) => children
                .iter()
                .map(|c| c.evaluate(snapshot))
                .reduce(f32::min)
                .unwrap_or(0.0),
            VirtualButton::Negate(input) => -input.evaluate(snapshot),
            VirtualButton::Scale {
                input,
                scale,
                offset,
            } => input.evaluate(snapshot) * scale + offset,
            VirtualButton::TwoWay { positive, negative } => {
                positive.evaluate(snapshot) - negative.evaluate(snapshot)
            }
            VirtualButton::Threshold { input, threshold } => {
                bool_value(input.evaluate(snapshot) > *threshold)
            }
            VirtualButton::Deadzone { input, deadzone } => {
                let v = input.evaluate(snapshot);
                if v.abs() < *deadzone {
                    0.0
                } else {
                    v
                }
            }
        }
    }

    /// `evaluate(..) > 0.5`.
    pub fn is_down(&self, snapshot: &Snapshot) -> bool {
        self.evaluate(snapshot) > 0.5
    }
}

/// Maps a virtual button to a named action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub action_name: String,
    pub button: VirtualButton,
}

/// Serializable profile of input bindings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingProfile {
    pub name: String,
    pub description: Option<String>,
    pub bindings: Vec<Binding>,
}

/// Resolved action values for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingOutput {
    pub values: BTreeMap<String, f32>,
}

impl BindingOutput {
    /// Value of an action (`0.0` if unknown).
    pub fn value(&self, action: &str) -> f32 {
        self.values.get(action).copied().unwrap_or(0.0)
    }

    pub fn is_active(&self, action: &str) -> bool {
        self.value(action) > 0.5
    }
}

impl BindingProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn bind(mut self, action: impl Into<String>, button: VirtualButton) -> Self {
        self.bindings.push(Binding {
            action_name: action.into(),
            button,
        });
        self
    }

    pub fn get(&self, action: &str) -> Option<&VirtualButton> {
        self.bindings
            .iter()
            .find(|b| b.action_name == action)
            .map(|b| &b.button)
    }

    /// Resolves every bound action against `snapshot`.
    ///
    /// When several bindings share an action name, the strongest value wins.
    pub fn resolve(&self, snapshot: &Snapshot) -> BindingOutput {
        let mut output = BindingOutput::default();
        for binding in &self.bindings {
            let value = binding.button.evaluate(snapshot);
            output
                .values
                .entry(binding.action_name.clone())
                .and_modify(|v| {
                    if value.abs() > v.abs() {
                        *v = value;
                    }
                })
                .or_insert(value);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ButtonEdge, InputKind};
    use crate::state::AxisKind;

    fn pad_with_axes(values: &[f32]) -> DeviceState {
        let mut s = DeviceState::new(vec![Capability::GameController]);
        for (i, &v) in values.iter().enumerate() {
            s.apply(&InputKind::AxisMoved {
                axis: i as u16,
                value: v,
                kind: AxisKind::Absolute,
            });
        }
        s
    }

    fn snapshot() -> Snapshot {
        let mut kb = DeviceState::new(vec![Capability::Keyboard]);
        kb.apply(&InputKind::Key {
            key: Key::D,
            edge: ButtonEdge::Pressed,
        });
        Snapshot::from_states([
            (DeviceId::from("kbd"), kb),
            (DeviceId::from("pad"), pad_with_axes(&[0.3, 0.7])),
        ])
    }

    fn axis(i: u16) -> VirtualButton {
        VirtualButton::control(DeviceSelector::Id("pad".into()), ControlPath::axis(i))
    }

    #[test]
    fn or_is_max_and_is_min() {
        let snap = snapshot();
        assert_eq!(VirtualButton::any([axis(0), axis(1)]).evaluate(&snap), 0.7);
        assert_eq!(VirtualButton::all([axis(0), axis(1)]).evaluate(&snap), 0.3);
        assert_eq!(VirtualButton::Any(Vec::new()).evaluate(&snap), 0.0);
        assert_eq!(VirtualButton::All(Vec::new()).evaluate(&snap), 0.0);
    }

    #[test]
    fn missing_device_reads_zero() {
        let snap = snapshot();
        let gone = VirtualButton::control(DeviceSelector::Id("gone".into()), ControlPath::button(0));
        assert_eq!(gone.evaluate(&snap), 0.0);
        assert_eq!(VirtualButton::gamepad_button(3, 0).evaluate(&snap), 0.0);
    }

    #[test]
    fn transforms() {
        let snap = snapshot();
        assert_eq!(axis(1).negate().evaluate(&snap), -0.7);
        assert!((axis(0).scale(2.0, 0.5).evaluate(&snap) - 1.1).abs() < 1e-6);
        assert_eq!(axis(0).threshold(0.5).evaluate(&snap), 0.0);
        assert_eq!(axis(1).threshold(0.5).evaluate(&snap), 1.0);
        assert_eq!(axis(0).deadzone(0.4).evaluate(&snap), 0.0);
        assert_eq!(
            VirtualButton::two_way(VirtualButton::key(Key::D), VirtualButton::key(Key::A))
                .evaluate(&snap),
            1.0
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let snap = snapshot();
        let tree = VirtualButton::any([
            VirtualButton::key(Key::Space),
            VirtualButton::all([axis(0), VirtualButton::key(Key::D)]).scale(2.0, 0.0),
        ]);
        let first = tree.evaluate(&snap);
        let second = tree.evaluate(&snap);
        assert_eq!(first, second);
        assert!((first - 0.6).abs() < 1e-6);
    }

    #[test]
    fn profile_resolves_named_actions() {
        let profile = BindingProfile::new("default")
            .bind("jump", VirtualButton::key(Key::Space))
            .bind("right", VirtualButton::key(Key::D))
            .bind("throttle", axis(1));

        let out = profile.resolve(&snapshot());
        assert!(!out.is_active("jump"));
        assert!(out.is_active("right"));
        assert_eq!(out.value("throttle"), 0.7);
        assert_eq!(out.value("unbound"), 0.0);
        assert!(profile.get("jump").is_some());
    }

    #[test]
    fn trees_load_from_toml() {
        let text = r#"
            name = "p"

            [[bindings]]
            action_name = "move_x"

            [bindings.button.TwoWay.positive.Control]
            device = { First = "Keyboard" }
            control = { control_type = "Button", index = 68 }

            [bindings.button.TwoWay.negative.Control]
            device = { First = "Keyboard" }
            control = { control_type = "Button", index = 65 }
        "#;
        let profile: BindingProfile = toml::from_str(text).unwrap();
        let expected = BindingProfile::new("p").bind(
            "move_x",
            VirtualButton::two_way(VirtualButton::key(Key::D), VirtualButton::key(Key::A)),
        );
        assert_eq!(profile, expected);
        assert_eq!(profile.resolve(&snapshot()).value("move_x"), 1.0);
    }
}
