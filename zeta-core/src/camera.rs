//! Perspective camera state
use std::fmt;

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::channel::{Observable, Watch};
use crate::transform::{Axis, Transform};

pub const ONE_DEGREE: f64 = std::f64::consts::PI / 180.0;

/// Camera pose: world position plus rotation angles (radians) about X, Y and Z
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perspective {
    pub position: Vector3<f64>,
    pub angle_x: f64,
    pub angle_y: f64,
    pub angle_z: f64,
}

impl Perspective {
    pub fn new(position: Vector3<f64>, angle_x: f64, angle_y: f64, angle_z: f64) -> Self {
        Self {
            position,
            angle_x,
            angle_y,
            angle_z,
        }
    }

    /// Camera-to-world transform `Rz · Ry · Rx · T`.
    ///
    /// Its inverse maps world points into eye space.
    pub fn transform(&self) -> Matrix4<f64> {
        let rz = Transform::rotation(Axis::Z, self.angle_z);
        let ry = Transform::rotation(Axis::Y, self.angle_y);
        let rx = Transform::rotation(Axis::X, self.angle_x);
        let t = Transform::translation(&self.position);

        let m = Transform::multiply(&Transform::identity(), &rz);
        let m = Transform::multiply(&m, &ry);
        let m = Transform::multiply(&m, &rx);
        Transform::multiply(&m, &t)
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, -7.5),
            angle_x: 45.0 * ONE_DEGREE,
            angle_y: 45.0 * ONE_DEGREE,
            angle_z: 0.0,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Perspective: Position (X {:.1}, Y {:.1}, Z {:.1}), \
             Angle-X {:.0}°, Angle-Y {:.0}°, Angle-Z {:.0}°",
            self.position.x,
            self.position.y,
            self.position.z,
            self.angle_x.to_degrees(),
            self.angle_y.to_degrees(),
            self.angle_z.to_degrees(),
        )
    }
}

/// Observable camera. Every operation clones the current perspective,
/// mutates the clone and publishes it as a whole.
#[derive(Debug)]
pub struct Camera {
    state: Observable<Perspective>,
}

impl Camera {
    pub fn new(perspective: Perspective) -> Self {
        Self {
            state: Observable::new(perspective),
        }
    }

    pub fn perspective(&self) -> Perspective {
        self.state.latest()
    }

    pub fn subscribe(&self) -> Watch<Perspective> {
        self.state.subscribe()
    }

    pub fn move_x(&self, delta: f64) {
        self.transition(|p| p.position.x += delta);
    }

    pub fn move_y(&self, delta: f64) {
        self.transition(|p| p.position.y += delta);
    }

    pub fn move_z(&self, delta: f64) {
        self.transition(|p| p.position.z += delta);
    }

    pub fn rotate_x(&self, delta: f64) {
        self.transition(|p| p.angle_x += delta);
    }

    pub fn rotate_y(&self, delta: f64) {
        self.transition(|p| p.angle_y += delta);
    }

    pub fn rotate_z(&self, delta: f64) {
        self.transition(|p| p.angle_z += delta);
    }

    /// Replaces the whole pose, e.g. with a world's saved camera.
    pub fn mount(&self, perspective: &Perspective) {
        self.state.publish(perspective.clone());
    }

    fn transition(&self, f: impl FnOnce(&mut Perspective)) {
        let mut next = self.state.latest();
        f(&mut next);
        self.state.publish(next);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Perspective::default())
    }
}

/// Keyboard bindings for moving the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
}

impl CameraKey {
    const STEP: f64 = 0.1;

    /// Maps a key name (`"w"`, `"ArrowUp"`, `","`, ...) to a binding.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "w" => Self::Forward,
            "s" => Self::Back,
            "a" => Self::Left,
            "d" => Self::Right,
            "r" => Self::Up,
            "f" => Self::Down,
            "ArrowUp" => Self::PitchUp,
            "ArrowDown" => Self::PitchDown,
            "ArrowLeft" => Self::YawLeft,
            "ArrowRight" => Self::YawRight,
            "," => Self::RollLeft,
            "." => Self::RollRight,
            _ => return None,
        })
    }

    pub fn apply(self, camera: &Camera) {
        match self {
            Self::Forward => camera.move_z(Self::STEP),
            Self::Back => camera.move_z(-Self::STEP),
            Self::Left => camera.move_x(-Self::STEP),
            Self::Right => camera.move_x(Self::STEP),
            Self::Up => camera.move_y(Self::STEP),
            Self::Down => camera.move_y(-Self::STEP),
            Self::PitchUp => camera.rotate_x(ONE_DEGREE),
            Self::PitchDown => camera.rotate_x(-ONE_DEGREE),
            Self::YawLeft => camera.rotate_y(ONE_DEGREE),
            Self::YawRight => camera.rotate_y(-ONE_DEGREE),
            Self::RollLeft => camera.rotate_z(-ONE_DEGREE),
            Self::RollRight => camera.rotate_z(ONE_DEGREE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_perspective() {
        let p = Perspective::default();
        assert_eq!(p.position, Vector3::new(0.0, 0.0, -7.5));
        assert!((p.angle_x - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((p.angle_y - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(p.angle_z, 0.0);
    }

    #[test]
    fn test_moves_and_rotations_accumulate() {
        let camera = Camera::default();
        camera.move_x(1.0);
        camera.move_y(-2.0);
        camera.move_z(0.5);
        camera.rotate_z(0.25);

        let p = camera.perspective();
        assert!((p.position - Vector3::new(1.0, -2.0, -7.0)).norm() < 1e-12);
        assert!((p.angle_z - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_subscribers_receive_current_and_later_states() {
        let camera = Camera::default();
        camera.rotate_x(0.1);

        let mut watch = camera.subscribe();
        let replayed = watch.poll().expect("replays current pose");
        assert!((replayed.angle_x - (45.0 * ONE_DEGREE + 0.1)).abs() < 1e-12);
        assert!(watch.poll().is_none());

        camera.move_z(1.0);
        assert!((watch.poll().unwrap().position.z + 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_emitted_states_do_not_alias() {
        let camera = Camera::default();
        let before = camera.perspective();
        camera.move_x(3.0);
        assert_eq!(before.position.x, 0.0);
        assert_eq!(camera.perspective().position.x, 3.0);
    }

    #[test]
    fn test_mount_replaces_whole_state() {
        let camera = Camera::default();
        camera.move_x(5.0);
        let saved = Perspective::new(Vector3::new(1.0, 2.0, 3.0), 0.1, 0.2, 0.3);
        camera.mount(&saved);
        assert_eq!(camera.perspective(), saved);
    }

    #[test]
    fn test_keyboard_bindings() {
        let camera = Camera::new(Perspective::new(Vector3::zeros(), 0.0, 0.0, 0.0));
        CameraKey::from_key("w").unwrap().apply(&camera);
        CameraKey::from_key("ArrowLeft").unwrap().apply(&camera);
        assert!(CameraKey::from_key("q").is_none());

        let p = camera.perspective();
        assert!((p.position.z - 0.1).abs() < 1e-12);
        assert!((p.angle_y - ONE_DEGREE).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let text = Perspective::default().to_string();
        assert_eq!(
            text,
            "Perspective: Position (X 0.0, Y 0.0, Z -7.5), Angle-X 45°, Angle-Y 45°, Angle-Z 0°"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let p = Perspective::new(Vector3::new(1.5, 0.0, -3.0), 0.1, 0.2, 0.3);
        let json = serde_json::to_string(&p).unwrap();
        let back: Perspective = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
