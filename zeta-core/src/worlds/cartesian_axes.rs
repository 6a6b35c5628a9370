use nalgebra::Vector3;

use crate::scene::{Circle3d, CircleStyle, WorldState};
use crate::world::WorldContent;

const SIZE: f64 = 5.0;
const SPACING: f64 = 0.15;
const COLOR_PERIOD: u64 = 50;

/// Dotted X, Y and Z axes around a marked origin. The axis colors rotate
/// every 50 ticks.
#[derive(Debug, Default)]
pub struct CartesianAxes;

impl CartesianAxes {
    pub const NAME: &'static str = "Cartesian Axes";

    fn origin_style() -> CircleStyle {
        CircleStyle::default()
            .stroke_width(3.0)
            .stroke("#000")
            .stroke_opacity(0.75)
            .fill("#fff")
    }

    fn dot_style(color: &str) -> CircleStyle {
        CircleStyle::default()
            .stroke_width(0.5)
            .stroke(color)
            .stroke_opacity(0.0)
            .fill(color)
            .fill_opacity(0.5)
    }
}

impl WorldContent for CartesianAxes {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn storage_key(&self) -> Option<&str> {
        Some("cartesianAxesConfig")
    }

    fn snapshot_at(&mut self, t: u64) -> WorldState {
        let mut colors = ["#f00", "#0f0", "#00f"];
        colors.rotate_left(((t / COLOR_PERIOD) % 3) as usize);
        let styles = colors.map(Self::dot_style);

        let mut circles = vec![Circle3d::new(Vector3::zeros())
            .with_radius(2.0)
            .with_style(Self::origin_style())];
        let steps = (SIZE / SPACING).floor() as usize;
        for step in 1..=steps {
            let d = step as f64 * SPACING;
            for (axis, style) in styles.iter().enumerate() {
                for sign in [-1.0, 1.0] {
                    let mut position = Vector3::zeros();
                    position[axis] = sign * d;
                    circles.push(Circle3d::new(position).with_style(style.clone()));
                }
            }
        }

        WorldState {
            circles,
            ..WorldState::default()
        }
    }
}
