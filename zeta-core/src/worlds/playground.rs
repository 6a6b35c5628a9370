use nalgebra::Vector3;

use crate::scene::{
    Circle3d, CircleStyle, Group3d, GroupChild3d, Orientation, Path3d, PathStyle, Rectangle3d,
    RectangleStyle, SortBy, Text3d, WorldState,
};
use crate::world::WorldContent;

/// A bit of every shape kind: axis lines, a tilted square, a label that
/// flips text and a stack of translucent discs painted in index order.
#[derive(Debug)]
pub struct Playground {
    base: WorldState,
}

impl Playground {
    pub const NAME: &'static str = "Playground";

    pub fn new() -> Self {
        let axis = |from: Vector3<f64>, to: Vector3<f64>, color: &str| {
            Path3d::new(vec![from, to]).with_style(
                PathStyle::default()
                    .stroke_width(3.0)
                    .stroke(color)
                    .stroke_opacity(0.5),
            )
        };

        let disc = |x: f64, color: &str| {
            GroupChild3d::Circle(
                Circle3d::new(Vector3::new(x, 0.0, 0.0))
                    .with_style(
                        CircleStyle::default().fill(color).fill_opacity(0.6).stroke_opacity(0.0),
                    ),
            )
        };

        let base = WorldState {
            groups: vec![Group3d::new(
                Vector3::new(0.0, 2.0, 0.0),
                vec![disc(-0.5, "#f80"), disc(0.0, "#8f0"), disc(0.5, "#08f")],
            )
            .sort_by(SortBy::Index)],
            circles: vec![Circle3d::new(Vector3::zeros())
                .with_radius(2.5)
                .with_style(CircleStyle::default().stroke_width(0.5).stroke("#fff").fill("#f80"))],
            paths: vec![
                axis(Vector3::new(-1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), "#f00"),
                axis(Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.0, 1.0, 0.0), "#0f0"),
                axis(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0), "#00f"),
            ],
            rectangles: vec![Rectangle3d::new(
                Vector3::zeros(),
                3.0,
                3.0,
                Orientation {
                    rotate_x: 90.0,
                    ..Orientation::default()
                },
            )
            .with_style(
                RectangleStyle::default()
                    .stroke_width(1.0)
                    .stroke("#00f")
                    .fill("#4af")
                    .fill_opacity(0.2),
            )],
            texts: vec![Text3d::new(Vector3::new(1.0, 0.0, 0.0), "Hello")],
        };
        Self { base }
    }
}

impl Default for Playground {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldContent for Playground {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn storage_key(&self) -> Option<&str> {
        Some("playgroundConfig")
    }

    fn snapshot_at(&mut self, t: u64) -> WorldState {
        let mut state = self.base.clone();
        if t % 100 >= 50 {
            if let Some(label) = state.texts.first_mut() {
                label.text = "World".into();
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_flips() {
        let mut playground = Playground::new();
        assert_eq!(playground.snapshot_at(10).texts[0].text, "Hello");
        assert_eq!(playground.snapshot_at(60).texts[0].text, "World");
        assert_eq!(playground.snapshot_at(110).texts[0].text, "Hello");
    }

    #[test]
    fn test_disc_stack_sorted_by_index() {
        let state = Playground::new().snapshot_at(0);
        assert_eq!(state.groups[0].sort_by, SortBy::Index);
        assert_eq!(state.groups[0].children.len(), 3);
    }
}
