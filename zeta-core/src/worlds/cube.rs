use nalgebra::Vector3;

use crate::camera::ONE_DEGREE;
use crate::scene::{Circle3d, WorldState};
use crate::world::WorldContent;

/// Eight corners of a cube, breathing in and out
#[derive(Debug, Default)]
pub struct Cube;

impl Cube {
    pub const NAME: &'static str = "Cube";
}

impl WorldContent for Cube {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn storage_key(&self) -> Option<&str> {
        Some("cubeConfig")
    }

    fn snapshot_at(&mut self, t: u64) -> WorldState {
        let amp = (5.0 * t as f64 * ONE_DEGREE).cos();
        let mut circles = Vec::with_capacity(8);
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    circles.push(Circle3d::new(Vector3::new(x, y, z) * amp));
                }
            }
        }
        WorldState {
            circles,
            ..WorldState::default()
        }
    }
}
