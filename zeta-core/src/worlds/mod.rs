//! Demo worlds shipped with the front-ends.
mod cartesian_axes;
mod cube;
mod playground;

pub use cartesian_axes::CartesianAxes;
pub use cube::Cube;
pub use playground::Playground;

use crate::world::WorldContent;

/// World ids the front-ends can switch to, with their names.
pub const WORLDS: [(u32, &str); 3] = [
    (1, CartesianAxes::NAME),
    (2, Playground::NAME),
    (3, Cube::NAME),
];

/// Unknown ids fall back to the cartesian axes.
pub fn create_world(id: u32) -> Box<dyn WorldContent> {
    match id {
        1 => Box::new(CartesianAxes),
        2 => Box::new(Playground::new()),
        3 => Box::new(Cube),
        _ => {
            log::warn!("unknown world {id}, showing {}", CartesianAxes::NAME);
            Box::new(CartesianAxes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_world_by_id() {
        for (id, name) in WORLDS {
            assert_eq!(create_world(id).name(), name);
        }
        assert_eq!(create_world(42).name(), CartesianAxes::NAME);
    }
}
