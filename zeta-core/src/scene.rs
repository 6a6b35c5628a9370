//! World-space shapes and the per-tick snapshot a world emits.
//!
//! Everything here is a plain value: a world builds a fresh [`WorldState`] on
//! every tick and nothing keeps identity across ticks.
use nalgebra::Vector3;

use crate::camera::ONE_DEGREE;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeLinecap {
    Butt,
    #[default]
    Round,
    Square,
}

impl StrokeLinecap {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Butt => "butt",
            Self::Round => "round",
            Self::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeLinejoin {
    Arcs,
    Bevel,
    #[default]
    Miter,
    MiterClip,
    Round,
}

impl StrokeLinejoin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arcs => "arcs",
            Self::Bevel => "bevel",
            Self::Miter => "miter",
            Self::MiterClip => "miter-clip",
            Self::Round => "round",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentBaseline {
    Auto,
    #[default]
    Baseline,
    Middle,
    Central,
    Hanging,
}

impl AlignmentBaseline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Baseline => "baseline",
            Self::Middle => "middle",
            Self::Central => "central",
            Self::Hanging => "hanging",
        }
    }
}

/// Circle style. `stroke_width` scales with distance.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub stroke_width: f64,
    pub stroke: String,
    pub stroke_opacity: f64,
    pub fill: String,
    pub fill_opacity: f64,
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            stroke_width: 0.15,
            stroke: "#aaa".into(),
            stroke_opacity: 1.0,
            fill: "#ddd".into(),
            fill_opacity: 1.0,
        }
    }
}

impl CircleStyle {
    #[must_use]
    pub fn stroke_width(mut self, value: f64) -> Self {
        self.stroke_width = value;
        self
    }

    #[must_use]
    pub fn stroke(mut self, value: impl Into<String>) -> Self {
        self.stroke = value.into();
        self
    }

    #[must_use]
    pub fn stroke_opacity(mut self, value: f64) -> Self {
        self.stroke_opacity = value;
        self
    }

    #[must_use]
    pub fn fill(mut self, value: impl Into<String>) -> Self {
        self.fill = value.into();
        self
    }

    #[must_use]
    pub fn fill_opacity(mut self, value: f64) -> Self {
        self.fill_opacity = value;
        self
    }
}

/// Polyline style. `stroke_width` scales with distance unless the path locks it.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub stroke_width: f64,
    pub stroke: String,
    pub stroke_opacity: f64,
    pub stroke_linecap: StrokeLinecap,
    pub stroke_linejoin: StrokeLinejoin,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke_width: 1.5,
            stroke: "#aaa".into(),
            stroke_opacity: 1.0,
            stroke_linecap: StrokeLinecap::Round,
            stroke_linejoin: StrokeLinejoin::Round,
        }
    }
}

impl PathStyle {
    #[must_use]
    pub fn stroke_width(mut self, value: f64) -> Self {
        self.stroke_width = value;
        self
    }

    #[must_use]
    pub fn stroke(mut self, value: impl Into<String>) -> Self {
        self.stroke = value.into();
        self
    }

    #[must_use]
    pub fn stroke_opacity(mut self, value: f64) -> Self {
        self.stroke_opacity = value;
        self
    }

    #[must_use]
    pub fn stroke_linecap(mut self, value: StrokeLinecap) -> Self {
        self.stroke_linecap = value;
        self
    }

    #[must_use]
    pub fn stroke_linejoin(mut self, value: StrokeLinejoin) -> Self {
        self.stroke_linejoin = value;
        self
    }
}

/// Rectangle style. `stroke_width` scales with distance.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleStyle {
    pub stroke_width: f64,
    pub stroke: String,
    pub stroke_opacity: f64,
    pub stroke_linejoin: StrokeLinejoin,
    pub fill: String,
    pub fill_opacity: f64,
}

impl Default for RectangleStyle {
    fn default() -> Self {
        Self {
            stroke_width: 1.5,
            stroke: "#aaa".into(),
            stroke_opacity: 1.0,
            stroke_linejoin: StrokeLinejoin::Miter,
            fill: "#ddd".into(),
            fill_opacity: 1.0,
        }
    }
}

impl RectangleStyle {
    #[must_use]
    pub fn stroke_width(mut self, value: f64) -> Self {
        self.stroke_width = value;
        self
    }

    #[must_use]
    pub fn stroke(mut self, value: impl Into<String>) -> Self {
        self.stroke = value.into();
        self
    }

    #[must_use]
    pub fn stroke_opacity(mut self, value: f64) -> Self {
        self.stroke_opacity = value;
        self
    }

    #[must_use]
    pub fn stroke_linejoin(mut self, value: StrokeLinejoin) -> Self {
        self.stroke_linejoin = value;
        self
    }

    #[must_use]
    pub fn fill(mut self, value: impl Into<String>) -> Self {
        self.fill = value.into();
        self
    }

    #[must_use]
    pub fn fill_opacity(mut self, value: f64) -> Self {
        self.fill_opacity = value;
        self
    }
}

/// Text style. `font_size` scales with distance unless the text locks it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_family: String,
    pub fill: String,
    pub fill_opacity: f64,
    pub alignment_baseline: AlignmentBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            font_family: "sans-serif".into(),
            fill: "#666".into(),
            fill_opacity: 1.0,
            alignment_baseline: AlignmentBaseline::Baseline,
        }
    }
}

impl TextStyle {
    #[must_use]
    pub fn font_size(mut self, value: f64) -> Self {
        self.font_size = value;
        self
    }

    #[must_use]
    pub fn font_family(mut self, value: impl Into<String>) -> Self {
        self.font_family = value.into();
        self
    }

    #[must_use]
    pub fn fill(mut self, value: impl Into<String>) -> Self {
        self.fill = value.into();
        self
    }

    #[must_use]
    pub fn alignment_baseline(mut self, value: AlignmentBaseline) -> Self {
        self.alignment_baseline = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle3d {
    pub position: Vector3<f64>,
    /// Scales with distance
    pub radius: f64,
    pub style: CircleStyle,
    pub visible: bool,
}

impl Circle3d {
    pub fn new(position: Vector3<f64>) -> Self {
        Self {
            position,
            radius: 1.0,
            style: CircleStyle::default(),
            visible: true,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: CircleStyle) -> Self {
        self.style = style;
        self
    }
}

/// Open or closed polyline
#[derive(Debug, Clone, PartialEq)]
pub struct Path3d {
    pub points: Vec<Vector3<f64>>,
    pub close: bool,
    pub lock_stroke_width: bool,
    pub style: PathStyle,
    pub visible: bool,
}

impl Path3d {
    pub fn new(points: Vec<Vector3<f64>>) -> Self {
        Self {
            points,
            close: false,
            lock_stroke_width: false,
            style: PathStyle::default(),
            visible: true,
        }
    }

    #[must_use]
    pub fn closed(mut self) -> Self {
        self.close = true;
        self
    }

    #[must_use]
    pub fn lock_stroke_width(mut self) -> Self {
        self.lock_stroke_width = true;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }
}

/// Rotation of a rectangle about its center, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub rotate_z: f64,
}

/// Flat rectangle stored as its four world-space corners
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle3d {
    pub corners: [Vector3<f64>; 4],
    pub style: RectangleStyle,
    pub visible: bool,
}

impl Rectangle3d {
    /// Rectangle of `width` x `height` in the local XY plane, rotated by
    /// `orientation` and centered on `position`.
    pub fn new(position: Vector3<f64>, width: f64, height: f64, orientation: Orientation) -> Self {
        let rotation = Transform::orientation3(
            orientation.rotate_x * ONE_DEGREE,
            orientation.rotate_y * ONE_DEGREE,
            orientation.rotate_z * ONE_DEGREE,
        );
        let (wh, hh) = (width / 2.0, height / 2.0);
        let corners = [
            Vector3::new(-wh, hh, 0.0),
            Vector3::new(wh, hh, 0.0),
            Vector3::new(wh, -hh, 0.0),
            Vector3::new(-wh, -hh, 0.0),
        ]
        .map(|corner| Transform::vector_multiply3(&rotation, &corner) + position);

        Self {
            corners,
            style: RectangleStyle::default(),
            visible: true,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: RectangleStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text3d {
    pub position: Vector3<f64>,
    pub text: String,
    pub lock_font_size: bool,
    pub style: TextStyle,
    pub visible: bool,
}

impl Text3d {
    pub fn new(position: Vector3<f64>, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            lock_font_size: false,
            style: TextStyle::default(),
            visible: true,
        }
    }

    #[must_use]
    pub fn lock_font_size(mut self) -> Self {
        self.lock_font_size = true;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

/// Paint order of a group's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Farthest child first
    #[default]
    Distance,
    /// Literal child order, for stacking that must not depend on depth
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupChild3d {
    Circle(Circle3d),
    Path(Path3d),
}

/// Children are expressed relative to the group's position
#[derive(Debug, Clone, PartialEq)]
pub struct Group3d {
    pub position: Vector3<f64>,
    pub children: Vec<GroupChild3d>,
    pub sort_by: SortBy,
    pub visible: bool,
}

impl Group3d {
    pub fn new(position: Vector3<f64>, children: Vec<GroupChild3d>) -> Self {
        Self {
            position,
            children,
            sort_by: SortBy::Distance,
            visible: true,
        }
    }

    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }
}

/// Snapshot of a world at one tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldState {
    pub groups: Vec<Group3d>,
    pub circles: Vec<Circle3d>,
    pub paths: Vec<Path3d>,
    pub rectangles: Vec<Rectangle3d>,
    pub texts: Vec<Text3d>,
}

impl WorldState {
    /// Number of shapes including group children.
    pub fn total(&self) -> usize {
        self.groups.len()
            + self.circles.len()
            + self.paths.len()
            + self.rectangles.len()
            + self.texts.len()
            + self.groups.iter().map(|g| g.children.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_corners_unrotated() {
        let rect = Rectangle3d::new(Vector3::new(1.0, 0.0, 0.0), 2.0, 4.0, Orientation::default());
        assert_eq!(rect.corners[0], Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(rect.corners[2], Vector3::new(2.0, -2.0, 0.0));
    }

    #[test]
    fn test_rectangle_corners_rotated() {
        let orientation = Orientation {
            rotate_y: 90.0,
            ..Orientation::default()
        };
        let rect = Rectangle3d::new(Vector3::zeros(), 2.0, 2.0, orientation);
        // x extent turns into z extent
        assert!((rect.corners[1] - Vector3::new(0.0, 1.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_total_counts_group_children() {
        let state = WorldState {
            groups: vec![Group3d::new(
                Vector3::zeros(),
                vec![GroupChild3d::Circle(Circle3d::new(Vector3::zeros()))],
            )],
            circles: vec![Circle3d::new(Vector3::zeros())],
            ..WorldState::default()
        };
        assert_eq!(state.total(), 3);
    }

    #[test]
    fn test_style_builders() {
        let style = CircleStyle::default().fill("#f00").fill_opacity(0.5).stroke_width(3.0);
        assert_eq!(style.fill, "#f00");
        assert_eq!(style.fill_opacity, 0.5);
        assert_eq!(style.stroke_width, 3.0);
        assert_eq!(style.stroke, "#aaa");

        let rect = RectangleStyle::default()
            .stroke_opacity(0.25)
            .stroke_linejoin(StrokeLinejoin::Round);
        assert_eq!(rect.stroke_opacity, 0.25);
        assert_eq!(rect.stroke_linejoin, StrokeLinejoin::Round);
        assert_eq!(rect.fill, "#ddd");
    }
}
