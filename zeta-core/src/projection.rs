//! World space to screen space projection.
//!
//! A [`Projector`] turns a [`WorldState`] seen through a [`Perspective`] into
//! render-space shapes. The first pass materializes a [`Shapes`] collection,
//! later passes rewrite it in place so shape identity survives.
use std::fmt::Write as _;

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::Perspective;
use crate::path_data::PathData;
use crate::scene::{Circle3d, Group3d, GroupChild3d, Path3d, Rectangle3d, Text3d, WorldState};
use crate::shape::{
    ChildShape, Circle, CircleAttr, Collection, Group, GroupChild, Polyline, Rectangle, ShapeId,
    ShapeKind, Shapes, Text, TextAttr,
};
use crate::transform::Transform;

/// Depth of a point that cannot be shown
pub const INVALID_DIST: f64 = -1.0;

pub const REFERENCE_HEIGHT: f64 = 720.0;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("camera transform is not invertible: {0}")]
    SingularTransform(String),
}

/// Pixel size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Height over width, applied to the horizontal axis
    pub fn inverted_ratio(&self) -> f64 {
        self.height / self.width
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorConfig {
    pub near: f64,
    pub far: f64,
    pub distance_factor: f64,
    pub reference_height: f64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 30.0,
            distance_factor: 20.0,
            reference_height: REFERENCE_HEIGHT,
        }
    }
}

/// Depth of an eye-space `z`: 1 at the near plane, growing towards the far
/// plane, [`INVALID_DIST`] outside `[near, far)`.
pub fn distance_to_camera(z: f64, config: &ProjectorConfig) -> f64 {
    if !z.is_finite() || z < config.near || z >= config.far {
        return INVALID_DIST;
    }
    z * (config.far - config.near) / (config.near * (config.far - z))
}

/// Scales a style magnitude by depth. Zero when `dist` is not positive.
pub fn scale_by_distance(
    base: f64,
    dist: f64,
    viewport: &Viewport,
    config: &ProjectorConfig,
) -> f64 {
    if dist > 0.0 {
        base / dist * config.distance_factor * (viewport.height / config.reference_height)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScreenPoint {
    left: f64,
    top: f64,
    dist: f64,
}

/// Camera inverse plus viewport for one pass. A blind lens marks every
/// point invalid.
struct Lens<'a> {
    inverse: Option<Matrix4<f64>>,
    viewport: &'a Viewport,
    config: &'a ProjectorConfig,
}

impl Lens<'_> {
    fn point(&self, p: &Vector3<f64>) -> ScreenPoint {
        let (plane, dist) = match &self.inverse {
            Some(inverse) => {
                let v = Transform::vector_multiply(inverse, p);
                let dist = distance_to_camera(v.z, self.config);
                if dist > 0.0 && v.x.is_finite() && v.y.is_finite() {
                    ((v.x / v.z, v.y / v.z), dist)
                } else {
                    ((0.0, 0.0), INVALID_DIST)
                }
            }
            None => ((0.0, 0.0), INVALID_DIST),
        };

        let (hw, hh) = (self.viewport.half_width(), self.viewport.half_height());
        ScreenPoint {
            left: hw * plane.0 * self.viewport.inverted_ratio() + hw,
            top: -hh * plane.1 + hh,
            dist,
        }
    }

    fn scale(&self, base: f64, dist: f64) -> f64 {
        scale_by_distance(base, dist, self.viewport, self.config)
    }

    /// Locked magnitudes keep their raw value, but only while in view.
    fn locked(&self, base: f64, dist: f64) -> f64 {
        if dist > 0.0 {
            base
        } else {
            0.0
        }
    }

    /// Writes the path string of `points` into `d` and returns the nearest
    /// depth, or [`INVALID_DIST`] when any point is culled.
    fn path(
        &self,
        d: &mut String,
        points: impl IntoIterator<Item = Vector3<f64>>,
        close: bool,
    ) -> f64 {
        let mut data = PathData::new();
        let mut dist: Option<f64> = None;
        for point in points {
            let screen = self.point(&point);
            data.push_point(screen.left, screen.top);
            dist = Some(dist.map_or(screen.dist, |d: f64| d.min(screen.dist)));
        }
        if close {
            data.close();
        }
        d.clear();
        // writing into a String cannot fail
        let _ = write!(d, "{data}");
        dist.unwrap_or(INVALID_DIST)
    }

    fn write_circle(&self, target: &mut Circle, circle: &Circle3d, offset: &Vector3<f64>) {
        let screen = self.point(&(circle.position + offset));
        target.attr.cx = screen.left;
        target.attr.cy = screen.top;
        target.attr.r = self.scale(circle.radius, screen.dist);
        target.style.clone_from(&circle.style);
        target.style.stroke_width = self.scale(circle.style.stroke_width, screen.dist);
        target.dist = screen.dist;
        target.visible = circle.visible;
        target.in_view = screen.dist > 0.0;
    }

    fn write_polyline(&self, target: &mut Polyline, path: &Path3d, offset: &Vector3<f64>) {
        let dist = self.path(&mut target.d, path.points.iter().map(|p| p + offset), path.close);
        target.style.clone_from(&path.style);
        target.style.stroke_width = if path.lock_stroke_width {
            self.locked(path.style.stroke_width, dist)
        } else {
            self.scale(path.style.stroke_width, dist)
        };
        target.dist = dist;
        target.visible = path.visible;
        target.in_view = dist > 0.0;
    }

    fn write_rectangle(&self, target: &mut Rectangle, rectangle: &Rectangle3d) {
        let dist = self.path(&mut target.d, rectangle.corners.iter().copied(), true);
        target.style.clone_from(&rectangle.style);
        target.style.stroke_width = self.scale(rectangle.style.stroke_width, dist);
        target.dist = dist;
        target.visible = rectangle.visible;
        target.in_view = dist > 0.0;
    }

    fn write_text(&self, target: &mut Text, text: &Text3d) {
        let screen = self.point(&text.position);
        target.attr.x = screen.left;
        target.attr.y = screen.top;
        target.attr.text.clone_from(&text.text);
        target.style.clone_from(&text.style);
        target.style.font_size = if text.lock_font_size {
            self.locked(text.style.font_size, screen.dist)
        } else {
            self.scale(text.style.font_size, screen.dist)
        };
        target.dist = screen.dist;
        target.visible = text.visible;
        target.in_view = screen.dist > 0.0;
    }

    /// Group depth and view state follow its anchor, not its children.
    fn write_anchor(&self, target: &mut Group, group: &Group3d) {
        let anchor = self.point(&group.position);
        target.sort_by = group.sort_by;
        target.dist = anchor.dist;
        target.visible = group.visible;
        target.in_view = anchor.dist > 0.0;
    }

    fn write_group(&self, target: &mut Group, group: &Group3d) {
        for (child, source) in target.children.iter_mut().zip(&group.children) {
            match (&mut child.shape, source) {
                (ChildShape::Circle(c), GroupChild3d::Circle(s)) => {
                    self.write_circle(c, s, &group.position)
                }
                (ChildShape::Polyline(p), GroupChild3d::Path(s)) => {
                    self.write_polyline(p, s, &group.position)
                }
                (existing, _) => {
                    log::error!(
                        "group {} child {} changed kind, skipping (render child is {})",
                        target.id,
                        child.index,
                        existing.id()
                    );
                }
            }
        }
        self.write_anchor(target, group);
    }

    fn circle(&self, circle: &Circle3d, offset: &Vector3<f64>, index: Option<usize>) -> Circle {
        let mut shape = Circle {
            id: ShapeId::new(ShapeKind::Circle),
            attr: CircleAttr { cx: 0.0, cy: 0.0, r: 0.0 },
            style: circle.style.clone(),
            dist: INVALID_DIST,
            index,
            visible: circle.visible,
            in_view: false,
        };
        self.write_circle(&mut shape, circle, offset);
        shape
    }

    fn polyline(&self, path: &Path3d, offset: &Vector3<f64>, index: Option<usize>) -> Polyline {
        let mut shape = Polyline {
            id: ShapeId::new(ShapeKind::Polyline),
            d: String::new(),
            style: path.style.clone(),
            dist: INVALID_DIST,
            index,
            visible: path.visible,
            in_view: false,
        };
        self.write_polyline(&mut shape, path, offset);
        shape
    }

    fn rectangle(&self, rectangle: &Rectangle3d) -> Rectangle {
        let mut shape = Rectangle {
            id: ShapeId::new(ShapeKind::Rectangle),
            d: String::new(),
            style: rectangle.style.clone(),
            dist: INVALID_DIST,
            visible: rectangle.visible,
            in_view: false,
        };
        self.write_rectangle(&mut shape, rectangle);
        shape
    }

    fn text(&self, text: &Text3d) -> Text {
        let mut shape = Text {
            id: ShapeId::new(ShapeKind::Text),
            attr: TextAttr {
                x: 0.0,
                y: 0.0,
                text: String::new(),
            },
            style: text.style.clone(),
            dist: INVALID_DIST,
            visible: text.visible,
            in_view: false,
        };
        self.write_text(&mut shape, text);
        shape
    }

    fn group(&self, group: &Group3d) -> Group {
        let children = group
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| GroupChild {
                index,
                shape: match child {
                    GroupChild3d::Circle(c) => {
                        ChildShape::Circle(self.circle(c, &group.position, Some(index)))
                    }
                    GroupChild3d::Path(p) => {
                        ChildShape::Polyline(self.polyline(p, &group.position, Some(index)))
                    }
                },
            })
            .collect();
        let mut shape = Group {
            id: ShapeId::new(ShapeKind::Group),
            children,
            sort_by: group.sort_by,
            dist: INVALID_DIST,
            visible: group.visible,
            in_view: false,
        };
        self.write_anchor(&mut shape, group);
        shape
    }

    /// Builds a collection with new identities.
    fn frame(&self, state: &WorldState) -> Collection {
        let origin = Vector3::zeros();
        Collection {
            groups: state.groups.iter().map(|g| self.group(g)).collect(),
            circles: state.circles.iter().map(|c| self.circle(c, &origin, None)).collect(),
            polylines: state.paths.iter().map(|p| self.polyline(p, &origin, None)).collect(),
            rectangles: state.rectangles.iter().map(|r| self.rectangle(r)).collect(),
            texts: state.texts.iter().map(|t| self.text(t)).collect(),
        }
    }

    /// Rewrites `current` in place, position by position. Only a change in
    /// shape counts replaces it with a new collection.
    fn refresh(&self, current: &mut Collection, state: &WorldState) {
        if !same_structure(current, state) {
            log::warn!(
                "world changed shape counts ({} -> {} shapes), rebuilding collection",
                current.total(),
                state.total()
            );
            *current = self.frame(state);
            return;
        }

        let origin = Vector3::zeros();
        for (group, source) in current.groups.iter_mut().zip(&state.groups) {
            self.write_group(group, source);
        }
        for (circle, source) in current.circles.iter_mut().zip(&state.circles) {
            self.write_circle(circle, source, &origin);
        }
        for (polyline, source) in current.polylines.iter_mut().zip(&state.paths) {
            self.write_polyline(polyline, source, &origin);
        }
        for (rectangle, source) in current.rectangles.iter_mut().zip(&state.rectangles) {
            self.write_rectangle(rectangle, source);
        }
        for (text, source) in current.texts.iter_mut().zip(&state.texts) {
            self.write_text(text, source);
        }
    }
}

/// Result of a pure projection pass. Its shapes carry fresh identities.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub collection: Collection,
}

#[derive(Debug)]
pub struct Projector {
    viewport: Viewport,
    config: ProjectorConfig,
    shapes: Option<Shapes>,
}

impl Projector {
    pub fn new(viewport: Viewport, config: ProjectorConfig) -> Self {
        Self {
            viewport,
            config,
            shapes: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// The collection created by [`Projector::activate`].
    pub fn shapes(&self) -> Option<&Shapes> {
        self.shapes.as_ref()
    }

    fn lens(&self, perspective: &Perspective) -> Result<Lens<'_>, ProjectError> {
        let inverse = Transform::inverse(&perspective.transform())
            .ok_or_else(|| ProjectError::SingularTransform(perspective.to_string()))?;
        Ok(Lens {
            inverse: Some(inverse),
            viewport: &self.viewport,
            config: &self.config,
        })
    }

    pub fn project(
        &self,
        state: &WorldState,
        perspective: &Perspective,
    ) -> Result<Frame, ProjectError> {
        let lens = self.lens(perspective)?;
        Ok(Frame {
            collection: lens.frame(state),
        })
    }

    /// Materializes a new collection, one shape per world shape in the same
    /// order. A singular camera yields a collection with nothing in view.
    pub fn activate(&mut self, state: &WorldState, perspective: &Perspective) -> &Shapes {
        let collection = match self.lens(perspective) {
            Ok(lens) => lens.frame(state),
            Err(e) => {
                log::warn!("activating with nothing in view: {e}");
                Lens {
                    inverse: None,
                    viewport: &self.viewport,
                    config: &self.config,
                }
                .frame(state)
            }
        };
        self.shapes.insert(Shapes::new(collection))
    }

    /// Rewrites the active collection in place. A singular camera leaves the
    /// collection untouched.
    pub fn update(
        &self,
        state: &WorldState,
        perspective: &Perspective,
    ) -> Result<(), ProjectError> {
        let Some(shapes) = &self.shapes else {
            log::debug!("update before activation ignored");
            return Ok(());
        };
        let lens = self.lens(perspective)?;
        shapes.update(|collection| lens.refresh(collection, state));
        Ok(())
    }
}

fn same_structure(current: &Collection, state: &WorldState) -> bool {
    current.groups.len() == state.groups.len()
        && current.circles.len() == state.circles.len()
        && current.polylines.len() == state.paths.len()
        && current.rectangles.len() == state.rectangles.len()
        && current.texts.len() == state.texts.len()
        && current
            .groups
            .iter()
            .zip(&state.groups)
            .all(|(a, b)| a.children.len() == b.children.len())
}
