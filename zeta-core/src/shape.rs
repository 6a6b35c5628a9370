//! Render-space shapes with stable identity.
//!
//! A [`Collection`] is created once per world activation and afterwards only
//! mutated in place through [`Shapes::update`], so every shape keeps its
//! [`ShapeId`] and array position and a renderer can diff by identity.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::{Observable, Watch};
use crate::scene::{CircleStyle, PathStyle, RectangleStyle, SortBy, TextStyle};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Group,
    Circle,
    Polyline,
    Rectangle,
    Text,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Group,
        ShapeKind::Circle,
        ShapeKind::Polyline,
        ShapeKind::Rectangle,
        ShapeKind::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Circle => "circle",
            Self::Polyline => "polyline",
            Self::Rectangle => "rectangle",
            Self::Text => "text",
        }
    }
}

/// Process-unique shape identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    kind: ShapeKind,
    serial: u64,
}

impl ShapeId {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            serial: next_id(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.serial)
    }
}

/// Process-unique collection identity, also used as the tag on every node
/// the collection owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(u64);

impl CollectionId {
    pub fn new() -> Self {
        Self(next_id())
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prj-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleAttr {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAttr {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub id: ShapeId,
    pub attr: CircleAttr,
    pub style: CircleStyle,
    pub dist: f64,
    /// Position among the parent group's children
    pub index: Option<usize>,
    pub visible: bool,
    pub in_view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub id: ShapeId,
    /// Path instruction string
    pub d: String,
    pub style: PathStyle,
    pub dist: f64,
    pub index: Option<usize>,
    pub visible: bool,
    pub in_view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub id: ShapeId,
    pub d: String,
    pub style: RectangleStyle,
    pub dist: f64,
    pub visible: bool,
    pub in_view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub id: ShapeId,
    pub attr: TextAttr,
    pub style: TextStyle,
    pub dist: f64,
    pub visible: bool,
    pub in_view: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChildShape {
    Circle(Circle),
    Polyline(Polyline),
}

impl ChildShape {
    pub fn id(&self) -> ShapeId {
        match self {
            Self::Circle(c) => c.id,
            Self::Polyline(p) => p.id,
        }
    }

    pub fn dist(&self) -> f64 {
        match self {
            Self::Circle(c) => c.dist,
            Self::Polyline(p) => p.dist,
        }
    }

    pub fn is_hidden(&self) -> bool {
        match self {
            Self::Circle(c) => c.is_hidden(),
            Self::Polyline(p) => p.is_hidden(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupChild {
    pub index: usize,
    pub shape: ChildShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: ShapeId,
    pub children: Vec<GroupChild>,
    pub sort_by: SortBy,
    pub dist: f64,
    pub visible: bool,
    pub in_view: bool,
}

macro_rules! impl_hidden {
    ($($ty:ty),*) => {
        $(impl $ty {
            /// Hidden when switched off by the world or outside the view volume.
            pub fn is_hidden(&self) -> bool {
                !self.visible || !self.in_view
            }
        })*
    };
}

impl_hidden!(Circle, Polyline, Rectangle, Text, Group);

/// Render-space shapes of one activation, grouped by kind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub groups: Vec<Group>,
    pub circles: Vec<Circle>,
    pub polylines: Vec<Polyline>,
    pub rectangles: Vec<Rectangle>,
    pub texts: Vec<Text>,
}

impl Collection {
    pub fn len(&self, kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Group => self.groups.len(),
            ShapeKind::Circle => self.circles.len(),
            ShapeKind::Polyline => self.polylines.len(),
            ShapeKind::Rectangle => self.rectangles.len(),
            ShapeKind::Text => self.texts.len(),
        }
    }

    /// Ids of the top-level shapes of `kind`, in array order.
    pub fn ids(&self, kind: ShapeKind) -> Vec<ShapeId> {
        match kind {
            ShapeKind::Group => self.groups.iter().map(|s| s.id).collect(),
            ShapeKind::Circle => self.circles.iter().map(|s| s.id).collect(),
            ShapeKind::Polyline => self.polylines.iter().map(|s| s.id).collect(),
            ShapeKind::Rectangle => self.rectangles.iter().map(|s| s.id).collect(),
            ShapeKind::Text => self.texts.iter().map(|s| s.id).collect(),
        }
    }

    /// Number of shapes including group children.
    pub fn total(&self) -> usize {
        ShapeKind::ALL.iter().map(|&kind| self.len(kind)).sum::<usize>()
            + self.groups.iter().map(|g| g.children.len()).sum::<usize>()
    }
}

/// Owner of one [`Collection`]. Every update is followed by a change
/// notification to subscribers.
#[derive(Debug)]
pub struct Shapes {
    id: CollectionId,
    collection: Observable<Collection>,
}

impl Shapes {
    pub fn new(collection: Collection) -> Self {
        let id = CollectionId::new();
        log::debug!("new shapes {id} with {} shapes", collection.total());
        Self {
            id,
            collection: Observable::new(collection),
        }
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Applies `mutator` to the collection, then notifies.
    pub fn update(&self, mutator: impl FnOnce(&mut Collection)) {
        self.collection.modify(mutator);
    }

    pub fn read<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        self.collection.read(f)
    }

    pub fn subscribe(&self) -> Watch<Collection> {
        self.collection.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle() -> Circle {
        Circle {
            id: ShapeId::new(ShapeKind::Circle),
            attr: CircleAttr { cx: 0.0, cy: 0.0, r: 1.0 },
            style: CircleStyle::default(),
            dist: 1.0,
            index: None,
            visible: true,
            in_view: true,
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ShapeId::new(ShapeKind::Circle);
        let b = ShapeId::new(ShapeKind::Circle);
        assert_ne!(a, b);
        assert_ne!(CollectionId::new(), CollectionId::new());
        assert!(a.to_string().starts_with("circle-"));
    }

    #[test]
    fn test_hidden() {
        let mut c = circle();
        assert!(!c.is_hidden());
        c.in_view = false;
        assert!(c.is_hidden());
        c.in_view = true;
        c.visible = false;
        assert!(c.is_hidden());
    }

    #[test]
    fn test_update_notifies() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle()],
            ..Collection::default()
        });
        let mut watch = shapes.subscribe();
        assert!(watch.poll_with(|c| c.circles.len()).is_some());

        shapes.update(|c| c.circles[0].attr.cx = 5.0);
        let cx = watch.poll_with(|c| c.circles[0].attr.cx);
        assert_eq!(cx, Some(5.0));
        assert_eq!(shapes.read(|c| c.total()), 1);
    }
}
