//! Persistent render surface.
//!
//! The [`Stage`] mirrors every registered [`Shapes`] collection into nodes of
//! a [`RenderBackend`]. Nodes are created once and afterwards only patched,
//! keyed by [`ShapeId`], and reordered back to front after every pass.
use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::channel::Watch;
use crate::scene::{CircleStyle, PathStyle, RectangleStyle, SortBy, TextStyle};
use crate::shape::{
    ChildShape, CircleAttr, Collection, CollectionId, ShapeId, ShapeKind, Shapes, TextAttr,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("render container {0:?} not found")]
    MissingContainer(String),
    #[error("no node for shape {0}")]
    UnknownNode(ShapeId),
    #[error("parent node {0} not found")]
    UnknownParent(ShapeId),
    #[error("backend failure: {0}")]
    Platform(String),
}

/// Drawable attributes of one node. Groups carry none.
#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    Circle { attr: CircleAttr, style: CircleStyle },
    Polyline { d: String, style: PathStyle },
    Rectangle { d: String, style: RectangleStyle },
    Text { attr: TextAttr, style: TextStyle },
}

/// A retained scene graph the stage can drive
pub trait RenderBackend {
    /// Creates a node for `id`, tagged with `collection`. Group children get
    /// their group as `parent`.
    fn create_node(
        &mut self,
        kind: ShapeKind,
        id: ShapeId,
        collection: CollectionId,
        parent: Option<ShapeId>,
    ) -> Result<(), BackendError>;

    fn set_attributes(&mut self, id: ShapeId, attributes: &Attributes) -> Result<(), BackendError>;

    fn set_hidden(&mut self, id: ShapeId, hidden: bool) -> Result<(), BackendError>;

    /// Moves the listed nodes into paint order, first painted first. With no
    /// `parent` the top-level nodes of `collection` are reordered.
    fn set_draw_order(
        &mut self,
        collection: CollectionId,
        parent: Option<ShapeId>,
        order: &[ShapeId],
    ) -> Result<(), BackendError>;

    /// Removes every node tagged with `collection`, returning how many went.
    fn remove_nodes(&mut self, collection: CollectionId) -> Result<usize, BackendError>;

    fn set_background(&mut self, color: Option<&str>) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Creation order of node kinds. Kinds left out are created last.
    pub kind_order: Vec<ShapeKind>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            kind_order: ShapeKind::ALL.to_vec(),
        }
    }
}

impl StageConfig {
    fn resolved_order(&self) -> Vec<ShapeKind> {
        let mut order: Vec<ShapeKind> = Vec::with_capacity(ShapeKind::ALL.len());
        for kind in self.kind_order.iter().chain(ShapeKind::ALL.iter()) {
            if !order.contains(kind) {
                order.push(*kind);
            }
        }
        order
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NodeState {
    attributes: Option<Attributes>,
    hidden: Option<bool>,
}

/// Backend-side state of one collection
#[derive(Debug, Default)]
struct Mirror {
    created: bool,
    layout: BTreeMap<ShapeKind, Vec<ShapeId>>,
    children: HashMap<ShapeId, Vec<ShapeId>>,
    nodes: HashMap<ShapeId, NodeState>,
    top_order: Vec<ShapeId>,
    child_order: HashMap<ShapeId, Vec<ShapeId>>,
}

impl Mirror {
    fn matches(&self, collection: &Collection) -> bool {
        ShapeKind::ALL.iter().all(|&kind| {
            let cached = self.layout.get(&kind).map(Vec::as_slice).unwrap_or_default();
            cached == collection.ids(kind).as_slice()
        }) && collection.groups.iter().all(|group| {
            let cached = self.children.get(&group.id).map(Vec::as_slice).unwrap_or_default();
            cached.len() == group.children.len()
                && cached.iter().zip(&group.children).all(|(id, child)| *id == child.shape.id())
        })
    }

    fn create<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        order: &[ShapeKind],
        id: CollectionId,
        collection: &Collection,
    ) -> Result<(), BackendError> {
        for &kind in order {
            let ids = collection.ids(kind);
            for &shape in &ids {
                backend.create_node(kind, shape, id, None)?;
                self.nodes.insert(shape, NodeState::default());
            }
            self.layout.insert(kind, ids);
        }
        for group in &collection.groups {
            let mut child_ids = Vec::with_capacity(group.children.len());
            for child in &group.children {
                let child_id = child.shape.id();
                backend.create_node(child_id.kind(), child_id, id, Some(group.id))?;
                self.nodes.insert(child_id, NodeState::default());
                child_ids.push(child_id);
            }
            self.children.insert(group.id, child_ids);
        }
        self.created = true;
        log::debug!("created {} nodes for {id}", self.nodes.len());
        Ok(())
    }

    fn patch_node<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        id: ShapeId,
        attributes: Option<Attributes>,
        hidden: bool,
    ) -> Result<(), BackendError> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Err(BackendError::UnknownNode(id));
        };
        if let Some(attributes) = attributes {
            if node.attributes.as_ref() != Some(&attributes) {
                backend.set_attributes(id, &attributes)?;
                node.attributes = Some(attributes);
            }
        }
        if node.hidden != Some(hidden) {
            backend.set_hidden(id, hidden)?;
            node.hidden = Some(hidden);
        }
        Ok(())
    }

    fn patch<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        collection: &Collection,
    ) -> Result<(), BackendError> {
        for group in &collection.groups {
            self.patch_node(backend, group.id, None, group.is_hidden())?;
            for child in &group.children {
                let attributes = match &child.shape {
                    ChildShape::Circle(c) => Attributes::Circle {
                        attr: c.attr.clone(),
                        style: c.style.clone(),
                    },
                    ChildShape::Polyline(p) => Attributes::Polyline {
                        d: p.d.clone(),
                        style: p.style.clone(),
                    },
                };
                self.patch_node(
                    backend,
                    child.shape.id(),
                    Some(attributes),
                    child.shape.is_hidden(),
                )?;
            }
        }
        for c in &collection.circles {
            let attributes = Attributes::Circle {
                attr: c.attr.clone(),
                style: c.style.clone(),
            };
            self.patch_node(backend, c.id, Some(attributes), c.is_hidden())?;
        }
        for p in &collection.polylines {
            let attributes = Attributes::Polyline {
                d: p.d.clone(),
                style: p.style.clone(),
            };
            self.patch_node(backend, p.id, Some(attributes), p.is_hidden())?;
        }
        for r in &collection.rectangles {
            let attributes = Attributes::Rectangle {
                d: r.d.clone(),
                style: r.style.clone(),
            };
            self.patch_node(backend, r.id, Some(attributes), r.is_hidden())?;
        }
        for t in &collection.texts {
            let attributes = Attributes::Text {
                attr: t.attr.clone(),
                style: t.style.clone(),
            };
            self.patch_node(backend, t.id, Some(attributes), t.is_hidden())?;
        }
        Ok(())
    }

    fn reorder<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        order: &[ShapeKind],
        id: CollectionId,
        collection: &Collection,
    ) -> Result<(), BackendError> {
        // creation order first, so the stable sort keeps it for equal depths
        let mut top: Vec<(ShapeId, f64)> = Vec::with_capacity(self.nodes.len());
        for &kind in order {
            match kind {
                ShapeKind::Group => top.extend(collection.groups.iter().map(|s| (s.id, s.dist))),
                ShapeKind::Circle => top.extend(collection.circles.iter().map(|s| (s.id, s.dist))),
                ShapeKind::Polyline => {
                    top.extend(collection.polylines.iter().map(|s| (s.id, s.dist)))
                }
                ShapeKind::Rectangle => {
                    top.extend(collection.rectangles.iter().map(|s| (s.id, s.dist)))
                }
                ShapeKind::Text => top.extend(collection.texts.iter().map(|s| (s.id, s.dist))),
            }
        }
        let top_order = back_to_front(top);
        if top_order != self.top_order {
            backend.set_draw_order(id, None, &top_order)?;
            self.top_order = top_order;
        }

        for group in &collection.groups {
            let child_order = match group.sort_by {
                SortBy::Index => {
                    let mut children: Vec<_> = group.children.iter().collect();
                    children.sort_by_key(|child| child.index);
                    children.iter().map(|child| child.shape.id()).collect()
                }
                SortBy::Distance => back_to_front(
                    group
                        .children
                        .iter()
                        .map(|child| (child.shape.id(), child.shape.dist()))
                        .collect(),
                ),
            };
            if self.child_order.get(&group.id) != Some(&child_order) {
                backend.set_draw_order(id, Some(group.id), &child_order)?;
                self.child_order.insert(group.id, child_order);
            }
        }
        Ok(())
    }
}

/// Farthest first. Equal depths keep their input order.
fn back_to_front(mut shapes: Vec<(ShapeId, f64)>) -> Vec<ShapeId> {
    shapes.sort_by(|a, b| b.1.total_cmp(&a.1));
    shapes.into_iter().map(|(id, _)| id).collect()
}

#[derive(Debug)]
struct Registration {
    watch: Watch<Collection>,
    mirror: Mirror,
}

/// Keeps a [`RenderBackend`] in sync with registered collections
#[derive(Debug)]
pub struct Stage<B: RenderBackend> {
    backend: B,
    kind_order: Vec<ShapeKind>,
    registrations: BTreeMap<CollectionId, Registration>,
}

impl<B: RenderBackend> Stage<B> {
    pub fn new(backend: B, config: StageConfig) -> Self {
        Self {
            backend,
            kind_order: config.resolved_order(),
            registrations: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_registered(&self, id: CollectionId) -> bool {
        self.registrations.contains_key(&id)
    }

    /// Starts mirroring `shapes`. Nodes appear on the next [`Stage::render`].
    pub fn register(
        &mut self,
        shapes: &Shapes,
        background: Option<&str>,
    ) -> Result<(), BackendError> {
        log::debug!("registering {}", shapes.id());
        self.registrations.insert(
            shapes.id(),
            Registration {
                watch: shapes.subscribe(),
                mirror: Mirror::default(),
            },
        );
        self.backend.set_background(background)
    }

    /// Applies pending collection changes to the backend.
    ///
    /// A failing collection does not stop the others; the first error is
    /// returned once all of them were processed. Failed collections are
    /// rebuilt on the next call even when they did not change.
    pub fn render(&mut self) -> Result<usize, BackendError> {
        let mut rendered = 0;
        let mut first_error = None;
        for (&id, registration) in self.registrations.iter_mut() {
            let backend = &mut self.backend;
            let order = &self.kind_order;
            let mirror = &mut registration.mirror;
            let outcome = registration
                .watch
                .poll_with(|collection| sync(backend, order, id, mirror, collection));
            match outcome {
                None => {}
                Some(Ok(())) => rendered += 1,
                Some(Err(e)) => {
                    log::error!("rendering {id} failed: {e}");
                    // recreate from scratch on the next render
                    *mirror = Mirror::default();
                    if let Err(e) = backend.remove_nodes(id) {
                        log::error!("clearing {id} failed: {e}");
                    }
                    registration.watch.rewind();
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(rendered),
        }
    }

    /// Removes every node of collection `id` and stops watching it. Safe to
    /// call for collections that are unknown or already gone.
    pub fn unregister(&mut self, id: CollectionId) -> Result<usize, BackendError> {
        if self.registrations.remove(&id).is_none() {
            log::debug!("unregister of unknown collection {id}");
        }
        let removed = self.backend.remove_nodes(id)?;
        log::debug!("unregistered {id}, removed {removed} nodes");
        Ok(removed)
    }
}

fn sync<B: RenderBackend>(
    backend: &mut B,
    order: &[ShapeKind],
    id: CollectionId,
    mirror: &mut Mirror,
    collection: &Collection,
) -> Result<(), BackendError> {
    if mirror.created && !mirror.matches(collection) {
        log::warn!("{id} changed structure, recreating its nodes");
        backend.remove_nodes(id)?;
        *mirror = Mirror::default();
    }
    if !mirror.created {
        mirror.create(backend, order, id, collection)?;
    }
    mirror.patch(backend, collection)?;
    mirror.reorder(backend, order, id, collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Perspective;
    use crate::projection::{Projector, ProjectorConfig, Viewport};
    use crate::retained::RetainedSurface;
    use crate::scene::{Circle3d, WorldState};
    use crate::shape::{Circle, GroupChild, Group, Polyline};
    use nalgebra::Vector3;

    /// Fails the first attribute write on a node of `failing`.
    #[derive(Default)]
    struct Flaky {
        surface: RetainedSurface,
        failing: Option<CollectionId>,
    }

    impl RenderBackend for Flaky {
        fn create_node(
            &mut self,
            kind: ShapeKind,
            id: ShapeId,
            collection: CollectionId,
            parent: Option<ShapeId>,
        ) -> Result<(), BackendError> {
            self.surface.create_node(kind, id, collection, parent)
        }

        fn set_attributes(
            &mut self,
            id: ShapeId,
            attributes: &Attributes,
        ) -> Result<(), BackendError> {
            let collection = self.surface.node(id).map(|node| node.collection);
            if collection.is_some() && collection == self.failing {
                self.failing = None;
                return Err(BackendError::Platform("transient".into()));
            }
            self.surface.set_attributes(id, attributes)
        }

        fn set_hidden(&mut self, id: ShapeId, hidden: bool) -> Result<(), BackendError> {
            self.surface.set_hidden(id, hidden)
        }

        fn set_draw_order(
            &mut self,
            collection: CollectionId,
            parent: Option<ShapeId>,
            order: &[ShapeId],
        ) -> Result<(), BackendError> {
            self.surface.set_draw_order(collection, parent, order)
        }

        fn remove_nodes(&mut self, collection: CollectionId) -> Result<usize, BackendError> {
            self.surface.remove_nodes(collection)
        }

        fn set_background(&mut self, color: Option<&str>) -> Result<(), BackendError> {
            self.surface.set_background(color)
        }
    }

    fn circle(dist: f64) -> Circle {
        Circle {
            id: ShapeId::new(ShapeKind::Circle),
            attr: CircleAttr { cx: 1.0, cy: 2.0, r: 3.0 },
            style: CircleStyle::default(),
            dist,
            index: None,
            visible: true,
            in_view: dist > 0.0,
        }
    }

    fn polyline(dist: f64, index: usize) -> Polyline {
        Polyline {
            id: ShapeId::new(ShapeKind::Polyline),
            d: "M0.00 0.00 L1.00 1.00".into(),
            style: PathStyle::default(),
            dist,
            index: Some(index),
            visible: true,
            in_view: true,
        }
    }

    fn stage() -> Stage<RetainedSurface> {
        Stage::new(RetainedSurface::default(), StageConfig::default())
    }

    #[test]
    fn test_creates_one_node_per_shape() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0), circle(2.0), circle(3.0)],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, Some("#fff")).unwrap();
        assert_eq!(stage.render().unwrap(), 1);
        assert_eq!(stage.backend().nodes_in_collection(shapes.id()), 3);

        // nothing changed, nothing to do
        assert_eq!(stage.render().unwrap(), 0);
    }

    #[test]
    fn test_patches_only_changed_attributes() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0), circle(2.0)],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        stage.render().unwrap();
        let writes = stage.backend().stats().attribute_writes;
        let ids = shapes.read(|c| c.ids(ShapeKind::Circle));

        shapes.update(|c| c.circles[1].attr.cx = 50.0);
        stage.render().unwrap();
        assert_eq!(stage.backend().stats().attribute_writes, writes + 1);
        assert_eq!(stage.backend().stats().created, 2);
        assert_eq!(shapes.read(|c| c.ids(ShapeKind::Circle)), ids);
    }

    #[test]
    fn test_hidden_shapes_toggle_visibility() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0)],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        stage.render().unwrap();
        let id = shapes.read(|c| c.circles[0].id);
        assert_eq!(stage.backend().node(id).map(|n| n.hidden), Some(false));

        shapes.update(|c| c.circles[0].in_view = false);
        stage.render().unwrap();
        assert_eq!(stage.backend().node(id).map(|n| n.hidden), Some(true));
    }

    #[test]
    fn test_depth_sort_farthest_first() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(5.0), circle(1.0), circle(3.0)],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        stage.render().unwrap();

        let ids = shapes.read(|c| c.ids(ShapeKind::Circle));
        assert_eq!(stage.backend().paint_order(None), vec![ids[0], ids[2], ids[1]]);

        let reorders = stage.backend().stats().reorders;
        shapes.update(|c| c.circles[0].attr.r = 9.0);
        stage.render().unwrap();
        assert_eq!(stage.backend().stats().reorders, reorders);

        shapes.update(|c| c.circles[1].dist = 10.0);
        stage.render().unwrap();
        assert_eq!(stage.backend().paint_order(None), vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn test_index_sorted_group_ignores_depth() {
        let group = Group {
            id: ShapeId::new(ShapeKind::Group),
            children: vec![
                GroupChild {
                    index: 0,
                    shape: ChildShape::Polyline(polyline(1.0, 0)),
                },
                GroupChild {
                    index: 1,
                    shape: ChildShape::Polyline(polyline(9.0, 1)),
                },
            ],
            sort_by: SortBy::Index,
            dist: 2.0,
            visible: true,
            in_view: true,
        };
        let group_id = group.id;
        let shapes = Shapes::new(Collection {
            groups: vec![group],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        stage.render().unwrap();

        let children: Vec<ShapeId> =
            shapes.read(|c| c.groups[0].children.iter().map(|ch| ch.shape.id()).collect());
        assert_eq!(stage.backend().paint_order(Some(group_id)), children);

        shapes.update(|c| c.groups[0].sort_by = SortBy::Distance);
        stage.render().unwrap();
        assert_eq!(stage.backend().paint_order(Some(group_id)), vec![children[1], children[0]]);
    }

    #[test]
    fn test_structure_change_recreates_nodes() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0)],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        stage.render().unwrap();

        shapes.update(|c| c.circles = vec![circle(1.0), circle(2.0)]);
        stage.render().unwrap();
        assert_eq!(stage.backend().nodes_in_collection(shapes.id()), 2);
        let ids = shapes.read(|c| c.ids(ShapeKind::Circle));
        assert!(ids.iter().all(|id| stage.backend().node(*id).is_some()));
    }

    #[test]
    fn test_unregister_removes_everything() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0), circle(2.0)],
            groups: vec![Group {
                id: ShapeId::new(ShapeKind::Group),
                children: vec![GroupChild {
                    index: 0,
                    shape: ChildShape::Circle(circle(1.0)),
                }],
                sort_by: SortBy::Distance,
                dist: 1.0,
                visible: true,
                in_view: true,
            }],
            ..Collection::default()
        });
        let mut stage = stage();
        stage.register(&shapes, None).unwrap();
        for step in 0..5 {
            shapes.update(|c| c.circles[0].attr.cx = step as f64);
            stage.render().unwrap();
        }
        assert_eq!(stage.backend().nodes_in_collection(shapes.id()), 4);

        assert_eq!(stage.unregister(shapes.id()).unwrap(), 4);
        assert_eq!(stage.backend().nodes_in_collection(shapes.id()), 0);
        assert!(!stage.is_registered(shapes.id()));

        // idempotent
        assert_eq!(stage.unregister(shapes.id()).unwrap(), 0);
        shapes.update(|c| c.circles[0].attr.cx = 99.0);
        assert_eq!(stage.render().unwrap(), 0);
    }

    #[test]
    fn test_failed_render_recovers_without_changes() {
        let shapes = Shapes::new(Collection {
            circles: vec![circle(1.0)],
            ..Collection::default()
        });
        let mut stage = Stage::new(
            Flaky {
                failing: Some(shapes.id()),
                ..Flaky::default()
            },
            StageConfig::default(),
        );
        stage.register(&shapes, None).unwrap();

        assert!(matches!(stage.render(), Err(BackendError::Platform(_))));
        assert_eq!(stage.backend().surface.nodes_in_collection(shapes.id()), 0);

        // the collection did not change, it is rebuilt anyway
        assert_eq!(stage.render().unwrap(), 1);
        assert_eq!(stage.backend().surface.nodes_in_collection(shapes.id()), 1);
        let id = shapes.read(|c| c.circles[0].id);
        assert!(stage.backend().surface.node(id).and_then(|n| n.attributes.as_ref()).is_some());
        assert_eq!(stage.render().unwrap(), 0);
    }

    #[test]
    fn test_failing_collection_does_not_block_others() {
        let healthy = Shapes::new(Collection {
            circles: vec![circle(1.0), circle(2.0)],
            ..Collection::default()
        });
        let failing = Shapes::new(Collection {
            circles: vec![circle(3.0)],
            ..Collection::default()
        });
        let mut stage = Stage::new(
            Flaky {
                failing: Some(failing.id()),
                ..Flaky::default()
            },
            StageConfig::default(),
        );
        stage.register(&failing, None).unwrap();
        stage.register(&healthy, None).unwrap();

        assert!(stage.render().is_err());
        assert_eq!(stage.backend().surface.nodes_in_collection(healthy.id()), 2);
        assert_eq!(stage.backend().surface.nodes_in_collection(failing.id()), 0);

        assert_eq!(stage.render().unwrap(), 1);
        assert_eq!(stage.backend().surface.nodes_in_collection(healthy.id()), 2);
        assert_eq!(stage.backend().surface.nodes_in_collection(failing.id()), 1);
    }

    #[test]
    fn test_culled_shapes_are_hidden() {
        let camera = Perspective::new(Vector3::new(0.0, 0.0, -7.5), 0.0, 0.0, 0.0);
        let mut state = WorldState {
            // the second circle sits at eye z = 0.5
            circles: vec![
                Circle3d::new(Vector3::zeros()),
                Circle3d::new(Vector3::new(0.0, 0.0, -7.0)),
            ],
            ..WorldState::default()
        };
        let mut projector = Projector::new(Viewport::default(), ProjectorConfig::default());
        let mut stage = stage();
        let shapes = projector.activate(&state, &camera);
        stage.register(shapes, None).unwrap();
        let ids = shapes.read(|c| c.ids(ShapeKind::Circle));
        stage.render().unwrap();
        assert_eq!(stage.backend().node(ids[0]).map(|n| n.hidden), Some(false));
        assert_eq!(stage.backend().node(ids[1]).map(|n| n.hidden), Some(true));

        state.circles[1].position.z = 1.0;
        projector.update(&state, &camera).unwrap();
        stage.render().unwrap();
        assert_eq!(stage.backend().node(ids[1]).map(|n| n.hidden), Some(false));
    }

    #[test]
    fn test_kind_order_with_missing_kinds() {
        let config = StageConfig {
            kind_order: vec![ShapeKind::Text, ShapeKind::Circle],
        };
        let order = config.resolved_order();
        assert_eq!(order.len(), ShapeKind::ALL.len());
        assert_eq!(&order[..2], &[ShapeKind::Text, ShapeKind::Circle]);
    }
}
