//! In-memory render backend.
//!
//! [`RetainedSurface`] keeps the node tree the stage builds, can serialize it
//! to SVG markup and is what the terminal front-end rasterizes.
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::projection::Viewport;
use crate::shape::{CollectionId, ShapeId, ShapeKind};
use crate::stage::{Attributes, BackendError, RenderBackend};

pub const HIDDEN_CLASS: &str = "zeta-hidden";

#[derive(Debug, Clone, PartialEq)]
pub struct RetainedNode {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub collection: CollectionId,
    pub parent: Option<ShapeId>,
    pub attributes: Option<Attributes>,
    pub hidden: bool,
}

/// Backend call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: usize,
    pub attribute_writes: usize,
    pub visibility_writes: usize,
    pub reorders: usize,
    pub removed: usize,
}

#[derive(Debug, Default)]
pub struct RetainedSurface {
    viewport: Viewport,
    background: Option<String>,
    nodes: HashMap<ShapeId, RetainedNode>,
    root: Vec<ShapeId>,
    children: HashMap<ShapeId, Vec<ShapeId>>,
    stats: SurfaceStats,
}

impl RetainedSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn stats(&self) -> &SurfaceStats {
        &self.stats
    }

    pub fn node(&self, id: ShapeId) -> Option<&RetainedNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_in_collection(&self, collection: CollectionId) -> usize {
        self.nodes.values().filter(|n| n.collection == collection).count()
    }

    /// Children of `parent` (or the top level) in paint order.
    pub fn paint_order(&self, parent: Option<ShapeId>) -> Vec<ShapeId> {
        match parent {
            None => self.root.clone(),
            Some(id) => self.children.get(&id).cloned().unwrap_or_default(),
        }
    }

    /// Calls `f` for every visible node in paint order. Children of a hidden
    /// group are skipped along with it.
    pub fn for_each_painted(&self, mut f: impl FnMut(&RetainedNode)) {
        self.walk(&self.root, &mut f);
    }

    fn walk(&self, ids: &[ShapeId], f: &mut impl FnMut(&RetainedNode)) {
        for id in ids {
            let Some(node) = self.nodes.get(id) else { continue };
            if node.hidden {
                continue;
            }
            f(node);
            if let Some(children) = self.children.get(id) {
                self.walk(children, f);
            }
        }
    }

    /// Serializes the retained tree, hidden nodes included.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}""#,
                r#" height="{h}" viewBox="0 0 {w} {h}">"#
            ),
            w = self.viewport.width,
            h = self.viewport.height,
        );
        let _ = write!(out, "<style>.{HIDDEN_CLASS}{{visibility:hidden}}</style>");
        if let Some(color) = &self.background {
            let _ = write!(out, r#"<rect width="100%" height="100%" fill="{}"/>"#, escape(color));
        }
        self.write_nodes(&mut out, &self.root);
        out.push_str("</svg>");
        out
    }

    fn write_nodes(&self, out: &mut String, ids: &[ShapeId]) {
        for id in ids {
            let Some(node) = self.nodes.get(id) else { continue };
            let class = if node.hidden {
                format!("{} {HIDDEN_CLASS}", node.collection)
            } else {
                node.collection.to_string()
            };
            let _ = write!(
                out,
                r#"<{} id="{}" class="{}""#,
                element_name(node.kind),
                node.id,
                class
            );
            match &node.attributes {
                Some(Attributes::Circle { attr, style }) => {
                    let _ = write!(
                        out,
                        concat!(
                            r#" cx="{:.2}" cy="{:.2}" r="{:.2}" stroke-width="{:.2}" stroke="{}""#,
                            r#" stroke-opacity="{}" fill="{}" fill-opacity="{}"/>"#
                        ),
                        attr.cx,
                        attr.cy,
                        attr.r,
                        style.stroke_width,
                        escape(&style.stroke),
                        style.stroke_opacity,
                        escape(&style.fill),
                        style.fill_opacity,
                    );
                }
                Some(Attributes::Polyline { d, style }) => {
                    let _ = write!(
                        out,
                        concat!(
                            r#" d="{}" fill="none" stroke-width="{:.2}" stroke="{}""#,
                            r#" stroke-opacity="{}" stroke-linecap="{}" stroke-linejoin="{}"/>"#
                        ),
                        d,
                        style.stroke_width,
                        escape(&style.stroke),
                        style.stroke_opacity,
                        style.stroke_linecap.as_str(),
                        style.stroke_linejoin.as_str(),
                    );
                }
                Some(Attributes::Rectangle { d, style }) => {
                    let _ = write!(
                        out,
                        concat!(
                            r#" d="{}" stroke-width="{:.2}" stroke="{}" stroke-opacity="{}""#,
                            r#" stroke-linejoin="{}" fill="{}" fill-opacity="{}"/>"#
                        ),
                        d,
                        style.stroke_width,
                        escape(&style.stroke),
                        style.stroke_opacity,
                        style.stroke_linejoin.as_str(),
                        escape(&style.fill),
                        style.fill_opacity,
                    );
                }
                Some(Attributes::Text { attr, style }) => {
                    let _ = write!(
                        out,
                        concat!(
                            r#" x="{:.2}" y="{:.2}" font-size="{:.2}" font-family="{}" fill="{}""#,
                            r#" fill-opacity="{}" alignment-baseline="{}">{}</text>"#
                        ),
                        attr.x,
                        attr.y,
                        style.font_size,
                        escape(&style.font_family),
                        escape(&style.fill),
                        style.fill_opacity,
                        style.alignment_baseline.as_str(),
                        escape(&attr.text),
                    );
                }
                None if node.kind == ShapeKind::Group => {
                    out.push('>');
                    if let Some(children) = self.children.get(id) {
                        self.write_nodes(out, children);
                    }
                    out.push_str("</g>");
                }
                None if node.kind == ShapeKind::Text => out.push_str("></text>"),
                None => out.push_str("/>"),
            }
        }
    }
}

fn element_name(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Group => "g",
        ShapeKind::Circle => "circle",
        ShapeKind::Polyline | ShapeKind::Rectangle => "path",
        ShapeKind::Text => "text",
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Moves `order` to the end of `list`, in the given order. Entries not in
/// `order` keep their relative position in front.
fn append_in_order(list: &mut Vec<ShapeId>, order: &[ShapeId]) {
    let moved: HashSet<&ShapeId> = order.iter().collect();
    list.retain(|id| !moved.contains(id));
    list.extend_from_slice(order);
}

impl RenderBackend for RetainedSurface {
    fn create_node(
        &mut self,
        kind: ShapeKind,
        id: ShapeId,
        collection: CollectionId,
        parent: Option<ShapeId>,
    ) -> Result<(), BackendError> {
        match parent {
            Some(parent_id) => {
                if !self.nodes.contains_key(&parent_id) {
                    return Err(BackendError::UnknownParent(parent_id));
                }
                self.children.entry(parent_id).or_default().push(id);
            }
            None => self.root.push(id),
        }
        self.nodes.insert(
            id,
            RetainedNode {
                id,
                kind,
                collection,
                parent,
                attributes: None,
                hidden: false,
            },
        );
        self.stats.created += 1;
        Ok(())
    }

    fn set_attributes(&mut self, id: ShapeId, attributes: &Attributes) -> Result<(), BackendError> {
        let node = self.nodes.get_mut(&id).ok_or(BackendError::UnknownNode(id))?;
        node.attributes = Some(attributes.clone());
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn set_hidden(&mut self, id: ShapeId, hidden: bool) -> Result<(), BackendError> {
        let node = self.nodes.get_mut(&id).ok_or(BackendError::UnknownNode(id))?;
        node.hidden = hidden;
        self.stats.visibility_writes += 1;
        Ok(())
    }

    fn set_draw_order(
        &mut self,
        _collection: CollectionId,
        parent: Option<ShapeId>,
        order: &[ShapeId],
    ) -> Result<(), BackendError> {
        if let Some(missing) = order.iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(BackendError::UnknownNode(*missing));
        }
        match parent {
            None => append_in_order(&mut self.root, order),
            Some(parent_id) => {
                let children = self
                    .children
                    .get_mut(&parent_id)
                    .ok_or(BackendError::UnknownParent(parent_id))?;
                append_in_order(children, order);
            }
        }
        self.stats.reorders += 1;
        Ok(())
    }

    fn remove_nodes(&mut self, collection: CollectionId) -> Result<usize, BackendError> {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| node.collection != collection);
        let nodes = &self.nodes;
        self.root.retain(|id| nodes.contains_key(id));
        self.children.retain(|parent, _| nodes.contains_key(parent));
        for children in self.children.values_mut() {
            children.retain(|id| nodes.contains_key(id));
        }
        let removed = before - self.nodes.len();
        self.stats.removed += removed;
        Ok(removed)
    }

    fn set_background(&mut self, color: Option<&str>) -> Result<(), BackendError> {
        self.background = color.map(str::to_owned);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CircleStyle;
    use crate::shape::CircleAttr;

    fn circle_attributes(cx: f64) -> Attributes {
        Attributes::Circle {
            attr: CircleAttr { cx, cy: 10.0, r: 2.0 },
            style: CircleStyle::default(),
        }
    }

    #[test]
    fn test_reorder_moves_nodes_to_end() {
        let mut surface = RetainedSurface::default();
        let collection = CollectionId::new();
        let ids: Vec<ShapeId> = (0..3).map(|_| ShapeId::new(ShapeKind::Circle)).collect();
        for id in &ids {
            surface.create_node(ShapeKind::Circle, *id, collection, None).unwrap();
        }
        surface.set_draw_order(collection, None, &[ids[2], ids[0]]).unwrap();
        assert_eq!(surface.paint_order(None), vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_reorder_large_collection() {
        let mut surface = RetainedSurface::default();
        let collection = CollectionId::new();
        let ids: Vec<ShapeId> = (0..2000).map(|_| ShapeId::new(ShapeKind::Circle)).collect();
        for id in &ids {
            surface.create_node(ShapeKind::Circle, *id, collection, None).unwrap();
        }
        let reversed: Vec<ShapeId> = ids.iter().rev().copied().collect();
        surface.set_draw_order(collection, None, &reversed).unwrap();
        assert_eq!(surface.paint_order(None), reversed);

        surface.set_draw_order(collection, None, &reversed[..10]).unwrap();
        let order = surface.paint_order(None);
        assert_eq!(order.len(), ids.len());
        assert_eq!(order[..1990], reversed[10..]);
        assert_eq!(order[1990..], reversed[..10]);
    }

    #[test]
    fn test_remove_only_tagged_nodes() {
        let mut surface = RetainedSurface::default();
        let (a, b) = (CollectionId::new(), CollectionId::new());
        let group = ShapeId::new(ShapeKind::Group);
        surface.create_node(ShapeKind::Group, group, a, None).unwrap();
        surface
            .create_node(ShapeKind::Circle, ShapeId::new(ShapeKind::Circle), a, Some(group))
            .unwrap();
        let kept = ShapeId::new(ShapeKind::Circle);
        surface.create_node(ShapeKind::Circle, kept, b, None).unwrap();

        assert_eq!(surface.remove_nodes(a).unwrap(), 2);
        assert_eq!(surface.paint_order(None), vec![kept]);
        assert!(surface.paint_order(Some(group)).is_empty());
        assert_eq!(surface.remove_nodes(a).unwrap(), 0);
    }

    #[test]
    fn test_child_needs_parent() {
        let mut surface = RetainedSurface::default();
        let missing = ShapeId::new(ShapeKind::Group);
        let result = surface.create_node(
            ShapeKind::Circle,
            ShapeId::new(ShapeKind::Circle),
            CollectionId::new(),
            Some(missing),
        );
        assert!(matches!(result, Err(BackendError::UnknownParent(_))));
    }

    #[test]
    fn test_svg_output() {
        let mut surface = RetainedSurface::new(Viewport::new(800.0, 450.0));
        let collection = CollectionId::new();
        let (shown, hidden) = (ShapeId::new(ShapeKind::Circle), ShapeId::new(ShapeKind::Circle));
        surface.set_background(Some("#fafafa")).unwrap();
        surface.create_node(ShapeKind::Circle, shown, collection, None).unwrap();
        surface.create_node(ShapeKind::Circle, hidden, collection, None).unwrap();
        surface.set_attributes(shown, &circle_attributes(5.0)).unwrap();
        surface.set_attributes(hidden, &circle_attributes(6.0)).unwrap();
        surface.set_hidden(hidden, true).unwrap();

        let svg = surface.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="800""#));
        assert!(svg.contains(r##"fill="#fafafa""##));
        assert!(svg.contains(r#"cx="5.00""#));
        assert!(svg.contains(&format!(r#"class="{collection} {HIDDEN_CLASS}""#)));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_painted_nodes_skip_hidden_groups() {
        let mut surface = RetainedSurface::default();
        let collection = CollectionId::new();
        let group = ShapeId::new(ShapeKind::Group);
        let child = ShapeId::new(ShapeKind::Circle);
        let loose = ShapeId::new(ShapeKind::Circle);
        surface.create_node(ShapeKind::Group, group, collection, None).unwrap();
        surface.create_node(ShapeKind::Circle, child, collection, Some(group)).unwrap();
        surface.create_node(ShapeKind::Circle, loose, collection, None).unwrap();

        let mut painted = Vec::new();
        surface.for_each_painted(|n| painted.push(n.id));
        assert_eq!(painted, vec![group, child, loose]);

        surface.set_hidden(group, true).unwrap();
        painted.clear();
        surface.for_each_painted(|n| painted.push(n.id));
        assert_eq!(painted, vec![loose]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b & "c">"#), "a&lt;b &amp; &quot;c&quot;&gt;");
    }
}
