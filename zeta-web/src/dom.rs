/// SVG DOM render backend
use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};
use zeta_core::retained::HIDDEN_CLASS;
use zeta_core::shape::{CollectionId, ShapeId, ShapeKind};
use zeta_core::{Attributes, BackendError, RenderBackend};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn platform(e: JsValue) -> BackendError {
    BackendError::Platform(format!("{e:?}"))
}

fn tag(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Group => "g",
        ShapeKind::Circle => "circle",
        ShapeKind::Polyline | ShapeKind::Rectangle => "path",
        ShapeKind::Text => "text",
    }
}

/// Creates SVG elements inside a `<g>` appended to an existing `<svg>`.
pub struct SvgDomBackend {
    document: Document,
    svg: Element,
    root: Element,
    nodes: HashMap<ShapeId, (Element, CollectionId)>,
}

impl SvgDomBackend {
    pub fn new(document: Document, svg_id: &str) -> Result<Self, BackendError> {
        let svg = document
            .get_element_by_id(svg_id)
            .ok_or_else(|| BackendError::MissingContainer(svg_id.to_owned()))?;

        let style = document.create_element_ns(Some(SVG_NS), "style").map_err(platform)?;
        style.set_text_content(Some(&format!(".{HIDDEN_CLASS}{{visibility:hidden}}")));
        svg.append_child(&style).map_err(platform)?;

        let root = document.create_element_ns(Some(SVG_NS), "g").map_err(platform)?;
        svg.append_child(&root).map_err(platform)?;

        Ok(Self {
            document,
            svg,
            root,
            nodes: HashMap::new(),
        })
    }

    pub fn set_size(&self, width: f64, height: f64) -> Result<(), BackendError> {
        self.svg.set_attribute("width", &width.to_string()).map_err(platform)?;
        self.svg.set_attribute("height", &height.to_string()).map_err(platform)?;
        self.svg
            .set_attribute("viewBox", &format!("0 0 {width} {height}"))
            .map_err(platform)
    }

    fn element(&self, id: ShapeId) -> Result<&Element, BackendError> {
        self.nodes
            .get(&id)
            .map(|(element, _)| element)
            .ok_or(BackendError::UnknownNode(id))
    }
}

fn set_all(element: &Element, attributes: &[(&str, String)]) -> Result<(), BackendError> {
    for (name, value) in attributes {
        element.set_attribute(name, value).map_err(platform)?;
    }
    Ok(())
}

impl RenderBackend for SvgDomBackend {
    fn create_node(
        &mut self,
        kind: ShapeKind,
        id: ShapeId,
        collection: CollectionId,
        parent: Option<ShapeId>,
    ) -> Result<(), BackendError> {
        let element = self.document.create_element_ns(Some(SVG_NS), tag(kind)).map_err(platform)?;
        element.set_id(&id.to_string());
        element.class_list().add_1(&collection.to_string()).map_err(platform)?;
        match parent {
            Some(parent_id) => {
                let (parent, _) = self
                    .nodes
                    .get(&parent_id)
                    .ok_or(BackendError::UnknownParent(parent_id))?;
                parent.append_child(&element).map_err(platform)?;
            }
            None => {
                self.root.append_child(&element).map_err(platform)?;
            }
        }
        self.nodes.insert(id, (element, collection));
        Ok(())
    }

    fn set_attributes(&mut self, id: ShapeId, attributes: &Attributes) -> Result<(), BackendError> {
        let element = self.element(id)?;
        match attributes {
            Attributes::Circle { attr, style } => set_all(
                element,
                &[
                    ("cx", attr.cx.to_string()),
                    ("cy", attr.cy.to_string()),
                    ("r", attr.r.to_string()),
                    ("stroke-width", style.stroke_width.to_string()),
                    ("stroke", style.stroke.clone()),
                    ("stroke-opacity", style.stroke_opacity.to_string()),
                    ("fill", style.fill.clone()),
                    ("fill-opacity", style.fill_opacity.to_string()),
                ],
            ),
            Attributes::Polyline { d, style } => set_all(
                element,
                &[
                    ("d", d.clone()),
                    ("fill", "none".into()),
                    ("stroke-width", style.stroke_width.to_string()),
                    ("stroke", style.stroke.clone()),
                    ("stroke-opacity", style.stroke_opacity.to_string()),
                    ("stroke-linecap", style.stroke_linecap.as_str().into()),
                    ("stroke-linejoin", style.stroke_linejoin.as_str().into()),
                ],
            ),
            Attributes::Rectangle { d, style } => set_all(
                element,
                &[
                    ("d", d.clone()),
                    ("stroke-width", style.stroke_width.to_string()),
                    ("stroke", style.stroke.clone()),
                    ("stroke-opacity", style.stroke_opacity.to_string()),
                    ("stroke-linejoin", style.stroke_linejoin.as_str().into()),
                    ("fill", style.fill.clone()),
                    ("fill-opacity", style.fill_opacity.to_string()),
                ],
            ),
            Attributes::Text { attr, style } => {
                element.set_text_content(Some(&attr.text));
                set_all(
                    element,
                    &[
                        ("x", attr.x.to_string()),
                        ("y", attr.y.to_string()),
                        ("font-size", style.font_size.to_string()),
                        ("font-family", style.font_family.clone()),
                        ("fill", style.fill.clone()),
                        ("fill-opacity", style.fill_opacity.to_string()),
                        ("alignment-baseline", style.alignment_baseline.as_str().into()),
                    ],
                )
            }
        }
    }

    fn set_hidden(&mut self, id: ShapeId, hidden: bool) -> Result<(), BackendError> {
        self.element(id)?
            .class_list()
            .toggle_with_force(HIDDEN_CLASS, hidden)
            .map(|_| ())
            .map_err(platform)
    }

    fn set_draw_order(
        &mut self,
        _collection: CollectionId,
        parent: Option<ShapeId>,
        order: &[ShapeId],
    ) -> Result<(), BackendError> {
        let container = match parent {
            Some(parent_id) => self.element(parent_id)?,
            None => &self.root,
        };
        // appending an attached node moves it to the end
        for id in order {
            let element = self.element(*id)?;
            container.append_child(element).map_err(platform)?;
        }
        Ok(())
    }

    fn remove_nodes(&mut self, collection: CollectionId) -> Result<usize, BackendError> {
        let tagged = self
            .root
            .query_selector_all(&format!(".{collection}"))
            .map_err(platform)?;
        let mut removed = 0;
        for i in 0..tagged.length() {
            if let Some(element) = tagged.item(i).and_then(|node| node.dyn_into::<Element>().ok()) {
                element.remove();
                removed += 1;
            }
        }
        self.nodes.retain(|_, (_, tag)| *tag != collection);
        Ok(removed)
    }

    fn set_background(&mut self, color: Option<&str>) -> Result<(), BackendError> {
        match color {
            Some(color) => self.svg.set_attribute("style", &format!("background:{color}")),
            None => self.svg.remove_attribute("style"),
        }
        .map_err(platform)
    }
}
