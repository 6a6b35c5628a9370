/// Character-cell rasterizer for the retained surface
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use zeta_core::path_data::parse_path_data;
use zeta_core::retained::RetainedSurface;
use zeta_core::shape::{CollectionId, ShapeId, ShapeKind};
use zeta_core::{Attributes, BackendError, RenderBackend, Viewport};

/// Stroke width ramp for lines (thinnest to thickest)
const STROKE_RAMP: &[char] = &['.', '-', '=', '#'];

/// Terminal cells are roughly twice as tall as wide, so every cell covers
/// two vertical pixels of the projected viewport.
const PIXELS_PER_ROW: f64 = 2.0;

/// Retained render backend drawn into a character grid
pub struct TerminalSurface {
    surface: RetainedSurface,
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
    color_buffer: Vec<Option<Color>>,
}

impl TerminalSurface {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            surface: RetainedSurface::new(Self::viewport_for(width, height)),
            width,
            height,
            char_buffer: vec![' '; size],
            color_buffer: vec![None; size],
        }
    }

    pub fn viewport_for(width: usize, height: usize) -> Viewport {
        Viewport::new(width.max(1) as f64, height.max(1) as f64 * PIXELS_PER_ROW)
    }

    pub fn viewport(&self) -> Viewport {
        *self.surface.viewport()
    }

    pub fn surface(&self) -> &RetainedSurface {
        &self.surface
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.char_buffer = vec![' '; width * height];
        self.color_buffer = vec![None; width * height];
        self.surface.set_viewport(Self::viewport_for(width, height));
    }

    pub fn clear(&mut self) {
        for i in 0..self.char_buffer.len() {
            self.char_buffer[i] = ' ';
            self.color_buffer[i] = None;
        }
    }

    /// Redraws the grid from the retained nodes in paint order.
    pub fn rasterize(&mut self) {
        self.clear();
        let mut strokes: Vec<Stroke> = Vec::new();
        self.surface.for_each_painted(|node| {
            if let Some(attributes) = &node.attributes {
                strokes.push(Stroke::from_attributes(attributes));
            }
        });
        for stroke in strokes {
            self.paint(stroke);
        }
    }

    fn paint(&mut self, stroke: Stroke) {
        match stroke {
            Stroke::Disc { x, y, r, color } => self.fill_disc(x, y, r, color),
            Stroke::Lines { segments, character, color } => {
                for (from, to) in segments {
                    self.line(from, to, character, color);
                }
            }
            Stroke::Label { x, y, text, color } => {
                let row = (y / PIXELS_PER_ROW).floor() as i64;
                let col = x.floor() as i64;
                for (i, c) in text.chars().enumerate() {
                    self.plot(col + i as i64, row, c, color);
                }
            }
        }
    }

    fn fill_disc(&mut self, x: f64, y: f64, r: f64, color: Option<Color>) {
        let center_col = x.floor() as i64;
        let center_row = (y / PIXELS_PER_ROW).floor() as i64;
        if r <= 0.0 {
            return;
        }
        let reach_cols = r.ceil() as i64;
        let reach_rows = (r / PIXELS_PER_ROW).ceil() as i64;
        // only cells on the grid
        let rows = center_row.saturating_sub(reach_rows).max(0)
            ..=center_row.saturating_add(reach_rows).min(self.height as i64 - 1);
        let cols = center_col.saturating_sub(reach_cols).max(0)
            ..=center_col.saturating_add(reach_cols).min(self.width as i64 - 1);
        let mut covered = false;
        for row in rows {
            for col in cols.clone() {
                let dx = col as f64 + 0.5 - x;
                let dy = (row as f64 + 0.5) * PIXELS_PER_ROW - y;
                if dx * dx + dy * dy <= r * r {
                    covered |= self.plot(col, row, '@', color);
                }
            }
        }
        // too small to cover a cell center
        if !covered {
            self.plot(center_col, center_row, 'o', color);
        }
    }

    /// Bresenham between two pixel positions
    fn line(&mut self, from: (f64, f64), to: (f64, f64), character: char, color: Option<Color>) {
        let (mut x0, mut y0) = (from.0.floor() as i64, (from.1 / PIXELS_PER_ROW).floor() as i64);
        let (x1, y1) = (to.0.floor() as i64, (to.1 / PIXELS_PER_ROW).floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        // bound the walk for segments far outside the grid
        let limit = (self.width + self.height) as i64 * 4;
        for _ in 0..=dx.max(-dy).min(limit) {
            self.plot(x0, y0, character, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn plot(&mut self, col: i64, row: i64, character: char, color: Option<Color>) -> bool {
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return false;
        }
        let idx = row as usize * self.width + col as usize;
        self.char_buffer[idx] = character;
        self.color_buffer[idx] = color;
        true
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<(char, Option<Color>)> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let idx = row * self.width + col;
        Some((self.char_buffer[idx], self.color_buffer[idx]))
    }

    pub fn row_text(&self, row: usize) -> String {
        (0..self.width).filter_map(|col| self.cell(col, row).map(|(c, _)| c)).collect()
    }

    /// Writes the grid starting at `top` rows from the top of the screen.
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        let background = self.surface.background().and_then(parse_color);
        if let Some(background) = background {
            writer.queue(SetBackgroundColor(background))?;
        }
        let mut current: Option<Color> = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, top + y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx].or(background.map(|_| Color::Black));
                if color != current {
                    writer.queue(SetForegroundColor(color.unwrap_or(Color::Reset)))?;
                    current = color;
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// What a node leaves on the grid
enum Stroke {
    Disc {
        x: f64,
        y: f64,
        r: f64,
        color: Option<Color>,
    },
    Lines {
        segments: Vec<((f64, f64), (f64, f64))>,
        character: char,
        color: Option<Color>,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
        color: Option<Color>,
    },
}

impl Stroke {
    fn from_attributes(attributes: &Attributes) -> Self {
        match attributes {
            Attributes::Circle { attr, style } => {
                let paint = if style.fill_opacity > 0.0 { &style.fill } else { &style.stroke };
                Stroke::Disc {
                    x: attr.cx,
                    y: attr.cy,
                    r: attr.r,
                    color: parse_color(paint),
                }
            }
            Attributes::Polyline { d, style } => {
                Stroke::lines(d, style.stroke_width, &style.stroke)
            }
            Attributes::Rectangle { d, style } => {
                Stroke::lines(d, style.stroke_width, &style.stroke)
            }
            Attributes::Text { attr, style } => Stroke::Label {
                x: attr.x,
                y: attr.y,
                text: attr.text.clone(),
                color: parse_color(&style.fill),
            },
        }
    }

    fn lines(d: &str, stroke_width: f64, stroke: &str) -> Self {
        let segments = match parse_path_data(d) {
            Ok(data) => data.segments(),
            Err(e) => {
                log::warn!("skipping unreadable path: {e}");
                Vec::new()
            }
        };
        let ramp_index = (stroke_width.max(0.0) as usize).min(STROKE_RAMP.len() - 1);
        Stroke::Lines {
            segments,
            character: STROKE_RAMP[ramp_index],
            color: parse_color(stroke),
        }
    }
}

/// `#rgb` or `#rrggbb` to a terminal color
pub fn parse_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = hex.chars().map(|c| channel(&c.to_string()).map(|v| v * 17));
            Some(Color::Rgb {
                r: rgb.next()??,
                g: rgb.next()??,
                b: rgb.next()??,
            })
        }
        6 => Some(Color::Rgb {
            r: channel(hex.get(0..2)?)?,
            g: channel(hex.get(2..4)?)?,
            b: channel(hex.get(4..6)?)?,
        }),
        _ => None,
    }
}

impl RenderBackend for TerminalSurface {
    fn create_node(
        &mut self,
        kind: ShapeKind,
        id: ShapeId,
        collection: CollectionId,
        parent: Option<ShapeId>,
    ) -> Result<(), BackendError> {
        self.surface.create_node(kind, id, collection, parent)
    }

    fn set_attributes(&mut self, id: ShapeId, attributes: &Attributes) -> Result<(), BackendError> {
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
