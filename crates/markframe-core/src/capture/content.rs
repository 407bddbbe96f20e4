//! Layout of the card content for export.
//!
//! Follows the preview stylesheet: headings, paragraphs, lists, quotes,
//! tables, highlighted code blocks and MathML, greedy-wrapped at the content
//! width. Vertical margins collapse between siblings. All positions are CSS
//! px relative to the content box; [`ContentLayout::paint`] scales them.

use tiny_skia::{FillRule, Mask, Pixmap, Transform};

use super::fonts::FaceRequest;
use super::raster::{rounded_rect, solid_paint};
use super::text::{TextEngine, VerticalMetrics};
use crate::dom::{Element, Fragment, Node};
use crate::style::compositor::{CompositedStyle, Rgba};
use crate::style::{Rgb, ThemeMode};

const LINE_HEIGHT: f32 = 1.65;
const HEADING_LINE_HEIGHT: f32 = 1.25;
const PARAGRAPH_GAP: f32 = 0.8;
const LIST_INDENT: f32 = 1.5;
const CODE_SCALE: f32 = 0.875;
const PRE_PADDING: f32 = 16.0;
const PRE_RADIUS: f32 = 10.0;
const INLINE_CODE_PAD: f32 = 6.0;
const QUOTE_BAR: f32 = 3.0;
const QUOTE_INDENT: f32 = 16.0;
const QUOTE_OPACITY: f32 = 0.8;
const CELL_GAP: f32 = 8.0;
const SCRIPT_SCALE: f32 = 0.7;
const TAB: &str = "    ";

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "ul", "ol", "li", "hr", "table",
    "thead", "tbody", "tfoot", "tr", "div", "section", "article", "header", "footer", "details",
    "summary", "figure", "dl", "dt", "dd",
];

const SPACED_OPERATORS: &[&str] = &[
    "=", "+", "-", "−", "<", ">", "≤", "≥", "≠", "≈", "±", "×", "÷", "→", "←", "⇒", "∈", "≡",
];

#[derive(Debug, Clone, PartialEq)]
enum PaintOp {
    Text {
        text: String,
        face: FaceRequest,
        size: f32,
        x: f32,
        baseline: f32,
        color: Rgba,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        color: Rgba,
    },
}

/// Laid-out content, ready to paint at any pixel ratio.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentLayout {
    ops: Vec<PaintOp>,
    height: f32,
}

impl ContentLayout {
    /// Lay out `html` in a content box `width` px wide.
    pub fn build(html: &str, width: f32, style: &CompositedStyle, engine: &mut TextEngine<'_>) -> Self {
        let fragment = Fragment::parse(html);
        let metrics = engine.metrics(FaceRequest::default());
        let mut layouter = Layouter {
            engine,
            metrics,
            theme: style.theme,
            ops: Vec::new(),
            y: 0.0,
            margin: 0.0,
            marker: None,
        };
        let root = Block {
            x: 0.0,
            width: width.max(1.0),
            size: style.font_size_px as f32,
            color: Rgba::new(style.text_color, 1.0),
            italic: false,
        };
        layouter.blocks(&fragment.children, &root);

        let height = if layouter.ops.is_empty() {
            0.0
        } else {
            layouter.y + layouter.margin
        };
        Self {
            ops: layouter.ops,
            height,
        }
    }

    /// Content height in CSS px, trailing margin included.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Paint with the content box origin at `origin` device px.
    pub fn paint(
        &self,
        canvas: &mut Pixmap,
        engine: &mut TextEngine<'_>,
        origin: (f32, f32),
        scale: f32,
        clip: Option<&Mask>,
    ) {
        let (ox, oy) = origin;
        for op in &self.ops {
            match op {
                PaintOp::Fill {
                    x,
                    y,
                    width,
                    height,
                    radius,
                    color,
                } => {
                    let Some(path) =
                        rounded_rect(ox + x * scale, oy + y * scale, width * scale, height * scale, radius * scale)
                    else {
                        continue;
                    };
                    canvas.fill_path(&path, &solid_paint(*color), FillRule::Winding, Transform::identity(), clip);
                }
                PaintOp::Text {
                    text,
                    face,
                    size,
                    x,
                    baseline,
                    color,
                } => engine.draw(
                    canvas,
                    text,
                    *face,
                    size * scale,
                    ox + x * scale,
                    oy + baseline * scale,
                    *color,
                    clip,
                ),
            }
        }
    }
}

/// Containing block of a run of content.
#[derive(Debug, Clone, Copy)]
struct Block {
    x: f32,
    width: f32,
    size: f32,
    color: Rgba,
    italic: bool,
}

impl Block {
    fn inline(&self) -> Inline {
        Inline {
            face: FaceRequest {
                italic: self.italic,
                ..Default::default()
            },
            size: self.size,
            color: self.color,
            rise: 0.0,
            code: false,
        }
    }

    fn indented(&self, by: f32) -> Self {
        Self {
            x: self.x + by,
            width: (self.width - by).max(1.0),
            ..*self
        }
    }
}

/// Inherited inline style.
#[derive(Debug, Clone, Copy)]
struct Inline {
    face: FaceRequest,
    size: f32,
    color: Rgba,
    /// Baseline shift, px up
    rise: f32,
    /// Inline code, painted on a pill
    code: bool,
}

impl Inline {
    fn bold(self) -> Self {
        Self {
            face: FaceRequest { bold: true, ..self.face },
            ..self
        }
    }

    fn italic(self) -> Self {
        Self {
            face: FaceRequest {
                italic: true,
                ..self.face
            },
            ..self
        }
    }

    fn script(self, rise: f32) -> Self {
        Self {
            size: self.size * SCRIPT_SCALE,
            rise: self.rise + rise * self.size,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    style: Inline,
}

impl Piece {
    fn new(text: impl Into<String>, style: Inline) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone)]
enum Item {
    /// Unbreakable run
    Word(Vec<Piece>),
    Space(Inline),
    Break,
    /// Display math on its own centered line
    Display(Vec<Piece>),
}

#[derive(Default)]
struct InlineItems {
    items: Vec<Item>,
    word: Vec<Piece>,
}

impl InlineItems {
    fn text(&mut self, text: &str, style: Inline) {
        let mut rest = text;
        while !rest.is_empty() {
            let split = rest.find(char::is_whitespace).unwrap_or(rest.len());
            if split > 0 {
                self.word.push(Piece::new(&rest[..split], style));
            }
            rest = &rest[split..];
            let trimmed = rest.trim_start();
            if trimmed.len() < rest.len() {
                self.space(style);
            }
            rest = trimmed;
        }
    }

    fn space(&mut self, style: Inline) {
        self.flush();
        if !matches!(self.items.last(), Some(Item::Space(_))) {
            self.items.push(Item::Space(style));
        }
    }

    fn atom(&mut self, pieces: Vec<Piece>) {
        self.word.extend(pieces);
    }

    fn push(&mut self, item: Item) {
        self.flush();
        self.items.push(item);
    }

    fn flush(&mut self) {
        if !self.word.is_empty() {
            self.items.push(Item::Word(std::mem::take(&mut self.word)));
        }
    }

    fn finish(mut self) -> Vec<Item> {
        self.flush();
        self.items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Default)]
struct Line {
    /// `(x, width, piece)`
    pieces: Vec<(f32, f32, Piece)>,
    width: f32,
}

impl Line {
    fn push(&mut self, piece: Piece, width: f32) {
        self.pieces.push((self.width, width, piece));
        self.width += width;
    }

    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

struct Layouter<'e, 'f> {
    engine: &'e mut TextEngine<'f>,
    metrics: VerticalMetrics,
    theme: ThemeMode,
    ops: Vec<PaintOp>,
    y: f32,
    /// Collapsed margin waiting above the next line
    margin: f32,
    /// List marker for the next placed line
    marker: Option<(String, f32, Rgba)>,
}

impl Layouter<'_, '_> {
    fn add_margin(&mut self, margin: f32) {
        self.margin = self.margin.max(margin);
    }

    fn settle(&mut self) {
        self.y += self.margin;
        self.margin = 0.0;
    }

    fn blocks(&mut self, nodes: &[Node], block: &Block) {
        let mut run: Vec<&Node> = Vec::new();
        for node in nodes {
            match node {
                Node::Element(el) if BLOCK_TAGS.contains(&el.name.as_str()) => {
                    self.anonymous(&run, block);
                    run.clear();
                    self.block_element(el, block);
                }
                other => run.push(other),
            }
        }
        self.anonymous(&run, block);
    }

    /// Loose inline content between blocks.
    fn anonymous(&mut self, nodes: &[&Node], block: &Block) {
        let mut items = InlineItems::default();
        for node in nodes {
            collect_inline(node, block.inline(), &mut items);
        }
        let items = items.finish();
        if items.iter().any(|item| !matches!(item, Item::Space(_))) {
            self.paragraph(items, block, LINE_HEIGHT);
        }
    }

    fn block_element(&mut self, el: &Element, block: &Block) {
        match el.name.as_str() {
            "p" => {
                let items = inline_items(&el.children, block.inline());
                self.paragraph(items, block, LINE_HEIGHT);
                self.add_margin(PARAGRAPH_GAP * block.size);
            }
            name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => self.heading(el, name, block),
            "pre" => self.code_block(el, block),
            "blockquote" => self.quote(el, block),
            "ul" | "ol" => self.list(el, block),
            "hr" => {
                self.settle();
                self.ops.push(PaintOp::Fill {
                    x: block.x,
                    y: self.y,
                    width: block.width,
                    height: 1.0,
                    radius: 0.0,
                    color: faded(block.color, 0.3),
                });
                self.y += 2.0;
            }
            "table" => self.table(el, block),
            _ => self.blocks(&el.children, block),
        }
    }

    fn heading(&mut self, el: &Element, name: &str, block: &Block) {
        let scale = match name {
            "h1" => 2.0,
            "h2" => 1.5,
            "h3" => 1.2,
            "h4" => 1.0,
            "h5" => 0.83,
            _ => 0.67,
        };
        let heading = Block {
            size: block.size * scale,
            ..*block
        };
        let (above, below) = match name {
            "h1" | "h2" | "h3" => (0.6 * heading.size, 0.4 * heading.size),
            _ => (0.0, 0.0),
        };
        self.add_margin(above);
        let items = inline_items(&el.children, heading.inline().bold());
        self.paragraph(items, &heading, HEADING_LINE_HEIGHT);
        self.add_margin(below);
    }

    fn paragraph(&mut self, items: Vec<Item>, block: &Block, line_height: f32) {
        let mut line = Line::default();
        let mut gap: Option<f32> = None;
        for item in items {
            match item {
                Item::Space(style) => {
                    if !line.is_empty() {
                        gap = Some(self.engine.measure(" ", style.face, style.size));
                    }
                }
                Item::Word(pieces) => {
                    let measured: Vec<(Piece, f32)> = pieces
                        .into_iter()
                        .map(|piece| {
                            let width = self.piece_width(&piece);
                            (piece, width)
                        })
                        .collect();
                    let width: f32 = measured.iter().map(|(_, w)| w).sum();
                    let gap = gap.take().unwrap_or(0.0);
                    if !line.is_empty() && line.width + gap + width > block.width {
                        self.place_line(std::mem::take(&mut line), block, line_height, Align::Left);
                    } else {
                        line.width += gap;
                    }
                    for (piece, w) in measured {
                        line.push(piece, w);
                    }
                }
                Item::Break => {
                    gap = None;
                    self.place_line(std::mem::take(&mut line), block, line_height, Align::Left);
                }
                Item::Display(pieces) => {
                    gap = None;
                    if !line.is_empty() {
                        self.place_line(std::mem::take(&mut line), block, line_height, Align::Left);
                    }
                    let mut display = Line::default();
                    for piece in pieces {
                        let width = self.piece_width(&piece);
                        display.push(piece, width);
                    }
                    self.add_margin(block.size);
                    self.place_line(display, block, line_height, Align::Center);
                    self.add_margin(block.size);
                }
            }
        }
        if !line.is_empty() {
            self.place_line(line, block, line_height, Align::Left);
        }
    }

    fn piece_width(&mut self, piece: &Piece) -> f32 {
        let width = self.engine.measure(&piece.text, piece.style.face, piece.style.size);
        if piece.style.code {
            width + 2.0 * INLINE_CODE_PAD
        } else {
            width
        }
    }

    fn place_line(&mut self, line: Line, block: &Block, line_height: f32, align: Align) {
        self.settle();
        let size = line
            .pieces
            .iter()
            .map(|(_, _, piece)| piece.style.size)
            .fold(block.size, f32::max);
        let height = size * line_height;
        let VerticalMetrics { ascent, descent } = self.metrics;
        let baseline = self.y + (height - (ascent + descent) * size) / 2.0 + ascent * size;
        let left = match align {
            Align::Left => block.x,
            Align::Center => block.x + ((block.width - line.width) / 2.0).max(0.0),
        };

        if let Some((marker, size, color)) = self.marker.take() {
            let width = self.engine.measure(&marker, FaceRequest::default(), size);
            self.ops.push(PaintOp::Text {
                text: marker,
                face: FaceRequest::default(),
                size,
                x: block.x - width - 0.4 * size,
                baseline,
                color,
            });
        }

        for (x, width, piece) in line.pieces {
            let mut x = left + x;
            let style = piece.style;
            if style.code {
                self.ops.push(PaintOp::Fill {
                    x,
                    y: baseline - ascent * style.size - 2.0,
                    width,
                    height: (ascent + descent) * style.size + 4.0,
                    radius: 4.0,
                    color: inline_code_background(self.theme),
                });
                x += INLINE_CODE_PAD;
            }
            self.ops.push(PaintOp::Text {
                text: piece.text,
                face: style.face,
                size: style.size,
                x,
                baseline: baseline - style.rise,
                color: style.color,
            });
        }
        self.y += height;
    }

    fn code_block(&mut self, el: &Element, block: &Block) {
        self.add_margin(block.size);
        self.settle();

        let style = Inline {
            face: FaceRequest {
                mono: true,
                ..Default::default()
            },
            size: block.size * CODE_SCALE,
            color: block.color,
            rise: 0.0,
            code: false,
        };
        let mut lines: Vec<Vec<Piece>> = vec![Vec::new()];
        collect_code(&el.children, style, &mut lines);
        if lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let line_height = block.size * LINE_HEIGHT;
        let height = 2.0 * PRE_PADDING + lines.len() as f32 * line_height;
        self.ops.push(PaintOp::Fill {
            x: block.x,
            y: self.y,
            width: block.width,
            height,
            radius: PRE_RADIUS,
            color: pre_background(self.theme),
        });

        let VerticalMetrics { ascent, descent } = self.metrics;
        let mut top = self.y + PRE_PADDING;
        for line in lines {
            let baseline = top + (line_height - (ascent + descent) * block.size) / 2.0 + ascent * block.size;
            let mut x = block.x + PRE_PADDING;
            for piece in line {
                let width = self.engine.measure(&piece.text, piece.style.face, piece.style.size);
                if !piece.text.trim().is_empty() {
                    self.ops.push(PaintOp::Text {
                        text: piece.text,
                        face: piece.style.face,
                        size: piece.style.size,
                        x,
                        baseline,
                        color: piece.style.color,
                    });
                }
                x += width;
            }
            top += line_height;
        }

        self.y += height;
        self.add_margin(block.size);
    }

    fn quote(&mut self, el: &Element, block: &Block) {
        self.add_margin(block.size);
        self.settle();
        let top = self.y;
        let color = faded(block.color, QUOTE_OPACITY);
        let inner = Block {
            color,
            italic: true,
            ..block.indented(QUOTE_BAR + QUOTE_INDENT)
        };
        self.blocks(&el.children, &inner);
        self.ops.push(PaintOp::Fill {
            x: block.x,
            y: top,
            width: QUOTE_BAR,
            height: self.y - top,
            radius: 0.0,
            color,
        });
        self.add_margin(block.size);
    }

    fn list(&mut self, el: &Element, block: &Block) {
        let ordered = el.name == "ol";
        let mut number = el
            .attr("start")
            .and_then(|start| start.trim().parse::<i64>().ok())
            .unwrap_or(1);
        let inner = block.indented(LIST_INDENT * block.size);
        for item in el.children.iter().filter_map(Node::as_element) {
            if item.name != "li" {
                continue;
            }
            let marker = if ordered { format!("{number}.") } else { "•".to_string() };
            number += 1;
            self.marker = Some((marker, block.size, block.color));
            self.blocks(&item.children, &inner);
            self.marker = None;
        }
        self.add_margin(PARAGRAPH_GAP * block.size);
    }

    fn table(&mut self, el: &Element, block: &Block) {
        let mut rows = Vec::new();
        table_rows(el, &mut rows);
        for row in rows {
            let cells: Vec<&Element> = row
                .children
                .iter()
                .filter_map(Node::as_element)
                .filter(|cell| cell.name == "td" || cell.name == "th")
                .collect();
            if cells.is_empty() {
                continue;
            }
            self.settle();
            let top = self.y;
            let column = block.width / cells.len() as f32;
            let mut bottom = top;
            for (i, cell) in cells.iter().enumerate() {
                self.y = top;
                let cell_block = Block {
                    x: block.x + i as f32 * column,
                    width: (column - CELL_GAP).max(1.0),
                    ..*block
                };
                let style = if cell.name == "th" {
                    cell_block.inline().bold()
                } else {
                    cell_block.inline()
                };
                self.paragraph(inline_items(&cell.children, style), &cell_block, LINE_HEIGHT);
                bottom = bottom.max(self.y);
                self.margin = 0.0;
            }
            self.y = bottom;
        }
        self.add_margin(PARAGRAPH_GAP * block.size);
    }
}

fn table_rows<'a>(el: &'a Element, rows: &mut Vec<&'a Element>) {
    for child in el.children.iter().filter_map(Node::as_element) {
        match child.name.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => table_rows(child, rows),
            _ => {}
        }
    }
}

fn inline_items(nodes: &[Node], style: Inline) -> Vec<Item> {
    let mut items = InlineItems::default();
    for node in nodes {
        collect_inline(node, style, &mut items);
    }
    items.finish()
}

fn collect_inline(node: &Node, style: Inline, items: &mut InlineItems) {
    let el = match node {
        Node::Text(text) => return items.text(text, style),
        Node::Rendered(rendered) => {
            for child in &Fragment::parse(&rendered.markup).children {
                collect_inline(child, style, items);
            }
            return;
        }
        Node::Element(el) => el,
    };

    match el.name.as_str() {
        "br" => items.push(Item::Break),
        "img" | "input" | "script" | "style" => {}
        "strong" | "b" => recurse(el, style.bold(), items),
        "em" | "i" => recurse(el, style.italic(), items),
        "code" | "kbd" | "samp" => {
            let text = el.text_content().split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                let code = Inline {
                    face: FaceRequest {
                        mono: true,
                        ..style.face
                    },
                    size: style.size * CODE_SCALE,
                    code: true,
                    ..style
                };
                items.atom(vec![Piece::new(text, code)]);
            }
        }
        "sup" => recurse(el, style.script(0.45), items),
        "sub" => recurse(el, style.script(-0.2), items),
        "span" if el.has_class("math-display") => items.push(Item::Display(math_of(el, style))),
        "span" if el.has_class("math-inline") => items.atom(math_of(el, style)),
        "math" if el.attr("display") == Some("block") => items.push(Item::Display(math_of(el, style))),
        "math" => items.atom(math_of(el, style)),
        _ => {
            let style = match el.attr("style").and_then(css_color) {
                Some(rgb) => Inline {
                    color: Rgba::new(rgb, style.color.alpha),
                    ..style
                },
                None => style,
            };
            recurse(el, style, items);
        }
    }
}

fn recurse(el: &Element, style: Inline, items: &mut InlineItems) {
    for child in &el.children {
        collect_inline(child, style, items);
    }
}

/// Split highlighted code into lines of colored pieces.
fn collect_code(nodes: &[Node], style: Inline, lines: &mut Vec<Vec<Piece>>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                for (i, part) in text.replace('\t', TAB).split('\n').enumerate() {
                    if i > 0 {
                        lines.push(Vec::new());
                    }
                    if let (false, Some(line)) = (part.is_empty(), lines.last_mut()) {
                        line.push(Piece::new(part, style));
                    }
                }
            }
            Node::Element(el) => {
                let style = match el.attr("style").and_then(css_color) {
                    Some(rgb) => Inline {
                        color: Rgba::new(rgb, style.color.alpha),
                        ..style
                    },
                    None => style,
                };
                collect_code(&el.children, style, lines);
            }
            Node::Rendered(rendered) => collect_code(&Fragment::parse(&rendered.markup).children, style, lines),
        }
    }
}

/// The `color` declaration of an inline style attribute.
fn css_color(style: &str) -> Option<Rgb> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("color") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn math_of(el: &Element, style: Inline) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for child in &el.children {
        math_pieces(child, style, &mut pieces);
    }
    pieces
}

/// Flatten MathML into baseline-shifted runs.
fn math_pieces(node: &Node, style: Inline, out: &mut Vec<Piece>) {
    let el = match node {
        Node::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                out.push(Piece::new(text, style));
            }
            return;
        }
        Node::Rendered(rendered) => {
            for child in &Fragment::parse(&rendered.markup).children {
                math_pieces(child, style, out);
            }
            return;
        }
        Node::Element(el) => el,
    };

    let kids: Vec<&Node> = el
        .children
        .iter()
        .filter(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()))
        .collect();
    let upright = Inline {
        face: FaceRequest {
            italic: false,
            ..style.face
        },
        ..style
    };

    match el.name.as_str() {
        "mi" => {
            let text = el.text_content();
            let text = text.trim();
            let mut chars = text.chars();
            let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
            let style = if single_letter { style.italic() } else { upright };
            if !text.is_empty() {
                out.push(Piece::new(text, style));
            }
        }
        "mn" | "mtext" | "ms" => {
            let text = el.text_content();
            if !text.trim().is_empty() {
                out.push(Piece::new(text.trim(), upright));
            }
        }
        "mo" => {
            let text = el.text_content();
            let op = text.trim();
            if SPACED_OPERATORS.contains(&op) {
                out.push(Piece::new(format!(" {op} "), upright));
            } else if !op.is_empty() {
                out.push(Piece::new(op, upright));
            }
        }
        "mspace" => out.push(Piece::new(" ", upright)),
        "msup" | "mover" => scripted(&kids, &[0.45], style, out),
        "msub" | "munder" => scripted(&kids, &[-0.2], style, out),
        "msubsup" | "munderover" => scripted(&kids, &[-0.2, 0.45], style, out),
        "mfrac" => {
            if let [numerator, denominator, ..] = kids.as_slice() {
                fenced(numerator, style, out);
                out.push(Piece::new("/", upright));
                fenced(denominator, style, out);
            }
        }
        "msqrt" => {
            out.push(Piece::new("√", upright));
            let compound = kids.len() > 1 || kids.first().is_some_and(|kid| is_compound(kid));
            if compound {
                out.push(Piece::new("(", upright));
            }
            for kid in &kids {
                math_pieces(kid, style, out);
            }
            if compound {
                out.push(Piece::new(")", upright));
            }
        }
        "mroot" => {
            if let [base, index, ..] = kids.as_slice() {
                math_pieces(index, style.script(0.45), out);
                out.push(Piece::new("√", upright));
                fenced(base, style, out);
            }
        }
        "annotation" | "annotation-xml" => {}
        _ => {
            for kid in kids {
                math_pieces(kid, style, out);
            }
        }
    }
}

/// Base followed by scripts raised by each of `rises` (in ems).
fn scripted(kids: &[&Node], rises: &[f32], style: Inline, out: &mut Vec<Piece>) {
    let Some((base, scripts)) = kids.split_first() else {
        return;
    };
    math_pieces(base, style, out);
    for (script, rise) in scripts.iter().zip(rises) {
        math_pieces(script, style.script(*rise), out);
    }
}

fn fenced(node: &Node, style: Inline, out: &mut Vec<Piece>) {
    let upright = Inline {
        face: FaceRequest {
            italic: false,
            ..style.face
        },
        ..style
    };
    if is_compound(node) {
        out.push(Piece::new("(", upright));
        math_pieces(node, style, out);
        out.push(Piece::new(")", upright));
    } else {
        math_pieces(node, style, out);
    }
}

fn is_compound(node: &Node) -> bool {
    match node {
        Node::Element(el) if el.name == "mrow" => {
            el.children
                .iter()
                .filter(|child| matches!(child, Node::Element(_)))
                .count()
                > 1
        }
        _ => false,
    }
}

fn faded(color: Rgba, factor: f32) -> Rgba {
    Rgba::new(color.rgb, color.alpha * factor)
}

fn pre_background(theme: ThemeMode) -> Rgba {
    match theme {
        ThemeMode::Light => Rgba::new(Rgb::hex(0xffffff), 0.7),
        ThemeMode::Dark => Rgba::new(Rgb::hex(0x0f172a), 0.6),
    }
}

fn inline_code_background(theme: ThemeMode) -> Rgba {
    match theme {
        ThemeMode::Light => Rgba::new(Rgb::hex(0x0f172a), 0.06),
        ThemeMode::Dark => Rgba::new(Rgb::hex(0xffffff), 0.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fonts::FontLibrary;
    use crate::style::{compose, StyleConfig};

    fn layout(html: &str, width: f32) -> ContentLayout {
        layout_with(html, width, &StyleConfig::default())
    }

    fn layout_with(html: &str, width: f32, style: &StyleConfig) -> ContentLayout {
        let fonts = FontLibrary::empty();
        let composed = compose(style);
        let mut engine = TextEngine::new(&fonts, &composed.font);
        ContentLayout::build(html, width, &composed, &mut engine)
    }

    fn texts(layout: &ContentLayout) -> Vec<(&str, f32, f32, f32)> {
        layout
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text {
                    text,
                    size,
                    x,
                    baseline,
                    ..
                } => Some((text.as_str(), *size, *x, *baseline)),
                PaintOp::Fill { .. } => None,
            })
            .collect()
    }

    fn fills(layout: &ContentLayout) -> Vec<Rgba> {
        layout
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Fill { color, .. } => Some(*color),
                PaintOp::Text { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_content_has_no_height() {
        let layout = layout("", 400.0);
        assert!(layout.is_empty());
        assert_eq!(layout.height(), 0.0);
        assert_eq!(self::layout("   \n", 400.0).height(), 0.0);
    }

    #[test]
    fn test_paragraph_line_and_margin() {
        let layout = layout("<p>Hello</p>", 400.0);
        // One 16px line at 1.65 plus the 0.8em bottom margin
        assert!((layout.height() - (16.0 * 1.65 + 12.8)).abs() < 1e-3, "{}", layout.height());
        assert_eq!(texts(&layout)[0].0, "Hello");
    }

    #[test]
    fn test_narrow_box_wraps_more_lines() {
        let html = format!("<p>{}</p>", "glass ".repeat(40));
        let wide = layout(&html, 2000.0);
        let narrow = layout(&html, 120.0);
        assert!(narrow.height() > wide.height() * 4.0);
        // Every word lands inside the box
        for (_, _, x, _) in texts(&narrow) {
            assert!(x < 120.0);
        }
    }

    #[test]
    fn test_heading_margins_and_size() {
        let layout = layout("<h1>Title</h1>", 400.0);
        let expected = 0.6 * 32.0 + 32.0 * 1.25 + 0.4 * 32.0;
        assert!((layout.height() - expected).abs() < 1e-3, "{}", layout.height());
        assert_eq!(texts(&layout)[0].1, 32.0);
    }

    #[test]
    fn test_sibling_margins_collapse() {
        let two = layout("<p>a</p><p>b</p>", 400.0);
        let lines: Vec<f32> = texts(&two).iter().map(|(_, _, _, baseline)| *baseline).collect();
        assert!((lines[1] - lines[0] - (16.0 * 1.65 + 12.8)).abs() < 1e-3);

        let quoted = layout("<p>a</p><blockquote><p>b</p></blockquote>", 400.0);
        let lines: Vec<f32> = texts(&quoted).iter().map(|(_, _, _, baseline)| *baseline).collect();
        // max(0.8em, 1em) between them, not the sum
        assert!((lines[1] - lines[0] - (16.0 * 1.65 + 16.0)).abs() < 1e-3);
    }

    #[test]
    fn test_highlighted_code_keeps_colors() {
        let html = "<pre><code class=\"hljs\"><span style=\"color:#ff0000;\">fn</span> main() {}\n</code></pre>";
        let layout = layout(html, 400.0);
        let keyword = layout
            .ops
            .iter()
            .find_map(|op| match op {
                PaintOp::Text { text, color, face, .. } if text == "fn" => Some((*color, *face)),
                _ => None,
            })
            .unwrap();
        assert_eq!(keyword.0.rgb, Rgb::hex(0xff0000));
        assert!(keyword.1.mono);
        // One line inside the padded box plus 1em margins
        let expected = 16.0 + 2.0 * PRE_PADDING + 16.0 * 1.65 + 16.0;
        assert!((layout.height() - expected).abs() < 1e-3, "{}", layout.height());
    }

    #[test]
    fn test_code_backgrounds_follow_theme() {
        let html = "<p><code>x</code></p><pre><code>y</code></pre>";
        let light = fills(&layout(html, 400.0));
        let mut dark_style = StyleConfig::default();
        dark_style.set_theme(ThemeMode::Dark);
        let dark = fills(&layout_with(html, 400.0, &dark_style));
        assert_eq!(light, vec![inline_code_background(ThemeMode::Light), pre_background(ThemeMode::Light)]);
        assert_eq!(dark, vec![inline_code_background(ThemeMode::Dark), pre_background(ThemeMode::Dark)]);
    }

    #[test]
    fn test_inline_math_superscript_is_raised() {
        let html = "<p><span class=\"math math-inline\"><math><msup><mi>x</mi><mn>2</mn></msup></math></span></p>";
        let layout = layout(html, 400.0);
        let runs = texts(&layout);
        let (_, base_size, base_x, base_line) = runs[0];
        let (text, size, x, baseline) = runs[1];
        assert_eq!((runs[0].0, text), ("x", "2"));
        assert!(size < base_size);
        assert!(x > base_x);
        assert!(baseline < base_line);
    }

    #[test]
    fn test_fraction_flattens_with_parens() {
        let html = "<p><span class=\"math math-inline\"><math><mfrac><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow><mn>2</mn></mfrac></math></span></p>";
        let layout = layout(html, 400.0);
        let joined: String = texts(&layout).iter().map(|(text, ..)| *text).collect();
        assert_eq!(joined, "(a + b)/2");
    }

    #[test]
    fn test_display_math_is_centered() {
        let html = "<p><span class=\"math math-display\"><math display=\"block\"><mi>y</mi></math></span></p>";
        let layout = layout(html, 400.0);
        let (_, _, x, _) = texts(&layout)[0];
        let width = 16.0 * 0.55;
        assert!((x - (400.0 - width) / 2.0).abs() < 1e-3, "{x}");
    }

    #[test]
    fn test_list_markers() {
        let layout = layout("<ul><li>a</li><li>b</li></ul><ol start=\"3\"><li>c</li><li>d</li></ol>", 400.0);
        let markers: Vec<&str> = texts(&layout)
            .into_iter()
            .map(|(text, ..)| text)
            .filter(|text| *text == "•" || text.ends_with('.'))
            .collect();
        assert_eq!(markers, vec!["•", "•", "3.", "4."]);
        let item = texts(&layout).into_iter().find(|(text, ..)| *text == "a").unwrap();
        assert!((item.2 - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_quote_bar_and_italics() {
        let layout = layout("<blockquote><p>quoted</p></blockquote>", 400.0);
        assert_eq!(fills(&layout).len(), 1);
        let quoted = layout
            .ops
            .iter()
            .find_map(|op| match op {
                PaintOp::Text { face, color, x, .. } => Some((*face, *color, *x)),
                _ => None,
            })
            .unwrap();
        assert!(quoted.0.italic);
        assert!((quoted.1.alpha - QUOTE_OPACITY).abs() < 1e-6);
        assert!((quoted.2 - (QUOTE_BAR + QUOTE_INDENT)).abs() < 1e-3);
    }

    #[test]
    fn test_table_cells_share_a_row() {
        let html = "<table><thead><tr><th>k</th><th>v</th></tr></thead><tbody><tr><td>a</td><td>b</td></tr></tbody></table>";
        let layout = layout(html, 400.0);
        let runs = texts(&layout);
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0].3, runs[1].3);
        assert!(runs[1].2 >= 200.0);
        assert!(runs[2].3 > runs[0].3);
    }

    #[test]
    fn test_css_color() {
        assert_eq!(css_color("color:#a6e22e;"), Some(Rgb::hex(0xa6e22e)));
        assert_eq!(css_color("font-weight:bold;color: #fff"), Some(Rgb::hex(0xffffff)));
        assert_eq!(css_color("background-color:#fff;"), None);
    }
}
