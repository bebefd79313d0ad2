//! Two-line LCD model
//!
//! The display shows 2 rows of 56 characters. In cell mode each row is split
//! into 8 cells of 7 characters (6 visible plus a separating space), one per
//! channel strip. A row can instead show one line of free text ("full text
//! mode"), which is how fallback and hint messages are rendered.
//!
//! `DisplayContent` is what a display layer shows; the `LcdDisplay` renders
//! whichever content is currently attached and only transmits a buffer that
//! differs from the last one sent.

use super::feedback::SurfaceOutput;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Characters per display row
pub const DISPLAY_WIDTH: usize = 56;

/// Characters per channel cell, including the trailing separator
pub const CELL_WIDTH: usize = 7;

/// Number of text rows
pub const DISPLAY_ROWS: usize = 2;

/// Shared handle to the content of one display layer
pub type DisplayHandle = Rc<RefCell<DisplayContent>>;

/// Where a piece of display text comes from
#[derive(Clone, Default)]
pub enum TextSource {
    #[default]
    Empty,
    /// Constant text
    Fixed(String),
    /// Text pulled from the host on every render
    Dynamic(Rc<dyn Fn() -> String>),
}

impl TextSource {
    pub fn fixed(text: impl Into<String>) -> Self {
        TextSource::Fixed(text.into())
    }

    pub fn dynamic(supplier: impl Fn() -> String + 'static) -> Self {
        TextSource::Dynamic(Rc::new(supplier))
    }

    pub fn resolve(&self) -> String {
        match self {
            TextSource::Empty => String::new(),
            TextSource::Fixed(text) => text.clone(),
            TextSource::Dynamic(supplier) => supplier(),
        }
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Empty => write!(f, "Empty"),
            TextSource::Fixed(text) => write!(f, "Fixed({:?})", text),
            TextSource::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

/// Text shown by one display layer
#[derive(Debug)]
pub struct DisplayContent {
    name: String,
    /// Per-row cell sources, one per channel
    cells: [Vec<TextSource>; DISPLAY_ROWS],
    /// Per-row free text used in full text mode
    main_text: [TextSource; DISPLAY_ROWS],
    /// Per-row full text mode switch
    full_text: [bool; DISPLAY_ROWS],
}

impl DisplayContent {
    pub fn new(name: impl Into<String>, channels: usize) -> Self {
        Self {
            name: name.into(),
            cells: [
                vec![TextSource::Empty; channels],
                vec![TextSource::Empty; channels],
            ],
            main_text: [TextSource::Empty, TextSource::Empty],
            full_text: [false; DISPLAY_ROWS],
        }
    }

    /// Wrap new content into a shareable handle
    pub fn shared(name: impl Into<String>, channels: usize) -> DisplayHandle {
        Rc::new(RefCell::new(Self::new(name, channels)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the cell for `index` on `row`; out-of-range cells are ignored
    pub fn bind_cell(&mut self, row: usize, index: usize, source: TextSource) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(index)) {
            *cell = source;
        } else {
            log::trace!(
                "Display '{}': ignoring cell binding row={} index={}",
                self.name,
                row,
                index
            );
        }
    }

    /// Set the free text of both rows
    pub fn set_main_text(&mut self, line1: impl Into<String>, line2: impl Into<String>) {
        self.main_text = [TextSource::Fixed(line1.into()), TextSource::Fixed(line2.into())];
    }

    /// Set the free text source of a single row
    pub fn set_row_text(&mut self, row: usize, source: TextSource) {
        if let Some(slot) = self.main_text.get_mut(row) {
            *slot = source;
        }
    }

    /// Switch both rows between cell mode and full text mode
    pub fn enable_full_text_mode(&mut self, enabled: bool) {
        self.full_text = [enabled; DISPLAY_ROWS];
    }

    /// Switch a single row between cell mode and full text mode
    pub fn enable_row_full_text(&mut self, row: usize, enabled: bool) {
        if let Some(flag) = self.full_text.get_mut(row) {
            *flag = enabled;
        }
    }

    pub fn is_full_text(&self, row: usize) -> bool {
        self.full_text.get(row).copied().unwrap_or(false)
    }

    /// Render both rows to fixed-width lines
    pub fn render(&self) -> [String; DISPLAY_ROWS] {
        [self.render_row(0), self.render_row(1)]
    }

    fn render_row(&self, row: usize) -> String {
        if self.full_text[row] {
            return fit(&self.main_text[row].resolve(), DISPLAY_WIDTH);
        }
        let mut line = String::with_capacity(DISPLAY_WIDTH);
        for cell in &self.cells[row] {
            let text = fit(&cell.resolve(), CELL_WIDTH - 1);
            line.push_str(&text);
            line.push(' ');
        }
        fit(&line, DISPLAY_WIDTH)
    }
}

/// Truncate or right-pad `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

fn blank_lines() -> [String; DISPLAY_ROWS] {
    [" ".repeat(DISPLAY_WIDTH), " ".repeat(DISPLAY_WIDTH)]
}

/// The physical display of one section
pub struct LcdDisplay {
    /// Content of the display layer that currently owns the LCD
    content: Option<DisplayHandle>,
    /// Buffer as it should appear on the hardware
    lines: [String; DISPLAY_ROWS],
    /// Buffer as last transmitted (None forces the next send)
    last_sent: Option<[String; DISPLAY_ROWS]>,
}

impl LcdDisplay {
    pub fn new() -> Self {
        Self {
            content: None,
            lines: blank_lines(),
            last_sent: None,
        }
    }

    /// Attach content and render it into the buffer immediately
    pub fn attach(&mut self, content: DisplayHandle) {
        self.content = Some(content);
        self.refresh();
    }

    /// Detach the current content and blank the buffer
    pub fn detach(&mut self) {
        self.content = None;
        self.lines = blank_lines();
    }

    pub fn is_attached(&self) -> bool {
        self.content.is_some()
    }

    /// Name of the attached content, if any
    pub fn content_name(&self) -> Option<String> {
        self.content
            .as_ref()
            .map(|content| content.borrow().name().to_string())
    }

    /// Re-render the attached content (dynamic text may have changed)
    pub fn refresh(&mut self) {
        if let Some(content) = &self.content {
            self.lines = content.borrow().render();
        }
    }

    pub fn lines(&self) -> &[String; DISPLAY_ROWS] {
        &self.lines
    }

    /// Transmit the buffer if it differs from the last transmitted one
    ///
    /// Returns whether anything was sent.
    pub fn flush(&mut self, section: usize, out: &mut dyn SurfaceOutput) -> bool {
        if self.last_sent.as_ref() == Some(&self.lines) {
            return false;
        }
        out.send_display(section, &self.lines);
        self.last_sent = Some(self.lines.clone());
        true
    }

    /// Forget the last transmitted buffer so the next flush resends it
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

impl Default for LcdDisplay {
    fn default() -> Self {
        Self::new()
    }
}
