//! Pointer-driven drag and corner-resize of the logo overlay.

use super::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "top-left" => Some(Corner::TopLeft),
            "top-right" => Some(Corner::TopRight),
            "bottom-left" => Some(Corner::BottomLeft),
            "bottom-right" => Some(Corner::BottomRight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }

    fn moves_left_edge(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    fn moves_top_edge(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Body,
    Handle(Corner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        offset_x: f64,
        offset_y: f64,
    },
    Resizing {
        corner: Corner,
        anchor: PixelRect,
        start_x: f64,
        start_y: f64,
    },
}

/// Live overlay geometry plus the interaction currently acting on it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEditor {
    rect: PixelRect,
    drag: DragState,
    min_size: f64,
}

impl OverlayEditor {
    pub fn new(rect: PixelRect, min_size: f64) -> Self {
        Self {
            rect,
            drag: DragState::Idle,
            min_size,
        }
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Whether the host must forward pointer moves/ups from anywhere in the window.
    pub fn captures_pointer(&self) -> bool {
        !matches!(self.drag, DragState::Idle)
    }

    pub fn pointer_down(&mut self, target: PointerTarget, x: f64, y: f64) {
        match (target, self.drag) {
            (PointerTarget::Body, DragState::Idle) => {
                self.drag = DragState::Dragging {
                    offset_x: x - self.rect.left,
                    offset_y: y - self.rect.top,
                };
                log::debug!("overlay drag start at ({x}, {y})");
            }
            // Handles swallow the event, so a body press never interrupts a resize.
            (PointerTarget::Body, _) => {}
            (PointerTarget::Handle(corner), _) => {
                self.drag = DragState::Resizing {
                    corner,
                    anchor: self.rect,
                    start_x: x,
                    start_y: y,
                };
                log::debug!("overlay resize start {} at ({x}, {y})", corner.as_str());
            }
        }
    }

    /// Apply a pointer move. Returns true when the overlay geometry changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let next = match self.drag {
            DragState::Idle => return false,
            DragState::Dragging { offset_x, offset_y } => PixelRect {
                left: x - offset_x,
                top: y - offset_y,
                ..self.rect
            },
            DragState::Resizing {
                corner,
                anchor,
                start_x,
                start_y,
            } => resize(corner, &anchor, x - start_x, y - start_y, self.min_size),
        };
        let changed = next != self.rect;
        self.rect = next;
        changed
    }

    pub fn pointer_up(&mut self) {
        if self.captures_pointer() {
            log::debug!(
                "overlay settled at {}x{} +{}+{}",
                self.rect.width,
                self.rect.height,
                self.rect.left,
                self.rect.top
            );
        }
        self.drag = DragState::Idle;
    }
}

/// Corner-specific resize from the geometry captured at pointer-down.
///
/// Width and height never drop below `min_size`; when clamped, the edge
/// opposite the dragged corner stays put.
pub fn resize(corner: Corner, anchor: &PixelRect, dx: f64, dy: f64, min_size: f64) -> PixelRect {
    let mut rect = *anchor;
    match corner {
        Corner::BottomRight => {
            rect.width = anchor.width + dx;
            rect.height = anchor.height + dy;
        }
        Corner::BottomLeft => {
            rect.width = anchor.width - dx;
            rect.left = anchor.left + dx;
            rect.height = anchor.height + dy;
        }
        Corner::TopRight => {
            rect.width = anchor.width + dx;
            rect.height = anchor.height - dy;
            rect.top = anchor.top + dy;
        }
        Corner::TopLeft => {
            rect.width = anchor.width - dx;
            rect.left = anchor.left + dx;
            rect.height = anchor.height - dy;
            rect.top = anchor.top + dy;
        }
    }

    if rect.width < min_size {
        rect.width = min_size;
        if corner.moves_left_edge() {
            rect.left = anchor.right() - min_size;
        }
    }
    if rect.height < min_size {
        rect.height = min_size;
        if corner.moves_top_edge() {
            rect.top = anchor.bottom() - min_size;
        }
    }
    rect
}
