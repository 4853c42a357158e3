//! Core of the PDF logo placer.
//!
//! A host UI sends JSON commands through a JNI `dispatch` export; this crate owns the
//! overlay geometry, the drag/resize state machine and the PDF session that
//! bakes a logo image into a chosen page.

pub mod config;
pub mod error;
pub mod features;
mod router;
mod state;
mod ui;

#[cfg(test)]
mod test_support;

pub use config::EditorConfig;
pub use error::{Result, StampError};
pub use features::geometry::{map_overlay_to_pdf, select_page, PageSize, PdfRect, PixelRect};
pub use features::logo::{LogoAsset, LogoFormat};
pub use features::overlay::{resize, Corner, DragState, OverlayEditor, PointerTarget};
pub use features::pdf::{embed_and_place, PageBox};
pub use features::session::PdfSession;
