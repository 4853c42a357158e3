//! Host-facing handlers: upload, pointer interaction, placement and export.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde_json::{json, Value};

use super::geometry::{map_overlay_to_pdf, select_page, PixelRect};
use super::logo::LogoAsset;
use super::overlay::{Corner, OverlayEditor, PointerTarget};
use super::session::PdfSession;
use crate::error::{Result, StampError};
use crate::state::{AppState, Screen};
use crate::ui::{
    to_value_or_text, Button as UiButton, Column as UiColumn, LogoOverlay as UiLogoOverlay,
    PdfViewer as UiPdfViewer, Text as UiText,
};

/// Start a fresh session from uploaded bytes; the previous one is kept on failure.
pub fn handle_pdf_upload(state: &mut AppState, bytes: Vec<u8>, name: Option<&str>) -> Result<()> {
    let session = PdfSession::load_original(bytes)?;
    state.session = Some(session);
    state.overlay = None;
    state.source_name = name.map(|n| n.to_string());
    state.last_output = None;
    state.screen = Screen::Editor;
    Ok(())
}

/// Make `bytes` the active logo and drop a fresh overlay at the configured spot.
pub fn handle_logo_upload(state: &mut AppState, bytes: Vec<u8>, mime: Option<&str>) -> Result<()> {
    let config = state.config();
    let session = state.session.as_mut().ok_or(StampError::NoDocument)?;
    let logo = LogoAsset::new(bytes, mime)?;
    log::info!(
        "Logo ready: {} ({} bytes)",
        logo.format().mime(),
        logo.bytes().len()
    );
    session.set_logo(logo);
    state.overlay = Some(OverlayEditor::new(
        PixelRect::new(
            config.initial_left,
            config.initial_top,
            config.initial_width,
            config.initial_height,
        ),
        config.min_overlay_size,
    ));
    Ok(())
}

pub fn handle_logo_clear(state: &mut AppState) {
    if let Some(session) = state.session.as_mut() {
        session.clear_logo();
    }
    state.overlay = None;
}

/// Parse the host's handle name; `None` means the overlay body.
pub fn pointer_target(handle: Option<&str>) -> std::result::Result<PointerTarget, String> {
    match handle.map(str::trim).filter(|h| !h.is_empty() && *h != "body") {
        None => Ok(PointerTarget::Body),
        Some(name) => Corner::parse(name)
            .map(PointerTarget::Handle)
            .ok_or_else(|| format!("unknown_handle:{name}")),
    }
}

pub fn handle_pointer_down(state: &mut AppState, target: PointerTarget, x: f64, y: f64) {
    if let Some(overlay) = state.overlay.as_mut() {
        overlay.pointer_down(target, x, y);
    }
}

pub fn handle_pointer_move(state: &mut AppState, x: f64, y: f64) -> bool {
    state
        .overlay
        .as_mut()
        .map(|overlay| overlay.pointer_move(x, y))
        .unwrap_or(false)
}

pub fn handle_pointer_up(state: &mut AppState) {
    if let Some(overlay) = state.overlay.as_mut() {
        overlay.pointer_up();
    }
}

/// Bake the overlay into the page it sits on. `pages` are the rendered page
/// rects in document order, measured by the host at the moment of the call.
///
/// Returns the zero-based index of the page that received the logo. On error
/// the overlay stays in place for another try.
pub fn handle_confirm_placement(state: &mut AppState, pages: &[PixelRect]) -> Result<usize> {
    let overlay = state
        .overlay
        .as_ref()
        .ok_or(StampError::MissingOverlay)?
        .rect();
    let session = state.session.as_mut().ok_or(StampError::NoDocument)?;
    if session.logo().is_none() {
        return Err(StampError::MissingLogo);
    }

    let index = select_page(&overlay, pages).ok_or(StampError::NoActivePage)?;
    let page_box = session.page_box(index)?;
    let rect = map_overlay_to_pdf(&overlay, &pages[index], page_box.size())
        .translated(page_box.x0, page_box.y0);
    if !rect.is_finite() {
        return Err(StampError::NonFinitePlacement);
    }
    session.commit_logo_placement(index, rect)?;

    state.overlay = None;
    Ok(index)
}

/// Write the current bytes under the configured download name inside `output_dir`.
pub fn handle_export(state: &mut AppState, output_dir: &Path) -> Result<PathBuf> {
    let name = state.config().download_name;
    let session = state.session.as_ref().ok_or(StampError::NoDocument)?;
    let path = output_dir.join(name);
    fs::write(&path, session.export_current())?;
    log::info!(
        "Exported {} bytes to {}",
        session.export_current().len(),
        path.display()
    );
    state.last_output = Some(path.display().to_string());
    Ok(path)
}

/// Current bytes for the host viewer.
pub fn pdf_bytes_payload(state: &AppState) -> Result<Value> {
    let session = state.session.as_ref().ok_or(StampError::NoDocument)?;
    Ok(json!({
        "type": "PdfBytes",
        "revision": session.revision(),
        "page_count": session.page_count(),
        "data_base64": B64.encode(session.export_current()),
    }))
}

/// Active logo for the host to paint inside the overlay box.
pub fn logo_bytes_payload(state: &AppState) -> Result<Value> {
    let logo = state
        .session
        .as_ref()
        .ok_or(StampError::NoDocument)?
        .logo()
        .ok_or(StampError::MissingLogo)?;
    Ok(json!({
        "type": "LogoBytes",
        "mime": logo.format().mime(),
        "data_base64": B64.encode(logo.bytes()),
    }))
}

pub fn render_home_screen(state: &AppState) -> Value {
    let mut children = vec![
        to_value_or_text(UiText::new("PDF logo placer").size(20.0), "title"),
        to_value_or_text(
            UiText::new("Pick a PDF, add a logo, drag it into place, then confirm.").size(14.0),
            "subtitle",
        ),
        to_value_or_text(
            UiButton::new("Pick PDF", "pdf_upload")
                .id("pdf_upload_btn")
                .requires_file_picker(true)
                .accept("application/pdf"),
            "pdf_upload",
        ),
    ];
    push_error(&mut children, state);
    to_value_or_text(UiColumn::new(children).padding(20), "home")
}

pub fn render_editor_screen(state: &AppState) -> Value {
    let Some(session) = state.session.as_ref() else {
        return render_home_screen(state);
    };

    let mut children = vec![to_value_or_text(
        UiText::new("PDF logo placer").size(20.0),
        "title",
    )];
    if let Some(name) = &state.source_name {
        children.push(to_value_or_text(
            UiText::new(&format!("Document: {name}")).size(12.0),
            "source",
        ));
    }
    children.push(to_value_or_text(
        UiText::new(&format!(
            "Pages: {} · placements: {}",
            session.page_count(),
            session.revision()
        ))
        .size(12.0),
        "summary",
    ));
    children.push(to_value_or_text(
        UiButton::new("Pick another PDF", "pdf_upload")
            .id("pdf_upload_btn")
            .requires_file_picker(true)
            .accept("application/pdf"),
        "pdf_upload",
    ));
    children.push(to_value_or_text(
        UiButton::new("Add logo", "logo_upload")
            .id("logo_upload_btn")
            .requires_file_picker(true)
            .accept("image/png,image/jpeg"),
        "logo_upload",
    ));

    children.push(to_value_or_text(
        UiPdfViewer::new(session.revision(), session.page_count()),
        "viewer",
    ));

    if let (Some(overlay), Some(logo)) = (state.overlay.as_ref(), session.logo()) {
        let rect = overlay.rect();
        children.push(to_value_or_text(
            UiLogoOverlay::new(rect.left, rect.top, rect.width, rect.height, logo.format().mime())
                .handles(Corner::ALL.iter().map(|c| c.as_str()).collect())
                .captures_pointer(overlay.captures_pointer()),
            "overlay",
        ));
        children.push(to_value_or_text(
            UiButton::new("Confirm placement", "confirm_placement").id("confirm_btn"),
            "confirm",
        ));
        children.push(to_value_or_text(
            UiButton::new("Remove logo", "logo_clear"),
            "logo_clear",
        ));
    }

    if session.is_modified() {
        children.push(to_value_or_text(
            UiButton::new("Download PDF", "pdf_export").id("export_btn"),
            "export",
        ));
    }
    if let Some(out) = &state.last_output {
        children.push(to_value_or_text(
            UiText::new(&format!("Saved to: {out}")).size(12.0),
            "output",
        ));
    }
    push_error(&mut children, state);

    to_value_or_text(
        UiColumn::new(children)
            .padding(20)
            .content_description("pdf_logo_editor"),
        "editor",
    )
}

fn push_error(children: &mut Vec<Value>, state: &AppState) {
    if let Some(err) = &state.last_error {
        children.push(to_value_or_text(
            UiText::new(&format!("Error: {err}"))
                .size(12.0)
                .content_description("editor_error"),
            "error",
        ));
    }
}
