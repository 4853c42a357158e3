use crate::config::EditorConfig;
use crate::features::overlay::OverlayEditor;
use crate::features::session::PdfSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Editor,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub session: Option<PdfSession>,
    pub overlay: Option<OverlayEditor>,
    pub source_name: Option<String>,
    pub last_error: Option<String>,
    pub last_output: Option<String>,
    config: Option<EditorConfig>,
}

impl AppState {
    // const so it can be used in static initialization
    pub const fn new() -> Self {
        Self {
            screen: Screen::Home,
            session: None,
            overlay: None,
            source_name: None,
            last_error: None,
            last_output: None,
            config: None,
        }
    }

    pub fn config(&self) -> EditorConfig {
        self.config.clone().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        self.config = Some(config);
    }

    /// Drop the document, logo and overlay; configuration survives.
    pub fn reset_runtime(&mut self) {
        self.screen = Screen::Home;
        self.session = None;
        self.overlay = None;
        self.source_name = None;
        self.last_error = None;
        self.last_output = None;
    }
}
