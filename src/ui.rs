use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
pub struct Text<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<&'a str>,
}

impl<'a> Text<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            kind: "Text",
            text,
            size: None,
            content_description: None,
        }
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn content_description(mut self, cd: &'a str) -> Self {
        self.content_description = Some(cd);
        self
    }
}

#[derive(Serialize)]
pub struct Button<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
    pub action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_file_picker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<&'a str>,
}

impl<'a> Button<'a> {
    pub fn new(text: &'a str, action: &'a str) -> Self {
        Self {
            kind: "Button",
            text,
            action,
            id: None,
            requires_file_picker: None,
            accept: None,
        }
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn requires_file_picker(mut self, needs: bool) -> Self {
        self.requires_file_picker = Some(needs);
        self
    }

    /// Mime filter for the host's file picker.
    pub fn accept(mut self, accept: &'a str) -> Self {
        self.accept = Some(accept);
        self
    }
}

#[derive(Serialize)]
pub struct Column<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
    pub children: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<&'a str>,
}

impl<'a> Column<'a> {
    pub fn new(children: Vec<Value>) -> Self {
        Self {
            kind: "Column",
            padding: None,
            children,
            content_description: None,
        }
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn content_description(mut self, cd: &'a str) -> Self {
        self.content_description = Some(cd);
        self
    }
}

/// The host's PDF viewer. It fetches bytes with `pdf_bytes` whenever
/// `revision` differs from what it last rendered.
#[derive(Serialize)]
pub struct PdfViewer {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub revision: u32,
    pub page_count: usize,
    pub page_class: &'static str,
}

impl PdfViewer {
    pub fn new(revision: u32, page_count: usize) -> Self {
        Self {
            kind: "PdfViewer",
            revision,
            page_count,
            page_class: "page",
        }
    }
}

/// Absolutely positioned logo box with its four resize handles.
#[derive(Serialize)]
pub struct LogoOverlay<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub mime: &'a str,
    pub handles: Vec<&'static str>,
    /// Host must route window-level pointer moves/ups to the core while set.
    pub captures_pointer: bool,
}

impl<'a> LogoOverlay<'a> {
    pub fn new(left: f64, top: f64, width: f64, height: f64, mime: &'a str) -> Self {
        Self {
            kind: "LogoOverlay",
            left,
            top,
            width,
            height,
            mime,
            handles: Vec::new(),
            captures_pointer: false,
        }
    }

    pub fn handles(mut self, handles: Vec<&'static str>) -> Self {
        self.handles = handles;
        self
    }

    pub fn captures_pointer(mut self, captures: bool) -> Self {
        self.captures_pointer = captures;
        self
    }
}

pub fn to_value_or_text<T: Serialize>(value: T, context: &str) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({
            "type": "Text",
            "text": format!("{context}_serialize_error:{e}")
        })
    })
}
