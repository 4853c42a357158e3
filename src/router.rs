use crate::config::EditorConfig;
use crate::features::editor::{
    handle_confirm_placement, handle_export, handle_logo_clear, handle_logo_upload,
    handle_pdf_upload, handle_pointer_down, handle_pointer_move, handle_pointer_up,
    logo_bytes_payload, pdf_bytes_payload, pointer_target, render_editor_screen,
    render_home_screen,
};
use crate::features::geometry::PixelRect;
use crate::features::overlay::PointerTarget;
use crate::state::{AppState, Screen};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::Read,
    os::unix::io::{FromRawFd, RawFd},
    path::Path,
    ptr,
    sync::Mutex,
};

static STATE: Mutex<AppState> = Mutex::new(AppState::new());

#[derive(Deserialize)]
struct Command {
    action: String,
    path: Option<String>,
    fd: Option<i32>,
    error: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    handle: Option<String>,
    pages: Option<Vec<PixelRect>>,
    output_dir: Option<String>,
    config: Option<Value>,
    bindings: Option<HashMap<String, String>>,
}

#[derive(Debug)]
enum Action {
    Init {
        config: Option<Value>,
    },
    Reset,
    PdfUpload {
        path: Option<String>,
        fd: Option<i32>,
        error: Option<String>,
    },
    LogoUpload {
        path: Option<String>,
        fd: Option<i32>,
        error: Option<String>,
        data_base64: Option<String>,
        mime: Option<String>,
    },
    LogoClear,
    PointerDown {
        target: PointerTarget,
        x: f64,
        y: f64,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp,
    ConfirmPlacement {
        pages: Vec<PixelRect>,
    },
    PdfBytes,
    LogoBytes,
    PdfExport {
        output_dir: Option<String>,
    },
}

struct FdHandle(Option<i32>);

impl FdHandle {
    fn new(fd: Option<i32>) -> Self {
        Self(fd)
    }

    fn take(&mut self) -> Option<i32> {
        self.0.take()
    }
}

impl Drop for FdHandle {
    fn drop(&mut self) {
        if let Some(fd) = self.0.take() {
            unsafe { File::from_raw_fd(fd as RawFd) };
        }
    }
}

fn pointer_position(x: Option<f64>, y: Option<f64>) -> Result<(f64, f64), String> {
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok((x, y)),
        _ => Err("missing_pointer_position".into()),
    }
}

fn parse_action(command: Command) -> Result<Action, String> {
    let Command {
        action,
        path,
        fd,
        error,
        x,
        y,
        handle,
        pages,
        output_dir,
        config,
        bindings,
    } = command;

    let mut bindings = bindings.unwrap_or_default();

    match action.as_str() {
        "init" => Ok(Action::Init { config }),
        "reset" => Ok(Action::Reset),
        "pdf_upload" => Ok(Action::PdfUpload { path, fd, error }),
        "logo_upload" => Ok(Action::LogoUpload {
            path,
            fd,
            error,
            data_base64: bindings.remove("logo_base64").filter(|s| !s.is_empty()),
            mime: bindings.remove("logo_mime").filter(|s| !s.is_empty()),
        }),
        "logo_clear" => Ok(Action::LogoClear),
        "pointer_down" => {
            let target = pointer_target(handle.as_deref())?;
            let (x, y) = pointer_position(x, y)?;
            Ok(Action::PointerDown { target, x, y })
        }
        "pointer_move" => {
            let (x, y) = pointer_position(x, y)?;
            Ok(Action::PointerMove { x, y })
        }
        "pointer_up" => Ok(Action::PointerUp),
        "confirm_placement" => Ok(Action::ConfirmPlacement {
            pages: pages.unwrap_or_default(),
        }),
        "pdf_bytes" => Ok(Action::PdfBytes),
        "logo_bytes" => Ok(Action::LogoBytes),
        "pdf_export" => Ok(Action::PdfExport { output_dir }),
        "error" => Err(error.unwrap_or_else(|| "host_error".into())),
        other => Err(format!("unknown_action:{other}")),
    }
}

#[no_mangle]
pub extern "system" fn Java_aeska_logoplace_MainActivity_dispatch(
    mut env: JNIEnv,
    _class: JClass,
    input: JString,
) -> jstring {
    let response = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let input_str: String = env
            .get_string(&input)
            .map(|s| s.into())
            .unwrap_or_else(|_| "{}".to_string());

        let command: Command = serde_json::from_str(&input_str).unwrap_or(Command {
            action: "error".into(),
            path: None,
            fd: None,
            error: Some("invalid_json".into()),
            x: None,
            y: None,
            handle: None,
            pages: None,
            output_dir: None,
            config: None,
            bindings: None,
        });

        handle_command(command)
    }));

    let json_value = match response {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => error_ui(&err),
        Err(_) => error_ui("panic"),
    };

    let output_string = json_value.to_string();
    match env.new_string(output_string) {
        Ok(java_str) => java_str.into_raw(),
        Err(_) => {
            let fallback = error_ui("jni_new_string_failed").to_string();
            env.new_string(fallback)
                .map(|s| s.into_raw())
                .unwrap_or(ptr::null_mut())
        }
    }
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

fn handle_command(command: Command) -> Result<Value, String> {
    let mut lock_poisoned = false;
    let mut state = match STATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            lock_poisoned = true;
            log::warn!("Recovered editor state after a panic in a previous command");
            STATE.clear_poison();
            poisoned.into_inner()
        }
    };

    let action = match parse_action(command) {
        Ok(action) => action,
        Err(err) => {
            state.last_error = Some(err);
            return Ok(render_ui(&state));
        }
    };

    match action {
        Action::Init { config } => {
            init_logging();
            if let Some(config) = config {
                state.set_config(EditorConfig::from_value(config));
            }
        }
        Action::Reset => state.reset_runtime(),
        Action::PdfUpload { path, fd, error } => {
            let mut fd_handle = FdHandle::new(fd);
            let result = match error {
                Some(err) => Err(err),
                None => read_source(fd_handle.take(), path.as_deref()).and_then(|bytes| {
                    let name = path.as_deref().and_then(file_name);
                    handle_pdf_upload(&mut state, bytes, name).map_err(|e| e.to_string())
                }),
            };
            state.last_error = result.err();
        }
        Action::LogoUpload {
            path,
            fd,
            error,
            data_base64,
            mime,
        } => {
            let mut fd_handle = FdHandle::new(fd);
            let bytes = match (error, data_base64) {
                (Some(err), _) => Err(err),
                (None, Some(data)) => B64
                    .decode(data.trim())
                    .map_err(|e| format!("logo_base64_invalid:{e}")),
                (None, None) => read_source(fd_handle.take(), path.as_deref()),
            };
            drop(fd_handle);
            let result = bytes.and_then(|bytes| {
                handle_logo_upload(&mut state, bytes, mime.as_deref()).map_err(|e| e.to_string())
            });
            state.last_error = result.err();
        }
        Action::LogoClear => {
            handle_logo_clear(&mut state);
            state.last_error = None;
        }
        Action::PointerDown { target, x, y } => handle_pointer_down(&mut state, target, x, y),
        Action::PointerMove { x, y } => {
            handle_pointer_move(&mut state, x, y);
        }
        Action::PointerUp => handle_pointer_up(&mut state),
        Action::ConfirmPlacement { pages } => {
            match handle_confirm_placement(&mut state, &pages) {
                Ok(index) => {
                    log::debug!("Logo placed on page {}", index + 1);
                    state.last_error = None;
                }
                Err(e) => state.last_error = Some(e.to_string()),
            }
        }
        Action::PdfBytes => match pdf_bytes_payload(&state) {
            Ok(payload) => return Ok(payload),
            Err(e) => state.last_error = Some(e.to_string()),
        },
        Action::LogoBytes => match logo_bytes_payload(&state) {
            Ok(payload) => return Ok(payload),
            Err(e) => state.last_error = Some(e.to_string()),
        },
        Action::PdfExport { output_dir } => {
            let result = match output_dir.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                Some(dir) => handle_export(&mut state, Path::new(dir))
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                None => Err("missing_output_dir".to_string()),
            };
            state.last_error = result.err();
        }
    }

    if lock_poisoned && state.last_error.is_none() {
        state.last_error = Some("state_recovered_after_panic".into());
    }

    Ok(render_ui(&state))
}

fn file_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}

fn read_source(fd: Option<i32>, path: Option<&str>) -> Result<Vec<u8>, String> {
    if let Some(fd) = fd {
        return read_bytes_from_fd(fd as RawFd);
    }
    match path {
        Some(path) if !path.is_empty() => fs::read(path).map_err(|e| format!("read_failed:{e}")),
        _ => Err("missing_source".into()),
    }
}

fn read_bytes_from_fd(fd: RawFd) -> Result<Vec<u8>, String> {
    if fd < 0 {
        return Err("invalid_fd".into());
    }

    let mut file = unsafe { File::from_raw_fd(fd) };
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| format!("read_failed:{e}"))?;
    Ok(buffer)
}

fn error_ui(message: &str) -> Value {
    json!({
        "type": "Column",
        "padding": 24,
        "children": [
            { "type": "Text", "text": "Error", "size": 18.0 },
            { "type": "Text", "text": message }
        ]
    })
}

fn render_ui(state: &AppState) -> Value {
    match state.screen {
        Screen::Home => render_home_screen(state),
        Screen::Editor => render_editor_screen(state),
    }
}
