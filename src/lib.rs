pub mod autosave;
pub mod clipboard;
mod components;
pub mod config;
pub mod controller;
pub mod editor;
pub mod extract;
pub mod status;
pub mod timer;
mod util;

pub use crate::config::{ExtrasOptions, FormConfig, Labels, Timings};
pub use crate::controller::FormExtras;
pub use crate::editor::WysiwygEditor;

use wasm_bindgen::prelude::*;

/// Options for one of the two stock forms, with the German UI strings they ship with.
fn stock_options(form: FormConfig) -> ExtrasOptions {
    ExtrasOptions::new(form).with_labels(Labels::german())
}

/// Generic factory. `options` is `{ editorRegionId, hiddenFieldId, formId, statusRegionId,
/// copyButtonId, timings?, labels? }`.
#[wasm_bindgen(js_name = initFormExtras)]
pub fn init_form_extras(options: JsValue) -> Result<FormExtras, JsValue> {
    let options = ExtrasOptions::from_js(&options)?;
    Ok(FormExtras::install(options))
}

#[wasm_bindgen(js_name = initSessionNotesExtras)]
pub fn init_session_notes_extras() -> FormExtras {
    FormExtras::install(stock_options(FormConfig::session_notes()))
}

#[wasm_bindgen(js_name = initReportExtras)]
pub fn init_report_extras() -> FormExtras {
    FormExtras::install(stock_options(FormConfig::report()))
}

/// Mounts TipTap into `#<editor_id>`. `on_ready` (e.g. `() => extras.notifyEditorReady()`)
/// runs once the editable view exists.
#[wasm_bindgen(js_name = initWysiwygEditor)]
pub fn init_wysiwyg_editor(
    editor_id: &str,
    content: Option<String>,
    placeholder: Option<String>,
    on_ready: Option<js_sys::Function>,
) -> Option<WysiwygEditor> {
    let placeholder = placeholder.unwrap_or_else(|| Labels::german().placeholder);
    WysiwygEditor::mount(editor_id, content.as_deref(), &placeholder, move || {
        if let Some(f) = on_ready {
            let _ = f.call0(&JsValue::NULL);
        }
    })
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
}
