use crate::extract::{plain_text, ContentNode};
use crate::timer::Scheduler;
use crate::util::document;
use leptos::logging::warn;
use leptos::task::spawn_local;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyError {
    NothingToCopy,
}

impl std::fmt::Display for CopyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyError::NothingToCopy => write!(f, "nothing to copy"),
        }
    }
}

impl std::error::Error for CopyError {}

pub fn prepare_copy(root: &ContentNode) -> Result<String, CopyError> {
    plain_text(root).ok_or(CopyError::NothingToCopy)
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
    fn clipboard_write_text(text: &str) -> Result<js_sys::Promise, JsValue>;
}

/// Writes `text` to the clipboard and calls `on_copied` once it is there.
///
/// Secure contexts use the async clipboard API; a throw or rejection falls back to the
/// `execCommand("copy")` path, which is also the only path elsewhere.
pub(crate) fn copy_text(text: String, on_copied: Rc<dyn Fn()>) {
    let secure = web_sys::window()
        .map(|w| w.is_secure_context())
        .unwrap_or(false);

    if secure {
        if let Ok(promise) = clipboard_write_text(&text) {
            spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    warn!("clipboard: writeText rejected ({e:?}), using fallback");
                    copy_with_fallback(&text);
                }
                on_copied();
            });
            return;
        }
    }

    copy_with_fallback(&text);
    on_copied();
}

fn copy_with_fallback(text: &str) {
    let Some(doc) = document() else {
        return;
    };
    let Some(body) = doc.body() else {
        return;
    };
    let Some(area) = doc
        .create_element("textarea")
        .ok()
        .and_then(|el| el.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
    else {
        return;
    };

    area.set_value(text);
    let _ = area.set_attribute("readonly", "");
    let _ = area.set_attribute("style", "position:fixed;top:0;left:-9999px;opacity:0;");
    if body.append_child(&area).is_err() {
        return;
    }
    area.select();

    let copied = doc
        .dyn_ref::<web_sys::HtmlDocument>()
        .and_then(|d| d.exec_command("copy").ok())
        .unwrap_or(false);
    if !copied {
        warn!("clipboard: execCommand(\"copy\") was refused");
    }

    area.remove();
}

/// The part of a button the copy feedback touches.
pub trait ButtonFace {
    fn snapshot(&self) -> String;
    fn restore(&self, snapshot: &str);
    fn show_label(&self, label: &str);
}

impl ButtonFace for web_sys::HtmlElement {
    fn snapshot(&self) -> String {
        self.inner_html()
    }

    fn restore(&self, snapshot: &str) {
        self.set_inner_html(snapshot);
    }

    fn show_label(&self, label: &str) {
        self.set_text_content(Some(&format!("✓ {label}")));
    }
}

/// Swaps the copy button's face to the "copied" label and restores it after a delay.
///
/// The original face is captured once per feedback period, so a second click while the
/// label is showing restores the real original, not the label.
#[derive(Clone)]
pub struct CopyFeedback {
    button: Rc<dyn ButtonFace>,
    scheduler: Rc<dyn Scheduler>,
    label: Rc<str>,
    revert_ms: u32,
    original: Rc<RefCell<Option<String>>>,
    cycle: Rc<Cell<u64>>,
}

impl CopyFeedback {
    pub fn new(
        button: Rc<dyn ButtonFace>,
        scheduler: Rc<dyn Scheduler>,
        label: &str,
        revert_ms: u32,
    ) -> Self {
        Self {
            button,
            scheduler,
            label: Rc::from(label),
            revert_ms,
            original: Rc::new(RefCell::new(None)),
            cycle: Rc::new(Cell::new(0)),
        }
    }

    pub fn show(&self) {
        {
            let mut original = self.original.borrow_mut();
            if original.is_none() {
                *original = Some(self.button.snapshot());
            }
        }
        self.button.show_label(&self.label);

        let cycle = self.cycle.get() + 1;
        self.cycle.set(cycle);

        let s2 = self.clone();
        self.scheduler.set_timeout(
            self.revert_ms,
            Box::new(move || {
                if s2.cycle.get() == cycle {
                    s2.revert();
                }
            }),
        );
    }

    pub fn revert(&self) {
        let original = self.original.borrow_mut().take();
        if let Some(original) = original {
            self.button.restore(&original);
        }
    }

    pub fn is_showing(&self) -> bool {
        self.original.borrow().is_some()
    }
}
