//! TipTap glue: construction, mirror sync and toolbar wiring.
//!
//! Formatting itself is entirely TipTap's; this module only maps buttons to commands and
//! reports when the editor has finished building its editable view.

use crate::util::{document, element_by_id, input_by_id, EventListenerGuard};
use leptos::logging::warn;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) const INITIALIZED_ATTR: &str = "data-editor-initialized";
const EDITOR_CLASS: &str = "format format-sm focus:outline-none format-blue max-w-none";

#[wasm_bindgen(raw_module = "https://esm.sh/@tiptap/core@2.6.6")]
extern "C" {
    type Editor;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &js_sys::Object) -> Result<Editor, JsValue>;

    #[wasm_bindgen(method, js_name = getHTML)]
    fn get_html(this: &Editor) -> String;

    #[wasm_bindgen(method)]
    fn chain(this: &Editor) -> ChainedCommands;

    #[wasm_bindgen(method)]
    fn destroy(this: &Editor);

    type ChainedCommands;

    #[wasm_bindgen(method)]
    fn focus(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleBold)]
    fn toggle_bold(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleItalic)]
    fn toggle_italic(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleUnderline)]
    fn toggle_underline(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleBulletList)]
    fn toggle_bullet_list(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleOrderedList)]
    fn toggle_ordered_list(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setParagraph)]
    fn set_paragraph(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleHeading)]
    fn toggle_heading(this: &ChainedCommands, attrs: &js_sys::Object) -> ChainedCommands;

    #[wasm_bindgen(method)]
    fn run(this: &ChainedCommands) -> bool;
}

#[wasm_bindgen(raw_module = "https://esm.sh/@tiptap/starter-kit@2.6.6")]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_name = default)]
    static STARTER_KIT: JsValue;
}

#[wasm_bindgen(raw_module = "https://esm.sh/@tiptap/extension-underline@2.6.6")]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_name = default)]
    static UNDERLINE: JsValue;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    BulletList,
    OrderedList,
    Paragraph,
    Heading(u8),
}

impl FormatCommand {
    /// Fixed toolbar buttons, by id prefix (`<prefix>-<editor id>`).
    pub const TOOLBAR: [(&'static str, FormatCommand); 6] = [
        ("toggleBoldButton", FormatCommand::Bold),
        ("toggleItalicButton", FormatCommand::Italic),
        ("toggleUnderlineButton", FormatCommand::Underline),
        ("toggleListButton", FormatCommand::BulletList),
        ("toggleOrderedListButton", FormatCommand::OrderedList),
        ("toggleParagraphButton", FormatCommand::Paragraph),
    ];

    /// Parses a `data-heading-level` value. Only 1–6 are headings.
    pub fn heading(level: &str) -> Option<Self> {
        match level.trim().parse::<u8>() {
            Ok(l @ 1..=6) => Some(FormatCommand::Heading(l)),
            _ => None,
        }
    }

    pub fn button_id(prefix: &str, editor_id: &str) -> String {
        format!("{prefix}-{editor_id}")
    }

    /// Paragraph and heading live in the typography dropdown, which closes afterwards.
    pub fn closes_typography_menu(self) -> bool {
        matches!(self, FormatCommand::Paragraph | FormatCommand::Heading(_))
    }

    fn apply(self, editor: &Editor) {
        let chain = editor.chain().focus();
        let chain = match self {
            FormatCommand::Bold => chain.toggle_bold(),
            FormatCommand::Italic => chain.toggle_italic(),
            FormatCommand::Underline => chain.toggle_underline(),
            FormatCommand::BulletList => chain.toggle_bullet_list(),
            FormatCommand::OrderedList => chain.toggle_ordered_list(),
            FormatCommand::Paragraph => chain.set_paragraph(),
            FormatCommand::Heading(level) => {
                let attrs = js_sys::Object::new();
                let _ = js_sys::Reflect::set(&attrs, &"level".into(), &JsValue::from(level));
                chain.toggle_heading(&attrs)
            }
        };
        chain.run();
    }
}

fn hide_typography_dropdown(editor_id: &str) {
    let Some(win) = web_sys::window() else {
        return;
    };
    let Ok(instances) = js_sys::Reflect::get(&win, &"FlowbiteInstances".into()) else {
        return;
    };
    if !instances.is_object() {
        return;
    }
    let Some(get_instance) = js_sys::Reflect::get(&instances, &"getInstance".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
    else {
        return;
    };
    let Ok(dropdown) = get_instance.call2(
        &instances,
        &"Dropdown".into(),
        &format!("typographyDropdown-{editor_id}").into(),
    ) else {
        return;
    };
    if let Some(hide) = js_sys::Reflect::get(&dropdown, &"hide".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
    {
        let _ = hide.call0(&dropdown);
    }
}

/// Initial document: the given HTML, or the placeholder as a paragraph when empty.
pub fn initial_content(content: Option<&str>, placeholder: &str) -> String {
    match content.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => format!("<p>{placeholder}</p>"),
    }
}

/// A mounted TipTap instance plus its toolbar listeners.
#[wasm_bindgen]
pub struct WysiwygEditor {
    editor: Rc<Editor>,
    _toolbar: Vec<EventListenerGuard>,
    _on_update: Closure<dyn FnMut()>,
    _on_create: Closure<dyn FnMut()>,
}

impl WysiwygEditor {
    /// Builds the editor inside `#<editor_id>` and mirrors it into `#<editor_id>-input`.
    /// `None` when the region is missing or already carries an editor.
    pub fn mount(
        editor_id: &str,
        content: Option<&str>,
        placeholder: &str,
        on_ready: impl FnOnce() + 'static,
    ) -> Option<Self> {
        let region = element_by_id(editor_id)?;
        if region.has_attribute(INITIALIZED_ATTR) {
            return None;
        }
        let _ = region.set_attribute(INITIALIZED_ATTR, "true");

        let mirror_id = format!("{editor_id}-input");
        let editor_slot: Rc<std::cell::OnceCell<Rc<Editor>>> = Rc::new(std::cell::OnceCell::new());

        let slot = editor_slot.clone();
        let mirror = mirror_id.clone();
        let on_update = Closure::<dyn FnMut()>::new(move || {
            if let (Some(editor), Some(input)) = (slot.get(), input_by_id(&mirror)) {
                input.set_value(&editor.get_html());
            }
        });

        let mut on_ready = Some(on_ready);
        let on_create = Closure::<dyn FnMut()>::new(move || {
            if let Some(f) = on_ready.take() {
                f();
            }
        });

        let options = js_sys::Object::new();
        let props = js_sys::Object::new();
        let attributes = js_sys::Object::new();
        let extensions = js_sys::Array::new();
        extensions.push(&STARTER_KIT.with(JsValue::clone));
        extensions.push(&UNDERLINE.with(JsValue::clone));
        let _ = js_sys::Reflect::set(&attributes, &"class".into(), &EDITOR_CLASS.into());
        let _ = js_sys::Reflect::set(&props, &"attributes".into(), &attributes);
        let _ = js_sys::Reflect::set(&options, &"element".into(), &region);
        let _ = js_sys::Reflect::set(&options, &"extensions".into(), &extensions);
        let _ = js_sys::Reflect::set(
            &options,
            &"content".into(),
            &initial_content(content, placeholder).into(),
        );
        let _ = js_sys::Reflect::set(&options, &"editorProps".into(), &props);
        let _ = js_sys::Reflect::set(&options, &"onUpdate".into(), on_update.as_ref());
        let _ = js_sys::Reflect::set(&options, &"onCreate".into(), on_create.as_ref());

        let editor = match Editor::new(&options) {
            Ok(editor) => Rc::new(editor),
            Err(e) => {
                warn!("editor: TipTap failed to start in #{editor_id}: {:?}", e);
                let _ = region.remove_attribute(INITIALIZED_ATTR);
                return None;
            }
        };
        let _ = editor_slot.set(editor.clone());

        let toolbar = wire_toolbar(editor_id, &editor);

        if let Some(input) = input_by_id(&mirror_id) {
            input.set_value(&editor.get_html());
        }

        Some(Self {
            editor,
            _toolbar: toolbar,
            _on_update: on_update,
            _on_create: on_create,
        })
    }
}

#[wasm_bindgen]
impl WysiwygEditor {
    /// Current document as HTML.
    pub fn html(&self) -> String {
        self.editor.get_html()
    }

    pub fn destroy(self) {
        self.editor.destroy();
    }
}

fn wire_toolbar(editor_id: &str, editor: &Rc<Editor>) -> Vec<EventListenerGuard> {
    let mut guards = Vec::new();

    for (prefix, command) in FormatCommand::TOOLBAR {
        let Some(button) = element_by_id(&FormatCommand::button_id(prefix, editor_id)) else {
            continue;
        };
        if let Some(g) = bind_command(&button, editor_id, editor, command) {
            guards.push(g);
        }
    }

    let selector = format!(".heading-button-{editor_id}");
    let Some(buttons) = document().and_then(|d| d.query_selector_all(&selector).ok()) else {
        return guards;
    };
    for i in 0..buttons.length() {
        let Some(button) = buttons
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        let level = button.get_attribute("data-heading-level").unwrap_or_default();
        let Some(command) = FormatCommand::heading(&level) else {
            warn!("editor: ignoring heading button with level {level:?}");
            continue;
        };
        if let Some(g) = bind_command(&button, editor_id, editor, command) {
            guards.push(g);
        }
    }

    guards
}

fn bind_command(
    button: &web_sys::Element,
    editor_id: &str,
    editor: &Rc<Editor>,
    command: FormatCommand,
) -> Option<EventListenerGuard> {
    let editor = editor.clone();
    let editor_id = editor_id.to_string();
    EventListenerGuard::new(button, "click", move |ev: web_sys::Event| {
        ev.prevent_default();
        command.apply(&editor);
        if command.closes_typography_menu() {
            hide_typography_dropdown(&editor_id);
        }
    })
}
