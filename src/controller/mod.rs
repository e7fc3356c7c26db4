use crate::autosave::{AutosaveDebouncer, ChangeDetection, DomSaveTarget};
use crate::clipboard::{copy_text, prepare_copy, CopyError, CopyFeedback};
use crate::config::{ExtrasOptions, Labels};
use crate::extract::ContentNode;
use crate::status::{
    mount_status_view, SaveStatus, StatusIndicator, StatusMount, TransportSignal,
    AFTER_REQUEST_EVENT, BEFORE_REQUEST_EVENT,
};
use crate::timer::{poll_until, BrowserScheduler, Scheduler};
use crate::util::{element_by_id, html_element_by_id, EventListenerGuard};
use leptos::logging::{log, warn};
use leptos::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Autosave, save-status and copy behavior for one form.
///
/// Created by the `init_*` factories; `dispose` tears everything down.
#[wasm_bindgen]
pub struct FormExtras {
    options: ExtrasOptions,
    status: StatusIndicator,
    status_view: RefCell<Option<StatusMount>>,
    debouncer: Option<AutosaveDebouncer>,
    detection: Rc<RefCell<Option<ChangeDetection>>>,
    listeners: RefCell<Vec<EventListenerGuard>>,
    copy_feedback: Option<CopyFeedback>,
    disposed: Rc<Cell<bool>>,
}

impl FormExtras {
    pub fn install(options: ExtrasOptions) -> Self {
        Self::install_with(options, Rc::new(BrowserScheduler))
    }

    pub(crate) fn install_with(options: ExtrasOptions, scheduler: Rc<dyn Scheduler>) -> Self {
        let form = &options.form;
        let timings = options.timings;
        let disposed = Rc::new(Cell::new(false));
        let mut listeners = Vec::new();

        // Status indicator: always tracks state, renders only when the region exists.
        let status_region = element_by_id(&form.status_region_id);
        let status_signal = RwSignal::new(SaveStatus::Empty);
        let status = StatusIndicator::new(
            &form.form_id,
            scheduler.clone(),
            timings.success_clear_ms,
            timings.failure_clear_ms,
            move |s| status_signal.set(s),
        );
        let status_view = status_region.as_ref().and_then(|region| {
            mount_status_view(region, &form.form_id, status_signal, options.labels.clone())
        });

        if let Some(win) = web_sys::window() {
            for event in [BEFORE_REQUEST_EVENT, AFTER_REQUEST_EVENT] {
                let s2 = status.clone();
                let guard = EventListenerGuard::new(&win, event, move |ev: web_sys::Event| {
                    if let Some(signal) = TransportSignal::from_event(&ev) {
                        s2.handle(&signal);
                    }
                });
                listeners.extend(guard);
            }
        }

        // Autosave needs both the form and somewhere to report to.
        let debouncer = if element_by_id(&form.form_id).is_some() && status_region.is_some() {
            let target = DomSaveTarget::new(
                &form.editor_region_id,
                &form.hidden_field_id,
                &form.form_id,
                status.clone(),
            );
            Some(AutosaveDebouncer::new(
                scheduler.clone(),
                Rc::new(target),
                timings.debounce_ms,
            ))
        } else {
            warn!(
                "autosave: #{} or #{} missing, autosave disabled",
                form.form_id, form.status_region_id
            );
            None
        };

        let detection = Rc::new(RefCell::new(None));
        if let Some(d) = &debouncer {
            let region_id = form.editor_region_id.clone();
            let probe_id = region_id.clone();
            let d2 = d.clone();
            let slot = detection.clone();
            let gone = disposed.clone();
            poll_until(
                scheduler.clone(),
                timings.ready_poll_interval_ms,
                timings.ready_poll_max_attempts,
                move || editor_looks_ready(&probe_id),
                move |ready| {
                    if gone.get() {
                        return;
                    }
                    if !ready {
                        warn!("autosave: no editor ready signal for #{region_id}, attaching anyway");
                    }
                    attach_detection(&region_id, &d2, &slot);
                },
            );
        }

        // Copy button.
        let copy_button = html_element_by_id(&form.copy_button_id);
        let copy_feedback = match copy_button {
            Some(button) if element_by_id(&form.editor_region_id).is_some() => {
                let feedback = CopyFeedback::new(
                    Rc::new(button.clone()),
                    scheduler.clone(),
                    &options.labels.copied,
                    timings.copied_revert_ms,
                );
                let region_id = form.editor_region_id.clone();
                let labels = options.labels.clone();
                let fb = feedback.clone();
                let guard = EventListenerGuard::new(&button, "click", move |ev: web_sys::Event| {
                    ev.prevent_default();
                    let _ = copy_region(&region_id, &labels, &fb);
                });
                listeners.extend(guard);
                Some(feedback)
            }
            _ => None,
        };

        log!(
            "form extras: #{} autosave={} copy={}",
            form.form_id,
            debouncer.is_some(),
            copy_feedback.is_some()
        );

        Self {
            options,
            status,
            status_view: RefCell::new(status_view),
            debouncer,
            detection,
            listeners: RefCell::new(listeners),
            copy_feedback,
            disposed,
        }
    }

    pub fn status_state(&self) -> SaveStatus {
        self.status.status()
    }

    pub fn options(&self) -> &ExtrasOptions {
        &self.options
    }
}

#[wasm_bindgen]
impl FormExtras {
    /// Records an edit; the save fires once edits pause.
    #[wasm_bindgen(js_name = scheduleSave)]
    pub fn schedule_save(&self) {
        if self.disposed.get() {
            return;
        }
        if let Some(d) = &self.debouncer {
            d.schedule_save();
        }
    }

    /// Saves immediately. Returns whether a submission was triggered.
    #[wasm_bindgen(js_name = saveNow)]
    pub fn save_now(&self) -> bool {
        if self.disposed.get() {
            return false;
        }
        self.debouncer.as_ref().is_some_and(|d| d.dispatch_now())
    }

    /// Explicit "editor ready" signal; attaches change detection right away.
    #[wasm_bindgen(js_name = notifyEditorReady)]
    pub fn notify_editor_ready(&self) {
        if self.disposed.get() {
            return;
        }
        if let Some(d) = &self.debouncer {
            attach_detection(&self.options.form.editor_region_id, d, &self.detection);
        }
    }

    /// Copies the region as plain text. Returns `false` when there was nothing to copy.
    #[wasm_bindgen(js_name = copyPlainText)]
    pub fn copy_plain_text(&self) -> bool {
        if self.disposed.get() {
            return false;
        }
        let Some(feedback) = &self.copy_feedback else {
            return false;
        };
        copy_region(&self.options.form.editor_region_id, &self.options.labels, feedback).is_ok()
    }

    /// Current indicator state: `empty`, `pending`, `success` or `failure`.
    pub fn status(&self) -> String {
        self.status.status().to_string()
    }

    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(d) = &self.debouncer {
            d.cancel();
        }
        self.detection.borrow_mut().take();
        self.listeners.borrow_mut().clear();
        self.status.invalidate();
        self.status_view.borrow_mut().take();
        if let Some(fb) = &self.copy_feedback {
            fb.revert();
        }
    }
}

/// The editor has replaced the region's markup with its editable view.
fn editor_looks_ready(region_id: &str) -> bool {
    element_by_id(region_id)
        .and_then(|el| el.query_selector("[contenteditable]").ok().flatten())
        .is_some()
}

fn attach_detection(
    region_id: &str,
    debouncer: &AutosaveDebouncer,
    slot: &Rc<RefCell<Option<ChangeDetection>>>,
) {
    if slot.borrow().is_some() {
        return;
    }
    let Some(region) = element_by_id(region_id) else {
        return;
    };
    *slot.borrow_mut() = Some(ChangeDetection::attach(&region, debouncer));
}

fn copy_region(region_id: &str, labels: &Labels, feedback: &CopyFeedback) -> Result<(), CopyError> {
    let Some(region) = element_by_id(region_id) else {
        return Err(CopyError::NothingToCopy);
    };
    match prepare_copy(&ContentNode::from_dom(&region)) {
        Ok(text) => {
            let fb = feedback.clone();
            copy_text(text, Rc::new(move || fb.show()));
            Ok(())
        }
        Err(e) => {
            if let Some(win) = web_sys::window() {
                let _ = win.alert_with_message(&labels.nothing_to_copy);
            }
            Err(e)
        }
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::timer::virtual_clock::VirtualScheduler;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture_with(name: &str, editor_html: &str) -> (FormConfig, web_sys::Element) {
        let doc = crate::util::document().expect("document");
        let body = doc.body().expect("body");
        let root = doc.create_element("div").expect("div");
        root.set_inner_html(&format!(
            r#"<form id="{name}-form">
                 <div id="{name}-editor"><div contenteditable="true">{editor_html}</div></div>
                 <input type="hidden" id="{name}-editor-input" value="">
               </form>
               <div id="{name}-status"></div>
               <button id="{name}-copy">Copy</button>"#
        ));
        body.append_child(&root).expect("append");
        let config = FormConfig::for_form(name, &format!("{name}-status"), &format!("{name}-copy"));
        (config, root)
    }

    fn fixture(name: &str) -> (FormConfig, web_sys::Element) {
        fixture_with(name, "<p>Hello</p>")
    }

    /// Dispatches an htmx lifecycle event for `form`, bubbling up to `window`.
    fn fire(event: &str, form: &web_sys::Element, status: Option<u16>) {
        let detail = js_sys::Object::new();
        js_sys::Reflect::set(&detail, &"elt".into(), form).expect("set elt");
        if let Some(status) = status {
            let xhr = js_sys::Object::new();
            js_sys::Reflect::set(&xhr, &"status".into(), &JsValue::from(status)).expect("status");
            js_sys::Reflect::set(&detail, &"xhr".into(), &xhr).expect("set xhr");
        }
        let init = web_sys::CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&detail);
        let ev = web_sys::CustomEvent::new_with_event_init_dict(event, &init).expect("event");
        form.dispatch_event(&ev).expect("dispatch");
    }

    /// Lets pending microtasks (e.g. MutationObserver callbacks) run.
    async fn flush_microtasks() {
        JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL))
            .await
            .expect("resolve");
    }

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            web_sys::window()
                .expect("window")
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .expect("setTimeout");
        });
        JsFuture::from(promise).await.expect("sleep");
    }

    fn textarea_left_in_body() -> bool {
        crate::util::document()
            .and_then(|d| d.query_selector("body > textarea").ok().flatten())
            .is_some()
    }

    /// Replaces `window.alert` with a recorder; returns the previous function.
    fn record_alerts() -> JsValue {
        let win = web_sys::window().expect("window");
        let previous = js_sys::Reflect::get(&win, &"alert".into()).expect("alert");
        let recorder = js_sys::Function::new_with_args(
            "msg",
            "window.__recordedAlerts = (window.__recordedAlerts || []).concat([msg]);",
        );
        js_sys::Reflect::set(&win, &"alert".into(), &recorder).expect("set alert");
        js_sys::Reflect::set(&win, &"__recordedAlerts".into(), &js_sys::Array::new())
            .expect("reset alerts");
        previous
    }

    fn recorded_alerts(previous: &JsValue) -> Vec<String> {
        let win = web_sys::window().expect("window");
        let alerts = js_sys::Reflect::get(&win, &"__recordedAlerts".into()).expect("alerts");
        js_sys::Reflect::set(&win, &"alert".into(), previous).expect("restore alert");
        js_sys::Array::from(&alerts)
            .iter()
            .filter_map(|v| v.as_string())
            .collect()
    }

    #[wasm_bindgen_test]
    fn test_debounced_save_mirrors_region_and_goes_pending() {
        let (config, root) = fixture("wt-save");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());

        extras.schedule_save();
        extras.schedule_save();
        clock.advance(1999);
        let mirror = crate::util::input_by_id(&config.hidden_field_id).expect("mirror");
        assert_eq!(mirror.value(), "");

        clock.advance(1);
        let region = element_by_id(&config.editor_region_id).expect("region");
        assert_eq!(mirror.value(), region.inner_html());
        assert_eq!(extras.status(), "pending");

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_missing_form_disables_autosave() {
        let (config, root) = fixture("wt-noform");
        let options = ExtrasOptions::new(FormConfig {
            form_id: "wt-noform-absent".to_string(),
            ..config
        });
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(options, clock.clone());

        extras.schedule_save();
        clock.advance(10_000);
        assert!(!extras.save_now());
        assert_eq!(extras.status(), "empty");

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_transport_signals_for_this_form_drive_status() {
        let (config, root) = fixture("wt-status");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let form = element_by_id(&config.form_id).expect("form");

        fire(BEFORE_REQUEST_EVENT, &form, None);
        assert_eq!(extras.status(), "pending");

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn test_forms_sharing_a_status_region_each_stay_visible() {
        let (first, first_root) = fixture("wt-share-a");
        let (second, second_root) = fixture("wt-share-b");
        let second = FormConfig {
            status_region_id: first.status_region_id.clone(),
            ..second
        };
        let clock = Rc::new(VirtualScheduler::default());
        let a = FormExtras::install_with(ExtrasOptions::new(first.clone()), clock.clone());
        let b = FormExtras::install_with(ExtrasOptions::new(second.clone()), clock.clone());

        let form_a = element_by_id(&first.form_id).expect("form a");
        fire(AFTER_REQUEST_EVENT, &form_a, Some(200));
        assert_eq!(a.status(), "success");
        assert_eq!(b.status(), "empty");
        // Render effects run on the next tick.
        sleep(10).await;

        let region = element_by_id(&first.status_region_id).expect("region");
        let view_a = region
            .query_selector(&format!(r#"[data-form="{}"]"#, first.form_id))
            .expect("selector")
            .expect("first form's view is still in the region");
        assert_eq!(view_a.get_attribute("data-status").as_deref(), Some("success"));
        assert!(view_a
            .text_content()
            .unwrap_or_default()
            .contains(&Labels::default().saved));

        // Tearing down the second form leaves the first form's view in place.
        b.dispose();
        assert!(region
            .query_selector(&format!(r#"[data-form="{}"]"#, second.form_id))
            .expect("selector")
            .is_none());
        assert!(region
            .query_selector(&format!(r#"[data-form="{}"]"#, first.form_id))
            .expect("selector")
            .is_some());

        a.dispose();
        first_root.remove();
        second_root.remove();
    }

    #[wasm_bindgen_test]
    fn test_input_events_on_region_arm_a_single_save() {
        let (config, root) = fixture("wt-input");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let region = element_by_id(&config.editor_region_id).expect("region");

        for _ in 0..3 {
            let ev = web_sys::Event::new("input").expect("input event");
            region.dispatch_event(&ev).expect("dispatch");
        }
        assert_eq!(clock.pending(), 1);

        clock.advance(1999);
        assert_eq!(extras.status(), "empty");
        clock.advance(1);
        assert_eq!(extras.status(), "pending");
        let mirror = crate::util::input_by_id(&config.hidden_field_id).expect("mirror");
        assert_eq!(mirror.value(), region.inner_html());
        assert_eq!(clock.pending(), 0);

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn test_subtree_insertion_arms_a_save() {
        let (config, root) = fixture("wt-mutate");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let region = element_by_id(&config.editor_region_id).expect("region");
        let editable = region
            .query_selector("[contenteditable]")
            .expect("selector")
            .expect("editable");

        let doc = crate::util::document().expect("document");
        let p = doc.create_element("p").expect("p");
        p.set_text_content(Some("added by a toolbar command"));
        editable.append_child(&p).expect("append");
        flush_microtasks().await;

        assert_eq!(clock.pending(), 1);
        clock.advance(2000);
        assert_eq!(extras.status(), "pending");

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn test_attribute_only_mutation_arms_nothing() {
        let (config, root) = fixture("wt-attr");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let region = element_by_id(&config.editor_region_id).expect("region");
        let editable = region
            .query_selector("[contenteditable]")
            .expect("selector")
            .expect("editable");

        editable.set_attribute("data-focused", "true").expect("attr");
        flush_microtasks().await;

        assert_eq!(clock.pending(), 0);
        assert_eq!(extras.status(), "empty");

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_copying_empty_region_alerts_and_leaves_button_alone() {
        let (config, root) = fixture_with("wt-copy-empty", "<p></p>");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let button = html_element_by_id(&config.copy_button_id).expect("button");

        let previous = record_alerts();
        button.click();
        let alerts = recorded_alerts(&previous);

        assert_eq!(alerts, vec![Labels::default().nothing_to_copy]);
        assert_eq!(button.inner_html(), "Copy");
        assert!(!textarea_left_in_body());
        assert_eq!(clock.pending(), 0);

        extras.dispose();
        root.remove();
    }

    #[wasm_bindgen_test]
    async fn test_copy_text_reports_copied_and_cleans_up() {
        let copied = Rc::new(Cell::new(false));
        let flag = copied.clone();
        copy_text("plain text".to_string(), Rc::new(move || flag.set(true)));

        // Insecure pages copy synchronously; secure ones settle the clipboard promise first.
        for _ in 0..20 {
            if copied.get() {
                break;
            }
            sleep(50).await;
        }
        assert!(copied.get());
        assert!(!textarea_left_in_body());
    }

    #[wasm_bindgen_test]
    async fn test_copy_button_shows_copied_label_then_reverts() {
        let (config, root) = fixture("wt-copy");
        let clock = Rc::new(VirtualScheduler::default());
        let extras = FormExtras::install_with(ExtrasOptions::new(config.clone()), clock.clone());
        let button = html_element_by_id(&config.copy_button_id).expect("button");

        button.click();
        for _ in 0..20 {
            if button.inner_html() != "Copy" {
                break;
            }
            sleep(50).await;
        }
        assert_eq!(
            button.text_content().as_deref(),
            Some(format!("✓ {}", Labels::default().copied).as_str())
        );
        assert!(!textarea_left_in_body());

        clock.advance(2000);
        assert_eq!(button.inner_html(), "Copy");

        extras.dispose();
        root.remove();
    }
}
