use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

pub(crate) fn document() -> Option<web_sys::Document> {
    web_sys::window().and_then(|w| w.document())
}

pub(crate) fn element_by_id(id: &str) -> Option<web_sys::Element> {
    if id.trim().is_empty() {
        return None;
    }
    document()?.get_element_by_id(id)
}

pub(crate) fn html_element_by_id(id: &str) -> Option<web_sys::HtmlElement> {
    element_by_id(id)?.dyn_into::<web_sys::HtmlElement>().ok()
}

pub(crate) fn input_by_id(id: &str) -> Option<web_sys::HtmlInputElement> {
    element_by_id(id)?.dyn_into::<web_sys::HtmlInputElement>().ok()
}

/// Owns a listener and detaches it on drop.
pub(crate) struct EventListenerGuard {
    target: web_sys::EventTarget,
    event: String,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl EventListenerGuard {
    pub(crate) fn new(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Option<Self> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target: target.clone(),
            event: event.to_string(),
            closure,
        })
    }
}

impl Drop for EventListenerGuard {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.event, self.closure.as_ref().unchecked_ref());
    }
}

/// Owns a `MutationObserver` and disconnects it on drop.
pub(crate) struct MutationObserverGuard {
    observer: web_sys::MutationObserver,
    _closure: Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>,
}

impl MutationObserverGuard {
    /// Observes `target` (subtree, child list and character data). `on_batch` receives the
    /// record types of each batch.
    pub(crate) fn observe(
        target: &web_sys::Node,
        mut on_batch: impl FnMut(Vec<String>) + 'static,
    ) -> Option<Self> {
        let closure = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                let kinds = records
                    .iter()
                    .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
                    .map(|r| r.type_())
                    .collect::<Vec<_>>();
                on_batch(kinds);
            },
        );

        let observer = web_sys::MutationObserver::new(closure.as_ref().unchecked_ref()).ok()?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_character_data(true);
        observer.observe_with_options(target, &init).ok()?;

        Some(Self {
            observer,
            _closure: closure,
        })
    }
}

impl Drop for MutationObserverGuard {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
