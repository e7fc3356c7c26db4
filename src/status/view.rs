use super::SaveStatus;
use crate::components::ui::Spinner;
use crate::config::Labels;
use icons::{Check, X};
use leptos::prelude::*;
use std::any::Any;
use wasm_bindgen::JsCast;

#[component]
pub fn AutosaveStatus(
    #[prop(into)] form_id: String,
    status: RwSignal<SaveStatus>,
    labels: Labels,
) -> impl IntoView {
    let labels = StoredValue::new(labels);

    view! {
        <div data-form=form_id data-status=move || status.get().to_string()>
            {move || match status.get() {
                SaveStatus::Empty => ().into_any(),
                SaveStatus::Pending => view! {
                    <div class="flex items-center text-sm text-gray-500">
                        <Spinner class="mr-1" label=labels.with_value(|l| l.saving.clone()) />
                        <span>{labels.with_value(|l| l.saving.clone())}</span>
                    </div>
                }
                .into_any(),
                SaveStatus::Success => view! {
                    <div class="flex items-center text-sm text-green-600">
                        <Check class="mr-1 size-4" />
                        <span>{labels.with_value(|l| l.saved.clone())}</span>
                    </div>
                }
                .into_any(),
                SaveStatus::Failure => view! {
                    <div class="flex items-center text-sm text-red-600">
                        <X class="mr-1 size-4" />
                        <span>{labels.with_value(|l| l.save_failed.clone())}</span>
                    </div>
                }
                .into_any(),
            }}
        </div>
    }
}

/// One form's slot inside a status region. Forms on the same page share the
/// region, so each gets its own host element; dropping this unmounts the view
/// and removes the host.
pub(crate) struct StatusMount {
    host: web_sys::Element,
    _handle: Box<dyn Any>,
}

impl Drop for StatusMount {
    fn drop(&mut self) {
        self.host.remove();
    }
}

/// Appends a host for `form_id` to `region` and mounts a reactive `AutosaveStatus` into it.
/// Whatever else the region holds is left alone.
pub(crate) fn mount_status_view(
    region: &web_sys::Element,
    form_id: &str,
    status: RwSignal<SaveStatus>,
    labels: Labels,
) -> Option<StatusMount> {
    let host = region
        .owner_document()?
        .create_element("div")
        .ok()?
        .dyn_into::<web_sys::HtmlElement>()
        .ok()?;
    region.append_child(&host).ok()?;

    let form_id = form_id.to_string();
    let handle = leptos::mount::mount_to(host.clone(), move || {
        view! { <AutosaveStatus form_id=form_id status=status labels=labels /> }
    });
    Some(StatusMount {
        host: host.into(),
        _handle: Box::new(handle),
    })
}
