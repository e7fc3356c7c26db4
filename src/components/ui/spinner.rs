use icons::LoaderCircle;
use leptos::prelude::*;
use tw_merge::tw_merge;

/// Inline busy glyph for the "saving" state. `label` is announced to screen readers.
#[component]
pub fn Spinner(
    #[prop(into, optional)] class: String,
    #[prop(into)] label: String,
) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <LoaderCircle class=merged_class attr:role="status" attr:aria-label=label /> }
}
