//! Pieces shared by the pages: sortable headers, the modal shell and the
//! status glyph.

use leptos::prelude::*;
use lucide_leptos::{CircleCheck, CircleX, LoaderCircle, X};
use modeldesk_core::{SortConfig, StatusGlyph};

/// Column header that toggles the table's sort on click.
#[component]
pub fn SortHeader<K>(sort: RwSignal<SortConfig<K>>, column: K, label: &'static str) -> impl IntoView
where
    K: Copy + PartialEq + Send + Sync + 'static,
{
    view! {
        <th
            class="px-6 py-4 font-semibold text-slate-300 cursor-pointer select-none hover:text-white"
            on:click=move |_| sort.update(|s| s.toggle(column))
        >
            {label}
            <span class="ml-1 text-blue-400">{move || sort.with(|s| s.arrow(column))}</span>
        </th>
    }
}

#[component]
pub fn Modal(
    title: &'static str,
    #[prop(into)] on_close: Callback<()>,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/60 backdrop-blur-sm">
            <div class="bg-slate-900 border border-slate-800 rounded-2xl w-full max-w-2xl max-h-[90vh] overflow-auto shadow-2xl">
                <div class="flex items-center justify-between px-6 py-4 border-b border-slate-800">
                    <h2 class="text-xl font-bold text-white">{title}</h2>
                    <button on:click=move |_| on_close.run(()) class="text-slate-400 hover:text-white">
                        <X size=20 />
                    </button>
                </div>
                <div class="p-6 space-y-4">{children()}</div>
            </div>
        </div>
    }
}

#[component]
pub fn Glyph(glyph: StatusGlyph) -> impl IntoView {
    match glyph {
        StatusGlyph::Success => view! { <span class="text-green-400"><CircleCheck size=16 /></span> }.into_any(),
        StatusGlyph::Failure => view! { <span class="text-red-400"><CircleX size=16 /></span> }.into_any(),
        StatusGlyph::Busy => view! { <span class="text-blue-400 inline-block animate-spin"><LoaderCircle size=16 /></span> }.into_any(),
    }
}

pub const INPUT_CLASS: &str = "w-full bg-slate-800 border border-slate-700 rounded-lg px-3 py-2 text-white focus:outline-none focus:border-blue-500";
pub const LABEL_CLASS: &str = "block text-sm font-medium text-slate-400 mb-1";
pub const PRIMARY_BUTTON: &str = "px-6 py-2 bg-blue-600 hover:bg-blue-500 disabled:opacity-50 text-white rounded-lg font-medium transition-colors";
pub const SECONDARY_BUTTON: &str = "px-4 py-2 bg-slate-800 hover:bg-slate-700 rounded-lg text-sm transition-colors border border-slate-700";
