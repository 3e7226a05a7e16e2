//! The model-runner page: a polled run table and the run detail modal.

use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::Play;
use modeldesk_core::sort::sort_rows;
use modeldesk_core::view::{InputTable, RunOutcome, NO_INPUT_FEATURES};
use modeldesk_core::{ModelRun, Poller, Route, RunDetail, RunRow, RunSortKey, SortConfig};

use crate::api::{use_console, IntervalScheduler};
use crate::app::use_current_route;
use crate::launcher::RunModelModal;
use crate::widgets::{Glyph, Modal, SortHeader, PRIMARY_BUTTON};

#[component]
pub fn ModelRunner() -> impl IntoView {
    let console = use_console();
    let current = use_current_route();
    // Keep the last filter while the location moves to another page.
    let model_id = Memo::new(move |prev: Option<&Option<String>>| match current.get() {
        Some(Route::ModelRunner { model_id }) => model_id,
        _ => prev.cloned().flatten(),
    });

    let runs = RwSignal::new(Vec::<ModelRun>::new());
    let load_error = RwSignal::new(None::<String>);
    let sort = RwSignal::new(SortConfig::<RunSortKey>::default());
    let selected = RwSignal::new(None::<String>);
    let show_launcher = RwSignal::new(false);

    let fetch = move |scope: &Option<String>| {
        let api = console.client();
        let scope = scope.clone();
        spawn_local(async move {
            match api.list_runs(scope.as_deref()).await {
                Ok(list) => {
                    let _ = runs.try_set(list);
                    let _ = load_error.try_set(None);
                }
                Err(e) => {
                    let _ = load_error.try_set(Some(e.user_message()));
                }
            }
        });
    };

    let interval = Duration::from_millis(console.config().runs_poll_interval_ms);
    let poller = StoredValue::new_local(Poller::new(IntervalScheduler, interval));
    Effect::new(move |_| {
        let scope = model_id.get();
        poller.update_value(|p| p.watch(scope, fetch));
    });
    on_cleanup(move || {
        let _ = poller.try_update_value(|p| p.stop());
    });

    let rows = move || {
        let mut list = runs.get();
        sort_rows(&mut list, &sort.get());
        list.iter().map(RunRow::from).collect::<Vec<_>>()
    };

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">"Model Runner"</h1>
                <button on:click=move |_| show_launcher.set(true) class=format!("flex items-center space-x-2 {PRIMARY_BUTTON}")>
                    <Play size=18 />
                    <span>"Run Model"</span>
                </button>
            </div>
            {move || load_error.get().map(|msg| view! { <p class="text-sm text-red-400">{msg}</p> })}
            <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
                <table class="w-full text-left border-collapse">
                    <thead>
                        <tr class="bg-slate-800/50">
                            {RunSortKey::ALL.into_iter().map(|column| view! {
                                <SortHeader sort=sort column=column label=column.label() />
                            }).collect_view()}
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800">
                        {move || {
                            let rows = rows();
                            if rows.is_empty() {
                                return view! {
                                    <tr><td colspan="6" class="px-6 py-10 text-center text-slate-500">"No runs yet."</td></tr>
                                }.into_any();
                            }
                            rows.into_iter().map(|row| {
                                let id = row.id.clone();
                                view! {
                                    <tr class="hover:bg-slate-800/30 transition-colors cursor-pointer"
                                        on:click=move |_| selected.set(Some(id.clone()))>
                                        <td class="px-6 py-4 font-medium">{row.model_name}</td>
                                        <td class="px-6 py-4 text-slate-300">{row.model_type}</td>
                                        <td class="px-6 py-4 text-slate-300">{row.model_engine}</td>
                                        <td class="px-6 py-4 text-slate-400 text-sm">{row.updated}</td>
                                        <td class="px-6 py-4 text-slate-300 font-mono text-sm">{row.duration}</td>
                                        <td class="px-6 py-4">
                                            <div class="flex items-center space-x-2">
                                                <Glyph glyph=row.glyph />
                                                <span class="text-sm text-slate-300">{row.state}</span>
                                            </div>
                                        </td>
                                    </tr>
                                }
                            }).collect_view().into_any()
                        }}
                    </tbody>
                </table>
            </div>

            {move || selected.get().map(|run_id| view! { <RunDetailsModal run_id=run_id selected=selected /> })}
            <Show when=move || show_launcher.get()>
                <RunModelModal
                    show=show_launcher
                    preselect=model_id.get_untracked()
                    on_submitted=move |_| fetch(&model_id.get_untracked())
                />
            </Show>
        </div>
    }
}

#[component]
fn RunDetailsModal(run_id: String, selected: RwSignal<Option<String>>) -> impl IntoView {
    let console = use_console();
    let detail = RwSignal::new(None::<RunDetail>);
    let error = RwSignal::new(None::<String>);

    let interval = Duration::from_millis(console.config().detail_poll_interval_ms);
    let poller = StoredValue::new_local(Poller::new(IntervalScheduler, interval));
    poller.update_value(|p| {
        p.watch(run_id, move |id: &String| {
            let api = console.client();
            let id = id.clone();
            spawn_local(async move {
                match api.run_detail(&id).await {
                    Ok(d) => {
                        let _ = detail.try_set(Some(d));
                        let _ = error.try_set(None);
                    }
                    Err(e) => {
                        let _ = error.try_set(Some(e.user_message()));
                    }
                }
            });
        })
    });
    on_cleanup(move || {
        let _ = poller.try_update_value(|p| p.stop());
    });

    view! {
        <Modal title="Run Details" on_close=move |_| selected.set(None)>
            {move || error.get().map(|msg| view! { <p class="text-sm text-red-400">{msg}</p> })}
            {move || match detail.get() {
                None => view! { <p class="text-slate-500 animate-pulse">"Loading run..."</p> }.into_any(),
                Some(d) => view! { <RunDetailBody detail=d /> }.into_any(),
            }}
        </Modal>
    }
}

#[component]
fn RunDetailBody(detail: RunDetail) -> impl IntoView {
    let run = detail.run.clone();
    let field = |label: &'static str, value: String| {
        view! {
            <div>
                <div class="text-xs uppercase tracking-wide text-slate-500">{label}</div>
                <div class="text-slate-200 font-mono text-sm break-all">{value}</div>
            </div>
        }
    };

    let container = detail.show_container().then(|| {
        view! {
            <div class="grid grid-cols-2 gap-4">
                {field("Container ID", run.container_id.clone().unwrap_or_else(|| "-".into()))}
                {field("Exit Code", run.container_exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".into()))}
            </div>
        }
    });

    let outcome = match detail.outcome() {
        RunOutcome::Result(text) => Some(("Result", text)),
        RunOutcome::Logs(text) => Some(("Logs", text)),
        RunOutcome::Pending => None,
    }
    .map(|(label, text)| {
        view! {
            <div>
                <div class="text-xs uppercase tracking-wide text-slate-500 mb-1">{label}</div>
                <pre class="bg-slate-950 border border-slate-800 rounded-lg p-4 text-sm text-slate-300 overflow-auto max-h-64">{text}</pre>
            </div>
        }
    });

    let inputs = detail.input_table().map(|table| {
        let body = match table {
            InputTable::Rows(rows) => rows
                .into_iter()
                .map(|(name, value)| view! {
                    <tr><td class="px-4 py-2">{name}</td><td class="px-4 py-2 font-mono">{value}</td></tr>
                })
                .collect_view()
                .into_any(),
            InputTable::Empty => view! {
                <tr><td colspan="2" class="px-4 py-2 text-center text-slate-500">{NO_INPUT_FEATURES}</td></tr>
            }
            .into_any(),
        };
        view! {
            <table class="w-full text-left text-sm border border-slate-800 rounded-lg">
                <thead><tr class="bg-slate-800/50"><th class="px-4 py-2">"Feature"</th><th class="px-4 py-2">"Value"</th></tr></thead>
                <tbody class="divide-y divide-slate-800">{body}</tbody>
            </table>
        }
    });

    view! {
        <div class="space-y-4">
            <div class="grid grid-cols-2 gap-4">
                {field("Model ID", run.model_id.clone())}
                <div>
                    <div class="text-xs uppercase tracking-wide text-slate-500">"State"</div>
                    <div class="flex items-center space-x-2">
                        <Glyph glyph=run.state.glyph() />
                        <span class="text-slate-200 text-sm">{run.state.to_string()}</span>
                    </div>
                </div>
                {field("Created", detail.created())}
                {field("Last Updated", detail.updated())}
            </div>
            {container}
            {inputs}
            {outcome}
        </div>
    }
}
