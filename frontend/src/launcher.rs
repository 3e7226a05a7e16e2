//! The "Run Model" form.

use leptos::prelude::*;
use leptos::task::spawn_local;
use modeldesk_core::{ControlKind, InputPanel, RunLauncher};
use web_sys::HtmlInputElement;

use crate::api::{read_selected_file, use_console};
use crate::widgets::{Modal, INPUT_CLASS, LABEL_CLASS, PRIMARY_BUTTON, SECONDARY_BUTTON};

/// Panel layout without the typed values, so editing an input does not
/// rebuild the controls.
#[derive(Debug, Clone, PartialEq)]
enum PanelShape {
    Empty,
    Features(Vec<(String, ControlKind)>),
    FileUpload,
}

#[component]
pub fn RunModelModal(
    show: RwSignal<bool>,
    preselect: Option<String>,
    #[prop(into)] on_submitted: Callback<()>,
) -> impl IntoView {
    let console = use_console();
    let launcher = RwSignal::new(RunLauncher::with_preselect(preselect));
    let error = RwSignal::new(None::<String>);
    let pending = RwSignal::new(false);

    let load_schema = move |id: String| {
        let api = console.client();
        spawn_local(async move {
            match api.get_model(&id).await {
                Ok(model) => {
                    if launcher.try_update(|l| l.schema_loaded(&model)) == Some(false) {
                        log::debug!("ignoring schema for {id}, selection moved on");
                    }
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.user_message()));
                }
            }
        });
    };

    launcher.update(RunLauncher::open);
    {
        let api = console.client();
        spawn_local(async move {
            match api.list_models().await {
                Ok(models) => {
                    if let Some(id) = launcher.try_update(|l| l.models_loaded(models)).flatten() {
                        load_schema(id);
                    }
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.user_message()));
                }
            }
        });
    }

    let options = Memo::new(move |_| {
        launcher.with(|l| {
            l.models()
                .iter()
                .map(|m| (m.id.clone(), m.name.clone()))
                .collect::<Vec<_>>()
        })
    });
    let shape = Memo::new(move |_| {
        launcher.with(|l| match l.panel() {
            InputPanel::Empty => PanelShape::Empty,
            InputPanel::Features(controls) => {
                PanelShape::Features(controls.into_iter().map(|c| (c.name, c.kind)).collect())
            }
            InputPanel::FileUpload => PanelShape::FileUpload,
        })
    });

    let on_select = move |ev: leptos::ev::Event| {
        let id = event_target_value(&ev);
        launcher.update(|l| l.select_model(&id));
        error.set(None);
        if !id.is_empty() {
            load_schema(id);
        }
    };

    let on_file = move |ev: leptos::ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        spawn_local(async move {
            let Some(file) = read_selected_file(&input).await else {
                return;
            };
            if launcher.try_update(|l| l.select_file(file)) == Some(false) {
                input.set_value("");
            }
        });
    };

    let submit = move |_| {
        let Some(built) = launcher.try_update(RunLauncher::submission) else {
            return;
        };
        let submission = match built {
            Ok(submission) => submission,
            Err(e) => {
                error.set(Some(e.user_message()));
                return;
            }
        };
        error.set(None);
        pending.set(true);
        let api = console.client();
        spawn_local(async move {
            match api.submit_run(submission).await {
                Ok(run) => {
                    log::info!("submitted run {} ({})", run.id, run.state);
                    let _ = show.try_set(false);
                    on_submitted.run(());
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.user_message()));
                }
            }
            let _ = pending.try_set(false);
        });
    };

    view! {
        <Modal title="Run Model" on_close=move |_| show.set(false)>
            <div>
                <label class=LABEL_CLASS>"Model"</label>
                <select class=INPUT_CLASS
                    prop:value=move || launcher.with(|l| l.selected().unwrap_or_default().to_string())
                    on:change=on_select>
                    <option value="">"Select a model"</option>
                    {move || options.get().into_iter().map(|(id, name)| view! {
                        <option value=id>{name}</option>
                    }).collect_view()}
                </select>
            </div>

            {move || match shape.get() {
                PanelShape::Empty => ().into_any(),
                PanelShape::Features(controls) if controls.is_empty() => view! {
                    <p class="text-sm text-slate-500">"This model takes no input features."</p>
                }.into_any(),
                PanelShape::Features(controls) => controls
                    .into_iter()
                    .map(|(name, kind)| view! { <FeatureInput launcher=launcher name=name kind=kind /> })
                    .collect_view()
                    .into_any(),
                PanelShape::FileUpload => view! {
                    <div>
                        <label class=LABEL_CLASS>"Input Archive"</label>
                        <input type="file" class=INPUT_CLASS
                            accept=move || launcher.with(|l| l.file().accept())
                            on:change=on_file />
                        {move || launcher.with(|l| l.file().error().map(str::to_string)).map(|msg| view! {
                            <p class="text-sm text-red-400 mt-1">{msg}</p>
                        })}
                    </div>
                }.into_any(),
            }}

            {move || error.get().map(|msg| view! { <p class="text-sm text-red-400">{msg}</p> })}
            <div class="flex justify-end space-x-3 pt-2">
                <button on:click=move |_| show.set(false) class=SECONDARY_BUTTON>"Cancel"</button>
                <button on:click=submit disabled=move || pending.get() class=PRIMARY_BUTTON>"Run"</button>
            </div>
        </Modal>
    }
}

#[component]
fn FeatureInput(launcher: RwSignal<RunLauncher>, name: String, kind: ControlKind) -> impl IntoView {
    let label = name.clone();
    let key = StoredValue::new(name);
    let value = move || launcher.with(|l| key.with_value(|k| l.input(k).unwrap_or_default().to_string()));
    let on_input = move |ev: leptos::ev::Event| {
        let raw = event_target_value(&ev);
        key.with_value(|k| launcher.update(|l| l.set_input(k, raw)));
    };

    let control = match kind {
        ControlKind::Checkbox => view! {
            <input type="checkbox" class="h-4 w-4 accent-blue-500"
                prop:checked=move || launcher.with(|l| key.with_value(|k| l.input(k) == Some("true")))
                on:change=move |ev| {
                    let checked = event_target_checked(&ev);
                    key.with_value(|k| launcher.update(|l| l.set_flag(k, checked)));
                } />
        }.into_any(),
        ControlKind::Integer => view! {
            <input type="number" min="0" step="1" class=INPUT_CLASS prop:value=value on:input=on_input />
        }.into_any(),
        ControlKind::Decimal => view! {
            <input type="number" step="0.01" class=INPUT_CLASS prop:value=value on:input=on_input />
        }.into_any(),
        ControlKind::Text => view! {
            <input type="text" class=INPUT_CLASS prop:value=value on:input=on_input />
        }.into_any(),
    };

    view! {
        <div>
            <label class=LABEL_CLASS>{label}</label>
            {control}
        </div>
    }
}
