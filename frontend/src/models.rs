use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use lucide_leptos::{Plus, Trash2};
use modeldesk_core::model_form::FeatureDraft;
use modeldesk_core::sort::sort_rows;
use modeldesk_core::{
    format_timestamp, Dependency, Engine, FeatureType, Language, ModelForm, ModelSortKey,
    ModelType, Route, Serialization, SortConfig,
};
use web_sys::HtmlInputElement;

use crate::api::{read_selected_file, use_console};
use crate::widgets::{Modal, SortHeader, INPUT_CLASS, LABEL_CLASS, PRIMARY_BUTTON, SECONDARY_BUTTON};

#[component]
pub fn ModelManagement() -> impl IntoView {
    let console = use_console();
    let navigate = use_navigate();
    let refresh = RwSignal::new(0u32);
    let show_add = RwSignal::new(false);
    let sort = RwSignal::new(SortConfig::<ModelSortKey>::default());

    let models = LocalResource::new(move || {
        refresh.track();
        let api = console.client();
        async move { api.list_models().await.map_err(|e| e.user_message()) }
    });

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">"Model Management"</h1>
                <button on:click=move |_| show_add.set(true) class=format!("flex items-center space-x-2 {PRIMARY_BUTTON}")>
                    <Plus size=18 />
                    <span>"Add Model"</span>
                </button>
            </div>
            <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
                <table class="w-full text-left border-collapse">
                    <thead>
                        <tr class="bg-slate-800/50">
                            {ModelSortKey::ALL.into_iter().map(|column| view! {
                                <SortHeader sort=sort column=column label=column.label() />
                            }).collect_view()}
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800">
                        <Suspense fallback=|| view! { <tr><td colspan="4" class="px-6 py-10 text-center text-slate-500">"Loading..."</td></tr> }>
                            {move || {
                                let navigate = navigate.clone();
                                Suspend::new(async move {
                                    let list = match models.await {
                                        Ok(list) => list,
                                        Err(msg) => return view! {
                                            <tr><td colspan="4" class="px-6 py-10 text-center text-red-400">{msg}</td></tr>
                                        }.into_any(),
                                    };
                                    if list.is_empty() {
                                        return view! {
                                            <tr><td colspan="4" class="px-6 py-10 text-center text-slate-500">"No models registered yet."</td></tr>
                                        }.into_any();
                                    }
                                    (move || {
                                        let mut rows = list.clone();
                                        sort_rows(&mut rows, &sort.get());
                                        rows.into_iter().map(|model| {
                                            let navigate = navigate.clone();
                                            let target = Route::ModelRunner { model_id: Some(model.id.clone()) }.path();
                                            view! {
                                                <tr class="hover:bg-slate-800/30 transition-colors cursor-pointer"
                                                    on:click=move |_| navigate(&target, Default::default())>
                                                    <td class="px-6 py-4 font-medium text-blue-400">{model.name}</td>
                                                    <td class="px-6 py-4 text-slate-300">{model.model_type.to_string()}</td>
                                                    <td class="px-6 py-4 text-slate-300">{model.engine.to_string()}</td>
                                                    <td class="px-6 py-4 text-slate-400 text-sm">
                                                        {model.created_at.as_ref().map(format_timestamp).unwrap_or_default()}
                                                    </td>
                                                </tr>
                                            }
                                        }).collect_view()
                                    }).into_any()
                                })
                            }}
                        </Suspense>
                    </tbody>
                </table>
            </div>
            <Show when=move || show_add.get()>
                <AddModelModal show=show_add refresh=refresh />
            </Show>
        </div>
    }
}

fn select_options<T: Copy + ToString>(options: impl IntoIterator<Item = T>) -> impl IntoView {
    options
        .into_iter()
        .map(|o| {
            let value = o.to_string();
            view! { <option value=value.clone()>{value}</option> }
        })
        .collect_view()
}

#[component]
fn AddModelModal(show: RwSignal<bool>, refresh: RwSignal<u32>) -> impl IntoView {
    let console = use_console();
    let form = RwSignal::new(ModelForm::default());
    let error = RwSignal::new(None::<String>);
    let pending = RwSignal::new(false);

    let uses_docker = Memo::new(move |_| form.with(ModelForm::uses_docker));
    let shows_features = Memo::new(move |_| form.with(ModelForm::shows_features));
    let shows_serialization = Memo::new(move |_| form.with(ModelForm::shows_serialization));
    let languages = Memo::new(move |_| form.with(ModelForm::languages));
    let feature_count = Memo::new(move |_| form.with(|f| f.features.len()));
    let dependency_count = Memo::new(move |_| form.with(|f| f.dependencies.len()));

    let on_file = move |ev: leptos::ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        spawn_local(async move {
            let Some(file) = read_selected_file(&input).await else {
                return;
            };
            let accepted = form.try_update(|f| f.select_file(file)).unwrap_or(false);
            if !accepted {
                input.set_value("");
            }
        });
    };

    let submit = move |_| {
        let api = console.client();
        let snapshot = form.get_untracked();
        pending.set(true);
        spawn_local(async move {
            match api.create_model(&snapshot).await {
                Ok(model) => {
                    log::info!("registered model {}", model.id);
                    show.set(false);
                    refresh.update(|n| *n += 1);
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.user_message()));
                }
            }
            let _ = pending.try_set(false);
        });
    };

    view! {
        <Modal title="Add Model" on_close=move |_| show.set(false)>
            <div>
                <label class=LABEL_CLASS>"Name"</label>
                <input class=INPUT_CLASS
                    prop:value=move || form.with(|f| f.name.clone())
                    on:input=move |ev| form.update(|f| f.name = event_target_value(&ev)) />
            </div>
            <div class="grid grid-cols-2 gap-4">
                <div>
                    <label class=LABEL_CLASS>"Type"</label>
                    <select class=INPUT_CLASS
                        prop:value=move || form.with(|f| f.model_type.to_string())
                        on:change=move |ev| {
                            if let Some(t) = ModelType::parse(&event_target_value(&ev)) {
                                form.update(|f| f.set_type(t));
                            }
                        }>
                        {select_options(ModelType::ALL)}
                    </select>
                </div>
                <div>
                    <label class=LABEL_CLASS>"Engine"</label>
                    <select class=INPUT_CLASS
                        prop:value=move || form.with(|f| f.engine.to_string())
                        on:change=move |ev| {
                            if let Some(e) = Engine::parse(&event_target_value(&ev)) {
                                form.update(|f| f.engine = e);
                            }
                        }>
                        {select_options(Engine::ALL)}
                    </select>
                </div>
            </div>

            <Show when=move || uses_docker.get()>
                <div class="grid grid-cols-2 gap-4">
                    <div>
                        <label class=LABEL_CLASS>"Language"</label>
                        <select class=INPUT_CLASS
                            prop:value=move || form.with(|f| f.language.to_string())
                            on:change=move |ev| {
                                if let Some(l) = Language::parse(&event_target_value(&ev)) {
                                    form.update(|f| f.set_language(l));
                                }
                            }>
                            {move || select_options(languages.get())}
                        </select>
                    </div>
                    <div>
                        <label class=LABEL_CLASS>"Docker Tag"</label>
                        <input class=INPUT_CLASS
                            prop:value=move || form.with(|f| f.docker_tag.clone())
                            on:input=move |ev| form.update(|f| f.docker_tag = event_target_value(&ev)) />
                    </div>
                    <div>
                        <label class=LABEL_CLASS>"Memory Limit"</label>
                        <input class=INPUT_CLASS
                            prop:value=move || form.with(|f| f.mem_limit.clone())
                            on:input=move |ev| form.update(|f| f.mem_limit = event_target_value(&ev)) />
                    </div>
                    <div>
                        <label class=LABEL_CLASS>"CPU Percentage"</label>
                        <input type="number" min="1" max="100" class=INPUT_CLASS
                            prop:value=move || form.with(|f| f.cpu_percentage.clone())
                            on:input=move |ev| form.update(|f| f.cpu_percentage = event_target_value(&ev)) />
                    </div>
                </div>
            </Show>

            <Show when=move || shows_serialization.get()>
                <div>
                    <label class=LABEL_CLASS>"Serialization"</label>
                    <select class=INPUT_CLASS
                        prop:value=move || form.with(|f| f.serialization.as_str())
                        on:change=move |ev| {
                            if let Some(s) = Serialization::parse(&event_target_value(&ev)) {
                                form.update(|f| f.serialization = s);
                            }
                        }>
                        {Serialization::ALL.into_iter().map(|s| view! { <option value=s.as_str()>{s.as_str()}</option> }).collect_view()}
                    </select>
                </div>
            </Show>

            <Show when=move || shows_features.get()>
                <div class="space-y-2">
                    <label class=LABEL_CLASS>"Features"</label>
                    {move || (0..feature_count.get()).map(|i| view! { <FeatureRow form=form index=i /> }).collect_view()}
                    <button on:click=move |_| form.update(ModelForm::add_feature) class=SECONDARY_BUTTON>"Add Feature"</button>
                </div>
            </Show>

            <div class="space-y-2">
                <label class=LABEL_CLASS>"Dependencies"</label>
                {move || (0..dependency_count.get()).map(|i| view! { <DependencyRow form=form index=i /> }).collect_view()}
                <button on:click=move |_| form.update(ModelForm::add_dependency) class=SECONDARY_BUTTON>"Add Dependency"</button>
            </div>

            <div>
                <label class=LABEL_CLASS>"Model File"</label>
                <input type="file" class=INPUT_CLASS
                    accept=move || form.with(|f| f.file.accept())
                    on:change=on_file />
                {move || form.with(|f| f.error().map(str::to_string)).map(|msg| view! { <p class="text-sm text-red-400 mt-1">{msg}</p> })}
            </div>

            {move || error.get().map(|msg| view! { <p class="text-sm text-red-400">{msg}</p> })}
            <div class="flex justify-end space-x-3 pt-2">
                <button on:click=move |_| show.set(false) class=SECONDARY_BUTTON>"Cancel"</button>
                <button on:click=submit disabled=move || pending.get() class=PRIMARY_BUTTON>"Submit"</button>
            </div>
        </Modal>
    }
}

#[component]
fn FeatureRow(form: RwSignal<ModelForm>, index: usize) -> impl IntoView {
    let read = move || form.with(|f| f.features.get(index).cloned().unwrap_or_default());
    let edit = move |apply: &dyn Fn(&mut FeatureDraft)| {
        form.update(|f| {
            if let Some(feature) = f.features.get_mut(index) {
                apply(feature);
            }
        })
    };

    view! {
        <div class="flex items-center space-x-2">
            <input class=INPUT_CLASS placeholder="Feature name"
                prop:value=move || read().name
                on:input=move |ev| {
                    let name = event_target_value(&ev);
                    edit(&|f: &mut FeatureDraft| f.name = name.clone());
                } />
            <select class=INPUT_CLASS
                prop:value=move || read().kind.as_str()
                on:change=move |ev| {
                    if let Some(kind) = FeatureType::parse(&event_target_value(&ev)) {
                        edit(&|f: &mut FeatureDraft| f.kind = kind);
                    }
                }>
                {FeatureType::ALL.into_iter().map(|t| view! { <option value=t.as_str()>{t.as_str()}</option> }).collect_view()}
            </select>
            <button on:click=move |_| form.update(|f| f.remove_feature(index)) class="text-slate-500 hover:text-red-400">
                <Trash2 size=18 />
            </button>
        </div>
    }
}

#[component]
fn DependencyRow(form: RwSignal<ModelForm>, index: usize) -> impl IntoView {
    let read = move || form.with(|f| f.dependencies.get(index).cloned().unwrap_or_default());
    let edit = move |apply: &dyn Fn(&mut Dependency)| {
        form.update(|f| {
            if let Some(dep) = f.dependencies.get_mut(index) {
                apply(dep);
            }
        })
    };

    view! {
        <div class="flex items-center space-x-2">
            <input class=INPUT_CLASS placeholder="Library"
                prop:value=move || read().library
                on:input=move |ev| {
                    let library = event_target_value(&ev);
                    edit(&|d: &mut Dependency| d.library = library.clone());
                } />
            <input class=INPUT_CLASS placeholder="Version"
                prop:value=move || read().version
                on:input=move |ev| {
                    let version = event_target_value(&ev);
                    edit(&|d: &mut Dependency| d.version = version.clone());
                } />
            <button on:click=move |_| form.update(|f| f.remove_dependency(index)) class="text-slate-500 hover:text-red-400">
                <Trash2 size=18 />
            </button>
        </div>
    }
}
