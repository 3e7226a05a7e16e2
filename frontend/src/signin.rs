use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use modeldesk_core::Route;

use crate::api::use_console;
use crate::widgets::{INPUT_CLASS, LABEL_CLASS, PRIMARY_BUTTON};

#[component]
pub fn SignIn() -> impl IntoView {
    let console = use_console();
    let navigate = use_navigate();
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let pending = RwSignal::new(false);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let api = console.client();
        let navigate = navigate.clone();
        let (email, password) = (email.get_untracked(), password.get_untracked());
        pending.set(true);
        spawn_local(async move {
            match api.sign_in(&email, &password).await {
                Ok(()) => {
                    error.set(None);
                    console.authenticated.set(true);
                    navigate(&Route::DEFAULT.path(), Default::default());
                }
                Err(e) => error.set(Some(e.user_message())),
            }
            pending.set(false);
        });
    };

    view! {
        <div class="max-w-sm mx-auto mt-24 bg-slate-900 border border-slate-800 rounded-2xl p-8 space-y-6">
            <h1 class="text-2xl font-bold text-white">"Sign In"</h1>
            <form on:submit=submit class="space-y-4">
                <div>
                    <label class=LABEL_CLASS>"Email"</label>
                    <input type="email" required class=INPUT_CLASS
                        on:input=move |ev| email.set(event_target_value(&ev))
                        prop:value=email />
                </div>
                <div>
                    <label class=LABEL_CLASS>"Password"</label>
                    <input type="password" required class=INPUT_CLASS
                        on:input=move |ev| password.set(event_target_value(&ev))
                        prop:value=password />
                </div>
                {move || error.get().map(|msg| view! { <p class="text-sm text-red-400">{msg}</p> })}
                <button type="submit" disabled=move || pending.get()
                    class=format!("w-full {PRIMARY_BUTTON}")>
                    "Sign In"
                </button>
            </form>
        </div>
    }
}
