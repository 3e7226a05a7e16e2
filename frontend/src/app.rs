use leptos::prelude::*;
use leptos_router::components::{Redirect, Route as RouterRoute, Router, Routes, A};
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::path;
use lucide_leptos::{Boxes, LogOut, Play, TriangleAlert};
use modeldesk_core::{guard, Route};

use crate::api::{use_console, Console};
use crate::models::ModelManagement;
use crate::runs::ModelRunner;
use crate::signin::SignIn;

#[component]
pub fn App(console: Console) -> impl IntoView {
    provide_context(console);

    view! {
        <Router>
            <div class="min-h-screen bg-slate-950 text-slate-100 font-sans">
                <Show when=move || console.authenticated.get()>
                    <Navbar />
                </Show>
                <main class="p-8">
                    <Routes fallback=|| view! { <NotFound /> }.into_any()>
                        <RouterRoute path=path!("/") view=|| view! { <Redirect path=Route::DEFAULT.path() /> } />
                        <RouterRoute path=path!("/signin") view=|| view! {
                            <Gate><SignIn /></Gate>
                        } />
                        <RouterRoute path=path!("/model-management") view=|| view! {
                            <Gate><ModelManagement /></Gate>
                        } />
                        <RouterRoute path=path!("/model-runner") view=|| view! {
                            <Gate><ModelRunner /></Gate>
                        } />
                    </Routes>
                </main>
            </div>
        </Router>
    }
    .into_any()
}

/// The console route for the current location; `None` for unknown paths.
pub fn use_current_route() -> Memo<Option<Route>> {
    let location = use_location();
    Memo::new(move |_| {
        let search = location.search.get();
        Route::from_location(&location.pathname.get(), search.trim_start_matches('?'))
    })
}

/// Renders its children only when the session allows the current route;
/// otherwise redirects to wherever the guard sends the user.
#[component]
fn Gate(children: ChildrenFn) -> impl IntoView {
    let console = use_console();
    let current = use_current_route();
    move || {
        let Some(requested) = current.get() else {
            return children().into_any();
        };
        let shown = guard(requested.clone(), console.authenticated.get());
        if shown == requested {
            children().into_any()
        } else {
            view! { <Redirect path=shown.path() /> }.into_any()
        }
    }
}

#[component]
fn Navbar() -> impl IntoView {
    let console = use_console();
    let navigate = use_navigate();
    let logout = move |_| {
        console.sign_out();
        navigate(&Route::SignIn.path(), Default::default());
    };
    let link = "flex items-center space-x-2 px-4 py-2 rounded-xl hover:bg-slate-800 transition-colors text-slate-400 hover:text-white";

    view! {
        <nav class="flex items-center justify-between px-8 py-4 border-b border-slate-800 bg-slate-900/50">
            <div class="flex items-center space-x-6">
                <span class="text-2xl font-bold tracking-tight text-white">"modeldesk"</span>
                <A href=Route::ModelManagement.path() attr:class=link>
                    <Boxes size=18 />
                    <span>"Model Management"</span>
                </A>
                <A href={Route::ModelRunner { model_id: None }.path()} attr:class=link>
                    <Play size=18 />
                    <span>"Model Runner"</span>
                </A>
            </div>
            <button on:click=logout class=link>
                <LogOut size=18 />
                <span>"Logout"</span>
            </button>
        </nav>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center h-full space-y-4 pt-24">
            <div class="text-yellow-500"><TriangleAlert size=48 /></div>
            <p class="text-slate-400">"Page not found"</p>
            <A href=Route::DEFAULT.path() attr:class="text-blue-400 hover:underline">"Back to models"</A>
        </div>
    }
    .into_any()
}
