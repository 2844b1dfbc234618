use super::super::{Model, Msg};
use yew::html::Scope;
use yew::prelude::*;

pub fn render_theme_toggle(theme: &str, link: &Scope<Model>) -> Html {
    let (title, icon) = if theme == "light" {
        ("Switch to Dark Mode", "fa-solid fa-moon")
    } else {
        ("Switch to Light Mode", "fa-solid fa-sun")
    };

    html! {
        <button
            id="theme-toggle"
            class="theme-toggle"
            onclick={link.callback(|_| Msg::ToggleTheme)}
            title={title}
        >
            <i class={icon}></i>
        </button>
    }
}
