use super::super::{Model, Msg};
use super::utils::{debounce, truncate_name};
use yew::html::Scope;
use yew::prelude::*;

pub fn render_preview_area(model: &Model, link: &Scope<Model>) -> Html {
    let Some(file_data) = model.file.as_ref() else {
        return html! {
            <div class="button-container">
                <button class="analyze-btn" disabled=true>
                    <i class="fa-solid fa-paper-plane"></i>{" Send to model"}
                </button>
            </div>
        };
    };

    let name = file_data.file.name();
    let preview = match &file_data.preview_url {
        Some(url) => html! {
            <img id="actual-image-preview"
                src={url.to_string()}
                alt={name.clone()}
                style="max-width:100%; max-height: 400px; object-fit: contain; margin-bottom: 10px;" />
        },
        None => html! {
            <div class="preview-placeholder">
                <i class="fa-solid fa-spinner fa-spin fa-2x"></i>
                <p>{"Loading preview..."}</p>
            </div>
        },
    };

    html! {
        <div id="preview-container">
            { preview }
            <p class="preview-caption" title={name.clone()}>
                { format!("{} ({} KB)", truncate_name(&name, 40), file_data.file.size() / 1024) }
            </p>
            <div class="button-container">
                <button
                    class="analyze-btn"
                    style="background-color: var(--danger-color);"
                    disabled={model.loading}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::ClearFile)
                    })}
                >
                    <i class="fa-solid fa-trash"></i>{" Remove"}
                </button>
                <button
                    class="analyze-btn"
                    disabled={model.loading}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Analyze)
                    })}
                >
                    { render_analyze_button_content(model.loading) }
                </button>
            </div>
        </div>
    }
}

fn render_analyze_button_content(loading: bool) -> Html {
    if loading {
        html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</> }
    } else {
        html! { <><i class="fa-solid fa-paper-plane"></i>{" Send to model"}</> }
    }
}
