use yew::prelude::*;

pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-brain"></i> {" NeuroScan: Alzheimer Classification"}</h1>
            <p class="subtitle">{"Upload a brain scan via button, drag & drop, or paste"}</p>
        </header>
    }
}
