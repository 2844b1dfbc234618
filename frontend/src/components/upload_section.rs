use super::super::{Model, Msg};
use super::utils::{ACCEPT_ATTRIBUTE, debounce, first_image_file};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlInputElement};
use yew::html::Scope;
use yew::prelude::*;

pub fn render_file_input_area(model: &Model, link: &Scope<Model>) -> Html {
    let handle_change = link.callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let selected = input.files().as_ref().map(first_image_file);
        input.set_value("");

        match selected {
            Some(Ok(Some(file))) => Msg::FileSelected(file),
            Some(Err(name)) => Msg::SetError(Some(format!(
                "Unsupported file: {}. Use JPG, PNG, WEBP or BMP.",
                name
            ))),
            _ => Msg::SetError(Some("No image selected.".into())),
        }
    });

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    let handle_drop = link.callback(Msg::HandleDrop);
    let trigger_file_input = move || {
        if let Some(input) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id("file-input"))
            .and_then(|element| element.dyn_into::<web_sys::HtmlElement>().ok())
        {
            input.click();
        }
    };

    html! {
        <>
            <input
                type="file"
                id="file-input"
                accept={ACCEPT_ATTRIBUTE}
                style="display: none;"
                onchange={handle_change}
            />

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={handle_drop}
                onclick={debounce(300, trigger_file_input)}
            >
                <div class="upload-placeholder">
                    <i class="fa-solid fa-cloud-arrow-up"></i>
                    <p>{"Drag & drop a brain scan here, paste, or click"}</p>
                    <p class="file-types">{"Supported formats: JPG, JPEG, PNG, WEBP, BMP"}</p>
                </div>
            </div>
        </>
    }
}
