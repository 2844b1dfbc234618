use super::super::{FileData, Model, Msg, api};
use super::utils::first_image_file;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::AnalysisReport;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

pub fn handle_file_selected(model: &mut Model, ctx: &Context<Model>, file: GlooFile) -> bool {
    model.error = None;
    model.report = None;
    model.file = Some(FileData {
        file: file.clone(),
        preview_url: None,
    });

    ctx.link().send_message(Msg::AddPreview(ObjectUrl::from(file)));
    true
}

pub fn handle_add_preview(model: &mut Model, url: ObjectUrl) -> bool {
    match model.file.as_mut() {
        Some(file_data) => {
            file_data.preview_url = Some(url);
            true
        }
        None => false,
    }
}

pub fn handle_clear_file(model: &mut Model) -> bool {
    model.file = None;
    model.report = None;
    model.error = None;
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(file_data) = model.file.as_ref() else {
        ctx.link()
            .send_message(Msg::SetError(Some("Choose an image before sending it to the model.".into())));
        return false;
    };
    if model.loading {
        return false;
    }

    model.loading = true;
    model.error = None;
    model.report = None;

    let file = file_data.file.clone();
    let link = ctx.link().clone();
    spawn_local(async move {
        match api::analyze_image(&file).await {
            Ok(report) => link.send_message(Msg::AnalysisFinished(report)),
            Err(e) => {
                log::error!("Analysis request failed: {}", e);
                link.send_message(Msg::SetError(Some(e)));
            }
        }
    });

    true
}

pub fn handle_analysis_finished(model: &mut Model, report: AnalysisReport) -> bool {
    log::info!(
        "Report {} for {} (HTTP {})",
        report.request_id,
        report.file_name,
        report.status_code
    );
    model.loading = false;
    model.error = report.error.clone();
    model.report = Some(report);
    true
}

pub fn handle_toggle_theme(model: &mut Model) -> bool {
    let Some(body) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
    else {
        return false;
    };

    let class_list = body.class_list();
    let result = if model.theme == "light" {
        model.theme = "dark".to_string();
        class_list.add_1("dark-mode")
    } else {
        model.theme = "light".to_string();
        class_list.remove_1("dark-mode")
    };
    if result.is_err() {
        log::warn!("Failed to update theme class");
    }
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
        process_file_list(ctx, &file_list);
    }
    true
}

pub fn handle_paste(ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    match event.clipboard_data().and_then(|dt| dt.files()) {
        Some(file_list) if file_list.length() > 0 => {
            event.prevent_default();
            process_file_list(ctx, &file_list);
            true
        }
        _ => false,
    }
}

fn process_file_list(ctx: &Context<Model>, file_list: &FileList) {
    match first_image_file(file_list) {
        Ok(Some(file)) => ctx.link().send_message(Msg::FileSelected(file)),
        Ok(None) => {}
        Err(name) => {
            log::warn!("Skipping unsupported file: {}", name);
            ctx.link().send_message(Msg::SetError(Some(format!(
                "Unsupported file: {}. Use JPG, PNG, WEBP or BMP.",
                name
            ))));
        }
    }
}
