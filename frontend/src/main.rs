mod api;
mod components;

use components::{handlers, header, preview_area, results, theme_toggle, upload_section};
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::AnalysisReport;
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

pub struct FileData {
    pub file: GlooFile,
    pub preview_url: Option<ObjectUrl>,
}

pub enum Msg {
    // File operations
    FileSelected(GlooFile),
    AddPreview(ObjectUrl),
    ClearFile,

    // Analysis operations
    Analyze,
    AnalysisFinished(AnalysisReport),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),
    ToggleTheme,

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

pub struct Model {
    pub file: Option<FileData>,
    pub report: Option<AnalysisReport>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_dragging: bool,
    pub theme: String,
    _paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let paste_listener = web_sys::window().map(|window| {
            EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            })
        });

        Self {
            file: None,
            report: None,
            loading: false,
            error: None,
            is_dragging: false,
            theme: "light".to_string(),
            _paste_listener: paste_listener,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, ctx, file),
            Msg::AddPreview(url) => handlers::handle_add_preview(self, url),
            Msg::ClearFile => handlers::handle_clear_file(self),

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::AnalysisFinished(report) => handlers::handle_analysis_finished(self, report),

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
            Msg::ToggleTheme => handlers::handle_toggle_theme(self),

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        html! {
            <div class="container">
                { header::render_header() }
                <div class="top-right">
                    { theme_toggle::render_theme_toggle(&self.theme, link) }
                </div>

                <main class="main-content">
                    <div class="upload-section">
                        { upload_section::render_file_input_area(self, link) }
                        { preview_area::render_preview_area(self, link) }
                    </div>
                    { results::render_error_message(self.error.as_deref()) }
                    { results::render_report(self.report.as_ref()) }
                </main>

                <footer class="app-footer">
                    <p>{"NeuroScan | This result does not constitute a medical diagnosis."}</p>
                </footer>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("NeuroScan frontend starting...");
    yew::Renderer::<Model>::new().render();
}
