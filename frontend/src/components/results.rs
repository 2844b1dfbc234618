use shared::{AnalysisReport, Finding, InterpretedResult};
use yew::prelude::*;

pub fn render_error_message(error: Option<&str>) -> Html {
    match error {
        Some(error_msg) => html! {
            <div class="error-message">
                <i class="fa-solid fa-circle-exclamation"></i>
                <p>{ error_msg }</p>
            </div>
        },
        None => html! {},
    }
}

pub fn render_report(report: Option<&AnalysisReport>) -> Html {
    let Some(report) = report else {
        return html! {};
    };

    let raw_json = serde_json::to_string_pretty(&report.raw_response)
        .unwrap_or_else(|_| report.raw_response.to_string());
    let status_class = if report.is_success() { "status-ok" } else { "status-error" };

    html! {
        <div class="results-container">
            <div class="result-header">
                <h2 title={format!("Request {}", report.request_id)}>
                    <i class="fa-solid fa-file-medical"></i>{" Result"}
                    <span class="analyzed-filename-display">{format!("({})", report.file_name)}</span>
                </h2>
                <p class={classes!("status-line", status_class)}>
                    { format!("HTTP status: {}", report.status_code) }
                </p>
            </div>

            <details class="raw-json">
                <summary>{"Raw JSON (debug)"}</summary>
                <pre>{ raw_json }</pre>
            </details>

            { report.result.as_ref().map(render_result).unwrap_or_default() }
            { render_explanation(report.explanation.as_deref()) }
        </div>
    }
}

fn render_result(result: &InterpretedResult) -> Html {
    let icon = match result.finding {
        Finding::Negative => "fa-solid fa-circle-check",
        Finding::Positive => "fa-solid fa-triangle-exclamation",
        Finding::Undetermined => "fa-solid fa-circle-question",
    };
    let confidence = result.confidence.clamp(0.0, 1.0) * 100.0;

    html! {
        <div class={classes!("detailed-results", result.finding.as_ref())}>
            <h3>{"Interpretation"}</h3>
            <div class="result-item">
                <div class="result-label">{"Predicted class"}</div>
                <div class="result-value"><strong>{ &result.label }</strong></div>
            </div>
            <div class="confidence-meter">
                <div class="meter-label">{"Confidence:"}</div>
                <div class="meter">
                    <div class="meter-fill" style={format!("width: {}%", confidence)}></div>
                </div>
                <div class="meter-value">{ format!("{:.3}", result.confidence) }</div>
            </div>
            <div class={classes!("finding-message", result.finding.as_ref())}>
                <i class={icon}></i>
                <p style="white-space: pre-wrap;">{ &result.message }</p>
            </div>
            {
                if let Some(warning) = &result.warning {
                    html! {
                        <div class="warning-message">
                            <i class="fa-solid fa-circle-info"></i>
                            <p>{ warning }</p>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn render_explanation(explanation: Option<&str>) -> Html {
    match explanation {
        Some(text) => html! {
            <div class="explanation">
                <h3><i class="fa-solid fa-comment-medical"></i>{" Visual explanation"}</h3>
                <p style="white-space: pre-wrap;">{ text }</p>
            </div>
        },
        None => html! {},
    }
}
