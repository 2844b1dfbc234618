use gloo_file::File as GlooFile;
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::FileList;
use yew::prelude::*;

pub const ACCEPTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/bmp"];
pub const ACCEPT_ATTRIBUTE: &str = ".jpg,.jpeg,.png,.webp,.bmp";

// Debounce function to limit button events
pub fn debounce<F>(duration: u32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));

    Callback::from(move |_| {
        let mut timeout_ref = timeout.borrow_mut();
        if let Some(old_timeout) = timeout_ref.take() {
            old_timeout.cancel();
        }

        let inner_callback = callback.clone();
        *timeout_ref = Some(Timeout::new(duration, move || inner_callback()));
    })
}

pub fn is_accepted_type(mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime_type)
}

/// First accepted image in the list, or the name of the first rejected file.
pub fn first_image_file(file_list: &FileList) -> Result<Option<GlooFile>, String> {
    let Some(file) = file_list.item(0) else {
        return Ok(None);
    };
    if is_accepted_type(&file.type_()) {
        Ok(Some(GlooFile::from(file)))
    } else {
        Err(file.name())
    }
}

pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}
