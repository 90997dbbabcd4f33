//! Browser bindings: object URLs and file extraction from DOM events.

use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Event, FileList, HtmlInputElement, Url};

use crate::error::PreviewError;
use crate::model::LocalFile;
use crate::preview::ObjectUrlBackend;

/// `URL.createObjectURL` / `URL.revokeObjectURL`.
#[derive(Debug, Default)]
pub struct BrowserObjectUrls;

impl ObjectUrlBackend for BrowserObjectUrls {
    fn create(&mut self, file: &LocalFile) -> Result<String, PreviewError> {
        Url::create_object_url_with_blob(&file.payload)
            .map_err(|e| PreviewError::CreateFailed(format!("{:?}", e)))
    }

    fn revoke(&mut self, url: &str) {
        if let Err(e) = Url::revoke_object_url(url) {
            log::warn!("revokeObjectURL({}) failed: {:?}", url, e);
        }
    }
}

fn collect(list: Option<FileList>) -> Vec<LocalFile> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(LocalFile::from_web)
        .collect()
}

/// Files from a file input `change` event. Clears the input so picking the
/// same file again fires another event.
pub fn files_from_input_event(event: &Event) -> Vec<LocalFile> {
    let Some(input) = event
        .target()
        .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
    else {
        log::warn!("change event did not come from a file input");
        return Vec::new();
    };
    let files = collect(input.files());
    input.set_value("");
    files
}

/// Files from a `drop` event. Prevents the browser from opening the file.
pub fn files_from_drop_event(event: &DragEvent) -> Vec<LocalFile> {
    event.prevent_default();
    collect(event.data_transfer().and_then(|transfer| transfer.files()))
}
