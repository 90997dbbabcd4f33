//! Browser transport (WASM only).
//!
//! Snapshots are fetched with `fetch`. Commits go through `XMLHttpRequest`,
//! the only browser API that reports upload progress.

use gloo_net::http::Request;
use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, ProgressEvent, XmlHttpRequest};

use super::{CommitOutcome, ProgressFn, SlotApi, decode_commit, decode_snapshot, parse_body};
use crate::commit::UploadPart;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::model::SlotUrlMap;
use crate::registry::EntityRef;

fn js_error(context: &str, value: JsValue) -> ApiError {
    ApiError::Network(format!("{}: {:?}", context, value))
}

/// HTTP client for the slot image endpoints.
pub struct HttpSlotApi {
    config: ApiConfig,
}

impl HttpSlotApi {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// POST a form and wait for the full response.
    async fn send_form(
        url: &str,
        form: &FormData,
        progress: ProgressFn,
    ) -> Result<serde_json::Value, ApiError> {
        let xhr = XmlHttpRequest::new().map_err(|e| js_error("XMLHttpRequest", e))?;
        xhr.open_with_async("POST", url, true)
            .map_err(|e| js_error("XMLHttpRequest.open", e))?;

        let on_progress = Closure::wrap(Box::new(move |event: ProgressEvent| {
            if event.length_computable() {
                progress(event.loaded() as u64, event.total() as u64);
            }
        }) as Box<dyn FnMut(ProgressEvent)>);
        xhr.upload()
            .map_err(|e| js_error("XMLHttpRequest.upload", e))?
            .set_onprogress(Some(on_progress.as_ref().unchecked_ref()));

        let done = Promise::new(&mut |resolve, reject| {
            xhr.set_onload(Some(&resolve));
            xhr.set_onerror(Some(&reject));
            xhr.set_onabort(Some(&reject));
        });

        // No explicit Content-Type: the browser adds the multipart boundary
        xhr.send_with_opt_form_data(Some(form))
            .map_err(|e| js_error("XMLHttpRequest.send", e))?;
        JsFuture::from(done)
            .await
            .map_err(|e| js_error("Upload request failed", e))?;
        drop(on_progress);

        let status = xhr
            .status()
            .map_err(|e| js_error("XMLHttpRequest.status", e))?;
        let text = xhr
            .response_text()
            .map_err(|e| js_error("XMLHttpRequest.responseText", e))?
            .unwrap_or_default();
        parse_body(status, text)
    }
}

impl SlotApi for HttpSlotApi {
    async fn load_snapshot(&self, entity: &EntityRef) -> Result<SlotUrlMap, ApiError> {
        let url = self.config.images_url(entity);
        log::debug!("GET {}", url);

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body = parse_body(status, text)?;
        decode_snapshot(&entity.class.registry(), &body)
    }

    async fn commit_batch(
        &self,
        entity: &EntityRef,
        parts: &[UploadPart],
        progress: ProgressFn,
    ) -> Result<CommitOutcome, ApiError> {
        let url = self.config.images_url(entity);
        log::debug!("POST {} ({} parts)", url, parts.len());

        let form = FormData::new().map_err(|e| js_error("FormData", e))?;
        for part in parts {
            form.append_with_blob_and_filename(
                part.slot.as_str(),
                &part.file.payload,
                &part.file.name,
            )
            .map_err(|e| js_error("FormData.append", e))?;
        }

        let body = Self::send_form(&url, &form, progress).await?;
        decode_commit(&entity.class.registry(), &body)
    }
}
