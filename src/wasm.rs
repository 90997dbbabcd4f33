//! JavaScript facade for host pages.

use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{DragEvent, Event};

use crate::api::HttpSlotApi;
use crate::browser::{BrowserObjectUrls, files_from_drop_event, files_from_input_event};
use crate::config::UploaderConfig;
use crate::constants::FILE_INPUT_ACCEPT;
use crate::drop_target::InputSource;
use crate::logging;
use crate::model::LocalFile;
use crate::preview::ObjectUrlBackend;
use crate::registry::{EntityClass, EntityRef};
use crate::state::{CommitResolution, LoadResolution, SlotSession};
use crate::uploader::{BackendFactory, SlotUploader};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Slot uploader bound to the page's `fetch` and object URLs.
#[wasm_bindgen]
pub struct WebSlotUploader {
    inner: SlotUploader<HttpSlotApi>,
}

#[wasm_bindgen]
impl WebSlotUploader {
    /// Create an uploader from the configuration in `localStorage`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebSlotUploader {
        let config = UploaderConfig::load_or_default();
        if logging::init(config.log_level).is_err() {
            log::debug!("Logger already installed");
        }

        let api = HttpSlotApi::new(config.api.clone());
        let backends: BackendFactory =
            Rc::new(|| -> Box<dyn ObjectUrlBackend> { Box::new(BrowserObjectUrls) });
        log::info!("Slot uploader ready ({})", config.api.base_url);
        WebSlotUploader {
            inner: SlotUploader::new(api, config, backends),
        }
    }

    /// Value for the `accept` attribute of slot file inputs.
    #[wasm_bindgen(js_name = fileInputAccept)]
    pub fn file_input_accept() -> String {
        FILE_INPUT_ACCEPT.to_string()
    }

    /// Mount an entity. The previous entity is torn down before this returns;
    /// the promise resolves to `true` once the snapshot is applied.
    pub fn mount(&self, class: &str, id: &str) -> Result<Promise, JsValue> {
        let class = EntityClass::from_id(class)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown entity class: {}", class)))?;
        let ticket = self.inner.switch_entity(EntityRef::new(class, id));
        let uploader = self.inner.clone();
        Ok(future_to_promise(async move {
            let resolution = uploader.load(ticket).await;
            Ok(JsValue::from_bool(resolution != LoadResolution::Stale))
        }))
    }

    /// Retry the snapshot load of the mounted entity.
    pub fn reload(&self) -> Promise {
        let uploader = self.inner.clone();
        future_to_promise(async move {
            let applied = matches!(uploader.reload().await, Some(r) if r != LoadResolution::Stale);
            Ok(JsValue::from_bool(applied))
        })
    }

    /// Tear down the mounted entity.
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// `change` event of a slot's file input.
    /// Returns `true` if the file was staged.
    #[wasm_bindgen(js_name = onPick)]
    pub fn on_pick(&self, slot: &str, event: &Event) -> bool {
        let files = files_from_input_event(event);
        self.receive(slot, InputSource::Picker, files)
    }

    /// `drop` event on a slot.
    #[wasm_bindgen(js_name = onDrop)]
    pub fn on_drop(&self, slot: &str, event: &DragEvent) -> bool {
        let files = files_from_drop_event(event);
        self.receive(slot, InputSource::Drop, files)
    }

    /// `dragenter` / `dragover` on a slot.
    #[wasm_bindgen(js_name = onDragEnter)]
    pub fn on_drag_enter(&self, slot: &str, event: &DragEvent) {
        event.prevent_default();
        self.inner.with_session(|session| {
            if let Some(slot) = session.resolve(slot) {
                session.drag_enter(slot);
            }
        });
    }

    /// `dragleave` on a slot.
    #[wasm_bindgen(js_name = onDragLeave)]
    pub fn on_drag_leave(&self, slot: &str) {
        self.inner.with_session(|session| {
            if let Some(slot) = session.resolve(slot) {
                session.drag_leave(slot);
            }
        });
    }

    /// Drop the staged file of one slot.
    pub fn cancel(&self, slot: &str) {
        self.inner.with_session(|session| {
            if let Some(slot) = session.resolve(slot) {
                session.cancel(slot);
            }
        });
    }

    #[wasm_bindgen(js_name = cancelAll)]
    pub fn cancel_all(&self) {
        self.inner.with_session(SlotSession::cancel_all);
    }

    /// Commit every staged slot. Resolves to `true` if a response was applied.
    pub fn commit(&self) -> Promise {
        let uploader = self.inner.clone();
        future_to_promise(async move {
            let resolution = uploader.commit().await;
            let applied = matches!(resolution, Some(r) if r != CommitResolution::Stale);
            Ok(JsValue::from_bool(applied))
        })
    }

    /// Render state as JSON, or `null` when nothing is mounted.
    #[wasm_bindgen(js_name = viewJson)]
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.view()).map_err(to_js)
    }

    /// Drain pending notices as a JSON array.
    #[wasm_bindgen(js_name = noticesJson)]
    pub fn notices_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.take_notices()).map_err(to_js)
    }

    /// Persist the active configuration to `localStorage`.
    #[wasm_bindgen(js_name = saveConfig)]
    pub fn save_config(&self) -> Result<(), JsValue> {
        self.inner.config().save_to_local_storage().map_err(to_js)
    }
}

impl Default for WebSlotUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSlotUploader {
    fn receive(&self, slot: &str, source: InputSource, files: Vec<LocalFile>) -> bool {
        self.inner
            .with_session(|session| session.receive_code(slot, source, files))
            .flatten()
            .is_some()
    }
}
