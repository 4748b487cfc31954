// Browser storage backend over window.localStorage
//
// The handle is looked up on every call, so the backend carries no JS
// values and stays Send + Sync for the core trait.

use labichat_core::StorageBackend;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    /// Whether this context exposes localStorage at all (workers do not)
    pub fn is_available() -> bool {
        Self::handle().is_ok()
    }

    fn handle() -> Result<web_sys::Storage, String> {
        web_sys::window()
            .ok_or_else(|| "no window object".to_string())?
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| "localStorage is disabled".to_string())
    }
}

fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

impl StorageBackend for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Self::handle()?.get_item(key).map_err(js_error)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), String> {
        Self::handle()?.set_item(key, value).map_err(|e| {
            let message = js_error(e);
            tracing::warn!("localStorage write of {} failed: {}", key, message);
            message
        })
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        Self::handle()?.remove_item(key).map_err(js_error)
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }
}
