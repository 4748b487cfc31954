// labichat-wasm — WebAssembly bindings for the browser chat log

pub mod storage;

use crate::storage::LocalStorage;
use labichat_core::store::DEFAULT_SLOT;
use labichat_core::{LabiError, MemoryStorage, Message, ThreadStore};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // A second call finds a subscriber already installed
    let _ = tracing_wasm::try_set_as_global_default();
}

fn to_js_error(err: LabiError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| js_sys::Error::new(&e.to_string()).into())
}

/// Chat room store for JS callers.
///
/// Values crossing the boundary use the same shapes the rooms are stored
/// in: `{ id, from, to, content, timestamp, signature? }` for messages.
#[wasm_bindgen]
pub struct ChatStore {
    inner: ThreadStore,
}

#[wasm_bindgen]
impl ChatStore {
    /// Store backed by localStorage under the default key. Throws where
    /// localStorage is missing (workers, storage disabled).
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ChatStore, JsValue> {
        Self::with_key(DEFAULT_SLOT.to_string())
    }

    /// Store backed by localStorage under `key`
    #[wasm_bindgen(js_name = withKey)]
    pub fn with_key(key: String) -> Result<ChatStore, JsValue> {
        init_logging();
        if !LocalStorage::is_available() {
            return Err(js_sys::Error::new("localStorage is not available in this context").into());
        }
        Ok(Self {
            inner: ThreadStore::with_slot(Arc::new(LocalStorage::new()), key),
        })
    }

    /// Store that lives only as long as this object
    #[wasm_bindgen(js_name = inMemory)]
    pub fn in_memory() -> Self {
        init_logging();
        Self {
            inner: ThreadStore::new(Arc::new(MemoryStorage::new())),
        }
    }

    #[wasm_bindgen(js_name = addMessage)]
    pub fn add_message(&self, message: JsValue) -> Result<(), JsValue> {
        let message: Message = serde_wasm_bindgen::from_value(message)
            .map_err(|e| js_sys::Error::new(&format!("Invalid message: {}", e)))?;
        self.inner.add_message(message).map_err(to_js_error)
    }

    /// Compose a message from raw input, store it and hand it back
    #[wasm_bindgen(js_name = sendMessage)]
    pub fn send_message(&self, from: String, to: String, content: String) -> Result<JsValue, JsValue> {
        let message = Message::compose(from, to, &content).map_err(to_js_error)?;
        self.inner
            .add_message(message.clone())
            .map_err(to_js_error)?;
        to_js(&message)
    }

    #[wasm_bindgen(js_name = getMessages)]
    pub fn get_messages(&self, user1: String, user2: String) -> Result<JsValue, JsValue> {
        to_js(&self.inner.get_messages(&user1, &user2))
    }

    #[wasm_bindgen(js_name = getChatRooms)]
    pub fn get_chat_rooms(&self, user_address: String) -> Result<JsValue, JsValue> {
        to_js(&self.inner.get_chat_rooms(&user_address))
    }

    #[wasm_bindgen(js_name = getRecentChats)]
    pub fn get_recent_chats(&self, user_address: String) -> Result<JsValue, JsValue> {
        to_js(&self.inner.get_recent_chats(&user_address))
    }

    #[wasm_bindgen(js_name = clearAllChats)]
    pub fn clear_all_chats(&self) -> Result<(), JsValue> {
        self.inner.clear_all_chats().map_err(to_js_error)
    }

    /// `{ rooms, messages }`, or throws if the stored data is unreadable
    pub fn verify(&self) -> Result<JsValue, JsValue> {
        let stats = self.inner.verify().map_err(to_js_error)?;
        to_js(&WasmStoreStats {
            rooms: stats.rooms,
            messages: stats.messages,
        })
    }
}

#[derive(Serialize)]
struct WasmStoreStats {
    rooms: usize,
    messages: usize,
}
