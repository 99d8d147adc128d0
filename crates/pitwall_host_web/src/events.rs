//! Cross-tab `storage` event subscription.

use pitwall_host::{StorageEvents, StorageListener, Subscription};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use pitwall_host::StorageChange;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

/// Listens for `storage` events, which browsers deliver only to tabs other than the writer.
///
/// Native builds never fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowStorageEvents;

impl StorageEvents for WindowStorageEvents {
    fn subscribe(&self, listener: StorageListener) -> Subscription {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                return Subscription::noop();
            };
            let callback = Closure::<dyn FnMut(web_sys::StorageEvent)>::wrap(Box::new(
                move |event: web_sys::StorageEvent| {
                    // `key` is null when another tab called `localStorage.clear()`.
                    let Some(key) = event.key() else {
                        return;
                    };
                    listener(&StorageChange {
                        key,
                        new_value: event.new_value(),
                    });
                },
            ));
            if let Err(err) =
                window.add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
            {
                leptos::logging::warn!(
                    "storage listener registration failed: {}",
                    crate::interop::js_error_to_string(err)
                );
                return Subscription::noop();
            }
            Subscription::new(Rc::new(move || {
                let _ = window.remove_event_listener_with_callback(
                    "storage",
                    callback.as_ref().unchecked_ref(),
                );
            }))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = listener;
            Subscription::noop()
        }
    }
}
