//! Same-tab session change channel over a window `CustomEvent`.
//!
//! Dispatching on `window` lets any script in the page observe actor/theme changes, not only
//! listeners registered through this crate.

use pitwall_contract::SessionChange;
#[cfg(not(target_arch = "wasm32"))]
use pitwall_host::LocalChangeChannel;
use pitwall_host::{ChangeChannel, ChangeListener, Subscription};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

/// Event name carrying a serialized [`SessionChange`] in `detail`.
pub const SESSION_CHANGE_EVENT: &str = "pitwall:session-change";

/// Publishes session changes as `pitwall:session-change` events on `window`.
///
/// Native builds fall back to an in-process [`LocalChangeChannel`].
#[derive(Clone, Default)]
pub struct WindowChangeChannel {
    #[cfg(not(target_arch = "wasm32"))]
    fallback: LocalChangeChannel,
}

impl ChangeChannel for WindowChangeChannel {
    fn publish(&self, change: &SessionChange) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Err(err) = dispatch(change) {
                leptos::logging::warn!("session change broadcast failed: {err}");
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.fallback.publish(change);
        }
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                return Subscription::noop();
            };
            let callback =
                Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event: web_sys::Event| {
                    let Some(event) = event.dyn_ref::<web_sys::CustomEvent>() else {
                        return;
                    };
                    match serde_wasm_bindgen::from_value::<SessionChange>(event.detail()) {
                        Ok(change) => listener(&change),
                        Err(err) => {
                            leptos::logging::warn!("ignoring malformed session change: {err}")
                        }
                    }
                }));
            if let Err(err) = window.add_event_listener_with_callback(
                SESSION_CHANGE_EVENT,
                callback.as_ref().unchecked_ref(),
            ) {
                leptos::logging::warn!(
                    "session change listener registration failed: {}",
                    crate::interop::js_error_to_string(err)
                );
                return Subscription::noop();
            }
            Subscription::new(Rc::new(move || {
                let _ = window.remove_event_listener_with_callback(
                    SESSION_CHANGE_EVENT,
                    callback.as_ref().unchecked_ref(),
                );
            }))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.fallback.subscribe(listener)
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn dispatch(change: &SessionChange) -> Result<(), String> {
    use crate::interop::js_error_to_string;

    let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
    let detail = serde_wasm_bindgen::to_value(change).map_err(|e| e.to_string())?;
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    let event = web_sys::CustomEvent::new_with_event_init_dict(SESSION_CHANGE_EVENT, &init)
        .map_err(js_error_to_string)?;
    window.dispatch_event(&event).map_err(js_error_to_string)?;
    Ok(())
}
