//! `setTimeout`-backed sleeper.

use std::time::Duration;

use pitwall_host::{SleepFuture, Sleeper};

/// Sleeper driven by `window.setTimeout`; native builds park a helper thread instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutSleeper;

impl Sleeper for TimeoutSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        #[cfg(target_arch = "wasm32")]
        {
            let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                let scheduled = web_sys::window().map(|window| {
                    window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                });
                if !matches!(scheduled, Some(Ok(_))) {
                    leptos::logging::warn!("setTimeout unavailable; timer will not fire");
                }
            });
            Box::pin(async move {
                let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            pitwall_host::ThreadSleeper.sleep(duration)
        }
    }
}
