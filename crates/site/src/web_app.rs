use std::rc::Rc;

use leptos::*;
use leptos_meta::*;
use pitwall_host::{KeyValueStore, SystemClock, ThemeCatalog};
use pitwall_host_web::{
    TimeoutSleeper, WebKeyValueStore, WindowChangeChannel, WindowStorageEvents,
};
use pitwall_shell::{Interpreter, InterpreterConfig, ProviderSet, SessionPorts};
use pitwall_terminal::TerminalApp;

/// Store key holding an optional JSON [`InterpreterConfig`] override.
const CONFIG_KEY: &str = "pitwall.config";

/// Reads the config override, falling back to defaults when absent or malformed.
fn load_config(store: &dyn KeyValueStore) -> InterpreterConfig {
    match store.get(CONFIG_KEY) {
        Ok(Some(raw)) => InterpreterConfig::from_json(&raw).unwrap_or_else(|err| {
            logging::warn!("ignoring malformed `{CONFIG_KEY}`: {err}");
            InterpreterConfig::default()
        }),
        Ok(None) => InterpreterConfig::default(),
        Err(err) => {
            logging::warn!("config load failed, using defaults: {err}");
            InterpreterConfig::default()
        }
    }
}

/// Interpreter wired to `localStorage`, window events and `setTimeout`.
///
/// Data providers are supplied by the embedding page; every query fails until they are.
pub fn browser_interpreter(providers: ProviderSet) -> Interpreter {
    let store = Rc::new(WebKeyValueStore);
    let config = load_config(store.as_ref());
    Interpreter::new(
        config,
        ThemeCatalog::builtin(),
        providers,
        SessionPorts {
            store,
            storage_events: Rc::new(WindowStorageEvents),
            changes: Rc::new(WindowChangeChannel::default()),
            clock: Rc::new(SystemClock),
        },
        Rc::new(TimeoutSleeper),
    )
}

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();
    let interpreter = browser_interpreter(ProviderSet::unconfigured());

    view! {
        <Title text="Pitwall" />
        <Meta name="description" content="Slash-command terminal for Formula 1 data." />

        <main class="site-root">
            <TerminalApp interpreter=interpreter />
        </main>
    }
}

#[cfg(test)]
mod tests {
    use pitwall_host::MemoryKeyValueStore;
    use pitwall_shell::PlainTextPolicy;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn config_override_is_read_from_the_store() {
        let store = MemoryKeyValueStore::default();
        store
            .set(CONFIG_KEY, r#"{"plain_text": "help", "provider_timeout_ms": null}"#)
            .expect("set");
        let config = load_config(&store);
        assert_eq!(config.plain_text, PlainTextPolicy::Help);
        assert_eq!(config.provider_timeout(), None);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let store = MemoryKeyValueStore::default();
        store.set(CONFIG_KEY, "{oops").expect("set");
        assert_eq!(load_config(&store), InterpreterConfig::default());
        assert_eq!(
            load_config(&MemoryKeyValueStore::default()),
            InterpreterConfig::default()
        );
    }
}
