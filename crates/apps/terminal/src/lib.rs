//! Pitwall terminal UI: scrollback, prompt, completion, command recall, and a live status bar.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{
    cell::Cell,
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use futures::StreamExt;
use leptos::ev::KeyboardEvent;
use leptos::*;
use pitwall_contract::{CompletionItem, HistoryEntry, SessionChange, Severity};
use pitwall_shell::{
    format_timestamp, format_uptime, ticks, Interpreter, SubmitRejected, TICK_PERIOD,
};

const MAX_RECALL_LINES: usize = 100;
static NEXT_TERMINAL_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

/// Direction of a recall keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recall {
    Older,
    Newer,
}

/// Entries still on screen after `clear`, newest first.
fn visible_entries(entries: &[HistoryEntry], hidden: usize) -> Vec<(usize, HistoryEntry)> {
    entries
        .iter()
        .cloned()
        .enumerate()
        .skip(hidden)
        .rev()
        .collect()
}

fn entry_class(severity: Severity) -> &'static str {
    if severity.is_error() {
        "terminal-line terminal-line-error"
    } else {
        "terminal-line"
    }
}

fn entry_meta(entry: &HistoryEntry) -> String {
    format!("[{}] {}> {}", entry.timestamp, entry.actor, entry.command)
}

fn is_clear(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("clear")
}

/// Moves the recall cursor; `None` means the fresh input line below the newest entry.
fn recall_index(len: usize, cursor: Option<usize>, direction: Recall) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match (cursor, direction) {
        (None, Recall::Older) => Some(len - 1),
        (Some(index), Recall::Older) => Some(index.saturating_sub(1)),
        (Some(index), Recall::Newer) if index + 1 < len => Some(index + 1),
        (Some(_), Recall::Newer) | (None, Recall::Newer) => None,
    }
}

fn remember(lines: &mut Vec<String>, line: &str) {
    let line = line.trim();
    if line.is_empty() || lines.last().map(String::as_str) == Some(line) {
        return;
    }
    lines.push(line.to_string());
    if lines.len() > MAX_RECALL_LINES {
        let overflow = lines.len() - MAX_RECALL_LINES;
        lines.drain(0..overflow);
    }
}

/// Completion applies only while the first token is being typed.
fn completion_target(input: &str) -> Option<&str> {
    let trimmed = input.trim_start();
    (!trimmed.contains(char::is_whitespace)).then_some(trimmed)
}

#[component]
/// Terminal window bound to one interpreter.
///
/// Output is listed newest first. `clear` hides what is on screen without touching the
/// interpreter's history.
pub fn TerminalApp(
    /// Interpreter owning this tab's session and history.
    interpreter: Interpreter,
) -> impl IntoView {
    let input_id = format!(
        "pitwall-input-{}",
        NEXT_TERMINAL_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
    );
    let session = interpreter.session().clone();
    let snapshot = session.snapshot();
    let clock = interpreter.clock();

    let entries = create_rw_signal(interpreter.history().entries());
    let hidden = create_rw_signal(0usize);
    let input = create_rw_signal(String::new());
    let suggestions = create_rw_signal(Vec::<CompletionItem>::new());
    let recall_lines = create_rw_signal(Vec::<String>::new());
    let recall_cursor = create_rw_signal::<Option<usize>>(None);
    let processing = create_rw_signal(snapshot.processing);
    let actor = create_rw_signal(snapshot.actor);
    let theme = create_rw_signal(snapshot.theme);
    let session_start_ms = snapshot.session_start_ms;
    let now_ms = create_rw_signal(clock.now_ms());
    let alive = Rc::new(Cell::new(true));

    let session_changes = session.subscribe(Rc::new(move |change: &SessionChange| match change {
        SessionChange::Actor(value) => actor.set(value.clone()),
        SessionChange::Theme(value) => theme.set(value.clone()),
    }));
    on_cleanup({
        let alive = alive.clone();
        move || {
            alive.set(false);
            drop(session_changes);
        }
    });

    spawn_local({
        let alive = alive.clone();
        let mut tick_stream = Box::pin(ticks(interpreter.sleeper(), TICK_PERIOD));
        async move {
            while tick_stream.next().await.is_some() {
                if !alive.get() {
                    break;
                }
                now_ms.set(clock.now_ms());
            }
        }
    });

    let submit_line: Rc<dyn Fn(String)> = Rc::new({
        let interpreter = interpreter.clone();
        let alive = alive.clone();
        move |line: String| {
            if is_clear(&line) {
                hidden.set(entries.with_untracked(Vec::len));
                input.set(String::new());
                suggestions.set(Vec::new());
                return;
            }
            let pending = match interpreter.submit(&line) {
                Ok(pending) => pending,
                Err(SubmitRejected::Busy) => return,
                Err(SubmitRejected::Empty) => {
                    input.set(String::new());
                    return;
                }
            };
            recall_lines.update(|lines| remember(lines, &line));
            recall_cursor.set(None);
            suggestions.set(Vec::new());
            input.set(String::new());
            processing.set(interpreter.session().is_processing());

            let interpreter = interpreter.clone();
            let alive = alive.clone();
            spawn_local(async move {
                let report = pending.await;
                if !alive.get() {
                    return;
                }
                if report.entry.severity.is_error() {
                    logging::log!("{} failed: {}", report.entry.command, report.entry.output);
                }
                entries.set(interpreter.history().entries());
                processing.set(interpreter.session().is_processing());
            });
        }
    });

    let navigate_recall = move |direction: Recall| {
        let lines = recall_lines.get_untracked();
        let next = recall_index(lines.len(), recall_cursor.get_untracked(), direction);
        recall_cursor.set(next);
        input.set(next.and_then(|index| lines.get(index).cloned()).unwrap_or_default());
    };

    let trigger_completion = {
        let interpreter = interpreter.clone();
        move || {
            let current = input.get_untracked();
            let Some(partial) = completion_target(&current) else {
                return;
            };
            let items = interpreter.suggest(partial);
            if let [only] = items.as_slice() {
                input.set(format!("{} ", only.value));
                suggestions.set(Vec::new());
            } else {
                suggestions.set(items);
            }
        }
    };

    let prefix = interpreter.config().command_prefix;
    let submit_help = submit_line.clone();
    let submit_on_enter = submit_line.clone();
    let submit_on_click = submit_line;

    view! {
        <div class=move || format!("app-shell pitwall-terminal theme-{}", theme.get())>
            <div class="terminal-toolbar">
                <button type="button" class="app-action" on:click=move |_| submit_help(format!("{prefix}help"))>"Help"</button>
                <button type="button" class="app-action" on:click=move |_| hidden.set(entries.with_untracked(Vec::len))>"Clear"</button>
            </div>

            <div class="terminal-input-row">
                <label class="terminal-prompt" for=input_id.clone()>
                    {move || format!("{}>", actor.get())}
                </label>
                <input
                    id=input_id.clone()
                    class="terminal-input app-field"
                    type="text"
                    prop:value=move || input.get()
                    disabled=move || processing.get()
                    on:input=move |ev| input.set(event_target_value(&ev))
                    on:keydown=move |ev: KeyboardEvent| {
                        match ev.key().as_str() {
                            "Enter" => submit_on_enter(input.get_untracked()),
                            "ArrowUp" => {
                                ev.prevent_default();
                                navigate_recall(Recall::Older);
                            }
                            "ArrowDown" => {
                                ev.prevent_default();
                                navigate_recall(Recall::Newer);
                            }
                            "Tab" => {
                                ev.prevent_default();
                                trigger_completion();
                            }
                            "Escape" => suggestions.set(Vec::new()),
                            "l" | "L" if ev.ctrl_key() => {
                                ev.prevent_default();
                                hidden.set(entries.with_untracked(Vec::len));
                            }
                            _ => {}
                        }
                    }
                    placeholder=format!("Try: {prefix}driver hamilton")
                    autocomplete="off"
                    spellcheck="false"
                />
                <button
                    type="button"
                    class="terminal-run app-action"
                    disabled=move || processing.get()
                    on:click=move |_| submit_on_click(input.get_untracked())
                >
                    "Run"
                </button>
            </div>

            <Show when=move || !suggestions.get().is_empty() fallback=|| ()>
                <div class="terminal-completions" role="listbox" aria-label="Completions">
                    <For each=move || suggestions.get() key=|item| item.value.clone() let:item>
                        <button
                            type="button"
                            class="terminal-completion"
                            title=item.detail.clone().unwrap_or_default()
                            on:click=move |_| {
                                input.set(format!("{} ", item.value));
                                suggestions.set(Vec::new());
                            }
                        >
                            {item.label}
                        </button>
                    </For>
                </div>
            </Show>

            <div class="terminal-screen" role="log" aria-live="polite">
                <For
                    each=move || visible_entries(&entries.get(), hidden.get())
                    key=|(index, _)| *index
                    let:row
                >
                    <div class=entry_class(row.1.severity)>
                        <div class="terminal-line-meta">{entry_meta(&row.1)}</div>
                        <pre class="terminal-line-output">{row.1.output}</pre>
                    </div>
                </For>
            </div>

            <div class="app-statusbar">
                <span>{move || if processing.get() { "Fetching" } else { "Ready" }}</span>
                <span>
                    {move || format!(
                        "Uptime {}",
                        format_uptime(std::time::Duration::from_millis(
                            now_ms.get().saturating_sub(session_start_ms)
                        ))
                    )}
                </span>
                <span>{move || format!("{} UTC", format_timestamp(now_ms.get()))}</span>
                <span>{move || format!("{} entrie(s)", entries.get().len())}</span>
            </div>
        </div>
    }
}
