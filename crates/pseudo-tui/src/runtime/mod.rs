//! TUI runtime - owns the terminal, runs the event loop, executes effects.
//!
//! This is the Elm runtime boundary: all side effects happen here. The
//! reducer produces effects; this module executes them.
//!
//! Background requests use the inbox pattern: handlers return a `UiEvent`,
//! the runtime sends it to `inbox_tx`, and the loop drains `inbox_rx` each
//! frame.

mod handlers;
mod inbox;

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use pseudo_core::api::ApiClient;
use pseudo_core::config::Config;
use tokio_util::sync::CancellationToken;

use crate::common::{Clipboard, TaskCompleted, TaskId, TaskKind, TaskMeta, TaskStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::TerminalSession;
use crate::{render, update};

/// Frame budget while something is moving (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle. Longer timeout reduces CPU usage.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
pub struct TuiRuntime {
    terminal: TerminalSession,
    pub state: AppState,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Enters the alternate screen and builds the initial state.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(config: Config, client: ApiClient) -> Result<Self> {
        let terminal = TerminalSession::enter()?;
        let (inbox_tx, inbox_rx) = inbox::channel();
        let now = Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(config, client),
            inbox_tx,
            inbox_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Starts loading a stored chat before the first frame.
    pub fn open_chat(&mut self, id: String) {
        let effects = update::startup(&mut self.state, id);
        self.execute_effects(effects);
    }

    /// Runs the main event loop until the user quits.
    ///
    /// Must be called from inside a multi-threaded tokio runtime.
    ///
    /// # Errors
    /// Returns an error if reading terminal input or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        self.terminal.restore()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.tui.should_quit {
            let mut events = self.collect_events()?;

            // Frame goes first so layout and scroll deltas apply before input
            let size = self.terminal.terminal().size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick triggers render; this caps the frame rate
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                let state = &self.state;
                self.terminal
                    .terminal()
                    .draw(|frame| render::render(state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if self.state.tui.tasks.is_any_running() || recent_terminal_activity {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick unless there is already work queued
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.execute_effects(effects);
    }

    /// Spawns a task with the uniform `TaskStarted`/`TaskCompleted` lifecycle.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, meta: TaskMeta, cancelable: bool, f: F)
    where
        F: FnOnce(Option<CancellationToken>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let cancel = cancelable.then(CancellationToken::new);
        let started = TaskStarted {
            id,
            cancel: cancel.clone(),
            meta,
        };
        let _ = tx.send(UiEvent::TaskStarted { kind, started });
        tokio::spawn(async move {
            let inner = f(cancel).await;
            let completed = TaskCompleted {
                id,
                result: Box::new(inner),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        let client = self.state.tui.client.clone();
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }
            UiEffect::CancelTask { kind, token } => {
                tracing::debug!(?kind, "cancelling task");
                if let Some(cancel) = token {
                    cancel.cancel();
                }
            }
            UiEffect::SendChat { task, request } => {
                let Some(task) = task else {
                    return;
                };
                let meta = TaskMeta::Chat {
                    model: request.model.clone(),
                };
                self.spawn_task(TaskKind::Chat, task, meta, true, move |cancel| {
                    handlers::send_chat(client, request, cancel)
                });
            }
            UiEffect::LoadChatList { task } => {
                let Some(task) = task else {
                    return;
                };
                self.spawn_task(TaskKind::ChatList, task, TaskMeta::None, false, move |_| {
                    handlers::chat_list_load(client)
                });
            }
            UiEffect::LoadChat { task, id } => {
                let Some(task) = task else {
                    return;
                };
                self.spawn_task(TaskKind::ChatLoad, task, TaskMeta::None, false, move |_| {
                    handlers::chat_load(client, id)
                });
            }
            UiEffect::DeleteChat { task, id } => {
                let Some(task) = task else {
                    return;
                };
                self.spawn_task(TaskKind::ChatDelete, task, TaskMeta::None, false, move |_| {
                    handlers::chat_delete(client, id)
                });
            }
            UiEffect::LoadModels { task, mode } => {
                let Some(task) = task else {
                    return;
                };
                self.spawn_task(TaskKind::Models, task, TaskMeta::None, false, move |_| {
                    handlers::models_load(client, mode)
                });
            }
            UiEffect::PersistModel { model } => {
                // The model is already applied in state; only the file write can fail here
                if let Err(err) = Config::save_model(&model) {
                    tracing::warn!("failed to save default model: {err:#}");
                }
            }
            UiEffect::CopyToClipboard { text } => {
                let event = match Clipboard::copy(&text) {
                    Ok(()) => UiEvent::ClipboardCopied,
                    Err(err) => UiEvent::ClipboardFailed {
                        error: err.to_string(),
                    },
                };
                self.dispatch_event(event);
            }
            UiEffect::OpenBrowser { url } => {
                if let Err(err) = open::that(&url) {
                    tracing::warn!(%url, "failed to open media: {err}");
                }
            }
            UiEffect::SaveMedia { task, media, dir } => {
                let Some(task) = task else {
                    return;
                };
                self.spawn_task(TaskKind::MediaSave, task, TaskMeta::None, false, move |_| {
                    handlers::media_save(client, media, dir)
                });
            }
        }
    }
}
