//! Event bus for planrev.
//!
//! Terminal input is normalised into a single `AppEvent` enum and sent over a
//! tokio unbounded MPSC channel. The main loop is the only receiver and the
//! only code that mutates application state, so every handler runs to
//! completion before the next event is looked at.
//!
//! There are no render or tick timers: the main loop redraws after each event
//! it handles, and a separate heartbeat in `main.rs` polls the SIGTERM flag.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use tokio::sync::mpsc;

/// All events the application can receive from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid
    /// double-firing on Windows, which synthesises both press and release for
    /// every keystroke.
    Key(KeyEvent),
    /// A mouse event from the terminal (click, wheel).
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// The terminal input stream ended or failed.
    Quit,
}

/// Holds the sender and receiver ends of the event channel.
pub struct EventHandler {
    /// Send half, handed to the input task.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    /// Receive half, owned by the main loop.
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts one crossterm event into an `AppEvent`, if planrev cares about it.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Spawns the background tokio task that forwards terminal input.
///
/// The task exits when the receiver is dropped or the crossterm stream ends.
/// A stream error or end is reported once as [`AppEvent::Quit`] so the main
/// loop can leave cleanly instead of waiting forever.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut reader = EventStream::new();

        loop {
            let maybe_event = reader.next().await;
            let forwarded = match maybe_event {
                Some(Ok(event)) => match translate(event) {
                    Some(app_event) => tx.send(app_event),
                    None => Ok(()),
                },
                Some(Err(e)) => {
                    tracing::error!(error = %e, "terminal input failed");
                    let _ = tx.send(AppEvent::Quit);
                    break;
                }
                None => {
                    let _ = tx.send(AppEvent::Quit);
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        }
    });
}
