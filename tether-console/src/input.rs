//! Keyboard input in raw mode.
//!
//! crossterm's event API is blocking, so keys are read on a dedicated
//! blocking thread and forwarded as plain characters.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How often the reader thread checks for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Character sent for keys that mean "leave" (Esc, Ctrl-C).
pub const QUIT_KEY: char = 'q';

/// Keeps the terminal in raw mode while alive.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// The character a key press stands for, if any.
pub fn key_to_char(key: &KeyEvent) -> Option<char> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(QUIT_KEY),
        KeyCode::Esc => Some(QUIT_KEY),
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

/// Read keys until `stop` is cancelled or the receiver goes away.
pub fn spawn_key_reader(keys: mpsc::Sender<char>, stop: CancellationToken) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.is_cancelled() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("keyboard poll failed: {e}");
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => {
                    let Some(c) = key_to_char(&key) else { continue };
                    if keys.blocking_send(c).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("keyboard read failed: {e}");
                    break;
                }
            }
        }
    })
}
