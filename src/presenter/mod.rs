//! Status presentation surface
//!
//! The engine tells the presenter what happened; the presenter holds no
//! status of its own, only a rendering of the last notification. User
//! requests travel the other way as messages through an `EngineHandle`.
//! A line-oriented stdin control surface stands in for a tray menu.

use tokio::sync::mpsc;

use crate::common::prelude::*;
use crate::engine::{Message, Status};

/// Notifications from the engine to the user-facing surface
pub trait StatusPresenter: Send {
    /// The observed status changed (or a toggle/restart re-confirmed it)
    fn on_status_changed(&mut self, status: Status);

    /// A restart pulse began; restart affordances should be disabled
    fn on_restart_started(&mut self);

    /// The restart pulse finished (or was abandoned); affordances re-enable
    fn on_restart_finished(&mut self);
}

/// Presenter that renders status transitions to the log
#[derive(Debug, Default)]
pub struct LogPresenter {
    restarting: bool,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusPresenter for LogPresenter {
    fn on_status_changed(&mut self, status: Status) {
        info!("Night light is: {}", status);
    }

    fn on_restart_started(&mut self) {
        self.restarting = true;
        info!("Restarting night light");
    }

    fn on_restart_finished(&mut self) {
        if self.restarting {
            self.restarting = false;
            info!("Night light restarted");
        }
    }
}

/// Spawn a blocking thread reading control commands from stdin.
///
/// Commands: `toggle`, `restart`, `refresh` (alias `status`), `quit`.
/// Unknown lines are reported and ignored.
pub fn spawn_stdin_control(msg_tx: mpsc::Sender<Message>) {
    std::thread::spawn(move || {
        read_stdin_commands(msg_tx);
    });
}

fn read_stdin_commands(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read error: {}", e);
                break;
            }
        };

        let msg = match parse_command(&line) {
            Some(msg) => msg,
            None => {
                if !line.trim().is_empty() {
                    warn!("unknown command: {:?}", line.trim());
                }
                continue;
            }
        };

        let quit = msg == Message::Quit;
        if msg_tx.blocking_send(msg).is_err() || quit {
            break;
        }
    }
}

/// Map one input line to an engine message
fn parse_command(line: &str) -> Option<Message> {
    match line.trim() {
        "t" | "toggle" => Some(Message::RequestToggle),
        "r" | "restart" => Some(Message::RequestRestart),
        "refresh" | "status" => Some(Message::RequestRefresh),
        "q" | "quit" => Some(Message::Quit),
        _ => None,
    }
}
