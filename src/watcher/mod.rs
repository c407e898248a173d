//! Session bus watcher for screen lock and monitor power signals
//!
//! Subscribes to `org.gnome.ScreenSaver.ActiveChanged` and to the
//! `org.gnome.Mutter.IdleMonitor` watch traffic, translating raw bus
//! messages into `LifecycleEvent`s for the engine. Bus members with no
//! mapping are dropped here, before they reach the engine.
//!
//! The watcher is optional: if the session bus is unavailable the daemon
//! keeps running on the poll loop alone.
//!
//! The idle-monitor members are method calls between gnome-shell and its
//! clients, not broadcast signals. Whether a plain match rule sees them
//! depends on the broker's eavesdropping policy; on brokers that demand a
//! full monitoring connection the monitor events simply never arrive and
//! only lock/unlock (plus the poll loop) drive the engine. That quiet
//! degradation is accepted: a monitoring connection cannot send, so it
//! would cost a second bus connection for a signal the restart pulse only
//! treats as a hint.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use zbus::{message::Type as MessageType, Connection, MatchRule, MessageStream};

use crate::common::prelude::*;
use crate::engine::{LifecycleEvent, Message};

/// Screensaver interface emitting lock state changes
pub const SCREENSAVER_INTERFACE: &str = "org.gnome.ScreenSaver";

/// Mutter idle monitor interface; its watch traffic betrays display power
/// transitions (a user-active watch is armed right before power-down and
/// fires when the display comes back)
pub const IDLE_MONITOR_INTERFACE: &str = "org.gnome.Mutter.IdleMonitor";

/// Watches the session bus and feeds lifecycle events into the engine
pub struct LifecycleWatcher;

impl LifecycleWatcher {
    /// Connect to the session bus and spawn the pump task.
    ///
    /// Fails with `Error::Bus` if the connection or the match rules cannot
    /// be set up; the caller treats that as non-fatal.
    pub async fn start(tx: mpsc::Sender<Message>) -> Result<()> {
        let conn = Connection::session()
            .await
            .map_err(|e| Error::bus(format!("failed to connect to session bus: {}", e)))?;

        let lock_rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(SCREENSAVER_INTERFACE)
            .map_err(|e| Error::bus(e.to_string()))?
            .member("ActiveChanged")
            .map_err(|e| Error::bus(e.to_string()))?
            .build();
        let lock_stream = MessageStream::for_match_rule(lock_rule, &conn, Some(16))
            .await
            .map_err(|e| Error::bus(format!("failed to match screensaver signals: {}", e)))?;

        let idle_rule = MatchRule::builder()
            .interface(IDLE_MONITOR_INTERFACE)
            .map_err(|e| Error::bus(e.to_string()))?
            .build();
        let idle_stream = MessageStream::for_match_rule(idle_rule, &conn, Some(16))
            .await
            .map_err(|e| Error::bus(format!("failed to match idle monitor traffic: {}", e)))?;

        tokio::spawn(pump(lock_stream, idle_stream, tx));
        info!("lifecycle watcher started");
        Ok(())
    }
}

/// Forward decoded events until either stream ends or the engine goes away
async fn pump(
    mut lock_stream: MessageStream,
    mut idle_stream: MessageStream,
    tx: mpsc::Sender<Message>,
) {
    loop {
        let next = tokio::select! {
            msg = lock_stream.next() => msg,
            msg = idle_stream.next() => msg,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                warn!("session bus stream error: {}", e);
                continue;
            }
            None => break,
        };

        let header = msg.header();
        let Some(member) = header.member() else {
            continue;
        };
        // Only ActiveChanged carries a boolean; for everything else this
        // deserialization simply fails and the argument stays None.
        let flag = msg.body().deserialize::<(bool,)>().ok().map(|(b,)| b);

        if let Some(event) = decode(member.as_str(), flag) {
            debug!("lifecycle event: {:?}", event);
            if tx.send(Message::Lifecycle(event)).await.is_err() {
                break;
            }
        }
    }
    info!("lifecycle watcher stopped");
}

/// Map a bus member (plus its leading boolean, if any) to a lifecycle event
fn decode(member: &str, flag: Option<bool>) -> Option<LifecycleEvent> {
    match (member, flag) {
        ("ActiveChanged", Some(true)) => Some(LifecycleEvent::ScreenLocked),
        ("ActiveChanged", Some(false)) => Some(LifecycleEvent::ScreenUnlocked),
        ("AddUserActiveWatch", _) => Some(LifecycleEvent::MonitorGoingOff),
        ("RemoveWatch", _) => Some(LifecycleEvent::MonitorRestored),
        ("WatchFired", _) => Some(LifecycleEvent::MonitorFlicker),
        _ => None,
    }
}
