//! Global hotkey listener using macOS CGEventTap
//!
//! Watches system-wide KeyDown/KeyUp events for the configured hotkey and
//! forwards each press and release, timestamped, to the state machine.
//! Runs on a dedicated thread with its own CFRunLoop.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventTapProxy, CGEventType, EventField,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::keys::{Hotkey, Modifiers};
use super::{HotkeyError, HotkeyEvent, KeyKind, PressFilter, TapAction};

/// Signals passed from the tap callback to the run loop
enum TapSignal {
    Key(HotkeyEvent),
    Disabled,
}

/// Global hotkey listener for a single key combination
pub struct HotkeyListener {
    hotkey: Hotkey,
    // Handed to the listener thread on start, so the receiver closes when
    // that thread exits
    event_tx: Option<mpsc::Sender<HotkeyEvent>>,
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    pub fn new(hotkey: Hotkey, event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self {
            hotkey,
            event_tx: Some(event_tx),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register the hotkey and start delivering events.
    ///
    /// Resolves once the listener thread has created its event tap, so a
    /// combination that cannot be bound is reported here rather than lost in
    /// the background thread. A listener can only be started once.
    pub async fn start(&mut self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }
        let Some(event_tx) = self.event_tx.take() else {
            self.running.store(false, Ordering::SeqCst);
            return Err(HotkeyError::AlreadyRunning);
        };

        let hotkey = self.hotkey;
        let running = Arc::clone(&self.running);
        let (ready_tx, ready_rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!(%hotkey, "hotkey listener thread started");

                if let Err(e) = run_event_loop(hotkey, event_tx, running.clone(), ready_tx) {
                    error!(?e, "hotkey listener error");
                }

                running.store(false, Ordering::SeqCst);
                info!("hotkey listener thread stopped");
            });

        if let Err(e) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(HotkeyError::ThreadSpawn(e.to_string()));
        }

        // A dropped sender means the thread died before reporting
        match ready_rx.await {
            Ok(result) => result,
            Err(_) => Err(HotkeyError::EventTapCreation),
        }
    }

    /// Stop the listener; the tap is released when its run loop exits
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Create the event tap and pump its run loop until stopped
fn run_event_loop(
    hotkey: Hotkey,
    event_tx: mpsc::Sender<HotkeyEvent>,
    running: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<(), HotkeyError>>,
) -> Result<(), HotkeyError> {
    let (callback_tx, callback_rx) = std_mpsc::channel::<TapSignal>();

    let filter = RefCell::new(PressFilter::new(hotkey));

    // Must be fast and non-blocking. Matching events are swallowed.
    let callback = move |_proxy: CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
                         -> Option<CGEvent> {
        let kind = match event_type {
            CGEventType::KeyDown => KeyKind::Down,
            CGEventType::KeyUp => KeyKind::Up,
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                let _ = callback_tx.send(TapSignal::Disabled);
                return Some(event.clone());
            }
            _ => return Some(event.clone()),
        };

        let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let autorepeat = event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
        let modifiers = Modifiers::from_flags(event.get_flags());

        match filter.borrow_mut().accept(kind, modifiers, key_code, autorepeat) {
            TapAction::Forward(kind) => {
                let _ = callback_tx.send(TapSignal::Key(HotkeyEvent::new(kind, Instant::now())));
                None
            }
            TapAction::Swallow => None,
            TapAction::PassThrough => Some(event.clone()),
        }
    };

    let tap = match CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![CGEventType::KeyDown, CGEventType::KeyUp],
        callback,
    ) {
        Ok(tap) => tap,
        Err(()) => {
            error!("failed to create event tap - is Accessibility permission granted?");
            let _ = ready_tx.send(Err(HotkeyError::EventTapCreation));
            return Err(HotkeyError::EventTapCreation);
        }
    };

    let run_loop_source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready_tx.send(Err(HotkeyError::EventTapCreation));
            return Err(HotkeyError::EventTapCreation);
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }
    tap.enable();

    info!(%hotkey, "event tap created and enabled");
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopDefaultMode },
            Duration::from_millis(100),
            true,
        );

        while let Ok(signal) = callback_rx.try_recv() {
            match signal {
                TapSignal::Key(event) => {
                    debug!(?event, "hotkey event");
                    if event_tx.blocking_send(event).is_err() {
                        warn!("failed to send hotkey event - channel closed?");
                        running.store(false, Ordering::SeqCst);
                        return Err(HotkeyError::ChannelSend);
                    }
                }
                TapSignal::Disabled => {
                    warn!("event tap disabled by the system, re-enabling");
                    tap.enable();
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = HotkeyListener::new(Hotkey::default(), tx);
        assert!(!listener.is_running());
    }

    #[test]
    fn test_listener_holds_only_sender() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut listener = HotkeyListener::new(Hotkey::default(), tx);

        // Once the sender is handed off, the receiver's lifetime follows it
        let handed_off = listener.event_tx.take();
        assert!(handed_off.is_some());
        drop(handed_off);
        assert!(rx.blocking_recv().is_none());
    }
}
