use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize,
}

/// Terminal events read on a background thread. A tick is sent whenever
/// `tick_rate` passes without input so timers and submissions advance.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            loop {
                let event = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        // Release and repeat events would double-type letters.
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            AppEvent::Key(key)
                        }
                        Ok(Event::Resize(_, _)) => AppEvent::Resize,
                        Ok(_) => continue,
                        Err(e) => {
                            log::error!("terminal read failed: {e}");
                            return;
                        }
                    },
                    Ok(false) => AppEvent::Tick,
                    Err(e) => {
                        log::error!("terminal poll failed: {e}");
                        return;
                    }
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
