//! Speaking Signal
//!
//! A process-wide binary flag raised while a foreground directive is in
//! flight. The writer half is not cloneable and is owned by the audio
//! processor; every other component gets a read-only [`SpeakingWatch`].

use tokio::sync::watch;

/// Creates the writer and a first watcher. Starts idle.
pub fn speaking_signal() -> (SpeakingSignal, SpeakingWatch) {
    let (tx, rx) = watch::channel(false);
    (SpeakingSignal { tx }, SpeakingWatch { rx })
}

/// Exclusive writer.
#[derive(Debug)]
pub struct SpeakingSignal {
    tx: watch::Sender<bool>,
}

impl SpeakingSignal {
    pub fn set_speaking(&self) {
        self.tx.send_replace(true);
    }

    pub fn set_idle(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_speaking(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn watch(&self) -> SpeakingWatch {
        SpeakingWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the signal.
#[derive(Debug, Clone)]
pub struct SpeakingWatch {
    rx: watch::Receiver<bool>,
}

impl SpeakingWatch {
    pub fn is_speaking(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves on the next transition. Never resolves once the writer is gone.
    pub async fn changed(&mut self) {
        if self.rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Resolves as soon as the signal is idle.
    pub async fn wait_idle(&mut self) {
        let _ = self.rx.wait_for(|speaking| !*speaking).await;
    }
}
