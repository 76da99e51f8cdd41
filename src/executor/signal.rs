use tokio::sync::mpsc;

/// Creates a payload-less change notification with a one-event buffer.
/// While an event sits unconsumed, further notifications coalesce into it.
pub(crate) fn channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

#[derive(Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<()>,
}

impl SignalSender {
    /// Never blocks. A full buffer means an event is already pending and
    /// this notification is absorbed by it.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

pub struct SignalReceiver {
    rx: mpsc::Receiver<()>,
}

impl SignalReceiver {
    /// Consumes the pending event, if any.
    pub(crate) fn try_take(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}
