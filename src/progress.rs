//! Ordered, timestamped progress events
//!
//! Probes push events through a `ProgressSender`; the consumer owns the
//! receiving end and decides how to render them. Sending never blocks and a
//! dropped receiver is ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// A progress event stamped with the time it was produced
#[derive(Debug, Clone, Serialize)]
pub struct Progress<T> {
    pub at: DateTime<Utc>,
    pub event: T,
}

pub type ProgressReceiver<T> = mpsc::UnboundedReceiver<Progress<T>>;

/// Sending half of a progress channel
#[derive(Debug)]
pub struct ProgressSender<T> {
    tx: Option<mpsc::UnboundedSender<Progress<T>>>,
}

impl<T> Clone for ProgressSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> ProgressSender<T> {
    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, ProgressReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sender with no consumer
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: T) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Progress { at: Utc::now(), event });
        }
    }
}

/// Drain every event currently queued on a receiver
pub fn drain<T>(rx: &mut ProgressReceiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        events.push(progress.event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (tx, mut rx) = ProgressSender::channel();
        for i in 0..5 {
            tx.emit(i);
        }
        assert_eq!(drain(&mut rx), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let (tx, mut rx) = ProgressSender::channel();
        tx.emit("a");
        tx.emit("b");
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(second.at >= first.at);
    }

    #[test]
    fn test_dropped_receiver_is_tolerated() {
        let (tx, rx) = ProgressSender::channel();
        drop(rx);
        tx.emit(1);
        ProgressSender::<u8>::disabled().emit(2);
    }
}
