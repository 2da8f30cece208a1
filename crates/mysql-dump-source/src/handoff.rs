//! Snapshot-to-stream position handoff.
//!
//! The bootstrap publishes the binlog position its snapshot is consistent
//! with, then waits for the live replication consumer to report that it has
//! applied events up to that position.

use std::sync::Arc;
use std::time::Duration;
use sync_core::BinlogPosition;
use tokio::sync::{mpsc, watch};

/// How long the bootstrap waits for live replication to catch up by default.
pub const DEFAULT_HANDOFF_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandoffError {
    #[error("live replication did not reach {target} within {waited:?}")]
    Timeout {
        target: BinlogPosition,
        waited: Duration,
    },

    #[error("live replication consumer is gone")]
    ConsumerGone,

    #[error("snapshot position was already handed off")]
    AlreadyPublished,
}

/// Create a connected handoff pair.
///
/// The bootstrap keeps the [`PositionHandoff`]; the live replication consumer
/// takes the [`HandoffReceiver`].
pub fn handoff_channel() -> (PositionHandoff, HandoffReceiver) {
    let (position_tx, position_rx) = mpsc::channel(1);
    let (progress_tx, progress_rx) = watch::channel(None);

    let handoff = PositionHandoff {
        position_tx: Some(position_tx),
        progress_rx,
    };
    let receiver = HandoffReceiver {
        position_rx,
        progress: ProgressReporter {
            tx: Arc::new(progress_tx),
        },
    };
    (handoff, receiver)
}

/// Bootstrap side of the handoff.
#[derive(Debug)]
pub struct PositionHandoff {
    position_tx: Option<mpsc::Sender<BinlogPosition>>,
    progress_rx: watch::Receiver<Option<BinlogPosition>>,
}

impl PositionHandoff {
    /// Hand `position` to the consumer. Only the first call succeeds.
    pub async fn publish(&mut self, position: BinlogPosition) -> Result<(), HandoffError> {
        let tx = self
            .position_tx
            .take()
            .ok_or(HandoffError::AlreadyPublished)?;
        tx.send(position)
            .await
            .map_err(|_| HandoffError::ConsumerGone)
    }

    /// Whether a position has been handed off.
    pub fn is_published(&self) -> bool {
        self.position_tx.is_none()
    }

    /// Wait until the consumer reports a position that has reached `target`.
    ///
    /// Returns the reported position.
    pub async fn wait_until_reached(
        &mut self,
        target: &BinlogPosition,
        timeout: Duration,
    ) -> Result<BinlogPosition, HandoffError> {
        let progress_rx = &mut self.progress_rx;
        let reached = async move {
            let seen = progress_rx
                .wait_for(|seen| seen.as_ref().is_some_and(|p| p.has_reached(target)))
                .await
                .map_err(|_| HandoffError::ConsumerGone)?;
            seen.as_ref().cloned().ok_or(HandoffError::ConsumerGone)
        };

        match tokio::time::timeout(timeout, reached).await {
            Ok(result) => result,
            Err(_) => Err(HandoffError::Timeout {
                target: target.clone(),
                waited: timeout,
            }),
        }
    }
}

/// Consumer side of the handoff.
#[derive(Debug)]
pub struct HandoffReceiver {
    position_rx: mpsc::Receiver<BinlogPosition>,
    progress: ProgressReporter,
}

impl HandoffReceiver {
    /// Wait for the snapshot position. `None` once the bootstrap side is gone
    /// without publishing.
    pub async fn recv(&mut self) -> Option<BinlogPosition> {
        self.position_rx.recv().await
    }

    pub fn progress(&self) -> ProgressReporter {
        self.progress.clone()
    }
}

/// Reports how far live replication has applied events.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<Option<BinlogPosition>>>,
}

impl ProgressReporter {
    pub fn report(&self, position: BinlogPosition) {
        self.tx.send_replace(Some(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(name: &str, offset: u64) -> BinlogPosition {
        BinlogPosition::new(name, offset)
    }

    #[tokio::test]
    async fn test_publish_delivers_position_once() {
        let (mut handoff, mut receiver) = handoff_channel();

        handoff.publish(pos("mysql-bin.000001", 154)).await.unwrap();
        assert!(handoff.is_published());
        assert_eq!(receiver.recv().await, Some(pos("mysql-bin.000001", 154)));

        let err = handoff
            .publish(pos("mysql-bin.000001", 200))
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::AlreadyPublished);
    }

    #[tokio::test]
    async fn test_publish_to_dropped_consumer() {
        let (mut handoff, receiver) = handoff_channel();
        drop(receiver);

        let err = handoff
            .publish(pos("mysql-bin.000001", 154))
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::ConsumerGone);
    }

    #[tokio::test]
    async fn test_receiver_sees_none_without_publish() {
        let (handoff, mut receiver) = handoff_channel();
        drop(handoff);
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_wait_until_reached() {
        let (mut handoff, mut receiver) = handoff_channel();
        let target = pos("mysql-bin.000001", 500);

        let consumer = tokio::spawn(async move {
            let start = receiver.recv().await.unwrap();
            let progress = receiver.progress();
            progress.report(pos(&start.name, 300));
            tokio::task::yield_now().await;
            progress.report(pos(&start.name, 520));
            receiver
        });

        handoff.publish(target.clone()).await.unwrap();
        let reached = handoff
            .wait_until_reached(&target, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reached, pos("mysql-bin.000001", 520));
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_accepts_rotated_log() {
        let (mut handoff, receiver) = handoff_channel();
        let target = pos("mysql-bin.000007", 9000);

        receiver.progress().report(pos("mysql-bin.000008", 4));
        let reached = handoff
            .wait_until_reached(&target, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reached.name, "mysql-bin.000008");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let (mut handoff, receiver) = handoff_channel();
        let target = pos("mysql-bin.000001", 500);
        receiver.progress().report(pos("mysql-bin.000001", 100));

        let err = handoff
            .wait_until_reached(&target, DEFAULT_HANDOFF_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HandoffError::Timeout {
                target,
                waited: DEFAULT_HANDOFF_TIMEOUT,
            }
        );
        drop(receiver);
    }

    #[tokio::test]
    async fn test_wait_with_dropped_consumer() {
        let (mut handoff, receiver) = handoff_channel();
        drop(receiver);

        let err = handoff
            .wait_until_reached(&pos("mysql-bin.000001", 500), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, HandoffError::ConsumerGone);
    }
}
