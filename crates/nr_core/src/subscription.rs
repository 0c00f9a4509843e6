use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SNAPSHOT_BUFFER: usize = 16;

/// Receiving end of a live query. Each item is a full snapshot of the query
/// result. Dropping the subscription tears down the producer.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    token: CancellationToken,
}

/// Producing end handed to the backend task that feeds a [`Subscription`].
#[derive(Debug, Clone)]
pub struct SnapshotSink<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T: Send + 'static> Subscription<T> {
    pub fn channel() -> (SnapshotSink<T>, Subscription<T>) {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let token = CancellationToken::new();
        (
            SnapshotSink { tx, token: token.clone() },
            Subscription { rx, token },
        )
    }

    /// Next snapshot, or `None` once the subscription has been torn down.
    pub async fn next(&mut self) -> Option<T> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.token.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn unsubscribe(&self) {
        self.token.cancel();
    }

    /// Ties this subscription to an outer lifetime: cancelling `parent`
    /// tears it down.
    pub fn bind_to(self, parent: &CancellationToken) -> Self {
        let token = self.token.clone();
        let parent = parent.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = parent.cancelled() => token.cancel(),
                _ = token.cancelled() => {}
            }
        });
        self
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T: Send + 'static> SnapshotSink<T> {
    /// Delivers a snapshot. Returns `false` once the subscriber is gone.
    pub async fn send(&self, snapshot: T) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = self.token.cancelled() => false,
            sent = self.tx.send(snapshot) => sent.is_ok(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    pub async fn closed(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshots_flow_until_unsubscribed() {
        let (sink, mut sub) = Subscription::<u32>::channel();
        assert!(sink.send(1).await);
        assert_eq!(sub.next().await, Some(1));

        sub.unsubscribe();
        assert!(!sink.send(2).await);
        assert!(sink.is_closed());
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_drop_closes_sink() {
        let (sink, sub) = Subscription::<u32>::channel();
        drop(sub);
        assert!(sink.is_closed());
        assert!(!sink.send(1).await);
    }

    #[tokio::test]
    async fn test_parent_cancellation() {
        let parent = CancellationToken::new();
        let (sink, mut sub) = Subscription::<u32>::channel();
        sub = sub.bind_to(&parent);
        parent.cancel();
        sink.closed().await;
        assert_eq!(sub.next().await, None);
    }
}
