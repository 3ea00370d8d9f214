use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Receiving half of a bounded queue drained by several consumers
///
/// Consumers take turns on the underlying receiver, so every item is
/// delivered to exactly one of them in FIFO order. `recv` returns `None`
/// once every sender is dropped and the queue is empty.
#[derive(Debug)]
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedReceiver<T> {
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(receiver)),
        }
    }

    pub async fn recv(&self) -> Option<T> {
        let mut receiver = self.inner.lock().await;
        receiver.recv().await
    }
}

/// Create a bounded multi-consumer queue; `capacity` must be non-zero
pub fn shared_channel<T>(capacity: usize) -> (mpsc::Sender<T>, SharedReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (sender, SharedReceiver::new(receiver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_each_item_is_delivered_once() {
        let (sender, receiver) = shared_channel::<u32>(16);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let receiver = receiver.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = receiver.recv().await {
                    seen.push(item);
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        for item in 0..100 {
            sender.send(item).await.unwrap();
        }
        drop(sender);

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: HashSet<u32> = all.iter().copied().collect();
        assert_eq!(all.len(), 100);
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn test_single_consumer_sees_fifo_order() {
        let (sender, receiver) = shared_channel::<u32>(8);
        for item in 0..5 {
            sender.send(item).await.unwrap();
        }
        drop(sender);

        let mut received = Vec::new();
        while let Some(item) = receiver.recv().await {
            received.push(item);
        }

        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }
}
