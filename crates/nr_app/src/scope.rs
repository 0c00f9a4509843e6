use std::future::Future;

use nr_core::{Error, Result, Subscription};
use tokio_util::sync::CancellationToken;

/// Lifetime of one screen. Requests started through it resolve to
/// [`Error::Cancelled`] once it is closed, and bound subscriptions are torn
/// down with it. Dropping the scope closes it.
#[derive(Debug, Default)]
pub struct ScreenScope {
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that closes with this one but can also be closed on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn run<F, T>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_closed() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            result = request => {
                // A result that lands after the screen closed is discarded
                if self.is_closed() {
                    Err(Error::Cancelled)
                } else {
                    result
                }
            }
        }
    }

    pub fn bind<T: Send + 'static>(&self, subscription: Subscription<T>) -> Subscription<T> {
        subscription.bind_to(&self.token)
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
