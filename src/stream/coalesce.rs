//! Latest-wins rate limiting for event streams.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Adds display-rate pacing to any [`Stream`].
pub trait CoalesceExt: Stream {
    /// Emit at most one item per `period`, keeping only the newest.
    ///
    /// Items that arrive between emissions are dropped, not queued, so a
    /// slow consumer always sees fresh data and never builds a backlog.
    /// Periods with no upstream items emit nothing.
    fn coalesce(self, period: Duration) -> Coalesced<Self>
    where
        Self: Sized,
    {
        Coalesced::new(self, period)
    }
}

impl<T: Stream> CoalesceExt for T {}

pin_project! {
    /// Stream returned by [`CoalesceExt::coalesce`].
    pub struct Coalesced<S: Stream> {
        #[pin]
        inner: S,
        ticker: Interval,
        newest: Option<S::Item>,
    }
}

impl<S: Stream> Coalesced<S> {
    fn new(inner: S, period: Duration) -> Self {
        let mut ticker = interval(period);
        // A stalled consumer must not cause a burst of catch-up emissions.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner, ticker, newest: None }
    }
}

impl<S: Stream> Stream for Coalesced<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            ready!(this.ticker.poll_tick(cx));

            // Drain whatever has accumulated, overwriting older items.
            loop {
                match this.inner.as_mut().poll_next(cx) {
                    Poll::Ready(Some(item)) => *this.newest = Some(item),
                    Poll::Ready(None) => return Poll::Ready(this.newest.take()),
                    Poll::Pending => break,
                }
            }

            match this.newest.take() {
                Some(item) => return Poll::Ready(Some(item)),
                // Quiet period: wait for the next tick rather than ending
                // the stream. The upstream waker is already registered.
                None => continue,
            }
        }
    }
}
