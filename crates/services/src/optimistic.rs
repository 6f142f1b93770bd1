//! # Optimistic Commands
//!
//! Each engagement mutation is a pair: the local step applied immediately
//! and its exact inverse. [`Optimistic::run`] applies, awaits the network
//! call, and applies the inverse if that call fails. Confirmation is the
//! request's own business.

use std::fmt::Display;
use std::future::Future;

use domains::MutationEvent;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Optimistic<M> {
    pub apply: M,
    pub rollback: M,
}

impl<M> Optimistic<M> {
    pub fn new(apply: M, rollback: M) -> Self {
        Self { apply, rollback }
    }

    /// Applies `apply` through `sink`, awaits `request`, and sends `rollback`
    /// through `sink` if the request failed. The error is returned untouched.
    pub async fn run<T, E, Fut>(self, sink: impl Fn(M), request: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        sink(self.apply);
        match request.await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "optimistic update rejected; rolling back");
                sink(self.rollback);
                Err(err)
            }
        }
    }
}

impl Optimistic<MutationEvent> {
    /// Toggles are self-inverse.
    pub fn like(post_id: Uuid) -> Self {
        Self::new(
            MutationEvent::LikeToggled { post_id },
            MutationEvent::LikeToggled { post_id },
        )
    }

    pub fn bookmark(post_id: Uuid) -> Self {
        Self::new(
            MutationEvent::BookmarkToggled { post_id },
            MutationEvent::BookmarkToggled { post_id },
        )
    }
}
