//! Account filter.

use std::sync::Arc;

use async_trait::async_trait;

use pubsub_core::{AccountId, Event};

use crate::conduit::{Inlet, Outlet};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::stage::{Stage, relay};
use crate::stats::PipelineStats;

/// Forwards only events of one account, or every event when no account is set.
pub struct Filter {
    account: Option<AccountId>,
    input: Inlet<Event>,
    output: Outlet<Event>,
    stats: Arc<PipelineStats>,
}

impl Filter {
    pub fn new(
        account: Option<AccountId>,
        input: Inlet<Event>,
        output: Outlet<Event>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            account,
            input,
            output,
            stats,
        }
    }
}

/// Whether `event` passes a filter on `account`.
pub fn admits(account: Option<&AccountId>, event: &Event) -> bool {
    match account {
        None => true,
        Some(account) => event.account_id() == account,
    }
}

#[async_trait]
impl Stage for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError> {
        let Filter {
            account,
            mut input,
            output,
            stats,
        } = *self;

        relay(&mut input, &output, &shutdown, |event: Event| {
            if admits(account.as_ref(), &event) {
                Some(event)
            } else {
                stats.filtered_out();
                None
            }
        })
        .await;

        Ok(())
    }
}
