//! Frame → [`Event`] decoding.

use std::sync::Arc;

use async_trait::async_trait;

use pubsub_core::Event;

use crate::conduit::{Inlet, Outlet};
use crate::error::PipelineError;
use crate::shutdown::Shutdown;
use crate::stage::{Stage, relay};
use crate::stats::PipelineStats;

/// Decodes raw frames; malformed frames are dropped without a trace other
/// than the `malformed_dropped` counter.
pub struct Decoder {
    input: Inlet<Vec<u8>>,
    output: Outlet<Event>,
    stats: Arc<PipelineStats>,
}

impl Decoder {
    pub fn new(input: Inlet<Vec<u8>>, output: Outlet<Event>, stats: Arc<PipelineStats>) -> Self {
        Self {
            input,
            output,
            stats,
        }
    }
}

#[async_trait]
impl Stage for Decoder {
    fn name(&self) -> &'static str {
        "decoder"
    }

    async fn run(self: Box<Self>, shutdown: Shutdown) -> Result<(), PipelineError> {
        let Decoder {
            mut input,
            output,
            stats,
        } = *self;

        relay(&mut input, &output, &shutdown, |frame: Vec<u8>| match Event::decode(&frame) {
            Ok(event) => {
                stats.event_decoded();
                Some(event)
            }
            Err(_) => {
                stats.malformed_dropped();
                None
            }
        })
        .await;

        Ok(())
    }
}
