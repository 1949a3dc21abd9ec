use std::sync::Arc;

use crate::error::ClientError;
use crate::exchange::Exchange;
use crate::flight::SingleFlightSlot;
use crate::query::{Channel, DetailResult, QueryRequest, QueryResult};

/// Per-object detail fetches on their own single-flight slot. A new lookup
/// supersedes the previous lookup and never touches the primary channel.
pub struct DetailLookup {
    exchange: Arc<Exchange>,
    slot: SingleFlightSlot,
}

impl DetailLookup {
    #[must_use]
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self {
            exchange,
            slot: SingleFlightSlot::new(Channel::Detail),
        }
    }

    pub async fn issue(
        &self,
        norad_id: u64,
        name: impl Into<String>,
    ) -> Result<DetailResult, ClientError> {
        let request = QueryRequest::detail(norad_id, name);
        let kind = request.kind();
        let ticket = self.slot.begin();
        tracing::debug!(
            norad_id,
            channel = self.slot.channel().as_str(),
            generation = ticket.generation(),
            "issuing detail lookup"
        );
        let outcome = self
            .exchange
            .post_authenticated(
                kind.endpoint(),
                request.parameters(),
                Some((&self.slot, &ticket)),
            )
            .await;
        self.slot.finish(&ticket);

        match QueryResult::decode(&request, &outcome?)? {
            QueryResult::Detail(detail) => Ok(detail),
            other => Err(ClientError::WrongChannel { kind: other.kind() }),
        }
    }

    pub fn cancel_in_flight(&self) -> bool {
        self.slot.cancel()
    }
}
