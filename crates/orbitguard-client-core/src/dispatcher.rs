use std::sync::Arc;

use crate::error::ClientError;
use crate::exchange::Exchange;
use crate::flight::SingleFlightSlot;
use crate::query::{Channel, QueryRequest, QueryResult};

/// Issues primary-channel queries, one at a time. A new query cancels the
/// one in flight instead of waiting behind it.
pub struct RequestDispatcher {
    exchange: Arc<Exchange>,
    slot: SingleFlightSlot,
}

impl RequestDispatcher {
    #[must_use]
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self {
            exchange,
            slot: SingleFlightSlot::new(Channel::Primary),
        }
    }

    pub async fn issue(&self, request: QueryRequest) -> Result<QueryResult, ClientError> {
        let kind = request.kind();
        if kind.channel() != self.slot.channel() {
            return Err(ClientError::WrongChannel { kind });
        }

        let ticket = self.slot.begin();
        tracing::debug!(
            kind = kind.as_str(),
            channel = self.slot.channel().as_str(),
            generation = ticket.generation(),
            "issuing query"
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

        let reply = outcome?;
        let result = QueryResult::decode(&request, &reply)?;
        tracing::debug!(
            kind = kind.as_str(),
            generation = ticket.generation(),
            application_error = result.is_application_error(),
            "query settled"
        );
        Ok(result)
    }

    /// Drops the in-flight query, if any, without issuing a new one.
    pub fn cancel_in_flight(&self) -> bool {
        self.slot.cancel()
    }
}
