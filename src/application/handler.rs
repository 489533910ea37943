//! Default message handler: log the event, then route it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Span;

use crate::application::router::SubmissionRouter;
use crate::domain::{PayloadSummary, RelayMessage};
use crate::error::SubmissionError;
use crate::port::{HandleOutcome, MessageHandler, ProcessingScope};

/// Hands every admitted message to a [`SubmissionRouter`].
pub struct RoutingHandler {
    router: Arc<SubmissionRouter>,
    span: Span,
}

impl RoutingHandler {
    #[must_use]
    pub fn new(router: Arc<SubmissionRouter>) -> Self {
        Self {
            router,
            span: tracing::info_span!("relay", component = "handler"),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn router(&self) -> &SubmissionRouter {
        &self.router
    }
}

#[async_trait]
impl MessageHandler for RoutingHandler {
    async fn handle(
        &self,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<HandleOutcome, SubmissionError> {
        let event = &message.event;
        tracing::debug!(
            parent: &self.span,
            key = message.key.short(),
            chain = event.source_chain_id,
            emitter = %event.emitter_address,
            sequence = event.sequence,
            timestamp = %event.timestamp,
            nonce = event.nonce,
            consistency_level = event.consistency_level,
            guardian_set_index = event.guardian_set_index,
            signatures = event.signature_count,
            correlation_id = event.correlation_id.as_deref().unwrap_or("-"),
            payload_len = event.payload.len(),
            "VAA details"
        );

        let summary = PayloadSummary::parse(&event.payload);
        tracing::debug!(
            parent: &self.span,
            key = message.key.short(),
            address = summary.address.as_deref().unwrap_or("-"),
            payload_chain = ?summary.chain_id,
            amount = ?summary.amount,
            fields = summary.fields.len(),
            "Payload summary"
        );

        self.router.dispatch(message, scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::router::{ForwardRoute, ReverseRoute};
    use crate::domain::{DecodedEvent, RawMessage};
    use crate::testkit::submitter::RecordingSubmitter;
    use crate::testkit::vaa::VaaBuilder;

    #[tokio::test]
    async fn delegates_to_router() {
        let forward = Arc::new(RecordingSubmitter::new("evm"));
        let router = SubmissionRouter::new(
            1,
            2,
            ForwardRoute {
                submitter: forward.clone(),
                target: "0xforward".into(),
            },
            ReverseRoute {
                primary: Arc::new(RecordingSubmitter::new("verifier")),
                secondary: Arc::new(RecordingSubmitter::new("pxe")),
                target: "0xreverse".into(),
            },
        );
        let handler = RoutingHandler::new(Arc::new(router));

        let raw = RawMessage::new(VaaBuilder::new(1, 3).payload(vec![0; 64]).build());
        let message = RelayMessage {
            key: raw.key(),
            event: DecodedEvent::decode(raw.as_bytes()).unwrap(),
            raw,
        };

        let outcome = handler
            .handle(&message, &ProcessingScope::detached())
            .await
            .unwrap();

        assert!(outcome.is_submitted());
        assert_eq!(forward.call_count(), 1);
    }
}
