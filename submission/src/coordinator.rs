//! Submission coordinator: turns a verified resource into a backend request
//! and hands back the response stream.

use keylink_verification::VerifiedResource;
use std::sync::Arc;

use crate::backend::SubmissionBackend;
use crate::channel::{channel, SubmissionStream};
use crate::error::SubmissionError;
use crate::request::{CorrelationId, CryptoInput, SubmissionRequest, SubmissionTarget};

/// Dispatches submissions to a backend. Holds no per-request state.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    backend: Arc<dyn SubmissionBackend>,
}

impl SubmissionCoordinator {
    pub fn new(backend: Arc<dyn SubmissionBackend>) -> Self {
        Self { backend }
    }

    /// Build a request from `resource` and dispatch it.
    ///
    /// Fails fast, without contacting the backend, when `resource` is absent.
    pub fn submit_verified(
        &self,
        correlation: CorrelationId,
        target: SubmissionTarget,
        resource: Option<&VerifiedResource>,
        crypto_input: CryptoInput,
    ) -> Result<SubmissionStream, SubmissionError> {
        let request = SubmissionRequest::build(correlation, target, resource, crypto_input)?;
        Ok(self.submit(request))
    }

    /// Dispatch an already built request.
    pub fn submit(&self, request: SubmissionRequest) -> SubmissionStream {
        let correlation = request.correlation();
        let (reply, stream) = channel(correlation);
        tracing::info!(
            %correlation,
            key_id = %request.target_key_id(),
            uri = request.uri(),
            payload_len = request.payload().as_bytes().len(),
            "dispatching attestation to backend"
        );
        self.backend.dispatch(request, reply);
        stream
    }
}
