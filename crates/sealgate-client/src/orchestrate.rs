//! Decrypt orchestration: the batch state machine.
//!
//! A batch moves through `Idle → AwaitingSession → AwaitingAuthorization →
//! Fetching → Decrypting` and finishes in `Done`, `PartialFailure`, or
//! `Failed`. Items resolve independently: one object's failure never
//! aborts its siblings. A hard failure before fetching (signature
//! rejected) aborts the whole batch with no partial results.

use std::sync::Arc;

use bytes::Bytes;

use sealgate_core::{seal_approve, subscribe_tx, Address, AuthDomain, ObjectId, ServiceTerms, TxSpec};
use sealgate_session::{SessionError, SessionKey, SessionKeyManager, Signer};

use crate::cancel::CancelToken;
use crate::collab::{BlobStore, KeyService};
use crate::error::DecryptError;

/// Result of attempting to decrypt one content object.
#[derive(Debug)]
pub struct DecryptionOutcome {
    /// The content id this outcome belongs to.
    pub content_id: Vec<u8>,
    /// Plaintext on success, the failure reason otherwise.
    pub result: Result<Bytes, DecryptError>,
}

/// Why a batch failed before any per-item work started.
#[derive(Debug)]
pub enum BatchFailure {
    /// The viewer rejected the session signature prompt.
    SignatureRejected,
    /// The signing collaborator failed.
    Signer(String),
    /// Subscription domain but no service terms were supplied, so neither
    /// a decrypt nor a purchase can be prepared.
    MissingTerms,
}

/// Terminal state of one decrypt batch.
#[derive(Debug)]
pub enum BatchResult {
    /// Every item decrypted.
    Done(Vec<DecryptionOutcome>),
    /// At least one item failed; successes are still usable.
    PartialFailure(Vec<DecryptionOutcome>),
    /// No valid subscription exists: the batch short-circuits to the
    /// purchase flow instead of decrypting. Not an error.
    SubscribeRequired {
        /// The prepared purchase transaction for the caller to execute.
        purchase: TxSpec,
    },
    /// Hard failure before any item ran; no partial results.
    Failed(BatchFailure),
}

impl BatchResult {
    /// The per-item outcomes, if the batch got far enough to have any.
    pub fn outcomes(&self) -> Option<&[DecryptionOutcome]> {
        match self {
            BatchResult::Done(o) | BatchResult::PartialFailure(o) => Some(o),
            _ => None,
        }
    }
}

/// One decrypt request: who is asking, under which domain, for what.
#[derive(Debug, Clone)]
pub struct DecryptRequest {
    /// The authorization domain the content lives under.
    pub domain: AuthDomain,
    /// Content ids to decrypt, resolved independently.
    pub content_ids: Vec<Vec<u8>>,
    /// Service terms; required for subscription domains, where they feed
    /// the purchase transaction if no valid subscription exists.
    pub terms: Option<ServiceTerms>,
}

/// Drives a batch of content objects from session acquisition through
/// decryption.
///
/// Side effects per batch: at most one signing prompt, one blob fetch and
/// one decryption call per content id. Nothing is retried automatically.
pub struct DecryptOrchestrator<S: Signer, K: KeyService, B: BlobStore> {
    package: ObjectId,
    sessions: Arc<SessionKeyManager<S>>,
    key_service: Arc<K>,
    blobs: Arc<B>,
}

impl<S: Signer, K: KeyService, B: BlobStore> DecryptOrchestrator<S, K, B> {
    /// Create an orchestrator for one authorization domain (package).
    pub fn new(
        package: ObjectId,
        sessions: Arc<SessionKeyManager<S>>,
        key_service: Arc<K>,
        blobs: Arc<B>,
    ) -> Self {
        Self {
            package,
            sessions,
            key_service,
            blobs,
        }
    }

    /// Run one batch to a terminal state.
    ///
    /// `cancel` stops scheduling further per-item work once the owning
    /// view is torn down; items already in flight finish.
    pub async fn decrypt_batch(
        &self,
        viewer: Address,
        request: DecryptRequest,
        cancel: &CancelToken,
    ) -> BatchResult {
        // AwaitingAuthorization is checked first: decrypt and purchase are
        // mutually exclusive actions gated by the same validity check, and
        // prompting for a signature on a doomed batch would waste the
        // viewer's attention.
        if let AuthDomain::Subscription {
            service_id,
            subscription_id: None,
        } = request.domain
        {
            let Some(terms) = request.terms.as_ref() else {
                return BatchResult::Failed(BatchFailure::MissingTerms);
            };
            tracing::debug!(service = %service_id, "no valid subscription; routing to purchase");
            return BatchResult::SubscribeRequired {
                purchase: subscribe_tx(self.package, service_id, terms.fee, viewer),
            };
        }

        // AwaitingSession: one prompt at most; concurrent batches for the
        // same address wait on the in-flight signature.
        let session = match self.sessions.obtain(viewer).await {
            Ok(session) => session,
            Err(SessionError::SignatureRejected) => {
                return BatchResult::Failed(BatchFailure::SignatureRejected);
            }
            Err(SessionError::Signer(msg)) => {
                return BatchResult::Failed(BatchFailure::Signer(msg));
            }
        };

        // Fetching → Decrypting, per item.
        let mut outcomes = Vec::with_capacity(request.content_ids.len());
        let mut any_failed = false;

        for content_id in request.content_ids {
            let result = if cancel.is_cancelled() {
                Err(DecryptError::Cancelled)
            } else {
                self.decrypt_one(&request.domain, &content_id, &session).await
            };

            if let Err(e) = &result {
                any_failed = true;
                tracing::debug!(error = %e, "item failed; continuing with siblings");
            }
            outcomes.push(DecryptionOutcome { content_id, result });
        }

        if any_failed {
            BatchResult::PartialFailure(outcomes)
        } else {
            BatchResult::Done(outcomes)
        }
    }

    async fn decrypt_one(
        &self,
        domain: &AuthDomain,
        content_id: &[u8],
        session: &SessionKey,
    ) -> Result<Bytes, DecryptError> {
        // Authorization call first: a missing credential must short-circuit
        // before anything network-shaped.
        let call = seal_approve(self.package, domain, content_id)?;
        let ciphertext = self.blobs.fetch(content_id).await?;
        let plaintext = self
            .key_service
            .decrypt(ciphertext, &call, session)
            .await?;
        Ok(plaintext)
    }
}
