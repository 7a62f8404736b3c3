//! Classification service: model call, normalization and decision rules

use std::sync::Arc;

use pharmclass_core::{ClassificationResult, ProductRecord, RawResponse};
use pharmclass_policy::{Decision, DecisionEngine};
use tracing::{debug, info};

use crate::client::{ModelClient, ModelError};
use crate::normalizer::normalize_response;

/// Classifies product records end to end
#[derive(Clone)]
pub struct ClassifierService {
    client: Arc<dyn ModelClient>,
    engine: Arc<DecisionEngine>,
}

impl ClassifierService {
    /// Create a service from a model client and a decision engine
    pub fn new(client: Arc<dyn ModelClient>, engine: Arc<DecisionEngine>) -> Self {
        Self { client, engine }
    }

    /// Decision engine in use
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Model client in use
    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Classify one record.
    ///
    /// Model errors are returned unchanged; every successful model answer
    /// yields a result, however uncertain.
    pub async fn classify(&self, record: &ProductRecord) -> Result<ClassificationResult, ModelError> {
        let (result, _) = self.classify_with_decision(record).await?;
        Ok(result)
    }

    /// Classify one record and report which rules fired
    pub async fn classify_with_decision(
        &self,
        record: &ProductRecord,
    ) -> Result<(ClassificationResult, Decision), ModelError> {
        let raw = self.client.classify_sku(record).await?;
        Ok(self.decide_raw(&raw, record))
    }

    /// Normalize an already obtained raw answer and apply the decision rules
    pub fn decide_raw(
        &self,
        raw: &RawResponse,
        record: &ProductRecord,
    ) -> (ClassificationResult, Decision) {
        let mut result = normalize_response(raw, record);
        debug!(
            sku = %record.name,
            client = %self.client.name(),
            confidence = result.confidence,
            hint = result.needs_review,
            "Normalized model response"
        );

        let decision = self.engine.decide(&mut result);

        info!(
            sku = %record.name,
            category = ?result.category_code,
            confidence = result.confidence,
            needs_review = result.needs_review,
            rules_fired = decision.fired.len(),
            "Classified SKU"
        );

        (result, decision)
    }
}
