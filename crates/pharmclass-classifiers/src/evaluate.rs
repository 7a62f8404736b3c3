//! Accuracy evaluation against a labeled test set

use pharmclass_core::ProductRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::service::ClassifierService;

/// A product with its expected category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSku {
    pub record: ProductRecord,

    /// Reference category code; blank means unknown
    pub expected_code: String,
}

/// A prediction that disagreed with the reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub sku_name: String,
    pub expected_code: String,
    pub predicted_code: Option<String>,
    pub reason: String,
}

/// Outcome of an evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Samples classified successfully
    pub total: usize,

    /// Predictions equal to a non-blank reference code
    pub correct: usize,

    /// Predictions flagged for review
    pub needs_review: usize,

    /// Samples the model failed on
    pub failed: usize,

    pub mismatches: Vec<Mismatch>,
}

impl EvaluationReport {
    /// Share of classified samples with the correct category
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Share of classified samples flagged for review
    pub fn review_rate(&self) -> f64 {
        ratio(self.needs_review, self.total)
    }
}

fn non_blank(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|code| !code.is_empty())
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Classify each labeled sample sequentially and compare category codes
pub async fn evaluate(service: &ClassifierService, samples: &[LabeledSku]) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for sample in samples {
        let result = match service.classify(&sample.record).await {
            Ok(result) => result,
            Err(e) => {
                report.failed += 1;
                warn!(sku = %sample.record.name, error = %e, "Evaluation sample failed");
                continue;
            }
        };

        report.total += 1;
        if result.needs_review {
            report.needs_review += 1;
        }

        let expected = non_blank(Some(sample.expected_code.as_str()));
        let predicted = non_blank(result.category_code.as_deref());
        if expected.is_some() && expected == predicted {
            report.correct += 1;
        } else if expected != predicted {
            let expected = expected.unwrap_or_default().to_string();
            report.mismatches.push(Mismatch {
                sku_name: result.sku_name,
                expected_code: expected,
                predicted_code: result.category_code,
                reason: result.reason,
            });
        }
    }

    report
}
