//! Subcommand implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pharmclass_classifiers::{
    evaluate, run_batch, ClassifierService, ModelClient, ProviderClient,
};
use pharmclass_core::ProductRecord;
use pharmclass_policy::{CategoryIndex, DecisionEngine};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::input::{load_records, load_taxonomy, load_testset};
use crate::sink::JsonlSink;
use crate::{ClassifyArgs, ClassifyOneArgs, EvaluateArgs, LookupArgs};

/// Load the taxonomy and build the category index
fn build_index(path: &Path) -> anyhow::Result<Arc<CategoryIndex>> {
    let nodes = load_taxonomy(path)?;
    let index = CategoryIndex::new(nodes)
        .with_context(|| format!("invalid taxonomy {}", path.display()))?;
    Ok(Arc::new(index))
}

/// Wire the provider client and decision engine into a service
fn build_service(config: &AppConfig, index: Arc<CategoryIndex>) -> anyhow::Result<ClassifierService> {
    let engine = DecisionEngine::new(config.decision, Arc::clone(&index))?;
    let client = ProviderClient::new(config.llm.clone(), index)?;

    info!(
        model = %client.name(),
        categories = engine.index().len(),
        hard_reject = config.decision.hard_reject_threshold,
        confidence = config.decision.confidence_threshold,
        "Classifier ready"
    );

    Ok(ClassifierService::new(Arc::new(client), Arc::new(engine)))
}

/// Classify a JSON-lines file of SKUs and append results to the output file
pub async fn classify(config: &AppConfig, args: &ClassifyArgs) -> anyhow::Result<()> {
    let index = build_index(&args.taxonomy)?;
    let service = build_service(config, index)?;

    let limit = args.limit.or(config.batch.limit);
    let concurrency = args.concurrency.unwrap_or(config.batch.concurrency);
    let records = load_records(&args.input, limit)?;

    let run_id = Uuid::new_v4();
    let mut sink = JsonlSink::open(&args.output, run_id)
        .with_context(|| format!("failed to open {}", args.output.display()))?;
    info!(run_id = %run_id, output = %sink.path().display(), "Writing results");

    let summary = run_batch(&service, records, &mut sink, concurrency).await;
    info!(run_id = %run_id, written = sink.written(), "Batch complete");

    println!("{}", serde_json::to_string_pretty(&json!({
        "run_id": run_id.to_string(),
        "summary": summary,
    }))?);

    Ok(())
}

/// Classify a single SKU and print the result
pub async fn classify_one(config: &AppConfig, args: &ClassifyOneArgs) -> anyhow::Result<()> {
    let index = build_index(&args.taxonomy)?;
    let service = build_service(config, index)?;

    let mut record = ProductRecord::new(args.name.as_str())?;
    if let Some(manufacturer) = &args.manufacturer {
        record = record.with_manufacturer(manufacturer.as_str());
    }
    if let Some(alternate) = &args.alt_name {
        record = record.with_alternate_name(alternate.as_str());
    }

    let raw = service.client().classify_sku(&record).await?;
    let output = if args.raw {
        json!({ "sku": record.name, "raw": raw })
    } else {
        let (result, decision) = service.decide_raw(&raw, &record);
        json!({ "result": result, "decision": decision })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Measure accuracy against a labeled test set
pub async fn evaluate_testset(config: &AppConfig, args: &EvaluateArgs) -> anyhow::Result<()> {
    let index = build_index(&args.taxonomy)?;
    let service = build_service(config, index)?;
    let samples = load_testset(&args.testset, args.limit)?;

    let report = evaluate(&service, &samples).await;

    println!("Total samples: {}", report.total);
    println!("Failed samples: {}", report.failed);
    println!("Accuracy by category_code: {:.3}", report.accuracy());
    println!("Share with needs_review=true: {:.3}", report.review_rate());

    for mismatch in report.mismatches.iter().take(args.show_mismatches) {
        println!(
            "EXPECTED: {}, PREDICTED: {}, sku={}, reason={}",
            mismatch.expected_code,
            mismatch.predicted_code.as_deref().unwrap_or("-"),
            mismatch.sku_name,
            mismatch.reason
        );
    }

    Ok(())
}

/// Print the categories an ingredient maps to
pub fn lookup(args: &LookupArgs) -> anyhow::Result<()> {
    let index = build_index(&args.taxonomy)?;
    let matches = index.find_by_ingredient(&args.ingredient);

    println!("{}", serde_json::to_string_pretty(&json!({
        "ingredient": args.ingredient,
        "matches": matches.len(),
        "categories": matches,
    }))?);

    Ok(())
}
