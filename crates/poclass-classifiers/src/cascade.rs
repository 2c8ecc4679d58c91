//! Classification cascade
//!
//! Composes the stages into a strict waterfall. Each stage is consulted only
//! when every earlier stage abstained, and the first stage to accept decides:
//!
//! 1. Rule engine, when the firing rule's confidence reaches the acceptance threshold (cached)
//! 2. Supplier knowledge (cached)
//! 3. Result cache, returned exactly as stored
//! 4. Statistical model, when all three levels are confident (not cached)
//! 5. Language model with validation and retry, else the "Not sure" fallback (cached)
//!
//! `classify` never fails: cache errors degrade to a miss or a skipped write,
//! and the fallback is the documented worst case.

use crate::llm::{LlmClassifier, LlmClient, LlmConfig, LlmOutcome};
use crate::rules::RuleEngine;
use crate::statistical::{self, ModelBundle};
use crate::supplier::SupplierKnowledge;
use poclass_core::{Classification, ClassificationCache, Stage, Taxonomy, NOT_PROVIDED};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Acceptance thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig {
    /// Minimum rule confidence for the rule stage to accept
    pub rule_acceptance_threshold: f64,

    /// Minimum per-level probability for the statistical stage to accept
    pub min_model_confidence: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            rule_acceptance_threshold: 0.9,
            min_model_confidence: 0.55,
        }
    }
}

/// A classification plus the stage that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeResult {
    pub classification: Classification,
    pub stage: Stage,
    pub latency_us: u64,
}

/// The single public entry point for classifying purchase-order text
pub struct ClassificationCascade {
    taxonomy: Arc<Taxonomy>,
    rules: RuleEngine,
    suppliers: SupplierKnowledge,
    cache: Option<Arc<dyn ClassificationCache>>,
    model: Option<ModelBundle>,
    llm: Option<LlmClassifier>,
    config: CascadeConfig,
}

impl ClassificationCascade {
    /// Start building a cascade over the given taxonomy
    pub fn builder(taxonomy: Arc<Taxonomy>) -> CascadeBuilder {
        CascadeBuilder::new(taxonomy)
    }

    /// Classify a description; a missing supplier is recorded as "Not provided"
    pub async fn classify(&self, description: &str, supplier: Option<&str>) -> Classification {
        self.classify_detailed(description, supplier)
            .await
            .classification
    }

    /// Classify and report which stage decided
    pub async fn classify_detailed(&self, description: &str, supplier: Option<&str>) -> CascadeResult {
        let start = Instant::now();
        let supplier = supplier.unwrap_or(NOT_PROVIDED);

        let (classification, stage) = self.run(description, supplier).await;

        let latency_us = start.elapsed().as_micros() as u64;
        metrics::counter!("poclass_classifications_total", "stage" => stage.as_str()).increment(1);
        metrics::histogram!("poclass_cascade_latency_us").record(latency_us as f64);
        debug!(
            stage = %stage,
            category = %classification.triple(),
            confidence = classification.confidence,
            latency_us,
            "Classification complete"
        );

        CascadeResult {
            classification,
            stage,
            latency_us,
        }
    }

    async fn run(&self, description: &str, supplier: &str) -> (Classification, Stage) {
        if let Some(rule) = self.rules.apply_rules(description) {
            if rule.confidence >= self.config.rule_acceptance_threshold {
                let result = self.stamp(Classification::new(
                    description,
                    rule.triple,
                    rule.confidence,
                    rule.reason,
                ));
                self.store(description, supplier, &result);
                return (result, Stage::Rules);
            }
            debug!(
                confidence = rule.confidence,
                threshold = self.config.rule_acceptance_threshold,
                "Rule fired below acceptance threshold"
            );
        }

        if let Some(hint) = self.suppliers.hint_for(supplier) {
            let result = self.stamp(Classification::new(
                description,
                hint.triple,
                hint.confidence,
                hint.reason,
            ));
            self.store(description, supplier, &result);
            return (result, Stage::Supplier);
        }

        if let Some(cached) = self.lookup(description, supplier) {
            return (cached, Stage::Cache);
        }

        if let Some(bundle) = &self.model {
            if let Some(prediction) = statistical::predict(
                bundle,
                description,
                supplier,
                self.config.min_model_confidence,
            ) {
                let reason = format!(
                    "Statistical model prediction (weakest level probability {:.2})",
                    prediction.confidence
                );
                let result = self.stamp(Classification::new(
                    description,
                    prediction.triple,
                    prediction.confidence,
                    reason,
                ));
                return (result, Stage::Model);
            }
        }

        let Some(llm) = &self.llm else {
            debug!("No language model configured, returning fallback");
            return (self.stamp(Classification::fallback(description)), Stage::Fallback);
        };

        let (result, stage) = match llm.classify(description, supplier).await {
            LlmOutcome::Accepted(result) => (self.stamp(result), Stage::Llm),
            LlmOutcome::Exhausted(failures) => {
                warn!(
                    attempts = failures.len(),
                    "Language model produced no valid classification, using fallback"
                );
                (self.stamp(Classification::fallback(description)), Stage::Fallback)
            }
        };
        self.store(description, supplier, &result);
        (result, stage)
    }

    fn stamp(&self, classification: Classification) -> Classification {
        classification.with_taxonomy_version(self.taxonomy.version())
    }

    fn lookup(&self, description: &str, supplier: &str) -> Option<Classification> {
        let cache = self.cache.as_ref()?;
        match cache.get(description, supplier) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    fn store(&self, description: &str, supplier: &str, result: &Classification) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(description, supplier, result) {
                warn!("Cache write failed: {}", e);
            }
        }
    }

    /// Taxonomy the cascade validates against
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Whether a statistical model is loaded
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Whether a language model is configured
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }
}

/// Builder for [`ClassificationCascade`]
pub struct CascadeBuilder {
    taxonomy: Arc<Taxonomy>,
    rules: Option<RuleEngine>,
    suppliers: Option<SupplierKnowledge>,
    cache: Option<Arc<dyn ClassificationCache>>,
    model: Option<ModelBundle>,
    llm: Option<(Arc<dyn LlmClient>, LlmConfig)>,
    config: CascadeConfig,
}

impl CascadeBuilder {
    fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            rules: None,
            suppliers: None,
            cache: None,
            model: None,
            llm: None,
            config: CascadeConfig::default(),
        }
    }

    /// Replace the built-in rules
    pub fn rules(mut self, rules: RuleEngine) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Replace the built-in supplier hints
    pub fn suppliers(mut self, suppliers: SupplierKnowledge) -> Self {
        self.suppliers = Some(suppliers);
        self
    }

    /// Attach a result cache
    pub fn cache(mut self, cache: Arc<dyn ClassificationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a statistical model; `None` leaves the stage disabled
    pub fn model(mut self, model: Option<ModelBundle>) -> Self {
        self.model = model;
        self
    }

    /// Attach a language model client
    pub fn llm(mut self, client: Arc<dyn LlmClient>, config: LlmConfig) -> Self {
        self.llm = Some((client, config));
        self
    }

    /// Set acceptance thresholds
    pub fn config(mut self, config: CascadeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ClassificationCascade {
        let llm = self
            .llm
            .map(|(client, config)| LlmClassifier::new(client, Arc::clone(&self.taxonomy), config));

        ClassificationCascade {
            taxonomy: self.taxonomy,
            rules: self.rules.unwrap_or_default(),
            suppliers: self.suppliers.unwrap_or_default(),
            cache: self.cache,
            model: self.model,
            llm,
            config: self.config,
        }
    }
}
