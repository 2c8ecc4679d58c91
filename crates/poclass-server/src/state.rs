//! Shared application state

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use poclass_classifiers::{
    ClassificationCascade, ModelBundle, OpenAiCompatClient, RuleEngine, SupplierKnowledge,
};
use poclass_core::{Taxonomy, Triple};
use poclass_store::{FileCache, JsonlRecordStore, RecordStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub cascade: Arc<ClassificationCascade>,
    pub records: Arc<dyn RecordStore>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the cascade and stores from configuration
    ///
    /// The taxonomy and the rule overrides are mandatory; a broken model
    /// artifact only disables the statistical stage.
    pub fn from_config(config: &AppConfig, metrics: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let taxonomy = Taxonomy::from_file(&config.taxonomy_path).with_context(|| {
            format!("Failed to load taxonomy from {}", config.taxonomy_path.display())
        })?;
        info!(
            version = taxonomy.version(),
            categories = taxonomy.len(),
            "Taxonomy loaded"
        );

        let rules = match &config.rules {
            Some(rules) => RuleEngine::new(rules.clone()).context("Invalid rules")?,
            None => RuleEngine::default(),
        };
        let suppliers = match &config.suppliers {
            Some(hints) => SupplierKnowledge::new(hints.clone()).context("Invalid supplier hints")?,
            None => SupplierKnowledge::default(),
        };
        for triple in uncovered_triples(&taxonomy, &rules, &suppliers) {
            warn!(category = %triple, "Rule or supplier result is not in taxonomy {}", taxonomy.version());
        }

        let mut builder = ClassificationCascade::builder(Arc::new(taxonomy))
            .config((&config.cascade).into())
            .rules(rules)
            .suppliers(suppliers);

        let cache = FileCache::open(&config.cache_path).with_context(|| {
            format!("Failed to open result cache {}", config.cache_path.display())
        })?;
        builder = builder.cache(Arc::new(cache));

        let model = match ModelBundle::load(&config.model_path) {
            Ok(model) => model,
            Err(e) => {
                warn!("Statistical model disabled: {}", e);
                None
            }
        };
        builder = builder.model(model);

        if config.llm.enabled {
            let api_key = config.llm.api_key();
            if api_key.is_none() {
                warn!("{} is not set, language model calls will be unauthenticated", config.llm.api_key_env);
            }
            let client = OpenAiCompatClient::new(
                &config.llm.base_url,
                api_key,
                &config.llm.model,
                config.llm.timeout(),
            )?;
            info!(model = %config.llm.model, base_url = %config.llm.base_url, "Language model configured");
            builder = builder.llm(Arc::new(client), config.llm.retry_config());
        } else {
            info!("Language model stage disabled");
        }

        Ok(Self {
            cascade: Arc::new(builder.build()),
            records: Arc::new(JsonlRecordStore::new(&config.records_path)),
            metrics,
        })
    }
}

/// Distinct rule and supplier results the taxonomy does not list
///
/// The all-"Not sure" triple is always allowed.
fn uncovered_triples(
    taxonomy: &Taxonomy,
    rules: &RuleEngine,
    suppliers: &SupplierKnowledge,
) -> Vec<Triple> {
    let not_sure = Triple::not_sure();
    let mut uncovered: Vec<Triple> = Vec::new();
    let results = rules
        .rules()
        .iter()
        .map(|rule| &rule.result)
        .chain(suppliers.hints().iter().map(|hint| &hint.result));
    for triple in results {
        if *triple != not_sure && !taxonomy.contains(triple) && !uncovered.contains(triple) {
            uncovered.push(triple.clone());
        }
    }
    uncovered
}
