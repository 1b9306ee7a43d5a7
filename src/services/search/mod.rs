// Start of file: /src/services/search/mod.rs

// * Metasearch: fan a query out to every configured provider,
// * interleave the answers and describe how the mix came together.

pub mod analysis;
pub mod providers;
pub mod trends;

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::config::environment::EnvironmentVariables;
use crate::database::RedisService;
use crate::models::common::{elapsed_ms, Metadata};
use crate::models::search::{
    BiasAnalysis, Query, QueryInput, SearchIntent, SearchLocality, SearchMetadata, SearchRequest,
    SearchResponse, SearchResult,
};
use crate::utils::error_handler::ServiceError;

use self::providers::{http_client, BingProvider, GoogleProvider, ProviderError, SearchProvider};

const CACHE_TTL: Duration = Duration::from_secs(300);
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESULTS: usize = 100;
const MAX_TREND_LIMIT: usize = 50;

pub struct SearchService {
    providers: Vec<Arc<dyn SearchProvider>>,
    provider_timeout: Duration,
    cache: DashMap<String, (SearchResponse, Instant)>,
    cache_ttl: Duration,
    redis: Option<RedisService>,
}

impl SearchService {
    /// Registers Google when both key and cx are set, Bing when its key is set.
    pub fn new(env: &EnvironmentVariables, redis: Option<RedisService>) -> Self {
        let client: reqwest::Client = http_client(PROVIDER_TIMEOUT);
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

        if let (Some(key), Some(cx)) = (&env.google_api_key, &env.google_cx) {
            providers.push(Arc::new(GoogleProvider::new(client.clone(), key.as_str(), cx.as_str())));
        }
        if let Some(key) = &env.bing_api_key {
            providers.push(Arc::new(BingProvider::new(client, key.as_str())));
        }

        Self::with_providers(providers, redis)
    }

    pub fn with_providers(providers: Vec<Arc<dyn SearchProvider>>, redis: Option<RedisService>) -> Self {
        let service: Self = Self {
            providers,
            provider_timeout: PROVIDER_TIMEOUT,
            cache: DashMap::new(),
            cache_ttl: CACHE_TTL,
            redis,
        };
        info!("SearchService initialized with providers: {:?}", service.provider_names());
        service
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_owned()).collect()
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn redis(&self) -> Option<&RedisService> {
        self.redis.as_ref()
    }

    /// Requested names that are configured, or every provider when none match.
    fn select_providers(&self, requested: Option<&[String]>) -> Vec<Arc<dyn SearchProvider>> {
        let Some(requested) = requested.filter(|r| !r.is_empty()) else {
            return self.providers.clone();
        };

        let wanted: HashSet<String> = requested.iter().map(|p| p.trim().to_lowercase()).collect();
        let selected: Vec<Arc<dyn SearchProvider>> = self
            .providers
            .iter()
            .filter(|p| wanted.contains(p.name()))
            .cloned()
            .collect();

        if selected.is_empty() {
            warn!("No enabled providers found among requested: {requested:?}");
            return self.providers.clone();
        }
        selected
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, ServiceError> {
        let started: Instant = Instant::now();

        if self.providers.is_empty() {
            return Err(ServiceError::Unavailable(
                "No search providers are configured".to_owned(),
            ));
        }
        if request.query.text().trim().is_empty() {
            return Err(ServiceError::InvalidInput("Query text must not be empty".to_owned()));
        }
        if request.num_results == 0 || request.num_results > MAX_RESULTS {
            return Err(ServiceError::InvalidInput(format!(
                "num_results must be between 1 and {MAX_RESULTS}"
            )));
        }

        let query_started: Instant = Instant::now();
        let query: Query = match request.query {
            QueryInput::Text(text) => analysis::analyze_query(&text),
            QueryInput::Structured(query) => complete_query(query),
        };
        let query_processing_time: f64 = elapsed_ms(query_started);

        let selection_started: Instant = Instant::now();
        let selected: Vec<Arc<dyn SearchProvider>> = self.select_providers(request.providers.as_deref());
        let engines_used: Vec<String> = selected.iter().map(|p| p.name().to_owned()).collect();
        let engine_selection_time: f64 = elapsed_ms(selection_started);

        let num_results: usize = request.num_results;
        let cache_key: String = format!(
            "search:{}:{}:{}",
            query.text.trim().to_lowercase(),
            num_results,
            engines_used.join(",")
        );

        if let Some(hit) = self.cached(&cache_key).await {
            info!("Cache hit for query: {}", query.text);
            return Ok(hit);
        }

        let timeout: Duration = self.provider_timeout;
        let searches = selected.iter().map(|provider| {
            let provider: Arc<dyn SearchProvider> = provider.clone();
            let text: String = query.text.clone();

            async move {
                let name: String = provider.name().to_owned();
                let outcome: Result<Vec<SearchResult>, ProviderError> =
                    match tokio::time::timeout(timeout, provider.search(&text, num_results)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout),
                    };

                match outcome {
                    Ok(results) => {
                        info!("Provider {name} returned {} results", results.len());
                        (name, results)
                    }
                    Err(e) => {
                        error!("Error searching with provider {name}: {e}");
                        (name, Vec::new())
                    }
                }
            }
        });
        let provider_results: Vec<(String, Vec<SearchResult>)> = join_all(searches).await;

        let mut result_counts: BTreeMap<String, usize> = provider_results
            .iter()
            .map(|(name, results)| (name.clone(), results.len()))
            .collect();

        let (results, duplicates) = interleave(
            provider_results.into_iter().map(|(_, results)| results).collect(),
            num_results,
        );
        result_counts.insert("total".to_owned(), results.len());

        let deduplication_stats: BTreeMap<String, usize> = BTreeMap::from([
            ("duplicates_found".to_owned(), duplicates),
            ("removed".to_owned(), duplicates),
        ]);

        let response: SearchResponse = SearchResponse {
            metadata: SearchMetadata {
                base: Metadata::since(started),
                query_processing_time,
                engine_selection_time,
                engines_used,
                result_counts,
                aggregation_strategy: "interleaved".to_owned(),
                deduplication_stats,
                bias_analysis: Some(analyze_bias(&results)),
            },
            results,
            query,
        };

        self.store(cache_key, &response).await;
        Ok(response)
    }

    async fn cached(&self, key: &str) -> Option<SearchResponse> {
        if let Some(entry) = self.cache.get(key) {
            if entry.1.elapsed() < self.cache_ttl {
                return Some(entry.0.clone());
            }
        }

        let redis: &RedisService = self.redis.as_ref()?;
        match redis.get_json::<SearchResponse>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Redis cache read failed: {e:#}");
                None
            }
        }
    }

    async fn store(&self, key: String, response: &SearchResponse) {
        if let Some(redis) = &self.redis {
            if let Err(e) = redis.set_json(&key, response, self.cache_ttl.as_secs()).await {
                warn!("Redis cache write failed: {e:#}");
            }
        }
        self.cache.retain(|_, (_, at)| at.elapsed() < self.cache_ttl);
        self.cache.insert(key, (response.clone(), Instant::now()));
    }

    pub fn analyze_query(&self, text: &str) -> Result<Query, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Query text must not be empty".to_owned()));
        }
        Ok(analysis::analyze_query(text))
    }

    pub fn get_trends(
        &self,
        category: Option<&str>,
        limit: usize,
    ) -> Result<BTreeMap<String, Vec<String>>, ServiceError> {
        if limit == 0 || limit > MAX_TREND_LIMIT {
            return Err(ServiceError::InvalidInput(format!(
                "limit must be between 1 and {MAX_TREND_LIMIT}"
            )));
        }
        Ok(trends::trending(category, limit))
    }
}

// * Fills whatever the caller left out of a structured query
fn complete_query(mut query: Query) -> Query {
    let analysed: Query = analysis::analyze_query(&query.text);

    if query.intent == SearchIntent::Undefined {
        query.intent = analysed.intent;
    }
    if query.locality == SearchLocality::Undefined {
        query.locality = analysed.locality;
    }
    query.query_id = query.query_id.or(analysed.query_id);
    query.timestamp = query.timestamp.or(analysed.timestamp);
    query.processed_text = query.processed_text.or(analysed.processed_text);
    query
}

/// Lowercase scheme and host, no fragment, no trailing slash.
pub fn normalize_url(url: &str) -> String {
    let without_fragment: &str = url.split('#').next().unwrap_or(url).trim();

    let normalized: String = match without_fragment.split_once("://") {
        Some((scheme, rest)) => {
            let split_at: usize = rest.find(['/', '?']).unwrap_or(rest.len());
            let (host, tail) = rest.split_at(split_at);
            format!("{}://{}{}", scheme.to_lowercase(), host.to_lowercase(), tail)
        }
        None => without_fragment.to_owned(),
    };

    normalized.trim_end_matches('/').to_owned()
}

/// Host of a URL without `www.`.
pub fn domain_of(url: &str) -> String {
    let rest: &str = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let host: &str = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host: String = host.to_lowercase();
    host.strip_prefix("www.").map(str::to_owned).unwrap_or(host)
}

/// Round-robin merge in provider order, skipping URLs already taken.
/// Returns the merged list and the number of duplicates dropped.
pub fn interleave(lists: Vec<Vec<SearchResult>>, limit: usize) -> (Vec<SearchResult>, usize) {
    let mut queues: Vec<std::vec::IntoIter<SearchResult>> = lists.into_iter().map(Vec::into_iter).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<SearchResult> = Vec::new();
    let mut duplicates: usize = 0;

    'rounds: while merged.len() < limit {
        let mut added_any: bool = false;

        for queue in queues.iter_mut() {
            // Take this provider's next result that is not a duplicate
            for candidate in queue.by_ref() {
                if seen.insert(normalize_url(&candidate.url)) {
                    merged.push(candidate);
                    added_any = true;
                    break;
                }
                duplicates += 1;
            }

            if merged.len() >= limit {
                break 'rounds;
            }
        }

        if !added_any {
            break;
        }
    }

    (merged, duplicates)
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn analyze_bias(results: &[SearchResult]) -> BiasAnalysis {
    let total: usize = results.len();

    let mut per_provider: BTreeMap<&str, usize> = BTreeMap::new();
    let mut per_domain: BTreeMap<String, usize> = BTreeMap::new();
    let mut flags: BTreeMap<&str, usize> = BTreeMap::new();
    let mut ads: usize = 0;

    for result in results {
        *per_provider.entry(result.provider.as_str()).or_default() += 1;
        *per_domain.entry(domain_of(&result.url)).or_default() += 1;
        for flag in &result.dark_pattern_flags {
            *flags.entry(flag.as_str()).or_default() += 1;
        }
        if result.is_ad {
            ads += 1;
        }
    }

    let provider_share: Map<String, Value> = per_provider
        .iter()
        .map(|(name, count)| (name.to_string(), json!(share(*count, total))))
        .collect();

    let (top_domain, top_count) = per_domain
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(domain, count)| (Some(domain.clone()), *count))
        .unwrap_or((None, 0));

    let flag_counts: Map<String, Value> = flags
        .iter()
        .map(|(flag, count)| (flag.to_string(), json!(count)))
        .collect();

    let mut provider_bias: Map<String, Value> = Map::new();
    provider_bias.insert("provider_share".to_owned(), Value::Object(provider_share));

    let mut commercial_bias: Map<String, Value> = Map::new();
    commercial_bias.insert("ad_count".to_owned(), json!(ads));
    commercial_bias.insert("ad_share".to_owned(), json!(share(ads, total)));

    let mut source_bias: Map<String, Value> = Map::new();
    source_bias.insert("unique_domains".to_owned(), json!(per_domain.len()));
    source_bias.insert("top_domain".to_owned(), json!(top_domain));
    source_bias.insert("top_domain_share".to_owned(), json!(share(top_count, total)));

    let mut dark_patterns: Map<String, Value> = Map::new();
    dark_patterns.insert("flagged_results".to_owned(), json!(results.iter().filter(|r| !r.dark_pattern_flags.is_empty()).count()));
    dark_patterns.insert("flag_counts".to_owned(), Value::Object(flag_counts));

    BiasAnalysis {
        provider_bias,
        commercial_bias,
        source_bias,
        dark_patterns,
    }
}

// End of file: /src/services/search/mod.rs
