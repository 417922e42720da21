//! Reference search orchestration.
//!
//! A search fans out one backend run per (root, extension) pair, joins them
//! all, then walks the concatenated output in scheduling order, resolving
//! every hit against the caller's [`EntityResolver`].

use crate::backend::{ProcessBackend, SearchBackend, SearchTool};
use crate::error::SearchError;
use crate::parser::{parse_output, Hit};
use crate::resolver::EntityResolver;
use crate::types::{EntityRef, SearchRequest, SearchResult, MAX_RESULTS, MIN_SEARCH_LEN};
use assetref_core::config::AppConfig;
use assetref_core::path_utils::to_logical_path;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Orchestrator {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
    min_search_len: usize,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            max_results: MAX_RESULTS,
            min_search_len: MIN_SEARCH_LEN,
        }
    }

    /// Process backend for the configured (or platform) tool and limits.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        let tool = match config.search_tool.as_deref() {
            Some(name) => name.parse::<SearchTool>()?,
            None => SearchTool::platform_default(),
        };
        Ok(Self::new(Arc::new(ProcessBackend::new(tool))).with_limits(config.max_results, config.min_search_len))
    }

    pub fn with_limits(mut self, max_results: usize, min_search_len: usize) -> Self {
        self.max_results = max_results.max(1);
        self.min_search_len = min_search_len;
        self
    }

    /// Backend used for every invocation; the CLI's doctor reports on it.
    pub fn backend(&self) -> &dyn SearchBackend {
        self.backend.as_ref()
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        resolver: &dyn EntityResolver,
    ) -> Result<SearchResult, SearchError> {
        self.search_with_cancel(request, resolver, &CancellationToken::new()).await
    }

    /// Runs a search. Only a too-short search text is an `Err`; tool
    /// failures, cancellation and the result cap are reported as flags on
    /// the returned result.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        resolver: &dyn EntityResolver,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        let text = request.search_text();
        if text.trim().chars().count() < self.min_search_len {
            return Err(SearchError::InvalidArgument(format!(
                "Search text must be at least {} characters",
                self.min_search_len
            )));
        }

        let started = Instant::now();
        let mut result = SearchResult::new(text);
        result.target_entity = resolver.resolve_identifier(text);

        if !self.backend.is_available() {
            warn!("⚠️ Search tool '{}' is not available; no search was run", self.backend.tool_name());
            result.search_unavailable = true;
            result.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(result);
        }

        let invocations = request.invocations();
        let scheduled = invocations.len();
        debug!("Scheduling {} invocations for '{}'", scheduled, text);

        let handles: Vec<_> = invocations
            .into_iter()
            .map(|inv| {
                let backend = Arc::clone(&self.backend);
                let cancel = cancel.clone();
                let meta = (inv.root.clone(), inv.extension.clone());
                let handle = tokio::spawn(async move { backend.run(&inv, &cancel).await });
                (meta, handle)
            })
            .collect();

        // Join barrier: outputs are kept in scheduling order.
        let mut outputs: Vec<String> = Vec::with_capacity(scheduled);
        let mut missing_tool: Option<String> = None;
        let mut failed = 0usize;

        for ((root, extension), handle) in handles {
            match handle.await {
                Ok(Ok(out)) => outputs.push(out),
                Ok(Err(SearchError::Cancelled)) => {}
                Ok(Err(SearchError::ToolMissing(tool))) => {
                    failed += 1;
                    missing_tool = Some(tool);
                }
                Ok(Err(e)) => {
                    failed += 1;
                    warn!("{}", e);
                }
                Err(e) => {
                    failed += 1;
                    warn!("Search task for {} (*.{}) aborted: {}", root.display(), extension, e);
                }
            }
        }

        result.failed_invocations = failed;

        if let Some(tool) = &missing_tool {
            warn!("⚠️ Search tool '{}' could not be started; affected searches returned nothing", tool);
        }
        // Only a tool that cannot be started makes the search unavailable;
        // missing roots or permission errors are ordinary failures.
        if missing_tool.is_some() && outputs.is_empty() {
            result.search_unavailable = true;
        }

        if cancel.is_cancelled() {
            info!("🛑 Search for '{}' cancelled", text);
            result.cancelled = true;
            result.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(result);
        }

        let combined = outputs.join("\n");
        collect_hits(&combined, request.root_directories(), resolver, self.max_results, &mut result);

        result.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "🔎 Search for '{}' finished in {} ms: {} matched, {} unresolved{}",
            text,
            result.elapsed_ms,
            result.matched_entities.len(),
            result.unresolved_paths.len(),
            if result.truncated { " (truncated)" } else { "" }
        );

        Ok(result)
    }
}

/// Resolves every hit in `output` into `result`, first occurrence wins.
///
/// Stops once `matched + unresolved` reaches `max_results`; the hit that
/// reaches the cap is kept. `truncated` is set only when a later line would
/// still have added an entity or path not yet in the result.
pub fn collect_hits(
    output: &str,
    roots: &[PathBuf],
    resolver: &dyn EntityResolver,
    max_results: usize,
    result: &mut SearchResult,
) {
    let mut seen_entities: HashSet<EntityRef> = result.matched_entities.iter().cloned().collect();
    let mut seen_paths: HashSet<String> = result.unresolved_paths.iter().cloned().collect();

    let mut hits = parse_output(output);
    while result.total() < max_results {
        let Some(hit) = hits.next() else {
            return;
        };

        match classify(&hit, roots, resolver) {
            Classified::Entity(entity) => {
                if seen_entities.insert(entity.clone()) {
                    result.matched_entities.push(entity);
                }
            }
            Classified::Path(raw_path) => {
                if seen_paths.insert(raw_path.clone()) {
                    result.unresolved_paths.push(raw_path);
                }
            }
        }
    }

    result.truncated = hits.any(|hit| match classify(&hit, roots, resolver) {
        Classified::Entity(entity) => !seen_entities.contains(&entity),
        Classified::Path(raw_path) => !seen_paths.contains(&raw_path),
    });
}

enum Classified {
    Entity(EntityRef),
    /// Raw `path:line` as printed by the tool.
    Path(String),
}

fn classify(hit: &Hit<'_>, roots: &[PathBuf], resolver: &dyn EntityResolver) -> Classified {
    let logical = to_logical_path(hit.path, roots);
    match resolver.resolve(&logical, hit.line) {
        Some(entity) => Classified::Entity(entity),
        None => Classified::Path(format!("{}:{}", hit.path, hit.line)),
    }
}
