//! Command handlers.

use std::sync::Arc;

use quarry_core::Result;
use quarry_core::store::RecordStore;
use quarry_fts::{
    BackendKind, FilterPredicate, IndexRebuilder, QueryMode, RebuildEvent, RebuildStats,
    SearchBackend, SearchQuery, get_backend,
};

use crate::config::QuarryConfig;

/// Rebuild the index of `backend` from the configured record store.
///
/// Never prompts. Progress goes to stdout.
pub async fn update_index(
    config: &QuarryConfig,
    backend: &str,
    batch_size: usize,
) -> Result<RebuildStats> {
    let store: Arc<dyn RecordStore> = Arc::new(config.record_store()?);
    let search = get_backend(backend, &config.backend_registry(), Arc::clone(&store))?;
    let record_types = config.record_types();

    tracing::info!(
        backend = %backend,
        kind = %search.kind(),
        types = record_types.len(),
        "Rebuilding search index"
    );

    let stats = IndexRebuilder::new()
        .with_batch_size(batch_size)
        .with_progress(print_progress)
        .rebuild(search.as_ref(), &record_types, store.as_ref())
        .await?;

    println!(
        "Indexed {} documents across {} record types",
        stats.documents_indexed, stats.types_registered
    );
    Ok(stats)
}

fn print_progress(event: &RebuildEvent) {
    match event {
        RebuildEvent::Reset => println!("Index reset"),
        RebuildEvent::TypeRegistered(name) => println!("Registered {name}"),
        RebuildEvent::BatchIndexed { .. } => {}
        RebuildEvent::TypeFinished { record_type, count } => {
            println!("  {record_type}: {count} records")
        }
        RebuildEvent::Refreshed => println!("Index refreshed"),
    }
}

/// Options of one `search` invocation.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub text: String,
    pub record_type: String,
    pub filters: Vec<String>,
    pub backend: String,
    pub limit: Option<usize>,
    pub offset: usize,
    pub mode: Option<QueryMode>,
}

/// Run a search and print matching records as JSON lines.
///
/// A backend without a persisted index is populated from the record store
/// first.
pub async fn search(config: &QuarryConfig, args: SearchArgs) -> Result<usize> {
    let store: Arc<dyn RecordStore> = Arc::new(config.record_store()?);
    let backend = get_backend(&args.backend, &config.backend_registry(), Arc::clone(&store))?;
    let record_types = config.record_types();

    if backend.document_count() == 0 {
        tracing::debug!("Backend '{}' holds no index, building one", args.backend);
        IndexRebuilder::new()
            .rebuild(backend.as_ref(), &record_types, store.as_ref())
            .await?;
    } else {
        for record_type in record_types {
            backend.add_type(record_type).await?;
        }
        backend.refresh_index().await?;
    }

    let filters = args
        .filters
        .iter()
        .map(|f| FilterPredicate::parse(f))
        .collect::<Result<Vec<_>>>()?;
    let limit = args.limit.unwrap_or(backend.options().default_limit);

    let mut query = SearchQuery::new(&args.text, &args.record_type)
        .filters(filters)
        .window(args.offset..args.offset.saturating_add(limit));
    if let Some(mode) = args.mode {
        query = query.mode(mode);
    }

    let results = backend.search(query).await?;
    let records = results.records().await?;
    for record in &records {
        let line = serde_json::to_string(record)
            .map_err(|e| quarry_core::Error::parse(format!("Failed to encode record: {e}")))?;
        println!("{line}");
    }
    tracing::info!(shown = records.len(), "Search complete");
    Ok(records.len())
}

/// Print configured backends, then every built-in kind.
pub fn list_backends(config: &QuarryConfig) {
    let registry = config.backend_registry();
    println!("Configured:");
    for (name, entry) in registry.entries() {
        let status = match BackendKind::from_locator(&entry.backend) {
            Ok(kind) if kind.is_available() => "ok",
            Ok(_) => "not compiled in",
            Err(_) => "invalid locator",
        };
        println!("  {name:<16} {} ({status})", entry.backend);
    }
    println!("Built-in:");
    for kind in BackendKind::ALL {
        let status = if kind.is_available() {
            "available"
        } else {
            "not compiled in"
        };
        println!("  {:<16} {} ({status})", kind.name(), kind.locator());
    }
}

// ============================================================================
// Tests
// ============================================================================
