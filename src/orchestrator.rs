//! RAG orchestrator for Abitur.
//!
//! Coordinates ingestion of the knowledge directory into the vector store and
//! serves retrieval, gating, and prompt building to the chat layer. One
//! orchestrator instance is shared per process; initialization is lazy and
//! runs at most once, with concurrent first calls awaiting the same in-flight
//! future.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::extract::{extractor_for, Chunk};
use crate::rag::{PromptBuilder, RelevanceGate};
use crate::vector_store::{
    EmbeddedRecord, FileVectorStore, MemoryVectorStore, SearchResult, VectorStore,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

/// Environment switch that forces a clear-and-reingest on startup.
const FORCE_REINGEST_ENV: &str = "ABITUR_FORCE_REINGEST";

/// The main orchestrator for the Abitur RAG pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompt_builder: PromptBuilder,
    gate: RelevanceGate,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    init: OnceCell<()>,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = Arc::new(
            OpenAIEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            )
            .with_batch_size(settings.embedding.batch_size as usize)
            .with_timeout(std::time::Duration::from_secs(settings.embedding.timeout_secs)),
        );

        let dimensions = settings.embedding.dimensions as usize;
        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new(dimensions)),
            _ => Arc::new(FileVectorStore::new(settings.store_path(), dimensions)),
        };

        Ok(Self::with_components(settings, prompts, embedder, vector_store))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        let gate = RelevanceGate::new().with_min_matches(settings.rag.gate_min_matches as usize);
        Self {
            settings,
            prompt_builder: PromptBuilder::new(prompts),
            gate,
            embedder,
            vector_store,
            init: OnceCell::new(),
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ensure one-time initialization has run.
    ///
    /// Concurrent callers share a single in-flight initialization; a failed
    /// attempt is not cached, so the next call retries.
    pub async fn ensure_initialized(&self) -> Result<()> {
        let force = self.settings.ingest.force || force_reingest_from_env();
        self.init
            .get_or_try_init(|| async {
                self.initialize(force).await?;
                Ok::<(), crate::error::AbiturError>(())
            })
            .await?;
        Ok(())
    }

    /// Initialize the vector store and ingest the knowledge directory.
    ///
    /// With `force`, the store is cleared and re-ingested. Otherwise a
    /// populated store skips ingestion entirely, so repeated process restarts
    /// spend no embedding calls.
    #[instrument(skip(self))]
    pub async fn initialize(&self, force: bool) -> Result<usize> {
        self.vector_store.initialize().await?;

        if force {
            info!("forced re-ingestion requested, clearing vector store");
            self.vector_store.clear().await?;
        } else if self.vector_store.count().await? > 0 {
            info!("vector store already populated, skipping ingestion");
            return Ok(0);
        }

        self.ingest_knowledge_dir().await
    }

    /// Extract, embed, and store every supported file in the knowledge
    /// directory. Returns the number of records added.
    async fn ingest_knowledge_dir(&self) -> Result<usize> {
        let knowledge_dir = self.settings.knowledge_dir();
        if !knowledge_dir.is_dir() {
            warn!(dir = %knowledge_dir.display(), "knowledge directory missing, store stays empty");
            return Ok(0);
        }

        let mut paths: Vec<_> = std::fs::read_dir(&knowledge_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut chunks: Vec<Chunk> = Vec::new();
        for path in &paths {
            match self.extract_file(path) {
                Ok(Some(file_chunks)) => {
                    info!(file = %path.display(), count = file_chunks.len(), "extracted chunks");
                    chunks.extend(file_chunks);
                }
                Ok(None) => {}
                Err(e) => {
                    // One bad file must not sink the whole batch.
                    warn!(file = %path.display(), "extraction failed, skipping: {}", e);
                }
            }
        }

        if chunks.is_empty() {
            info!("no chunks extracted from knowledge directory");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<EmbeddedRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedRecord::new(chunk.text, embedding, chunk.metadata))
            .collect();

        let count = records.len();
        self.vector_store.add_items(records).await?;
        info!(count, "ingestion complete");

        Ok(count)
    }

    fn extract_file(&self, path: &Path) -> Result<Option<Vec<Chunk>>> {
        match extractor_for(path) {
            Some(extractor) => extractor.extract(path).map(Some),
            None => Ok(None),
        }
    }

    /// Retrieve the text of the most relevant chunks for a query.
    ///
    /// Metadata and scores are dropped here; use [`Orchestrator::search`]
    /// when they are needed.
    pub async fn find_relevant_chunks(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let results = self.search(query, max_results).await?;
        Ok(results.into_iter().map(|r| r.text).collect())
    }

    /// Retrieve ranked search results with scores and provenance.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.ensure_initialized().await?;

        let query_embedding = self.embedder.embed(query).await?;
        let results = self.vector_store.search(&query_embedding, k).await?;

        info!(count = results.len(), "retrieved chunks for query");
        Ok(results)
    }

    /// Decide whether retrieved chunks actually answer the query.
    pub fn has_relevant_information(&self, chunks: &[String], query: &str) -> bool {
        self.gate.is_relevant(chunks, query)
    }

    /// Build the chat prompt for a query and its context chunks.
    pub fn create_prompt_with_context(&self, query: &str, chunks: &[String]) -> String {
        self.prompt_builder.create_prompt_with_context(query, chunks)
    }
}

fn force_reingest_from_env() -> bool {
    std::env::var(FORCE_REINGEST_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ChunkMetadata;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder that counts batch calls.
    struct CountingEmbedder {
        dimensions: usize,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.embed_batch(&[text.to_string()]).await?.remove(0))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; self.dimensions];
                    v[t.len() % self.dimensions] = 1.0;
                    v
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn orchestrator_with(
        settings: Settings,
        embedder: Arc<CountingEmbedder>,
        store: Arc<dyn VectorStore>,
    ) -> Orchestrator {
        let prompts = Prompts::load(None, None).unwrap();
        Orchestrator::with_components(settings, prompts, embedder, store)
    }

    fn settings_for(knowledge_dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.knowledge_dir = knowledge_dir.to_string_lossy().into_owned();
        settings
    }

    #[tokio::test]
    async fn test_populated_store_skips_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));

        store
            .add_items(vec![EmbeddedRecord::new(
                "существующий".to_string(),
                vec![1.0, 0.0, 0.0, 0.0],
                ChunkMetadata::new("old.txt", "s"),
            )])
            .await
            .unwrap();

        let orch = orchestrator_with(settings_for(dir.path()), embedder.clone(), store);
        let added = orch.initialize(false).await.unwrap();

        assert_eq!(added, 0);
        assert_eq!(embedder.calls(), 0, "no embedding calls on a populated store");
    }

    #[tokio::test]
    async fn test_ingestion_embeds_in_one_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("info.txt")).unwrap();
        writeln!(file, "Документы\nПаспорт и аттестат.\n\nСроки\nС 20 июня.").unwrap();

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        let orch = orchestrator_with(settings_for(dir.path()), embedder.clone(), store.clone());

        let added = orch.initialize(false).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(embedder.calls(), 1, "chunk texts embed as a single batch");
    }

    #[tokio::test]
    async fn test_bad_file_does_not_abort_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        // Invalid UTF-8 makes extraction fail for this file.
        std::fs::write(dir.path().join("broken.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        std::fs::write(dir.path().join("ok.txt"), "Общежитие\nМеста есть.\n").unwrap();

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        let orch = orchestrator_with(settings_for(dir.path()), embedder, store.clone());

        let added = orch.initialize(false).await.unwrap();
        assert_eq!(added, 1);
    }

    #[tokio::test]
    async fn test_missing_knowledge_dir_is_ready_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        let orch = orchestrator_with(settings_for(&missing), embedder, store);

        assert_eq!(orch.initialize(false).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_force_clears_and_reingests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Новый раздел\nНовый текст.\n").unwrap();

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        store
            .add_items(vec![EmbeddedRecord::new(
                "старый".to_string(),
                vec![0.0, 1.0, 0.0, 0.0],
                ChunkMetadata::new("old.txt", "s"),
            )])
            .await
            .unwrap();

        let orch = orchestrator_with(settings_for(dir.path()), embedder, store.clone());
        let added = orch.initialize(true).await.unwrap();

        assert_eq!(added, 1);
        let results = store.search(&[1.0, 0.0, 0.0, 0.0], 10).await.unwrap();
        assert!(results.iter().all(|r| r.text != "старый"));
    }

    #[tokio::test]
    async fn test_find_relevant_chunks_returns_text_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Раздел\nСодержимое раздела.\n").unwrap();

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        let orch = orchestrator_with(settings_for(dir.path()), embedder, store);

        let chunks = orch.find_relevant_chunks("Содержимое", 5).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("Содержимое раздела"));
    }

    #[tokio::test]
    async fn test_ensure_initialized_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Раздел\nТекст.\n").unwrap();

        let embedder = Arc::new(CountingEmbedder::new(4));
        let store = Arc::new(MemoryVectorStore::new(4));
        let orch = orchestrator_with(settings_for(dir.path()), embedder.clone(), store);

        orch.ensure_initialized().await.unwrap();
        orch.ensure_initialized().await.unwrap();

        assert_eq!(embedder.calls(), 1, "ingestion must not repeat");
    }
}
