//! Abitur - Admissions Knowledge Base RAG
//!
//! The retrieval core of a university admissions assistant: it ingests the
//! admissions knowledge base (spreadsheet exports and plain-text files) into an
//! embedding-backed vector store, retrieves the most similar chunks for a user
//! question, and decides whether what was retrieved is actually usable as
//! grounding context before a prompt is sent to the language model.
//!
//! # Overview
//!
//! Abitur allows you to:
//! - Ingest admissions documents into a searchable vector store
//! - Retrieve the most relevant knowledge-base chunks for a question
//! - Gate retrieved chunks with a lexical relevance check tuned for short
//!   Russian administrative text
//! - Build grounded prompts (or an honest fallback) for the chat model
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `extract` - Document-to-chunk extraction
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector store with flat-file persistence
//! - `rag` - Relevance gating, prompt building, and answer generation
//! - `orchestrator` - Ingestion and retrieval coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use abitur::config::Settings;
//! use abitur::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let chunks = orchestrator.find_relevant_chunks("сроки подачи документов", 3).await?;
//!     let relevant = orchestrator.has_relevant_information(&chunks, "сроки подачи документов");
//!     println!("{} chunks, relevant: {}", chunks.len(), relevant);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

pub use error::{AbiturError, Result};
