//! Boundary between the query algebra and a search engine.
//!
//! The crate never talks to an engine itself. It compiles a [`Query`] into a
//! search document and hands it to a [`SearchBackend`], which returns
//! ordered [`Hit`]s. Document writes go through [`DocumentStore`]; the
//! [`Index`] façade ties both to one index name.
//!
//! [`memory::MemoryBackend`] implements both traits in-process and is what
//! the tests and the `oqr find` command run against.
//!
//! # Examples
//!
//! ```
//! use oqr::executor::{Index, memory::MemoryBackend};
//! use oqr::{Condition, Limit};
//! use serde_json::json;
//!
//! let mut index = Index::new(MemoryBackend::new(), "items");
//! index.insert_one(json!({"name": "a", "value": 1}), None).unwrap();
//! index.insert_one(json!({"name": "b", "value": 5}), None).unwrap();
//!
//! let hits = index.find(Condition::gt("value", 2) & Limit::from(10)).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].source["name"], "b");
//! ```

pub mod memory;

use serde_json::{Map, Value};

use crate::{
    ast::Query,
    compiler,
    config::Config,
    error::{CompileError, MongoError},
    mongo,
};

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: Option<f64>,
    pub source: Value,
}

/// Outcome of a write through [`DocumentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Deleted,
}

/// Executes compiled search documents.
///
/// Implementations own transport, retries and pagination; they are expected
/// to honour the document's `size` field.
pub trait SearchBackend {
    type Error: std::error::Error + 'static;

    fn search(&self, index: &str, body: &Value) -> Result<Vec<Hit>, Self::Error>;
}

/// Document writes addressed by identifier.
pub trait DocumentStore: SearchBackend {
    /// Store `document`, returning its identifier (generated when `id` is None).
    fn insert_one(&mut self, index: &str, document: Value, id: Option<String>) -> Result<String, Self::Error>;

    fn insert_many(&mut self, index: &str, documents: Vec<Value>) -> Result<Vec<String>, Self::Error> {
        documents
            .into_iter()
            .map(|doc| self.insert_one(index, doc, None))
            .collect()
    }

    /// Merge `update` into the stored document; with `upsert`, a missing
    /// document is created from `update`.
    fn update_one(
        &mut self,
        index: &str,
        id: &str,
        update: Map<String, Value>,
        upsert: bool,
    ) -> Result<WriteResult, Self::Error>;

    fn delete_one(&mut self, index: &str, id: &str) -> Result<WriteResult, Self::Error>;
}

/// Errors surfaced by [`Index`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError<E: std::error::Error + 'static> {
    #[error("failed to compile query: {0}")]
    Compile(#[source] CompileError),

    #[error("invalid mongo query: {0}")]
    Mongo(#[source] MongoError),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("backend error: {0}")]
    Backend(#[source] E),
}

/// A named index on top of a backend.
#[derive(Debug)]
pub struct Index<B> {
    backend: B,
    name: String,
    config: Config,
}

impl<B: SearchBackend> Index<B> {
    pub fn new(backend: B, name: impl Into<String>) -> Self {
        Index {
            backend,
            name: name.into(),
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Compiled document that [`Index::find`] would send.
    pub fn search_body(&self, query: impl Into<Query>) -> Result<Value, CompileError> {
        compiler::compile(&query.into(), &self.config)
    }

    pub fn find(&self, query: impl Into<Query>) -> Result<Vec<Hit>, IndexError<B::Error>> {
        let body = self.search_body(query).map_err(IndexError::Compile)?;
        tracing::debug!(index = %self.name, %body, "executing search");
        let hits = self
            .backend
            .search(&self.name, &body)
            .map_err(IndexError::Backend)?;
        tracing::debug!(index = %self.name, hits = hits.len(), "search finished");
        Ok(hits)
    }

    /// Search with a Mongo-style mapping; `{}` and `null` match everything.
    pub fn find_mongo(&self, query: &Value) -> Result<Vec<Hit>, IndexError<B::Error>> {
        let query = mongo::parse_query(query, &self.config).map_err(IndexError::Mongo)?;
        self.find(query)
    }
}

impl<B: DocumentStore> Index<B> {
    pub fn insert_one(&mut self, document: Value, id: Option<String>) -> Result<String, IndexError<B::Error>> {
        match &document {
            Value::Object(map) if !map.is_empty() => {}
            _ => {
                return Err(IndexError::InvalidDocument(
                    "document for insert_one must be a non-empty object".to_string(),
                ));
            }
        }
        let id = self
            .backend
            .insert_one(&self.name, document, id)
            .map_err(IndexError::Backend)?;
        tracing::debug!(index = %self.name, %id, "inserted document");
        Ok(id)
    }

    pub fn insert_many(&mut self, documents: Vec<Value>) -> Result<Vec<String>, IndexError<B::Error>> {
        if !documents.iter().all(Value::is_object) {
            return Err(IndexError::InvalidDocument(
                "documents for insert_many must all be objects".to_string(),
            ));
        }
        let ids = self
            .backend
            .insert_many(&self.name, documents)
            .map_err(IndexError::Backend)?;
        tracing::debug!(index = %self.name, count = ids.len(), "inserted documents");
        Ok(ids)
    }

    pub fn update_one(
        &mut self,
        id: &str,
        update: Value,
        upsert: bool,
    ) -> Result<WriteResult, IndexError<B::Error>> {
        let update = match update {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(IndexError::InvalidDocument(
                    "update for update_one must be a non-empty object".to_string(),
                ));
            }
        };
        let result = self
            .backend
            .update_one(&self.name, id, update, upsert)
            .map_err(IndexError::Backend)?;
        tracing::debug!(index = %self.name, %id, ?result, "updated document");
        Ok(result)
    }

    pub fn delete_one(&mut self, id: &str) -> Result<WriteResult, IndexError<B::Error>> {
        let result = self
            .backend
            .delete_one(&self.name, id)
            .map_err(IndexError::Backend)?;
        tracing::debug!(index = %self.name, %id, "deleted document");
        Ok(result)
    }
}
