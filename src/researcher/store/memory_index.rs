// SPDX-License-Identifier: MIT

//! Full-text index over memory records, ranked with BM25

use crate::adk::error::Result;
use parking_lot::Mutex;
use tantivy::collector::TopDocs;
use tantivy::doc;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub key: String,
    pub score: f32,
}

/// In-RAM tantivy index keyed by memory record key
pub struct MemoryIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    key_field: Field,
    content_field: Field,
}

impl MemoryIndex {
    pub fn in_memory() -> Result<Self> {
        let mut schema_builder = Schema::builder();
        let key_field = schema_builder.add_text_field("key", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let writer = index.writer(50_000_000)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            key_field,
            content_field,
        })
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Index `content` under `key`, replacing any earlier document
    pub fn upsert(&self, key: &str, content: &str) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.key_field, key));
        writer.add_document(doc!(
            self.key_field => key,
            self.content_field => content,
        ))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.key_field, key));
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Replace the whole index with `(key, content)` pairs
    pub fn rebuild<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut writer = self.writer.lock();
        writer.delete_all_documents()?;

        let mut count = 0usize;
        for (key, content) in entries {
            writer.add_document(doc!(
                self.key_field => key,
                self.content_field => content,
            ))?;
            count += 1;
        }

        writer.commit()?;
        self.reader.reload()?;
        Ok(count)
    }

    /// Best-scoring keys for a free-text query; any query term may match
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<IndexHit>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            log::debug!("Lenient parse of '{}' skipped: {:?}", query, errors);
        }

        let top_docs = searcher.search(parsed.as_ref(), &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let document: TantivyDocument = searcher.doc(address)?;
            let Some(value) = document.get_first(self.key_field) else {
                continue;
            };
            let Some(key) = value.as_str() else {
                continue;
            };
            hits.push(IndexHit {
                key: key.to_string(),
                score,
            });
        }

        Ok(hits)
    }
}
