use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{self, Schema, Value as TantivyValue, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

use crate::error::Result;

/// BM25 full-text index mirroring the `content` table. One document per
/// chunk; `chunk_id` and `item_id` are stored as decimal strings so Tantivy's
/// term queries can address them directly.
pub struct TextIndex {
    index: Index,
    reader: IndexReader,
    writer: parking_lot::Mutex<IndexWriter>,
    chunk_id_field: schema::Field,
    item_id_field: schema::Field,
    text_field: schema::Field,
    title_field: schema::Field,
}

impl TextIndex {
    fn build_schema() -> (Schema, schema::Field, schema::Field, schema::Field, schema::Field) {
        let mut sb = Schema::builder();
        let chunk_id_field = sb.add_text_field("chunk_id", STRING | STORED);
        let item_id_field = sb.add_text_field("item_id", STRING | STORED);
        let text_field = sb.add_text_field("text", TEXT | STORED);
        let title_field = sb.add_text_field("title", TEXT);
        (sb.build(), chunk_id_field, item_id_field, text_field, title_field)
    }

    pub fn open(data_dir: &Path) -> Result<Self> {
        let index_path = data_dir.join("tantivy_index");
        std::fs::create_dir_all(&index_path)?;

        let (schema, chunk_id_field, item_id_field, text_field, title_field) = Self::build_schema();

        let dir = tantivy::directory::MmapDirectory::open(&index_path)?;
        let index = if Index::exists(&dir)? {
            Index::open_in_dir(&index_path)?
        } else {
            Index::create_in_dir(&index_path, schema)?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        let writer = index.writer(50_000_000)?;

        Ok(Self {
            index,
            reader,
            writer: parking_lot::Mutex::new(writer),
            chunk_id_field,
            item_id_field,
            text_field,
            title_field,
        })
    }

    pub fn index_chunk(&self, chunk_id: i64, item_id: i64, text: &str, title: &str) -> Result<()> {
        let writer = self.writer.lock();
        writer.add_document(doc!(
            self.chunk_id_field => chunk_id.to_string(),
            self.item_id_field => item_id.to_string(),
            self.text_field => text,
            self.title_field => title,
        ))?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// BM25-ranked chunk ids for `query`, highest score first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<(i64, f32)>> {
        let searcher = self.reader.searcher();
        let query_parser =
            QueryParser::for_index(&self.index, vec![self.text_field, self.title_field]);

        let parsed_query = match query_parser.parse_query(query) {
            Ok(q) => q,
            Err(_) => {
                let escaped = query.replace('"', "");
                let fallback = QueryParser::for_index(&self.index, vec![self.text_field]);
                fallback.parse_query(&format!("\"{}\"", escaped))?
            }
        };

        let top_docs = searcher.search(&parsed_query, &TopDocs::with_limit(k))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc = searcher.doc::<TantivyDocument>(doc_address)?;
            if let Some(id_text) = doc.get_first(self.chunk_id_field).and_then(|v| v.as_str()) {
                if let Ok(chunk_id) = id_text.parse::<i64>() {
                    results.push((chunk_id, score));
                }
            }
        }
        Ok(results)
    }

    pub fn delete_by_chunk(&self, chunk_id: i64) -> Result<()> {
        let writer = self.writer.lock();
        let term = tantivy::Term::from_field_text(self.chunk_id_field, &chunk_id.to_string());
        writer.delete_term(term);
        Ok(())
    }

    /// Delete every chunk belonging to an item — used by the cascading item delete.
    pub fn delete_by_item(&self, item_id: i64) -> Result<()> {
        self.reader.reload().ok();
        let searcher = self.reader.searcher();
        let mut writer = self.writer.lock();
        let item_id_str = item_id.to_string();
        let mut deleted = 0usize;

        for segment_reader in searcher.segment_readers() {
            let store_reader = segment_reader.get_store_reader(64)?;
            for doc_id in 0..segment_reader.max_doc() {
                if segment_reader.is_deleted(doc_id) {
                    continue;
                }
                let doc = store_reader.get::<TantivyDocument>(doc_id)?;
                let doc_item_id = doc.get_first(self.item_id_field).and_then(|v| v.as_str());
                if doc_item_id == Some(item_id_str.as_str()) {
                    if let Some(chunk_id) = doc.get_first(self.chunk_id_field).and_then(|v| v.as_str()) {
                        let term = tantivy::Term::from_field_text(self.chunk_id_field, chunk_id);
                        writer.delete_term(term);
                        deleted += 1;
                    }
                }
            }
        }

        if deleted > 0 {
            writer.commit()?;
            self.reader.reload()?;
            tracing::debug!(item_id, deleted, "removed item's chunks from text index");
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.delete_all_documents()?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.reader.searcher().num_docs() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn index_search_and_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let index = TextIndex::open(dir.path()).unwrap();

        index.index_chunk(1, 100, "the quick brown fox", "doc one").unwrap();
        index.index_chunk(2, 100, "jumps over the lazy dog", "doc one").unwrap();
        index.index_chunk(3, 200, "completely unrelated content", "doc two").unwrap();
        index.commit().unwrap();

        assert_eq!(index.count().unwrap(), 3);

        let hits = index.search("fox", 10).unwrap();
        assert_eq!(hits[0].0, 1);

        index.delete_by_item(100).unwrap();
        assert_eq!(index.count().unwrap(), 1);
    }
}
