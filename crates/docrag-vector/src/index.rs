use arrow_array::RecordBatchIterator;
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;

use docrag_core::traits::VectorIndex;
use docrag_core::types::{IndexedPassage, OwnerFilter, ScoredPassage};
use docrag_core::{Error, Result};

use crate::schema::{build_passage_schema, vector_width, COL_OWNER, COL_VECTOR};
use crate::search::batch_to_passages;
use crate::table::{ensure_table, open_db};
use crate::writer::passages_to_record_batch;

fn index_err(context: &str) -> impl Fn(lancedb::Error) -> Error + '_ {
    move |e| Error::Index(format!("{}: {}", context, e))
}

/// Passage store backed by a LanceDB table under a local directory.
///
/// Every `add` commits a new table version before returning, so a write is
/// on disk once `upsert` returns. Reopening the directory later sees every
/// committed passage without re-embedding.
pub struct LanceVectorIndex {
    table: Table,
    dim: usize,
}

impl LanceVectorIndex {
    /// Open (creating if needed) the passage table at `dir/table_name`.
    ///
    /// Fails with `IndexUnavailable` when storage cannot be opened or the
    /// existing table was built for a different embedding width.
    pub async fn open(dir: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let unavailable = |what: &str, e: &dyn std::fmt::Display| {
            Error::IndexUnavailable(format!("{} ({}): {}", what, dir.display(), e))
        };
        let width = i32::try_from(dim).map_err(|e| unavailable("vector width", &e))?;
        std::fs::create_dir_all(dir).map_err(|e| unavailable("creating index directory", &e))?;
        let conn = open_db(&dir.to_string_lossy())
            .await
            .map_err(|e| unavailable("connecting", &e))?;
        let created = ensure_table(&conn, table_name, build_passage_schema(width))
            .await
            .map_err(|e| unavailable("creating table", &e))?;
        let table = conn
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| unavailable("opening table", &e))?;
        let schema = table.schema().await.map_err(|e| unavailable("reading schema", &e))?;
        match vector_width(&schema) {
            Some(existing) if existing == dim => {}
            Some(existing) => {
                return Err(Error::IndexUnavailable(format!(
                    "table '{}' stores {}-dim vectors but the embedder produces {}",
                    table_name, existing, dim
                )))
            }
            None => {
                return Err(Error::IndexUnavailable(format!(
                    "table '{}' has no '{}' column",
                    table_name, COL_VECTOR
                )))
            }
        }
        tracing::info!(
            dir = %dir.display(),
            table = table_name,
            dim,
            created,
            "vector index opened"
        );
        Ok(Self { table, dim })
    }
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn upsert(&self, passages: &[IndexedPassage]) -> Result<()> {
        if passages.is_empty() {
            return Ok(());
        }
        let batch = passages_to_record_batch(passages, self.dim, Utc::now().timestamp_millis())?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        self.table.add(reader).execute().await.map_err(index_err("appending passages"))?;
        tracing::debug!(rows = passages.len(), "passages appended");
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        self.table.checkout_latest().await.map_err(index_err("checking out latest version"))?;
        let version = self.table.version().await.map_err(index_err("reading version"))?;
        tracing::debug!(version, "vector index persisted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: OwnerFilter,
    ) -> Result<Vec<ScoredPassage>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: query.len() });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        if self.table.count_rows(None).await.map_err(index_err("counting rows"))? == 0 {
            return Ok(Vec::new());
        }

        // Pre-filter: owner_id is applied before the top-k cut.
        let predicate = format!("{} = {}", COL_OWNER, filter.owner_id);
        let mut stream = self
            .table
            .vector_search(query.to_vec())
            .map_err(index_err("building vector query"))?
            .column(COL_VECTOR)
            .distance_type(DistanceType::Cosine)
            .only_if(predicate)
            .limit(k)
            .execute()
            .await
            .map_err(index_err("executing vector query"))?;

        let mut hits = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| Error::Index(format!("reading results: {}", e)))?
        {
            hits.extend(batch_to_passages(&batch)?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn clear(&self) -> Result<()> {
        self.table.delete("id IS NOT NULL").await.map_err(index_err("clearing table"))?;
        tracing::info!("vector index cleared");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.table.count_rows(None).await.map_err(index_err("counting rows"))
    }
}
