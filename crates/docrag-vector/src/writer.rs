use arrow_array::types::Float32Type;
use arrow_array::{
    FixedSizeListArray, Int64Array, RecordBatch, StringArray, TimestampMillisecondArray,
};
use std::sync::Arc;

use docrag_core::types::IndexedPassage;
use docrag_core::{Error, Result};

use crate::schema::build_passage_schema;

/// Row id for a passage. Includes the write time and batch position so that
/// identical passages written twice stay distinct rows.
pub fn passage_id(passage: &IndexedPassage, written_at_ms: i64, position: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&passage.owner_id.to_le_bytes());
    hasher.update(passage.source.as_bytes());
    hasher.update(&[0]);
    hasher.update(passage.text.as_bytes());
    hasher.update(&written_at_ms.to_le_bytes());
    hasher.update(&(position as u64).to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

pub fn passages_to_record_batch(
    passages: &[IndexedPassage],
    dim: usize,
    written_at_ms: i64,
) -> Result<RecordBatch> {
    let width = i32::try_from(dim)
        .map_err(|_| Error::Index(format!("vector width {} out of range", dim)))?;
    let mut ids = Vec::with_capacity(passages.len());
    let mut texts = Vec::with_capacity(passages.len());
    let mut sources = Vec::with_capacity(passages.len());
    let mut owners = Vec::with_capacity(passages.len());
    let mut times = Vec::with_capacity(passages.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(passages.len());
    for (i, p) in passages.iter().enumerate() {
        if p.vector.len() != dim {
            return Err(Error::DimensionMismatch { expected: dim, got: p.vector.len() });
        }
        ids.push(passage_id(p, written_at_ms, i));
        texts.push(p.text.clone());
        sources.push(p.source.clone());
        owners.push(p.owner_id);
        times.push(written_at_ms);
        vectors.push(Some(p.vector.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(
        build_passage_schema(width),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(sources)),
            Arc::new(Int64Array::from(owners)),
            Arc::new(TimestampMillisecondArray::from(times)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vectors.into_iter(),
                width,
            )),
        ],
    )
    .map_err(|e| Error::Index(format!("building record batch: {}", e)))?;
    Ok(record_batch)
}
