use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};

use docrag_core::types::{IndexedPassage, ScoredPassage};
use docrag_core::{Error, Result};

use crate::schema::{COL_DISTANCE, COL_OWNER, COL_SOURCE, COL_TEXT, COL_VECTOR};

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::Index(format!("result column '{}' missing or mistyped", name)))
}

/// Convert one vector query batch into scored passages.
///
/// Cosine distance `d` becomes similarity `1 - d`. The vector column is
/// optional in the result; passages come back with an empty vector without it.
pub fn batch_to_passages(batch: &RecordBatch) -> Result<Vec<ScoredPassage>> {
    let texts = column::<StringArray>(batch, COL_TEXT)?;
    let sources = column::<StringArray>(batch, COL_SOURCE)?;
    let owners = column::<Int64Array>(batch, COL_OWNER)?;
    let distances = column::<Float32Array>(batch, COL_DISTANCE).ok();
    let vectors = column::<FixedSizeListArray>(batch, COL_VECTOR).ok();
    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let vector = match vectors {
            Some(fsl) if fsl.is_valid(i) => {
                fsl.value(i).as_primitive::<Float32Type>().values().to_vec()
            }
            _ => Vec::new(),
        };
        let score = distances.map(|d| 1.0 - d.value(i)).unwrap_or(0.0);
        out.push(ScoredPassage {
            passage: IndexedPassage {
                vector,
                text: texts.value(i).to_string(),
                owner_id: owners.value(i),
                source: sources.value(i).to_string(),
            },
            score,
        });
    }
    Ok(out)
}
