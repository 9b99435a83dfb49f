use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const COL_ID: &str = "id";
pub const COL_TEXT: &str = "text";
pub const COL_SOURCE: &str = "source";
pub const COL_OWNER: &str = "owner_id";
pub const COL_INDEXED_AT: &str = "indexed_at";
pub const COL_VECTOR: &str = "vector";
/// Distance column LanceDB appends to vector query results.
pub const COL_DISTANCE: &str = "_distance";

pub fn build_passage_schema(dim: i32) -> Arc<Schema> {
    let item = Arc::new(Field::new("item", DataType::Float32, true));
    Arc::new(Schema::new(vec![
        Field::new(COL_ID, DataType::Utf8, false),
        Field::new(COL_TEXT, DataType::Utf8, false),
        Field::new(COL_SOURCE, DataType::Utf8, false),
        Field::new(COL_OWNER, DataType::Int64, false),
        Field::new(COL_INDEXED_AT, DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new(COL_VECTOR, DataType::FixedSizeList(item, dim), true),
    ]))
}

/// Width of the vector column, if the schema has one.
pub fn vector_width(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(COL_VECTOR).ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}
