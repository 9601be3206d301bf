#[cfg(test)]
mod tests;

use super::{ChunkMetadata, EmbeddingRecord, join_variables, split_variables};
use crate::MsgForgeError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One named LanceDB table of chunks plus their embeddings. Two instances
/// serve the system: the `policies` collection and the `exemplars`
/// collection.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

/// Search result from vector similarity search. Higher similarity is more
/// relevant; results from one query come back sorted descending.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (or create) the named collection under `db_dir`. A missing
    /// index starts cold as an empty store rather than failing.
    #[inline]
    pub async fn open(
        db_dir: &Path,
        collection: &str,
        vector_dimension: usize,
    ) -> Result<Self, MsgForgeError> {
        debug!(
            "Initializing LanceDB collection '{}' at {:?}",
            collection, db_dir
        );

        std::fs::create_dir_all(db_dir).map_err(|e| {
            MsgForgeError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_dir.display());
        let connection = lancedb::connect(&uri).execute().await.map_err(|e| {
            MsgForgeError::Database(format!("Failed to connect to LanceDB: {}", e))
        })?;

        let store = Self {
            connection,
            table_name: collection.to_string(),
            vector_dimension,
        };

        store.initialize_table().await?;

        info!("Vector store '{}' initialized", store.table_name);
        Ok(store)
    }

    #[inline]
    pub fn collection(&self) -> &str {
        &self.table_name
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn initialize_table(&self) -> Result<(), MsgForgeError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            debug!("Table '{}' already exists", self.table_name);
            return Ok(());
        }

        let schema = self.create_schema();
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to create table: {}", e)))?;

        info!(
            "Created empty '{}' table with {} dimensions",
            self.table_name, self.vector_dimension
        );
        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("chunk_id", DataType::Utf8, false),
            Field::new("source_id", DataType::Utf8, false),
            Field::new("document_type", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, true),
            Field::new("business_type", DataType::Utf8, true),
            Field::new("content", DataType::Utf8, false),
            Field::new("variables", DataType::Utf8, false),
            Field::new("button", DataType::Utf8, true),
            Field::new("char_count", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Append a batch of embedding records. The add is a single LanceDB
    /// transaction: either the whole batch lands or none of it does, so a
    /// cancelled ingest never leaves a split index/metadata state.
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), MsgForgeError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        for record in &records {
            if record.vector.len() != self.vector_dimension {
                return Err(MsgForgeError::Ingest(format!(
                    "Embedding dimension mismatch: expected {}, got {} for chunk {}",
                    self.vector_dimension,
                    record.vector.len(),
                    record.metadata.chunk_id
                )));
            }
        }

        debug!(
            "Storing batch of {} embeddings into '{}'",
            records.len(),
            self.table_name
        );

        let record_batch = self.create_record_batch(&records)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to open table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to insert embeddings: {}", e)))?;

        info!(
            "Stored {} embeddings in '{}'",
            records.len(),
            self.table_name
        );
        Ok(())
    }

    fn create_record_batch(
        &self,
        records: &[EmbeddingRecord],
    ) -> Result<RecordBatch, MsgForgeError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut vectors = Vec::with_capacity(len);
        let mut chunk_ids = Vec::with_capacity(len);
        let mut source_ids = Vec::with_capacity(len);
        let mut document_types = Vec::with_capacity(len);
        let mut categories = Vec::with_capacity(len);
        let mut business_types = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut variables = Vec::with_capacity(len);
        let mut buttons = Vec::with_capacity(len);
        let mut char_counts = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            vectors.push(record.vector.clone());
            chunk_ids.push(record.metadata.chunk_id.as_str());
            source_ids.push(record.metadata.source_id.as_str());
            document_types.push(record.metadata.document_type.as_str());
            categories.push(record.metadata.category.as_deref());
            business_types.push(record.metadata.business_type.as_deref());
            contents.push(record.metadata.content.as_str());
            variables.push(join_variables(&record.metadata.variables));
            buttons.push(record.metadata.button.as_deref());
            char_counts.push(record.metadata.char_count);
            created_ats.push(record.metadata.created_at.as_str());
        }

        let schema = self.create_schema();

        let mut flat_values = Vec::with_capacity(len * self.vector_dimension);
        for vector in &vectors {
            flat_values.extend_from_slice(vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| MsgForgeError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(chunk_ids)),
            Arc::new(StringArray::from(source_ids)),
            Arc::new(StringArray::from(document_types)),
            Arc::new(StringArray::from(categories)),
            Arc::new(StringArray::from(business_types)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(variables)),
            Arc::new(StringArray::from(buttons)),
            Arc::new(UInt32Array::from(char_counts)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| MsgForgeError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest-neighbor search over the whole collection. An empty store
    /// returns an empty result set, never an error.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, MsgForgeError> {
        debug!(
            "Searching '{}' for similar vectors with limit {}",
            self.table_name, limit
        );

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to open table: {}", e)))?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| MsgForgeError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let results = query
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, MsgForgeError> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = parse_search_batch(&batch_result)?;
            search_results.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    /// Total number of chunks in this collection
    #[inline]
    pub async fn count(&self) -> Result<u64, MsgForgeError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Drop and recreate the collection. Used for wholesale re-ingestion.
    #[inline]
    pub async fn reset(&mut self) -> Result<(), MsgForgeError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| MsgForgeError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            warn!("Dropping collection '{}' for re-ingestion", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| MsgForgeError::Database(format!("Failed to drop table: {}", e)))?;
        }

        self.initialize_table().await
    }
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, MsgForgeError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| MsgForgeError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| MsgForgeError::Database(format!("Invalid {} column type", name)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, MsgForgeError> {
    let num_rows = batch.num_rows();
    let mut search_results = Vec::with_capacity(num_rows);

    let chunk_ids = string_column(batch, "chunk_id")?;
    let source_ids = string_column(batch, "source_id")?;
    let document_types = string_column(batch, "document_type")?;
    let categories = string_column(batch, "category")?;
    let business_types = string_column(batch, "business_type")?;
    let contents = string_column(batch, "content")?;
    let variables = string_column(batch, "variables")?;
    let buttons = string_column(batch, "button")?;
    let created_ats = string_column(batch, "created_at")?;

    let char_counts = batch
        .column_by_name("char_count")
        .ok_or_else(|| MsgForgeError::Database("Missing char_count column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| MsgForgeError::Database("Invalid char_count column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    for row in 0..num_rows {
        let optional = |column: &StringArray| {
            (!column.is_null(row)).then(|| column.value(row).to_string())
        };

        let metadata = ChunkMetadata {
            chunk_id: chunk_ids.value(row).to_string(),
            source_id: source_ids.value(row).to_string(),
            document_type: document_types.value(row).to_string(),
            category: optional(categories),
            business_type: optional(business_types),
            content: contents.value(row).to_string(),
            variables: split_variables(variables.value(row)),
            button: optional(buttons),
            char_count: char_counts.value(row),
            created_at: created_ats.value(row).to_string(),
        };

        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        // Convert distance to similarity score (higher is better)
        let similarity_score = 1.0 - distance;

        search_results.push(SearchResult {
            metadata,
            similarity_score,
            distance,
        });
    }

    Ok(search_results)
}
