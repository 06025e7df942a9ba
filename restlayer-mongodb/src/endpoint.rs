use futures::TryStreamExt;
use bson::Document;
use mongodb::{
    Collection as MongoCollection, Database,
    error::Error as MongoError,
    options::ReturnDocument,
};
use serde_json::Value;
use tracing::debug;

use restlayer_core::{
    error::{TranslateError, TranslateResult},
    schema::SchemaDescriptor,
    translate::Translator,
};


/// The operations of an auto-generated REST endpoint, executed against one collection.
///
/// Every method translates its input with the collection's [`Translator`] and hands the
/// result to the driver unmodified.
#[derive(Debug, Clone)]
pub struct MongoEndpoint {
    collection: MongoCollection<Document>,
    translator: Translator,
}

impl MongoEndpoint {
    pub fn new(collection: MongoCollection<Document>, translator: Translator) -> Self {
        Self { collection, translator }
    }

    /// Creates an endpoint for `name` in `database` with a default translator for `schema`.
    pub fn for_collection(database: &Database, name: &str, schema: SchemaDescriptor) -> Self {
        Self::new(database.collection(name), Translator::new(schema))
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Finds every document matching flat query parameters.
    pub async fn find<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> TranslateResult<Vec<Document>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.find_filter(self.translator.query_filter(params)).await
    }

    /// Finds every document matching a JSON search body.
    pub async fn search(&self, body: Value) -> TranslateResult<Vec<Document>> {
        self.find_filter(self.translator.search_filter(body)?).await
    }

    /// Runs a JSON aggregation pipeline.
    pub async fn aggregate(&self, body: Value) -> TranslateResult<Vec<Document>> {
        let pipeline = self.translator.aggregate_pipeline(body)?;
        debug!(collection = self.collection_name(), stages = pipeline.len(), "aggregate");

        self.collection
            .aggregate(pipeline)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    /// Inserts a JSON body and returns it with the `_id` the store assigned.
    pub async fn create(&self, body: Value) -> TranslateResult<Document> {
        let mut document = self.translator.insert_document(body)?;
        debug!(collection = self.collection_name(), "create");

        let result = self.collection
            .insert_one(&document)
            .await
            .map_err(backend_error)?;

        if !document.contains_key("_id") {
            document.insert("_id", result.inserted_id);
        }

        Ok(document)
    }

    /// Deletes the first document matching flat query parameters and returns it.
    pub async fn delete<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> TranslateResult<Option<Document>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = self.translator.query_filter(params);
        debug!(collection = self.collection_name(), ?filter, "delete");

        self.collection
            .find_one_and_delete(filter)
            .await
            .map_err(backend_error)
    }

    /// Updates the first document matching flat query parameters and returns the
    /// document as it is after the update.
    pub async fn update<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
        body: Value,
    ) -> TranslateResult<Option<Document>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = self.translator.query_filter(params);
        let update = self.translator.update_document(body)?;
        debug!(collection = self.collection_name(), ?filter, "update");

        self.collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_error)
    }

    async fn find_filter(&self, filter: Document) -> TranslateResult<Vec<Document>> {
        debug!(collection = self.collection_name(), ?filter, "find");

        self.collection
            .find(filter)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }
}

fn backend_error(err: MongoError) -> TranslateError {
    TranslateError::Backend(err.to_string())
}
