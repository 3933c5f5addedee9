use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential, ServerAddress, UpdateModifications};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::Connector;
use crate::domain::{infer_schema, DomainError, ResultEnvelope, StorageConfig, SCHEMA_SAMPLE_SIZE};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 27017;
const DEFAULT_DATABASE: &str = "test";
const DEFAULT_FIND_LIMIT: i64 = 100;

/// Read request: `{"collection": .., "filter"?, "sort"?, "skip"?, "limit"?, "projection"?}`.
/// Explicit `null` fields are treated as absent.
#[derive(Debug, Deserialize)]
struct FindRequest {
    collection: Option<String>,
    #[serde(default)]
    filter: Option<Map<String, Value>>,
    #[serde(default)]
    sort: Option<Map<String, Value>>,
    #[serde(default)]
    skip: Option<u64>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    projection: Option<Map<String, Value>>,
}

/// A validated read request, ready to hand to the driver.
#[derive(Debug, PartialEq)]
struct FindSpec {
    collection: String,
    filter: Document,
    sort: Document,
    skip: u64,
    limit: i64,
    /// `None` when the request asked for no projection.
    projection: Option<Document>,
}

/// Write request: `{"collection": .., "operation": .., "document"|"documents"|"filter"|"update"}`.
#[derive(Debug, Deserialize)]
struct WriteRequest {
    collection: Option<String>,
    operation: Option<String>,
    document: Option<Map<String, Value>>,
    documents: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    filter: Option<Map<String, Value>>,
    update: Option<Value>,
}

#[derive(Debug)]
enum WriteOperation {
    InsertOne(Document),
    InsertMany(Vec<Document>),
    UpdateOne(Document, UpdateModifications),
    UpdateMany(Document, UpdateModifications),
    DeleteOne(Document),
    DeleteMany(Document),
}

impl WriteOperation {
    fn name(&self) -> &'static str {
        match self {
            WriteOperation::InsertOne(_) => "insertOne",
            WriteOperation::InsertMany(_) => "insertMany",
            WriteOperation::UpdateOne(..) => "updateOne",
            WriteOperation::UpdateMany(..) => "updateMany",
            WriteOperation::DeleteOne(_) => "deleteOne",
            WriteOperation::DeleteMany(_) => "deleteMany",
        }
    }
}

/// Document-store connector over the official MongoDB driver.
///
/// Queries and writes are JSON payloads (extended JSON accepted) naming the
/// target collection; results come back as relaxed extended JSON.
pub struct MongoDbConnector {
    config: StorageConfig,
    client: Mutex<Option<Client>>,
}

impl MongoDbConnector {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            config: config.clone(),
            client: Mutex::new(None),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    async fn client_options(&self) -> Result<ClientOptions, DomainError> {
        let conn = self.config.connection();
        if let Some(uri) = conn.uri.as_deref() {
            return ClientOptions::parse(uri)
                .await
                .map_err(|e| DomainError::configuration(format!("Invalid MongoDB URI: {}", e)));
        }

        let host = conn.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = conn.port.unwrap_or(DEFAULT_PORT);
        let address = ServerAddress::parse(format!("{}:{}", host, port))
            .map_err(|e| DomainError::configuration(format!("Invalid MongoDB address: {}", e)))?;

        let mut options = ClientOptions::default();
        options.hosts = vec![address];
        options.repl_set_name = conn.replica_set.clone();

        if let (Some(user), Some(password)) = (conn.user.as_deref(), conn.password.as_deref()) {
            let mut credential = Credential::default();
            credential.username = Some(user.to_string());
            credential.password = Some(password.to_string());
            credential.source = conn.auth_source.clone();
            options.credential = Some(credential);
        }

        Ok(options)
    }

    async fn client(&self) -> Result<Client, DomainError> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        debug!("Opening MongoDB client for {}", self.config.id());
        let client = Client::with_options(self.client_options().await?)
            .map_err(|e| DomainError::connection(e.to_string()))?;
        *guard = Some(client.clone());
        Ok(client)
    }

    async fn database(&self, schema: Option<&str>) -> Result<Database, DomainError> {
        let default = self
            .config
            .connection()
            .database
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE);
        Ok(self.client().await?.database(schema.unwrap_or(default)))
    }

    async fn run_query(&self, query: &str) -> Result<Value, DomainError> {
        let spec = parse_find_request(query)?;
        let collection: Collection<Document> =
            self.database(None).await?.collection(&spec.collection);

        let mut find = collection
            .find(spec.filter)
            .sort(spec.sort)
            .skip(spec.skip)
            .limit(spec.limit);
        if let Some(projection) = spec.projection {
            find = find.projection(projection);
        }

        let documents: Vec<Document> = find
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;
        let rows: Vec<Value> = documents.into_iter().map(document_to_json).collect();

        Ok(json!({
            "collection": spec.collection,
            "rowCount": rows.len(),
            "rows": rows,
        }))
    }

    async fn run_execute(&self, operation: &str) -> Result<Value, DomainError> {
        if !self.config.write_mode() {
            return Err(DomainError::WriteModeDisabled);
        }

        let (collection_name, operation) = parse_write_request(operation)?;
        let collection: Collection<Document> =
            self.database(None).await?.collection(&collection_name);
        let name = operation.name();

        let result = match operation {
            WriteOperation::InsertOne(document) => {
                let result = collection.insert_one(document).await.map_err(map_mongo_error)?;
                json!({ "insertedId": result.inserted_id.into_relaxed_extjson() })
            }
            WriteOperation::InsertMany(documents) => {
                let result = collection.insert_many(documents).await.map_err(map_mongo_error)?;
                let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
                ids.sort_by_key(|(index, _)| *index);
                let ids: Vec<Value> = ids.into_iter().map(|(_, id)| id.into_relaxed_extjson()).collect();
                json!({ "insertedCount": ids.len(), "insertedIds": ids })
            }
            WriteOperation::UpdateOne(filter, update) => {
                let result = collection.update_one(filter, update).await.map_err(map_mongo_error)?;
                json!({
                    "matchedCount": result.matched_count,
                    "modifiedCount": result.modified_count,
                    "upsertedId": result.upserted_id.map(Bson::into_relaxed_extjson),
                })
            }
            WriteOperation::UpdateMany(filter, update) => {
                let result = collection.update_many(filter, update).await.map_err(map_mongo_error)?;
                json!({
                    "matchedCount": result.matched_count,
                    "modifiedCount": result.modified_count,
                    "upsertedId": result.upserted_id.map(Bson::into_relaxed_extjson),
                })
            }
            WriteOperation::DeleteOne(filter) => {
                let result = collection.delete_one(filter).await.map_err(map_mongo_error)?;
                json!({ "deletedCount": result.deleted_count })
            }
            WriteOperation::DeleteMany(filter) => {
                let result = collection.delete_many(filter).await.map_err(map_mongo_error)?;
                json!({ "deletedCount": result.deleted_count })
            }
        };

        Ok(json!({
            "collection": collection_name,
            "operation": name,
            "result": result,
        }))
    }

    async fn run_list_collections(&self, schema: Option<&str>) -> Result<Value, DomainError> {
        let db = self.database(schema).await?;
        let mut names = db.list_collection_names().await.map_err(map_mongo_error)?;
        names.sort();

        Ok(json!({
            "collections": names,
            "count": names.len(),
            "database": db.name(),
        }))
    }

    async fn run_describe(&self, collection_name: &str, schema: Option<&str>) -> Result<Value, DomainError> {
        let db = self.database(schema).await?;
        let collection: Collection<Document> = db.collection(collection_name);

        let sample = async {
            collection
                .find(doc! {})
                .limit(SCHEMA_SAMPLE_SIZE as i64)
                .await?
                .try_collect::<Vec<Document>>()
                .await
        };
        let indexes = async {
            collection
                .list_indexes()
                .await?
                .try_collect::<Vec<IndexModel>>()
                .await
        };
        let (sample, indexes, estimated_count) = tokio::try_join!(
            sample,
            indexes,
            async { collection.estimated_document_count().await }
        )
        .map_err(map_mongo_error)?;

        let sample: Vec<Map<String, Value>> = sample
            .into_iter()
            .filter_map(|document| match document_to_json(document) {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        let indexes: Vec<Value> = indexes
            .iter()
            .filter_map(|index| bson::to_bson(index).ok())
            .map(Bson::into_relaxed_extjson)
            .collect();

        Ok(json!({
            "collection": collection_name,
            "database": db.name(),
            "estimatedCount": estimated_count,
            "indexes": indexes,
            "inferredSchema": infer_schema(&sample, SCHEMA_SAMPLE_SIZE),
            "sampleSize": sample.len(),
        }))
    }
}

#[async_trait]
impl Connector for MongoDbConnector {
    async fn query(&self, query: &str, _params: Option<&Value>) -> ResultEnvelope {
        let outcome = self.run_query(query).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "query": query }))
    }

    async fn execute(&self, operation: &str, _params: Option<&Value>) -> ResultEnvelope {
        let outcome = self.run_execute(operation).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "operation": operation }))
    }

    async fn list_collections(&self, schema: Option<&str>) -> ResultEnvelope {
        let outcome = self.run_list_collections(schema).await;
        ResultEnvelope::from_outcome(outcome, || json!({ "schema": schema }))
    }

    async fn describe_collection(&self, collection: &str, schema: Option<&str>) -> ResultEnvelope {
        let outcome = self.run_describe(collection, schema).await;
        ResultEnvelope::from_outcome(outcome, || {
            json!({ "collection": collection, "schema": schema })
        })
    }

    async fn disconnect(&self) {
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            client.shutdown().await;
            debug!("Closed MongoDB client for {}", self.config.id());
        }
    }

    fn storage_type(&self) -> &'static str {
        "mongodb"
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    serde_json::from_str(raw).map_err(|e| DomainError::malformed(format!("Invalid JSON payload: {}", e)))
}

fn parse_find_request(raw: &str) -> Result<FindSpec, DomainError> {
    let request: FindRequest = parse_payload(raw)?;
    let collection = request
        .collection
        .ok_or_else(|| DomainError::malformed("Missing \"collection\" field in query"))?;
    let projection = to_document(request.projection.unwrap_or_default())?;

    Ok(FindSpec {
        collection,
        filter: to_document(request.filter.unwrap_or_default())?,
        sort: to_document(request.sort.unwrap_or_default())?,
        skip: request.skip.unwrap_or(0),
        limit: match request.limit {
            Some(limit) if limit != 0 => limit,
            _ => DEFAULT_FIND_LIMIT,
        },
        projection: (!projection.is_empty()).then_some(projection),
    })
}

fn parse_write_request(raw: &str) -> Result<(String, WriteOperation), DomainError> {
    let request: WriteRequest = parse_payload(raw)?;
    let collection = request
        .collection
        .ok_or_else(|| DomainError::malformed("Missing \"collection\" field in operation"))?;
    let operation = request.operation.ok_or_else(|| {
        DomainError::malformed(
            "Missing \"operation\" field (insertOne, insertMany, updateOne, updateMany, deleteOne, deleteMany)",
        )
    })?;
    let filter = to_document(request.filter.unwrap_or_default())?;

    let operation = match operation.as_str() {
        "insertOne" => {
            let document = request
                .document
                .ok_or_else(|| DomainError::malformed("insertOne requires a \"document\""))?;
            WriteOperation::InsertOne(to_document(document)?)
        }
        "insertMany" => {
            let documents = request
                .documents
                .filter(|documents| !documents.is_empty())
                .ok_or_else(|| DomainError::malformed("insertMany requires non-empty \"documents\""))?;
            WriteOperation::InsertMany(
                documents
                    .into_iter()
                    .map(to_document)
                    .collect::<Result<_, _>>()?,
            )
        }
        "updateOne" => WriteOperation::UpdateOne(filter, to_update(request.update)?),
        "updateMany" => WriteOperation::UpdateMany(filter, to_update(request.update)?),
        "deleteOne" => WriteOperation::DeleteOne(filter),
        "deleteMany" => WriteOperation::DeleteMany(filter),
        other => {
            return Err(DomainError::malformed(format!("Unsupported operation: {}", other)));
        }
    };

    Ok((collection, operation))
}

fn to_document(map: Map<String, Value>) -> Result<Document, DomainError> {
    Document::try_from(map).map_err(|e| DomainError::malformed(format!("Invalid document: {}", e)))
}

fn to_update(update: Option<Value>) -> Result<UpdateModifications, DomainError> {
    match update {
        Some(Value::Object(map)) => Ok(UpdateModifications::Document(to_document(map)?)),
        Some(Value::Array(stages)) => {
            let pipeline = stages
                .into_iter()
                .map(|stage| match stage {
                    Value::Object(map) => to_document(map),
                    _ => Err(DomainError::malformed("Update pipeline stages must be objects")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(UpdateModifications::Pipeline(pipeline))
        }
        _ => Err(DomainError::malformed(
            "Update operations require an \"update\" document or pipeline",
        )),
    }
}

fn document_to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn map_mongo_error(e: mongodb::error::Error) -> DomainError {
    match *e.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => DomainError::connection(e.to_string()),
        _ => DomainError::query(e.to_string()),
    }
}
