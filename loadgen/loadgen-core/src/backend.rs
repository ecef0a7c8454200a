//! Remote vector database seam.
//!
//! [`VectorBackend`] lists exactly the wire operations the load client issues.
//! [`QdrantBackend`] implements it over the gRPC `qdrant-client`; tests swap in
//! fakes.

use crate::config::{CollectionOptions, QdrantUserConfig, VectorSpace};
use crate::error::{LoadgenError, OperationError, Result};
use crate::request::{ScrollRequest, SearchRequest};
use async_trait::async_trait;
use qdrant_client::qdrant::points_selector::PointsSelectorOneOf;
use qdrant_client::qdrant::{
    CreateCollection, CreateCollectionBuilder, DeletePoints, DeletePointsBuilder, Distance,
    HnswConfigDiff, PointStruct, PointsOperationResponse, Query, QueryPoints, QueryPointsBuilder,
    QueryResponse, ScrollPoints, ScrollPointsBuilder, ScrollResponse, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

type OpResult<T> = std::result::Result<T, OperationError>;

/// Wire operations against one vector database.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> OpResult<bool>;

    async fn create_collection(
        &self,
        collection: &str,
        vectors: &VectorSpace,
        options: &CollectionOptions,
    ) -> OpResult<()>;

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> OpResult<PointsOperationResponse>;

    async fn query(&self, collection: &str, request: SearchRequest) -> OpResult<QueryResponse>;

    async fn scroll(&self, collection: &str, request: ScrollRequest) -> OpResult<ScrollResponse>;

    async fn delete(&self, collection: &str, selector: PointsSelectorOneOf) -> OpResult<PointsOperationResponse>;
}

#[async_trait]
impl<B: VectorBackend + ?Sized> VectorBackend for Arc<B> {
    async fn collection_exists(&self, collection: &str) -> OpResult<bool> {
        (**self).collection_exists(collection).await
    }

    async fn create_collection(
        &self,
        collection: &str,
        vectors: &VectorSpace,
        options: &CollectionOptions,
    ) -> OpResult<()> {
        (**self).create_collection(collection, vectors, options).await
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> OpResult<PointsOperationResponse> {
        (**self).upsert(collection, points).await
    }

    async fn query(&self, collection: &str, request: SearchRequest) -> OpResult<QueryResponse> {
        (**self).query(collection, request).await
    }

    async fn scroll(&self, collection: &str, request: ScrollRequest) -> OpResult<ScrollResponse> {
        (**self).scroll(collection, request).await
    }

    async fn delete(&self, collection: &str, selector: PointsSelectorOneOf) -> OpResult<PointsOperationResponse> {
        (**self).delete(collection, selector).await
    }
}

/// [`VectorBackend`] over a `qdrant_client::Qdrant` connection.
///
/// Upserts and deletes wait until the server has applied them, so the
/// measured time covers the whole write.
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    /// Build a client from configuration.
    ///
    /// The gRPC channel connects lazily, so an unreachable endpoint surfaces
    /// on the first operation rather than here.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::Config`] if the client cannot be built
    pub fn connect(config: &QdrantUserConfig) -> Result<Self> {
        info!("Connecting to Qdrant at {}", config.url);

        let mut client_config = qdrant_client::config::QdrantConfig::from_url(&config.url);
        client_config.set_timeout(config.timeout());

        if let Some(api_key) = &config.api_key {
            client_config.set_api_key(api_key);
        }

        if let Some(secs) = config.client.connect_timeout_secs {
            client_config.set_connect_timeout(Duration::from_secs(secs));
        }

        client_config.keep_alive_while_idle = config.client.keep_alive_while_idle;
        client_config.check_compatibility = config.client.check_compatibility;

        let client = Qdrant::new(client_config)
            .map_err(|e| LoadgenError::Config(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn collection_exists(&self, collection: &str) -> OpResult<bool> {
        Ok(self.client.collection_exists(collection).await?)
    }

    async fn create_collection(
        &self,
        collection: &str,
        vectors: &VectorSpace,
        options: &CollectionOptions,
    ) -> OpResult<()> {
        self.client
            .create_collection(create_collection_request(collection, vectors, options))
            .await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> OpResult<PointsOperationResponse> {
        Ok(self
            .client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?)
    }

    async fn query(&self, collection: &str, request: SearchRequest) -> OpResult<QueryResponse> {
        Ok(self.client.query(query_request(collection, request)).await?)
    }

    async fn scroll(&self, collection: &str, request: ScrollRequest) -> OpResult<ScrollResponse> {
        Ok(self.client.scroll(scroll_request(collection, request)).await?)
    }

    async fn delete(&self, collection: &str, selector: PointsSelectorOneOf) -> OpResult<PointsOperationResponse> {
        Ok(self
            .client
            .delete_points(delete_request(collection, selector))
            .await?)
    }
}

fn create_collection_request(
    collection: &str,
    vectors: &VectorSpace,
    options: &CollectionOptions,
) -> CreateCollection {
    let distance: Distance = vectors.distance.into();
    let mut vector_params = VectorParamsBuilder::new(vectors.size, distance);

    if let Some(hnsw) = &options.hnsw {
        vector_params = vector_params.hnsw_config(HnswConfigDiff {
            m: Some(hnsw.m),
            ef_construct: Some(hnsw.ef_construct),
            full_scan_threshold: Some(hnsw.full_scan_threshold),
            ..Default::default()
        });
    }
    if let Some(on_disk) = options.on_disk_vectors {
        vector_params = vector_params.on_disk(on_disk);
    }

    let mut builder = CreateCollectionBuilder::new(collection).vectors_config(vector_params);

    if let Some(shards) = options.shard_number {
        builder = builder.shard_number(shards);
    }
    if let Some(replicas) = options.replication_factor {
        builder = builder.replication_factor(replicas);
    }
    if let Some(on_disk) = options.on_disk_payload {
        builder = builder.on_disk_payload(on_disk);
    }

    builder.into()
}

fn query_request(collection: &str, request: SearchRequest) -> QueryPoints {
    let mut builder = QueryPointsBuilder::new(collection)
        .query(Query::new_nearest(request.query))
        .limit(request.limit)
        .with_payload(request.with_payload);

    if let Some(filter) = request.filter {
        builder = builder.filter(filter);
    }
    if let Some(params) = request.params {
        builder = builder.params(params);
    }

    builder.into()
}

fn scroll_request(collection: &str, request: ScrollRequest) -> ScrollPoints {
    let mut builder = ScrollPointsBuilder::new(collection)
        .limit(request.limit)
        .with_payload(request.with_payload);

    if let Some(filter) = request.filter {
        builder = builder.filter(filter);
    }
    if let Some(offset) = request.offset {
        builder = builder.offset(offset);
    }

    builder.into()
}

fn delete_request(collection: &str, selector: PointsSelectorOneOf) -> DeletePoints {
    DeletePointsBuilder::new(collection)
        .points(selector)
        .wait(true)
        .into()
}
