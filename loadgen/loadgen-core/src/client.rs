//! Timed, non-failing Qdrant client for load scenarios.
//!
//! Every operation measures wall-clock time around one remote call and returns
//! an [`OperationResult`]. Remote errors are captured in the result and never
//! returned as `Err`; nothing is retried.

use crate::backend::{QdrantBackend, VectorBackend};
use crate::config::{CollectionOptions, QdrantUserConfig, VectorSpace};
use crate::error::{OperationError, Result};
use crate::request::{PointSelector, ScrollRequest, SearchRequest};
use crate::result::{OperationResult, Outcome, Provisioned, ScrollPage};
use qdrant_client::qdrant::{PointStruct, PointsOperationResponse, QueryResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Load-test client bound to a single collection.
pub struct QdrantLoadClient<B = QdrantBackend> {
    backend: B,
    collection_name: String,
}

impl QdrantLoadClient<QdrantBackend> {
    /// Connect to the configured Qdrant endpoint.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the collection name is missing or the
    /// client cannot be built
    pub fn connect(config: &QdrantUserConfig) -> Result<Self> {
        let collection_name = config.require_collection()?.to_string();
        let backend = QdrantBackend::connect(config)?;
        Ok(Self {
            backend,
            collection_name,
        })
    }
}

impl<B: VectorBackend> QdrantLoadClient<B> {
    /// Wrap an existing backend.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the collection name is missing
    pub fn with_backend(config: &QdrantUserConfig, backend: B) -> Result<Self> {
        let collection_name = config.require_collection()?.to_string();
        Ok(Self {
            backend,
            collection_name,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the collection unless it already exists.
    pub async fn create_collection(
        &self,
        vectors: &VectorSpace,
        options: &CollectionOptions,
    ) -> OperationResult<Provisioned> {
        let start = Instant::now();

        let exists = match self.backend.collection_exists(&self.collection_name).await {
            Ok(exists) => exists,
            Err(e) => return self.failed(start, "create_collection", e),
        };

        if exists {
            debug!("Collection '{}' already exists", self.collection_name);
            return OperationResult::since(start, Outcome::Success(Provisioned::AlreadyExists));
        }

        match self
            .backend
            .create_collection(&self.collection_name, vectors, options)
            .await
        {
            Ok(()) => {
                let result = OperationResult::since(start, Outcome::Success(Provisioned::Created));
                info!(
                    "Created collection '{}' (size={}, distance={:?})",
                    self.collection_name, vectors.size, vectors.distance
                );
                result
            }
            Err(e) => self.failed(start, "create_collection", e),
        }
    }

    pub async fn upsert(&self, points: Vec<PointStruct>) -> OperationResult<PointsOperationResponse> {
        let start = Instant::now();
        let count = points.len();

        match self.backend.upsert(&self.collection_name, points).await {
            Ok(response) => {
                let result = OperationResult::since(start, Outcome::Success(response));
                debug!("upsert {} points in {:.2}ms", count, result.response_time());
                result
            }
            Err(e) => self.failed(start, "upsert", e),
        }
    }

    /// Nearest-neighbour query. A response with no points is reported as
    /// empty, not successful.
    pub async fn search(&self, request: SearchRequest) -> OperationResult<QueryResponse> {
        let start = Instant::now();

        match self.backend.query(&self.collection_name, request).await {
            Ok(response) => {
                let matches = response.result.len();
                let outcome = if matches == 0 {
                    Outcome::Empty(response)
                } else {
                    Outcome::Success(response)
                };
                let result = OperationResult::since(start, outcome);
                debug!("search matched {} points in {:.2}ms", matches, result.response_time());
                result
            }
            Err(e) => self.failed(start, "search", e),
        }
    }

    /// One page of points. A page with no points is reported as empty.
    pub async fn scroll(&self, request: ScrollRequest) -> OperationResult<ScrollPage> {
        let start = Instant::now();

        match self.backend.scroll(&self.collection_name, request).await {
            Ok(response) => {
                let page = ScrollPage {
                    points: response.result,
                    next_offset: response.next_page_offset,
                };
                let matches = page.points.len();
                let outcome = if matches == 0 {
                    Outcome::Empty(page)
                } else {
                    Outcome::Success(page)
                };
                let result = OperationResult::since(start, outcome);
                debug!("scroll returned {} points in {:.2}ms", matches, result.response_time());
                result
            }
            Err(e) => self.failed(start, "scroll", e),
        }
    }

    /// Delete points. Succeeds whenever the call itself succeeds, whether or
    /// not the targeted points existed.
    pub async fn delete(&self, selector: impl Into<PointSelector>) -> OperationResult<PointsOperationResponse> {
        let start = Instant::now();
        let selector: PointSelector = selector.into();

        match self.backend.delete(&self.collection_name, selector.into()).await {
            Ok(response) => {
                let result = OperationResult::since(start, Outcome::Success(response));
                debug!("delete in {:.2}ms", result.response_time());
                result
            }
            Err(e) => self.failed(start, "delete", e),
        }
    }

    /// Release the connection.
    pub fn close(self) {
        debug!("Closing Qdrant client for collection '{}'", self.collection_name);
    }

    fn failed<T>(&self, start: Instant, operation: &str, err: OperationError) -> OperationResult<T> {
        let result = OperationResult::since(start, Outcome::Failure(Arc::new(err)));
        if let Some(cause) = result.failure() {
            warn!(
                "{} on '{}' failed after {:.2}ms: {}",
                operation,
                self.collection_name,
                result.response_time(),
                cause
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;
    use async_trait::async_trait;
    use mockall::mock;
    use qdrant_client::qdrant::points_selector::PointsSelectorOneOf;
    use qdrant_client::qdrant::{PointId, ScoredPoint, ScrollResponse};

    type OpResult<T> = std::result::Result<T, OperationError>;

    mock! {
        pub Backend {}

        #[async_trait]
        impl VectorBackend for Backend {
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
    }

    fn config() -> QdrantUserConfig {
        QdrantUserConfig::new("http://localhost:6334", "t")
    }

    fn space() -> VectorSpace {
        VectorSpace::new(4, DistanceMetric::Cosine)
    }

    #[test]
    fn test_missing_collection_rejected() {
        let result = QdrantLoadClient::with_backend(&QdrantUserConfig::default(), MockBackend::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_collection_when_absent() {
        let mut backend = MockBackend::new();
        backend
            .expect_collection_exists()
            .times(1)
            .returning(|_| Ok(false));
        backend
            .expect_create_collection()
            .withf(|name, vectors, _| name == "t" && vectors.size == 4)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();
        let result = client.create_collection(&space(), &CollectionOptions::default()).await;

        assert!(result.success());
        assert_eq!(result.result(), Some(&Provisioned::Created));
    }

    #[tokio::test]
    async fn test_create_collection_is_idempotent() {
        let mut backend = MockBackend::new();
        let mut exists = false;
        backend.expect_collection_exists().times(2).returning(move |_| {
            let current = exists;
            exists = true;
            Ok(current)
        });
        backend
            .expect_create_collection()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();
        let first = client.create_collection(&space(), &CollectionOptions::default()).await;
        let second = client.create_collection(&space(), &CollectionOptions::default()).await;

        assert_eq!(first.result(), Some(&Provisioned::Created));
        assert!(second.success());
        assert_eq!(second.result(), Some(&Provisioned::AlreadyExists));
    }

    #[tokio::test]
    async fn test_create_collection_failure_is_captured() {
        let mut backend = MockBackend::new();
        backend
            .expect_collection_exists()
            .returning(|_| Err(OperationError::Connection("refused".to_string())));
        backend.expect_create_collection().never();

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();
        let result = client.create_collection(&space(), &CollectionOptions::default()).await;

        assert!(!result.success());
        assert!(result.failure().is_some());
    }

    #[tokio::test]
    async fn test_search_success_depends_on_matches() {
        let mut backend = MockBackend::new();
        let mut calls = 0;
        backend.expect_query().times(2).returning(move |_, request| {
            assert_eq!(request.limit, 5);
            calls += 1;
            if calls == 1 {
                Ok(QueryResponse {
                    result: vec![ScoredPoint::default(), ScoredPoint::default()],
                    ..Default::default()
                })
            } else {
                Ok(QueryResponse::default())
            }
        });

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();

        let hit = client.search(SearchRequest::new(vec![0.0; 4]).limit(5)).await;
        assert!(hit.success());
        assert!(!hit.is_empty());
        assert_eq!(hit.result().map(|r| r.result.len()), Some(2));

        let miss = client.search(SearchRequest::new(vec![0.0; 4]).limit(5)).await;
        assert!(!miss.success());
        assert!(miss.is_empty());
        assert!(miss.failure().is_none());
    }

    #[tokio::test]
    async fn test_scroll_carries_next_offset() {
        let mut backend = MockBackend::new();
        backend.expect_scroll().returning(|_, _| {
            Ok(ScrollResponse {
                result: vec![Default::default()],
                next_page_offset: Some(11u64.into()),
                ..Default::default()
            })
        });

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();
        let result = client.scroll(ScrollRequest::new()).await;

        assert!(result.success());
        let page = result.result().unwrap();
        assert_eq!(page.points.len(), 1);
        assert_eq!(page.next_offset, Some(11u64.into()));
    }

    #[tokio::test]
    async fn test_operation_errors_never_escape() {
        let mut backend = MockBackend::new();
        backend
            .expect_upsert()
            .returning(|_, _| Err(OperationError::Connection("refused".to_string())));
        backend
            .expect_delete()
            .returning(|_, _| Err(OperationError::Connection("refused".to_string())));

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();

        let upsert = client.upsert(vec![]).await;
        assert!(!upsert.success());
        assert!(matches!(
            upsert.failure().map(|e| e.as_ref()),
            Some(OperationError::Connection(_))
        ));
        assert!(upsert.response_time() >= 0.0);

        let delete = client.delete(vec![1u64]).await;
        assert!(!delete.success());
        assert!(delete.failure().is_some());
    }

    #[tokio::test]
    async fn test_delete_passes_collection_and_ids() {
        let mut backend = MockBackend::new();
        backend
            .expect_delete()
            .withf(|name, selector| {
                name == "t"
                    && matches!(selector, PointsSelectorOneOf::Points(list) if list.ids == vec![PointId::from(404u64)])
            })
            .times(1)
            .returning(|_, _| Ok(PointsOperationResponse::default()));

        let client = QdrantLoadClient::with_backend(&config(), backend).unwrap();
        assert!(client.delete(vec![404u64]).await.success());
    }
}
