//! Qdrant virtual user.
//!
//! [`QdrantUser`] wraps a [`QdrantLoadClient`] and reports every operation as
//! a [`RequestEvent`] so the statistics pipeline sees latency and failures.
//! Scenario users own one and call it from their tasks:
//!
//! ```no_run
//! use loadgen_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> loadgen_core::Result<()> {
//! let config = QdrantUserConfig::new("http://localhost:6334", "load_test_collection")
//!     .with_vectors(VectorSpace::new(128, DistanceMetric::Cosine));
//! let stats = Arc::new(StatsCollector::new());
//! let mut user = QdrantUser::start(config, stats.clone()).await?;
//!
//! let result = user.search(SearchRequest::new(vec![0.5; 128]).limit(5)).await;
//! if result.is_empty() {
//!     println!("nothing matched in {:.1}ms", result.response_time());
//! }
//!
//! user.stop();
//! # Ok(())
//! # }
//! ```

use crate::backend::{QdrantBackend, VectorBackend};
use crate::client::QdrantLoadClient;
use crate::config::QdrantUserConfig;
use crate::error::{LoadgenError, OperationError, Result};
use crate::events::{EventSink, RequestEvent, CLIENT_TYPE};
use crate::request::{PointSelector, ScrollRequest, SearchRequest};
use crate::result::{OperationResult, Outcome, ScrollPage};
use qdrant_client::qdrant::{PointStruct, PointsOperationResponse, QueryResponse};
use std::sync::Arc;
use tracing::{debug, info};

/// Virtual-user adapter for Qdrant operations.
pub struct QdrantUser<B: VectorBackend = QdrantBackend> {
    client: Option<QdrantLoadClient<B>>,
    events: Arc<dyn EventSink>,
}

impl QdrantUser<QdrantBackend> {
    /// Connect and, if vector parameters are configured, provision the
    /// collection.
    ///
    /// # Errors
    ///
    /// Fails without touching the network when the collection name is
    /// missing, and fails when provisioning fails
    pub async fn start(config: QdrantUserConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        let client = QdrantLoadClient::connect(&config)?;
        Self::provision(client, &config, events).await
    }
}

impl<B: VectorBackend> QdrantUser<B> {
    /// Same as [`QdrantUser::start`] over an existing backend.
    ///
    /// # Errors
    ///
    /// Fails when the collection name is missing or provisioning fails
    pub async fn with_backend(
        config: &QdrantUserConfig,
        backend: B,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let client = QdrantLoadClient::with_backend(config, backend)?;
        Self::provision(client, config, events).await
    }

    async fn provision(
        client: QdrantLoadClient<B>,
        config: &QdrantUserConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        if let Some(vectors) = &config.vectors {
            let result = client.create_collection(vectors, &config.collection).await;
            if let Outcome::Failure(cause) = result.into_outcome() {
                return Err(LoadgenError::Provisioning(cause));
            }
        }

        info!("Qdrant user ready on collection '{}'", client.collection_name());
        Ok(Self {
            client: Some(client),
            events,
        })
    }

    /// The underlying client, until the user is stopped.
    pub fn client(&self) -> Option<&QdrantLoadClient<B>> {
        self.client.as_ref()
    }

    pub async fn upsert(&self, points: Vec<PointStruct>) -> OperationResult<PointsOperationResponse> {
        let result = match &self.client {
            Some(client) => client.upsert(points).await,
            None => closed(),
        };
        self.fire_event("upsert", &result);
        result
    }

    pub async fn search(&self, request: SearchRequest) -> OperationResult<QueryResponse> {
        let result = match &self.client {
            Some(client) => client.search(request).await,
            None => closed(),
        };
        self.fire_event("search", &result);
        result
    }

    pub async fn scroll(&self, request: ScrollRequest) -> OperationResult<ScrollPage> {
        let result = match &self.client {
            Some(client) => client.scroll(request).await,
            None => closed(),
        };
        self.fire_event("scroll", &result);
        result
    }

    pub async fn delete(&self, selector: impl Into<PointSelector>) -> OperationResult<PointsOperationResponse> {
        let result = match &self.client {
            Some(client) => client.delete(selector).await,
            None => closed(),
        };
        self.fire_event("delete", &result);
        result
    }

    /// Release the connection. Later operations fail with
    /// [`OperationError::Closed`] without reaching the server.
    pub fn stop(&mut self) {
        if let Some(client) = self.client.take() {
            client.close();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.client.is_none()
    }

    fn fire_event<T>(&self, name: &str, result: &OperationResult<T>) {
        let event = RequestEvent::from_result(CLIENT_TYPE, name, result);
        debug!(
            "{} {} {}ms failed={}",
            event.request_type,
            event.name,
            event.response_time,
            event.is_failure()
        );
        self.events.fire(event);
    }
}

fn closed<T>() -> OperationResult<T> {
    OperationResult::new(0.0, Outcome::Failure(Arc::new(OperationError::Closed)))
}
