//! In-memory backends shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use loadgen_core::config::{CollectionOptions, VectorSpace};
use loadgen_core::{OperationError, ScrollRequest, SearchRequest, VectorBackend};
use parking_lot::Mutex;
use qdrant_client::qdrant::points_selector::PointsSelectorOneOf;
use qdrant_client::qdrant::{
    PointStruct, PointsOperationResponse, QueryResponse, RetrievedPoint,
    ScoredPoint, ScrollResponse,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type OpResult<T> = std::result::Result<T, OperationError>;

/// Keeps points per collection in insertion order. Search ignores the
/// query vector and returns the first `limit` points.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: Mutex<HashMap<String, Vec<PointStruct>>>,
    pub create_calls: AtomicUsize,
    pub remote_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(name: &str) -> Self {
        let backend = Self::default();
        backend.collections.lock().insert(name.to_string(), Vec::new());
        backend
    }

    pub fn point_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map(|points| points.len())
            .unwrap_or(0)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn missing(collection: &str) -> OperationError {
        OperationError::Connection(format!("Collection `{}` doesn't exist", collection))
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn collection_exists(&self, collection: &str) -> OpResult<bool> {
        self.touch();
        Ok(self.collections.lock().contains_key(collection))
    }

    async fn create_collection(
        &self,
        collection: &str,
        _vectors: &VectorSpace,
        _options: &CollectionOptions,
    ) -> OpResult<()> {
        self.touch();
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.collections.lock().insert(collection.to_string(), Vec::new());
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> OpResult<PointsOperationResponse> {
        self.touch();
        let mut collections = self.collections.lock();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;

        for point in points {
            stored.retain(|existing| existing.id != point.id);
            stored.push(point);
        }
        Ok(PointsOperationResponse::default())
    }

    async fn query(&self, collection: &str, request: SearchRequest) -> OpResult<QueryResponse> {
        self.touch();
        let collections = self.collections.lock();
        let stored = collections.get(collection).ok_or_else(|| Self::missing(collection))?;

        let result = stored
            .iter()
            .take(request.limit as usize)
            .map(|point| ScoredPoint {
                id: point.id.clone(),
                payload: if request.with_payload {
                    point.payload.clone()
                } else {
                    HashMap::new()
                },
                ..Default::default()
            })
            .collect();

        Ok(QueryResponse {
            result,
            ..Default::default()
        })
    }

    async fn scroll(&self, collection: &str, request: ScrollRequest) -> OpResult<ScrollResponse> {
        self.touch();
        let collections = self.collections.lock();
        let stored = collections.get(collection).ok_or_else(|| Self::missing(collection))?;

        let start = match &request.offset {
            Some(offset) => stored
                .iter()
                .position(|point| point.id.as_ref() == Some(offset))
                .unwrap_or(stored.len()),
            None => 0,
        };
        let limit = request.limit as usize;

        let result: Vec<RetrievedPoint> = stored
            .iter()
            .skip(start)
            .take(limit)
            .map(|point| RetrievedPoint {
                id: point.id.clone(),
                payload: point.payload.clone(),
                ..Default::default()
            })
            .collect();
        let next_page_offset = stored.get(start + limit).and_then(|point| point.id.clone());

        Ok(ScrollResponse {
            result,
            next_page_offset,
            ..Default::default()
        })
    }

    async fn delete(&self, collection: &str, selector: PointsSelectorOneOf) -> OpResult<PointsOperationResponse> {
        self.touch();
        let mut collections = self.collections.lock();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;

        if let PointsSelectorOneOf::Points(list) = selector {
            stored.retain(|point| match &point.id {
                Some(id) => !list.ids.contains(id),
                None => true,
            });
        }
        Ok(PointsOperationResponse::default())
    }
}

/// Every call fails as if nothing listened on the endpoint.
#[derive(Default)]
pub struct UnreachableBackend {
    pub calls: AtomicUsize,
}

impl UnreachableBackend {
    fn refuse<T>(&self) -> OpResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OperationError::Connection(
            "tcp connect error: Connection refused (os error 111)".to_string(),
        ))
    }
}

#[async_trait]
impl VectorBackend for UnreachableBackend {
    async fn collection_exists(&self, _collection: &str) -> OpResult<bool> {
        self.refuse()
    }

    async fn create_collection(
        &self,
        _collection: &str,
        _vectors: &VectorSpace,
        _options: &CollectionOptions,
    ) -> OpResult<()> {
        self.refuse()
    }

    async fn upsert(&self, _collection: &str, _points: Vec<PointStruct>) -> OpResult<PointsOperationResponse> {
        self.refuse()
    }

    async fn query(&self, _collection: &str, _request: SearchRequest) -> OpResult<QueryResponse> {
        self.refuse()
    }

    async fn scroll(&self, _collection: &str, _request: ScrollRequest) -> OpResult<ScrollResponse> {
        self.refuse()
    }

    async fn delete(&self, _collection: &str, _selector: PointsSelectorOneOf) -> OpResult<PointsOperationResponse> {
        self.refuse()
    }
}
