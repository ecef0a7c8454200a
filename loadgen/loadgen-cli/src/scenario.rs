//! Bundled Qdrant scenario.
//!
//! Each user provisions a 128-dimensional cosine collection, keeps ten random
//! query vectors, and mixes upserts, searches, scrolls and deletes with a
//! 1-3 second pause between tasks.

use async_trait::async_trait;
use futures::future::BoxFuture;
use loadgen_core::prelude::*;
use loadgen_core::LoadConfig;
use qdrant_client::Payload;
use qdrant_client::qdrant::PointStruct;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_COLLECTION: &str = "load_test_collection";
pub const DEFAULT_DIMENSION: u64 = 128;
pub const QUERY_VECTORS: usize = 10;
pub const MAX_POINT_ID: u64 = 10_000;
pub const SEARCH_LIMIT: u64 = 5;
pub const SCROLL_LIMIT: u32 = 5;

/// Settings shared by every user of a run.
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub qdrant: QdrantUserConfig,
    pub wait: WaitTime,
}

impl ScenarioSettings {
    /// Fill in the scenario defaults the configuration leaves open.
    pub fn from_config(config: &LoadConfig) -> Self {
        let mut qdrant = config.qdrant.clone();

        if qdrant
            .collection_name
            .as_deref()
            .is_none_or(|name| name.trim().is_empty())
        {
            qdrant.collection_name = Some(DEFAULT_COLLECTION.to_string());
        }
        if qdrant.vectors.is_none() {
            qdrant.vectors = Some(VectorSpace::new(DEFAULT_DIMENSION, DistanceMetric::Cosine));
        }

        Self {
            qdrant,
            wait: WaitTime::between(Duration::from_secs(1), Duration::from_secs(3)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.qdrant
            .vectors
            .map(|v| v.size as usize)
            .unwrap_or(DEFAULT_DIMENSION as usize)
    }
}

/// Minimal Qdrant user for load testing.
pub struct SimpleQdrantUser {
    qdrant: QdrantUser,
    dimension: usize,
    wait: WaitTime,
    test_vectors: Vec<Vec<f32>>,
}

impl SimpleQdrantUser {
    /// Build a user, pointing it at the run's host when one was given.
    ///
    /// # Errors
    ///
    /// Fails when the Qdrant user cannot start
    pub async fn build(ctx: UserContext, settings: ScenarioSettings) -> Result<Self> {
        let dimension = settings.dimension();
        let mut config = settings.qdrant;
        if let Some(host) = ctx.host {
            config.url = host;
        }

        let qdrant = QdrantUser::start(config, ctx.events).await?;
        Ok(Self {
            qdrant,
            dimension,
            wait: settings.wait,
            test_vectors: Vec::new(),
        })
    }
}

#[async_trait]
impl VirtualUser for SimpleQdrantUser {
    async fn on_start(&mut self) -> Result<()> {
        self.test_vectors = (0..QUERY_VECTORS)
            .map(|_| random_vector(self.dimension))
            .collect();
        Ok(())
    }

    async fn on_stop(&mut self) {
        self.qdrant.stop();
    }

    fn tasks(&self) -> Vec<Task<Self>> {
        vec![
            Task::new("upsert_data", 3, upsert_data),
            Task::new("search_vectors", 5, search_vectors),
            Task::new("scroll_data", 2, scroll_data),
            Task::new("delete_data", 1, delete_data),
        ]
    }

    fn wait_time(&self) -> WaitTime {
        self.wait
    }
}

fn upsert_data(user: &mut SimpleQdrantUser) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        let point = random_point(user.dimension);
        user.qdrant.upsert(vec![point]).await;
    })
}

fn search_vectors(user: &mut SimpleQdrantUser) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        let query = pick_query(&user.test_vectors).unwrap_or_else(|| random_vector(user.dimension));
        user.qdrant
            .search(SearchRequest::new(query).limit(SEARCH_LIMIT))
            .await;
    })
}

fn scroll_data(user: &mut SimpleQdrantUser) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        user.qdrant.scroll(ScrollRequest::new().limit(SCROLL_LIMIT)).await;
    })
}

fn delete_data(user: &mut SimpleQdrantUser) -> BoxFuture<'_, ()> {
    Box::pin(async move {
        let id = random_id();
        user.qdrant.delete(vec![id]).await;
    })
}

fn random_vector(dimension: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..dimension).map(|_| rng.random::<f32>()).collect()
}

fn random_id() -> u64 {
    rand::rng().random_range(1..=MAX_POINT_ID)
}

fn random_point(dimension: usize) -> PointStruct {
    let item = rand::rng().random_range(1..=1000);
    let mut payload = Payload::new();
    payload.insert("name", format!("item_{}", item));
    PointStruct::new(random_id(), random_vector(dimension), payload)
}

fn pick_query(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    if vectors.is_empty() {
        return None;
    }
    let index = rand::rng().random_range(0..vectors.len());
    vectors.get(index).cloned()
}
