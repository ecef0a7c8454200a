//! Qdrant load generation.
//!
//! This crate wraps Qdrant client calls for load testing:
//! - Timed, non-failing client operations (upsert, search, scroll, delete)
//! - A virtual-user adapter that reports every call as a request event
//! - A small tokio runner and statistics collector to drive scenarios
//!
//! # Architecture
//!
//! - **Client** ([`QdrantLoadClient`]): measures each remote call and turns
//!   errors into data inside an [`OperationResult`]
//! - **User** ([`QdrantUser`]): provisions the collection on startup and
//!   fires one [`RequestEvent`] per operation
//! - **Host** ([`VirtualUser`], [`Runner`], [`StatsCollector`]): schedules
//!   weighted scenario tasks and aggregates the events
//!
//! # Example
//!
//! ```no_run
//! use loadgen_core::prelude::*;
//! use qdrant_client::qdrant::PointStruct;
//! use qdrant_client::Payload;
//! use std::sync::Arc;
//!
//! # async fn example() -> loadgen_core::Result<()> {
//! let config = QdrantUserConfig::new("http://localhost:6334", "t")
//!     .with_vectors(VectorSpace::new(4, DistanceMetric::Cosine));
//! let stats = Arc::new(StatsCollector::new());
//! let user = QdrantUser::start(config, stats.clone()).await?;
//!
//! let point = PointStruct::new(1u64, vec![0.0_f32; 4], Payload::new());
//! let result = user.upsert(vec![point]).await;
//! assert!(result.success());
//!
//! println!("{:?}", stats.report().get(CLIENT_TYPE, "upsert"));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod request;
pub mod result;
pub mod runner;
pub mod stats;
pub mod user;

pub use backend::{QdrantBackend, VectorBackend};
pub use client::QdrantLoadClient;
pub use config::{
    ClientOptions, CollectionOptions, DistanceMetric, HnswConfig, LoadConfig, QdrantUserConfig,
    RunSettings, VectorSpace,
};
pub use error::{LoadgenError, OperationError, Result};
pub use events::{EventSink, NoopSink, RecordingSink, RequestEvent, CLIENT_TYPE};
pub use host::{Task, TaskFn, UserContext, VirtualUser, WaitTime};
pub use request::{PointSelector, ScrollRequest, SearchRequest};
pub use result::{OperationResult, Outcome, Provisioned, ScrollPage};
pub use runner::{RunSummary, Runner, RunnerConfig};
pub use stats::{OperationStats, StatsCollector, StatsReport};
pub use user::QdrantUser;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{DistanceMetric, QdrantUserConfig, VectorSpace};
    pub use crate::error::{LoadgenError, Result};
    pub use crate::events::{EventSink, RequestEvent, CLIENT_TYPE};
    pub use crate::host::{Task, UserContext, VirtualUser, WaitTime};
    pub use crate::request::{PointSelector, ScrollRequest, SearchRequest};
    pub use crate::result::OperationResult;
    pub use crate::runner::{Runner, RunnerConfig};
    pub use crate::stats::StatsCollector;
    pub use crate::user::QdrantUser;
}
