//! Request parameters for search, scroll and delete.
//!
//! Defaults follow the usual scenario shape: ten results with payloads.

use qdrant_client::qdrant::points_selector::PointsSelectorOneOf;
use qdrant_client::qdrant::{Filter, PointId, PointsIdsList, SearchParams};

pub const DEFAULT_LIMIT: u32 = 10;

/// Nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Vec<f32>,
    pub limit: u64,
    pub filter: Option<Filter>,
    pub params: Option<SearchParams>,
    pub with_payload: bool,
}

impl SearchRequest {
    pub fn new(query: Vec<f32>) -> Self {
        Self {
            query,
            limit: DEFAULT_LIMIT as u64,
            filter: None,
            params: None,
            with_payload: true,
        }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn params(mut self, params: SearchParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_payload(mut self, with_payload: bool) -> Self {
        self.with_payload = with_payload;
        self
    }
}

/// Filtered pagination without a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRequest {
    pub filter: Option<Filter>,
    pub limit: u32,
    pub with_payload: bool,
    /// Continuation token from a previous page
    pub offset: Option<PointId>,
}

impl Default for ScrollRequest {
    fn default() -> Self {
        Self {
            filter: None,
            limit: DEFAULT_LIMIT,
            with_payload: true,
            offset: None,
        }
    }
}

impl ScrollRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_payload(mut self, with_payload: bool) -> Self {
        self.with_payload = with_payload;
        self
    }

    pub fn offset(mut self, offset: impl Into<PointId>) -> Self {
        self.offset = Some(offset.into());
        self
    }
}

/// Points targeted by a delete.
#[derive(Debug, Clone, PartialEq)]
pub enum PointSelector {
    Ids(Vec<PointId>),
    Filter(Filter),
}

impl PointSelector {
    pub fn ids<I, P>(ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PointId>,
    {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PointId>> for PointSelector {
    fn from(ids: Vec<PointId>) -> Self {
        Self::Ids(ids)
    }
}

impl From<Vec<u64>> for PointSelector {
    fn from(ids: Vec<u64>) -> Self {
        Self::ids(ids)
    }
}

impl From<Filter> for PointSelector {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<PointSelector> for PointsSelectorOneOf {
    fn from(selector: PointSelector) -> Self {
        match selector {
            PointSelector::Ids(ids) => PointsSelectorOneOf::Points(PointsIdsList { ids }),
            PointSelector::Filter(filter) => PointsSelectorOneOf::Filter(filter),
        }
    }
}
