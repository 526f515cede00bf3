use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wayfare_catalog::{CatalogSource, Offering};
use wayfare_core::{CoreError, CoreResult, SearchQuery, SortKey};

use crate::filter::OfferingMatcher;
use crate::ranker::sort_offerings;

/// Runs queries against the catalog of the query's travel mode.
#[derive(Clone)]
pub struct SearchEngine {
    catalog: Arc<dyn CatalogSource>,
}

impl SearchEngine {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }

    /// Filtered, unsorted matches for an already validated query.
    pub async fn execute(&self, query: &SearchQuery) -> CoreResult<Vec<Offering>> {
        let offerings = self.catalog.load(query.mode).await?;
        let total = offerings.len();

        let matcher = OfferingMatcher::new(query);
        let matches: Vec<Offering> = offerings.into_iter().filter(|o| matcher.matches(o)).collect();

        info!(
            "Search {} -> {} ({}, {}): {} of {} offerings match",
            query.from,
            query.to,
            query.mode,
            query.travel_class,
            matches.len(),
            total
        );
        Ok(matches)
    }

    /// Begin, execute and complete in one call. Only usable when nothing else
    /// touches the session while the catalog is read.
    pub async fn search(
        &self,
        session: &mut SearchSession,
        query: SearchQuery,
        today: NaiveDate,
    ) -> CoreResult<Vec<Offering>> {
        let ticket = session.begin(query, today)?;
        let result = self.execute(ticket.query()).await;
        let outcome = result.clone();
        session.complete(&ticket, result);
        outcome
    }
}

/// Where the latest search stands.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SearchOutcome {
    Idle,
    Pending,
    Ready,
    /// The catalog could not be read; results are empty.
    Failed(String),
}

/// Handle for one in-flight search.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    query: SearchQuery,
}

impl SearchTicket {
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Current query and its result set.
///
/// Each `begin` supersedes earlier searches: a ticket from an older
/// generation is ignored on `complete`, whatever order the reads finish in.
#[derive(Debug, Clone)]
pub struct SearchSession {
    generation: u64,
    query: Option<SearchQuery>,
    results: Vec<Offering>,
    outcome: SearchOutcome,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            generation: 0,
            query: None,
            results: Vec::new(),
            outcome: SearchOutcome::Idle,
        }
    }

    /// Validate and record the query. Nothing changes when validation fails.
    pub fn begin(&mut self, query: SearchQuery, today: NaiveDate) -> CoreResult<SearchTicket> {
        query.validate(today)?;

        self.generation += 1;
        self.query = Some(query.clone());
        self.results.clear();
        self.outcome = SearchOutcome::Pending;

        debug!("Search generation {} started", self.generation);
        Ok(SearchTicket {
            generation: self.generation,
            query,
        })
    }

    /// Apply a finished read. Returns `false` when the ticket was superseded.
    pub fn complete(&mut self, ticket: &SearchTicket, result: CoreResult<Vec<Offering>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Dropping results of superseded search generation {} (current {})",
                ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(results) => {
                self.results = results;
                self.outcome = SearchOutcome::Ready;
            }
            Err(e) => {
                warn!("Failed to fetch results: {}", e);
                self.results.clear();
                self.outcome = SearchOutcome::Failed(e.to_string());
            }
        }
        true
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    /// Results in presentation order.
    pub fn results(&self, key: SortKey) -> Vec<Offering> {
        sort_offerings(&self.results, key)
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Look an offering up in the current result set.
    pub fn find(&self, offering_id: &str) -> CoreResult<&Offering> {
        self.results
            .iter()
            .find(|o| o.id == offering_id)
            .ok_or_else(|| CoreError::NotFound(format!("Offering {} is not in the current results", offering_id)))
    }
}
