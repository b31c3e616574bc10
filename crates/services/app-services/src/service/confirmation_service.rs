//! Confirmation search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use common::{AppResult, ServiceConfig};
use domain::{Confirmation, DEFAULT_PAGE_SIZE};
use persistence::query::Comparator;
use persistence::{BaseRepository, Filter, Page, QueryOptions, RepoCtx, SortDirection};

use crate::date::{self, DateRange};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const ORDERABLE: &[&str] = &[
    "created_datetime",
    "start_datetime",
    "appointment_datetime",
    "delivered_datetime",
    "patient_name",
    "rut",
    "phone_number",
    "service_name",
    "center_name",
];

/// Which identifier the search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Rut,
    Phone,
}

impl SearchMode {
    pub fn field(&self) -> &'static str {
        match self {
            SearchMode::Rut => "rut",
            SearchMode::Phone => "phone_number",
        }
    }

    /// Document index that serves this lookup.
    fn index(&self) -> &'static str {
        match self {
            SearchMode::Rut => "idx_confirmations_rut_created",
            SearchMode::Phone => "idx_confirmations_phone_created",
        }
    }
}

/// Timestamp the date range applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    #[default]
    CreatedDatetime,
    StartDatetime,
    AppointmentDatetime,
    DeliveredDatetime,
}

impl DateField {
    pub fn field(&self) -> &'static str {
        match self {
            DateField::CreatedDatetime => "created_datetime",
            DateField::StartDatetime => "start_datetime",
            DateField::AppointmentDatetime => "appointment_datetime",
            DateField::DeliveredDatetime => "delivered_datetime",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfirmationsParams {
    pub mode: SearchMode,
    #[validate(length(min = 1, message = "query cannot be empty"))]
    pub query: String,
    pub offset: Option<u64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u64>,
    pub cursor: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
    /// `yyyy-mm-dd`, local day
    pub start_date: Option<String>,
    /// `yyyy-mm-dd`, local day
    pub end_date: Option<String>,
    #[serde(default)]
    pub date_field: DateField,
}

impl SearchConfirmationsParams {
    pub fn new(mode: SearchMode, query: impl Into<String>) -> Self {
        Self {
            mode,
            query: query.into(),
            offset: None,
            limit: None,
            cursor: None,
            order_by: None,
            order: None,
            start_date: None,
            end_date: None,
            date_field: DateField::default(),
        }
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ConfirmationService: Send + Sync {
    /// Confirmations of one patient, optionally restricted to a day range.
    async fn search(&self, params: SearchConfirmationsParams) -> AppResult<Page<Confirmation>>;
}

pub struct ConfirmationManager {
    repo: Arc<dyn BaseRepository<Confirmation>>,
    config: ServiceConfig,
}

impl ConfirmationManager {
    pub fn new(repo: Arc<dyn BaseRepository<Confirmation>>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Translate search parameters into query options.
    pub fn build_query(&self, params: &SearchConfirmationsParams) -> AppResult<QueryOptions> {
        super::validate(params)?;

        let mut filter = Filter::new().eq(params.mode.field(), params.query.trim());

        let tz = date::time_zone(&self.config.time_zone)?;
        let range = date::day_range(params.start_date.as_deref(), params.end_date.as_deref(), tz)?;
        if let Some(range) = range {
            let condition = match range {
                DateRange::From(start) => Comparator::new().gte(start),
                DateRange::Until(end) => Comparator::new().lte(end),
                DateRange::Between(start, end) => Comparator::new().between(start, end),
            };
            filter = filter.field(params.date_field.field(), condition);
        }

        let order_by = super::order_field(
            params.order_by.as_deref(),
            ORDERABLE,
            "created_datetime",
        )?;
        let direction = super::sort_direction(params.order.as_deref(), SortDirection::Desc)?;

        let mut options = QueryOptions::new()
            .filter(filter)
            .order_by(order_by, direction)
            .paginate(super::pagination(
                params.limit,
                params.offset,
                params.cursor.clone(),
                DEFAULT_PAGE_SIZE,
            ));
        if order_by == "created_datetime" {
            options = options.index(params.mode.index());
        }
        Ok(options)
    }
}

#[async_trait]
impl ConfirmationService for ConfirmationManager {
    async fn search(&self, params: SearchConfirmationsParams) -> AppResult<Page<Confirmation>> {
        let options = self.build_query(&params)?;
        tracing::debug!(mode = ?params.mode, "Searching confirmations");
        self.repo.find_many(options, &RepoCtx::default()).await
    }
}
