//! Cost query parameters and their validation.

use super::CostError;
use crate::models::Period;
use uuid::Uuid;

/// Validated parameters of a cost query.
///
/// The window is inclusive on both ends and never inverted; a `QueryFilter`
/// cannot be built otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    window_start: Period,
    window_end: Period,
    owner_id: Option<Uuid>,
    service_name: Option<String>,
}

impl QueryFilter {
    pub fn new(window_start: Period, window_end: Period) -> Result<Self, CostError> {
        if window_start > window_end {
            return Err(CostError::InvertedWindow {
                start: window_start,
                end: window_end,
            });
        }

        Ok(Self {
            window_start,
            window_end,
            owner_id: None,
            service_name: None,
        })
    }

    /// Validate raw request values.
    ///
    /// Empty `owner_id` or `service_name` strings mean "no filter".
    pub fn parse(
        window_start: &str,
        window_end: &str,
        owner_id: Option<&str>,
        service_name: Option<&str>,
    ) -> Result<Self, CostError> {
        let start = Period::parse(window_start)
            .map_err(|e| CostError::from_period("startDate", e))?;
        let end =
            Period::parse(window_end).map_err(|e| CostError::from_period("endDate", e))?;

        let mut filter = Self::new(start, end)?;

        if let Some(raw) = owner_id.map(str::trim).filter(|s| !s.is_empty()) {
            let owner = Uuid::parse_str(raw).map_err(|_| CostError::InvalidOwnerId(raw.to_string()))?;
            filter = filter.with_owner(owner);
        }

        if let Some(name) = service_name {
            filter = filter.with_service_name(name);
        }

        Ok(filter)
    }

    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Restrict to one service, matched case-insensitively. Blank names clear
    /// the restriction.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        let name = service_name.into();
        let name = name.trim();
        self.service_name = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn window_start(&self) -> Period {
        self.window_start
    }

    pub fn window_end(&self) -> Period {
        self.window_end
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn matches_owner(&self, owner_id: &Uuid) -> bool {
        self.owner_id.map_or(true, |wanted| &wanted == owner_id)
    }

    pub fn matches_service(&self, service_name: &str) -> bool {
        self.service_name
            .as_deref()
            .map_or(true, |wanted| wanted.to_lowercase() == service_name.to_lowercase())
    }
}
