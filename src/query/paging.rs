//! Sort specification parsing and page windows.

use serde::{Deserialize, Serialize};

use crate::db::{validate_field, SortKey};
use crate::errors::AppError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Maximum number of records returned in one page.
pub const MAX_LIMIT: u64 = 100;

/// Raw pagination and sort parameters as they arrive on a list request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default, deserialize_with = "crate::models::de::string_or_number")]
    pub page: Option<String>,
    #[serde(default, deserialize_with = "crate::models::de::string_or_number")]
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    /// Validate and resolve against an entity's default sort.
    pub fn normalize(&self, default_sort: &str) -> Result<ListQuery, AppError> {
        Ok(ListQuery {
            sort: parse_sort(self.sort.as_deref(), default_sort)?,
            window: Window::parse(self.page.as_deref(), self.limit.as_deref())?,
        })
    }
}

/// Validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub sort: Vec<SortKey>,
    pub window: Window,
}

/// Parse `"className,-roll"` into ordered sort keys.
///
/// A leading `-` selects descending order, `+` or no prefix ascending. An absent or blank
/// specification falls back to `default`.
pub fn parse_sort(spec: Option<&str>, default: &str) -> Result<Vec<SortKey>, AppError> {
    let keys = parse_keys(spec.unwrap_or(""))?;
    if keys.is_empty() {
        return parse_keys(default);
    }
    Ok(keys)
}

fn parse_keys(spec: &str) -> Result<Vec<SortKey>, AppError> {
    let mut keys = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let key = match part.strip_prefix('-') {
            Some(field) => SortKey::desc(field.trim()),
            None => SortKey::asc(part.strip_prefix('+').unwrap_or(part).trim()),
        };
        validate_field(&key.field)
            .map_err(|_| AppError::Validation(format!("Invalid sort field: {:?}", part)))?;
        keys.push(key);
    }
    Ok(keys)
}

/// One page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// 1-indexed page number.
    pub page: u64,
    pub limit: u64,
}

impl Window {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page = match parse_integer("page", page)? {
            None => DEFAULT_PAGE,
            Some(p) if p >= 1 => p as u64,
            Some(_) => return Err(AppError::Validation("page must be at least 1".to_string())),
        };
        let limit = match parse_integer("limit", limit)? {
            None => DEFAULT_LIMIT,
            Some(l) if l > MAX_LIMIT as i64 => {
                tracing::debug!("limit {} capped at {}", l, MAX_LIMIT);
                MAX_LIMIT
            }
            Some(l) if l > 0 => l as u64,
            Some(_) => return Err(AppError::Validation("limit must be positive".to_string())),
        };
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` records.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

fn parse_integer(name: &str, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be an integer, got {:?}", name, raw))),
    }
}

/// A page of records together with the unwindowed total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: u64, window: Window) -> Self {
        Self {
            items,
            total,
            page: window.page,
            limit: window.limit,
            pages: window.pages(total),
        }
    }
}
