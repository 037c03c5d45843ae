//! Typed, per-resource filter records.
//!
//! Filters cross the process boundary as loose `key=value` pairs (CLI flags,
//! query strings). Each resource parses them into a closed record up front so
//! the controller and the REST adapter only ever see validated values.

use std::{fmt::Debug, str::FromStr};

use shared::{
    domain::{DocumentId, DocumentStatus, IngestionStatus, Role, UserStatus},
    protocol::{Sort, SortOrder},
};

use crate::error::FilterError;

pub trait ListFilters: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Sort keys the backend accepts for this resource.
    const SORT_KEYS: &'static [&'static str];

    /// Query-string pairs for the fields that are set.
    fn to_params(&self) -> Vec<(&'static str, String)>;

    fn apply(&mut self, key: &str, value: &str) -> Result<(), FilterError>;

    fn from_params<'a, I>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            filters.apply(key.trim(), value.trim())?;
        }
        Ok(filters)
    }

    fn is_empty(&self) -> bool {
        self.to_params().is_empty()
    }
}

/// Splits `key=value` arguments into pairs.
pub fn split_pairs<'a>(
    raw: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<(&'a str, &'a str)>, FilterError> {
    raw.into_iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| FilterError::MalformedPair(pair.to_string()))
        })
        .collect()
}

/// Parses `key` or `key:order` against the resource's sort keys.
pub fn parse_sort<F: ListFilters>(raw: &str) -> Result<Sort, FilterError> {
    let (key, order) = match raw.split_once(':') {
        Some((key, order)) => {
            let order = order.parse::<SortOrder>().map_err(|err| FilterError::InvalidValue {
                key: "sort".to_string(),
                value: order.to_string(),
                reason: err.to_string(),
            })?;
            (key.trim(), order)
        }
        None => (raw.trim(), SortOrder::Asc),
    };

    let known = F::SORT_KEYS
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(key))
        .ok_or_else(|| FilterError::UnknownSortKey {
            key: key.to_string(),
            allowed: F::SORT_KEYS.to_vec(),
        })?;
    Ok(Sort::new(*known, order))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, FilterError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|err: T::Err| FilterError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilters {
    pub search: Option<String>,
    pub status: Option<DocumentStatus>,
    pub mime_type: Option<String>,
}

impl ListFilters for DocumentFilters {
    const SORT_KEYS: &'static [&'static str] = &["title", "createdAt", "sizeBytes", "status"];

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(mime_type) = &self.mime_type {
            params.push(("mimeType", mime_type.clone()));
        }
        params
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        match key {
            "search" | "q" => self.search = non_empty(value),
            "status" => self.status = Some(parse_value(key, value)?),
            "mimeType" | "mime_type" | "type" => self.mime_type = non_empty(value),
            _ => return Err(FilterError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl ListFilters for UserFilters {
    const SORT_KEYS: &'static [&'static str] = &["name", "email", "createdAt", "lastLoginAt"];

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(role) = self.role {
            params.push(("role", role.as_str().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        match key {
            "search" | "q" => self.search = non_empty(value),
            "role" => self.role = Some(parse_value(key, value)?),
            "status" => self.status = Some(parse_value(key, value)?),
            _ => return Err(FilterError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionFilters {
    pub document_id: Option<DocumentId>,
    pub status: Option<IngestionStatus>,
}

impl ListFilters for IngestionFilters {
    const SORT_KEYS: &'static [&'static str] = &["queuedAt", "finishedAt", "status"];

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(document_id) = &self.document_id {
            params.push(("documentId", document_id.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        match key {
            "documentId" | "document_id" | "document" => {
                self.document_id = non_empty(value).map(DocumentId)
            }
            "status" => self.status = Some(parse_value(key, value)?),
            _ => return Err(FilterError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
