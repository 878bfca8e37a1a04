use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::types::{FieldName, PageSize, TypeConstraintError};

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortDirection {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: FieldName,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: FieldName, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// The request the list view currently intends to make.
///
/// `search` holds the settled search value; raw keystrokes live in the
/// debouncer until they settle. `page` is never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub search: String,
    pub filters: BTreeMap<FieldName, String>,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub page_size: PageSize,
}

impl QuerySnapshot {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
            page_size,
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        Some(self.search.trim()).filter(|s| !s.is_empty())
    }

    /// Filters that constrain the request; empty values mean "any".
    pub fn active_filters(&self) -> impl Iterator<Item = (&FieldName, &str)> {
        self.filters
            .iter()
            .map(|(name, value)| (name, value.trim()))
            .filter(|(_, value)| !value.is_empty())
    }

    /// Everything except the page number.
    pub fn filter_class(&self) -> FilterClass {
        FilterClass {
            search: self.search_term().map(str::to_string),
            filters: self
                .active_filters()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
            sort: self.sort.clone(),
            page_size: self.page_size,
        }
    }
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

/// The part of a query whose change invalidates the current page number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterClass {
    pub search: Option<String>,
    pub filters: BTreeMap<FieldName, String>,
    pub sort: Option<SortSpec>,
    pub page_size: PageSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> FieldName {
        FieldName::new(value).expect("valid name")
    }

    #[test]
    fn empty_filters_and_blank_search_do_not_constrain() {
        let mut query = QuerySnapshot::default();
        query.search = "   ".to_string();
        query.filters.insert(name("status"), String::new());
        query.filters.insert(name("course"), " 12 ".to_string());

        let class = query.filter_class();
        assert_eq!(class.search, None);
        assert_eq!(class.filters.len(), 1);
        assert_eq!(class.filters.get(&name("course")).map(String::as_str), Some("12"));
    }

    #[test]
    fn filter_class_ignores_page() {
        let mut first = QuerySnapshot::default();
        first.page = 1;
        let mut second = first.clone();
        second.page = 4;

        assert_eq!(first.filter_class(), second.filter_class());
    }

    #[test]
    fn sort_direction_parses_and_flips() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("sideways".parse::<SortDirection>().is_err());
        assert_eq!(SortDirection::Asc.flip(), SortDirection::Desc);
    }
}
