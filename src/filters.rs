//! Filter panel state for the match list.
//!
//! The panel is a controlled component: it owns five independent facets and
//! hands the result to its owner on apply. Values are not checked against the
//! available listings; the backend does the actual filtering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRICE_RANGE: (u32, u32) = (1000, 3000);

/// Filters applied to a match query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub price_range: (u32, u32),
    pub bedrooms: BTreeSet<String>,
    pub bathrooms: BTreeSet<String>,
    pub neighborhoods: BTreeSet<String>,
    pub amenities: BTreeSet<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            price_range: DEFAULT_PRICE_RANGE,
            bedrooms: BTreeSet::new(),
            bathrooms: BTreeSet::new(),
            neighborhoods: BTreeSet::new(),
            amenities: BTreeSet::new(),
        }
    }
}

impl Filters {
    /// Query parameters for `GET /api/user/matches/:prefId`. Empty facets are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("minPrice", self.price_range.0.to_string()),
            ("maxPrice", self.price_range.1.to_string()),
        ];

        for (name, values) in [
            ("bedrooms", &self.bedrooms),
            ("bathrooms", &self.bathrooms),
            ("neighborhoods", &self.neighborhoods),
            ("amenities", &self.amenities),
        ] {
            if !values.is_empty() {
                pairs.push((name, values.iter().cloned().collect::<Vec<_>>().join(",")));
            }
        }

        pairs
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::Bedrooms => &mut self.bedrooms,
            Facet::Bathrooms => &mut self.bathrooms,
            Facet::Neighborhoods => &mut self.neighborhoods,
            Facet::Amenities => &mut self.amenities,
        }
    }
}

/// Multi-select facets of the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Bedrooms,
    Bathrooms,
    Neighborhoods,
    Amenities,
}

/// Editable filter state behind the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPanel {
    current: Filters,
}

impl FilterPanel {
    pub fn new(initial: Filters) -> Self {
        Self { current: initial }
    }

    pub fn filters(&self) -> &Filters {
        &self.current
    }

    /// Set the price range; bounds given in the wrong order are swapped.
    pub fn set_price_range(&mut self, min: u32, max: u32) {
        self.current.price_range = if min <= max { (min, max) } else { (max, min) };
    }

    /// Set only the bounds that are given. A missing bound is left open when
    /// the other one is set, and falls back to the default when neither is.
    pub fn set_price_bounds(&mut self, min: Option<u32>, max: Option<u32>) {
        let (min, max) = match (min, max) {
            (None, None) => DEFAULT_PRICE_RANGE,
            (min, max) => (min.unwrap_or(0), max.unwrap_or(u32::MAX)),
        };
        self.set_price_range(min, max);
    }

    /// Add `value` to the facet if absent, remove it if present.
    /// Returns whether the value is selected afterwards.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let values = self.current.facet_mut(facet);
        if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        }
    }

    /// Filters to hand to the owner's apply handler.
    pub fn apply(&self) -> Filters {
        self.current.clone()
    }

    /// Restore the built-in defaults, regardless of the initial filters.
    pub fn reset(&mut self) -> &Filters {
        self.current = Filters::default();
        &self.current
    }
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self::new(Filters::default())
    }
}
