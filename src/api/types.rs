use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::filters::Filters;
use crate::models::{Apartment, User};

/// Sort key for match results
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    MatchScore,
    Price,
    DateAdded,
}

impl SortBy {
    pub fn as_param(self) -> &'static str {
        match self {
            SortBy::MatchScore => "matchScore",
            SortBy::Price => "price",
            SortBy::DateAdded => "dateAdded",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Parameters for one page of match results
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub filters: Option<Filters>,
    /// Ask intermediaries to skip any cached copy
    pub force_refresh: bool,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 4,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            filters: None,
            force_refresh: false,
        }
    }
}

impl MatchQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.as_param().to_string()),
            ("sortOrder", self.sort_order.as_param().to_string()),
        ];
        if let Some(filters) = &self.filters {
            pairs.extend(filters.to_query_pairs());
        }
        pairs
    }
}

/// Login payload
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/user/save`. `saved` carries the wanted membership in
/// both directions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest<'a> {
    pub apartment_id: &'a str,
    pub saved: bool,
}

/// Inquiry sent to the broker of a listing
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub apartment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

/// Tour booking for a listing
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourRequest {
    pub apartment_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Broker signup payload
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub agency: String,
    pub license_number: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_address: Option<String>,
}

/// Listing fields a broker can create or edit
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub price: u32,
    pub bedrooms: u32,
    pub bathrooms: f32,
    pub neighborhood: String,
    pub address: String,
    pub description: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
}

/// Response of `GET /api/user/session`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: Option<User>,
}

/// Response of `GET /api/user/saved`, which comes either wrapped or as a bare list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SavedResponse {
    Wrapped {
        #[serde(rename = "savedApartments")]
        saved_apartments: Vec<Apartment>,
    },
    Bare(Vec<Apartment>),
}

impl SavedResponse {
    pub fn into_apartments(self) -> Vec<Apartment> {
        match self {
            SavedResponse::Wrapped { saved_apartments } => saved_apartments,
            SavedResponse::Bare(apartments) => apartments,
        }
    }
}
