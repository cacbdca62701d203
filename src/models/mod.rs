use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role, sent by the backend as `type`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Broker,
    Admin,
}

impl Role {
    /// Landing route for this role.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::User => "/home",
            Role::Broker => "/broker/dashboard",
            Role::Admin => "/admin/dashboard",
        }
    }
}

/// Identity of the logged-in account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    #[serde(default)]
    pub is_approved: bool,
}

impl User {
    /// A broker still waiting for an admin to approve the account.
    pub fn is_pending_broker(&self) -> bool {
        self.role == Role::Broker && !self.is_approved
    }
}

/// Broker-specific fields from `GET /api/broker/me`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerStatus {
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
}

/// Broker account as listed for admin moderation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrokerAccount {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
}

/// Coordinates of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Apartment listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Monthly rent in dollars
    pub price: u32,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: f32,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub broker_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A scored pairing of a saved preference with an apartment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub apartment: Apartment,
    #[serde(default)]
    pub match_score: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Match {
    /// Score rounded and clamped to `0..=100`.
    pub fn display_score(&self) -> u8 {
        if self.match_score.is_nan() {
            return 0;
        }
        self.match_score.clamp(0.0, 100.0).round() as u8
    }
}

/// One page of match results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchPage {
    #[serde(default)]
    pub results: Vec<Match>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub filtered_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_reads_backend_shape() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Dana",
            "email": "dana@example.com",
            "type": "broker",
            "isApproved": false
        }))
        .unwrap();

        assert_eq!(user.role, Role::Broker);
        assert!(user.is_pending_broker());
    }

    #[test]
    fn display_score_is_clamped_and_rounded() {
        let apartment: Apartment =
            serde_json::from_value(json!({ "id": "a1", "price": 1800 })).unwrap();
        let mut record = Match {
            id: "m1".to_string(),
            apartment,
            match_score: 87.6,
            explanation: None,
        };
        assert_eq!(record.display_score(), 88);

        record.match_score = 140.0;
        assert_eq!(record.display_score(), 100);

        record.match_score = -3.0;
        assert_eq!(record.display_score(), 0);
    }

    #[test]
    fn match_page_tolerates_missing_counts() {
        let page: MatchPage = serde_json::from_value(json!({ "results": [] })).unwrap();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.filtered_count, 0);
    }
}
