//! Wire types for the conversation service.
//!
//! Two contracts exist: the structured create/continue conversation API
//! and the historical `/api/mock` echo API. Business maps keep the order
//! in which the service listed them, since the cycling animation walks
//! them by index.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Body of `POST /v1/conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub user_request: String,
}

/// Response of `POST /v1/conversation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub conversation_id: String,
    pub response_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "business_map")]
    pub businesses: Option<Vec<Business>>,
}

/// Body of `POST /v1/conversation/continue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueConversationRequest {
    pub conversation_id: String,
    pub user_request: String,
}

/// Response of `POST /v1/conversation/continue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueConversationResponse {
    pub response_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "business_map")]
    pub businesses: Option<Vec<Business>>,
}

/// Body of the legacy `POST /api/mock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Response of the legacy `POST /api/mock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub reply: String,
}

/// A business record as it appears on the wire, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub hours: String,
    pub number: String,
    pub price_range: String,
    pub stars: f64,
}

/// A candidate business, with its name folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    pub name: String,
    pub hours: String,
    pub phone_number: String,
    pub price_range: String,
    pub star_rating: f64,
}

impl Business {
    /// Build a business from its map key and record.
    pub fn from_record(name: impl Into<String>, record: BusinessRecord) -> Self {
        Self {
            name: name.into(),
            hours: record.hours,
            phone_number: record.number,
            price_range: record.price_range,
            star_rating: record.stars,
        }
    }

    /// Convert back into the wire record.
    pub fn to_record(&self) -> BusinessRecord {
        BusinessRecord {
            hours: self.hours.clone(),
            number: self.phone_number.clone(),
            price_range: self.price_range.clone(),
            stars: self.star_rating,
        }
    }

    /// Star rating rendered the way JSON numbers print (`4.5`, `5`).
    pub fn stars(&self) -> String {
        format_stars(self.star_rating)
    }
}

/// Render a rating without a trailing `.0` for whole numbers.
pub fn format_stars(stars: f64) -> String {
    if stars.is_finite() && stars.fract() == 0.0 && stars.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = stars as i64;
        whole.to_string()
    } else {
        stars.to_string()
    }
}

/// Reply from either contract, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationReply {
    /// Present only on create responses.
    pub conversation_id: Option<String>,
    pub response_message: String,
    pub businesses: Option<Vec<Business>>,
}

impl From<CreateConversationResponse> for ConversationReply {
    fn from(resp: CreateConversationResponse) -> Self {
        Self {
            conversation_id: Some(resp.conversation_id),
            response_message: resp.response_message,
            businesses: resp.businesses,
        }
    }
}

impl From<ContinueConversationResponse> for ConversationReply {
    fn from(resp: ContinueConversationResponse) -> Self {
        Self {
            conversation_id: None,
            response_message: resp.response_message,
            businesses: resp.businesses,
        }
    }
}

impl From<SendMessageResponse> for ConversationReply {
    fn from(resp: SendMessageResponse) -> Self {
        Self {
            conversation_id: None,
            response_message: resp.reply,
            businesses: None,
        }
    }
}

/// One problem found while validating a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field the issue applies to.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Request bodies that can be checked before they go on the wire.
pub trait Validate {
    /// Return every issue found; empty means valid.
    fn issues(&self) -> Vec<ValidationIssue>;
}

fn require_non_empty(path: &str, value: &str, message: &str, issues: &mut Vec<ValidationIssue>) {
    if value.is_empty() {
        issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }
}

impl Validate for CreateConversationRequest {
    fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        require_non_empty(
            "user_request",
            &self.user_request,
            "user_request is required",
            &mut issues,
        );
        issues
    }
}

impl Validate for ContinueConversationRequest {
    fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        require_non_empty(
            "conversation_id",
            &self.conversation_id,
            "conversation_id is required",
            &mut issues,
        );
        require_non_empty(
            "user_request",
            &self.user_request,
            "user_request is required",
            &mut issues,
        );
        issues
    }
}

impl Validate for SendMessageRequest {
    fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        require_non_empty("message", &self.message, "message is required", &mut issues);
        issues
    }
}

/// Whether a conversation id looks like a UUID.
pub fn is_uuid(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// Order-preserving (de)serialization of `name → BusinessRecord` maps.
pub mod business_map {
    use super::{Business, BusinessRecord, Deserializer, MapAccess, SerializeMap, Serializer, Visitor};
    use std::fmt;

    pub fn serialize<S>(value: &Option<Vec<Business>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(businesses) => {
                let mut map = serializer.serialize_map(Some(businesses.len()))?;
                for business in businesses {
                    map.serialize_entry(&business.name, &business.to_record())?;
                }
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<Business>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionalMapVisitor)
    }

    struct OptionalMapVisitor;

    impl<'de> Visitor<'de> for OptionalMapVisitor {
        type Value = Option<Vec<Business>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of business name to business record")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(MapVisitor).map(Some)
        }
    }

    struct MapVisitor;

    impl<'de> Visitor<'de> for MapVisitor {
        type Value = Vec<Business>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of business name to business record")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut businesses: Vec<Business> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, record)) = access.next_entry::<String, BusinessRecord>()? {
                // Later duplicates win, like a JS object literal.
                if let Some(existing) = businesses.iter_mut().find(|b| b.name == name) {
                    *existing = Business::from_record(name, record);
                } else {
                    businesses.push(Business::from_record(name, record));
                }
            }
            Ok(businesses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_response_keeps_business_order() {
        let json = r#"{
            "conversation_id": "6f1c1c52-5d1a-4c55-9a53-3f4c0bb0f7a1",
            "response_message": "Found some",
            "businesses": {
                "Zed Barbers": {"hours": "9-5", "number": "555-0100", "price_range": "$$", "stars": 4.5},
                "A Cuts": {"hours": "10-6", "number": "555-0101", "price_range": "$", "stars": 4}
            }
        }"#;

        let resp: CreateConversationResponse = serde_json::from_str(json).unwrap();
        let businesses = resp.businesses.unwrap();
        assert_eq!(businesses.len(), 2);
        assert_eq!(businesses[0].name, "Zed Barbers");
        assert_eq!(businesses[1].name, "A Cuts");
        assert_eq!(businesses[1].phone_number, "555-0101");
    }

    #[test]
    fn test_businesses_optional() {
        let resp: ContinueConversationResponse =
            serde_json::from_str(r#"{"response_message": "hi"}"#).unwrap();
        assert!(resp.businesses.is_none());

        let resp: ContinueConversationResponse =
            serde_json::from_str(r#"{"response_message": "hi", "businesses": null}"#).unwrap();
        assert!(resp.businesses.is_none());
    }

    #[test]
    fn test_malformed_business_record_is_an_error() {
        let json = r#"{"response_message": "x", "businesses": {"A": {"hours": "9-5"}}}"#;
        assert!(serde_json::from_str::<ContinueConversationResponse>(json).is_err());
    }

    #[test]
    fn test_legacy_request_uses_camel_case() {
        let req = SendMessageRequest {
            message: "hello".into(),
            conversation_id: Some("demo-convo".into()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["conversationId"], "demo-convo");
        assert_eq!(json["message"], "hello");
    }

    #[test]
    fn test_validation_issues() {
        let ok = CreateConversationRequest {
            user_request: "book me a haircut".into(),
        };
        assert!(ok.issues().is_empty());

        let bad = ContinueConversationRequest {
            conversation_id: String::new(),
            user_request: String::new(),
        };
        let issues = bad.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, "conversation_id");
        assert_eq!(issues[1].to_string(), "user_request: user_request is required");
    }

    #[test]
    fn test_format_stars() {
        assert_eq!(format_stars(4.0), "4");
        assert_eq!(format_stars(4.5), "4.5");
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("6f1c1c52-5d1a-4c55-9a53-3f4c0bb0f7a1"));
        assert!(!is_uuid("demo-convo"));
    }
}
