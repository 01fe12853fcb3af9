use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use validator::{Validate, ValidationError};

// ============================================================================
// STORED RECORDS
// ============================================================================

/// Business profile as stored in the BusinessProfile table
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub id: String,
    pub name: String,
    pub business_state: String,
    pub profile_picture: Option<ProfilePicture>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub operating_hours: Option<Vec<OperatingHours>>,
    pub contact_info: Option<ContactInfo>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePicture {
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub day_of_week: String,
    pub opens: String,
    pub closes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// User profile; only the liked-businesses list matters here
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub liked_businesses: Option<Vec<String>>,
}

impl UserProfile {
    pub fn liked(&self) -> &[String] {
        self.liked_businesses.as_deref().unwrap_or_default()
    }

    pub fn likes(&self, business_id: &str) -> bool {
        self.liked().iter().any(|id| id == business_id)
    }
}

/// Image belonging to a business album
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumImage {
    pub business_profile_id: String,
    pub image_url: Option<String>,
}

/// Review left by a user for a business
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub business_id: String,
    pub user_id: String,
    pub rating: Option<Number>,
    pub text: Option<String>,
    /// Stored either as epoch millis or as an ISO-8601 string; passed through as-is.
    pub updated_at: Option<Value>,
}

// ============================================================================
// PUBLIC RESPONSE SHAPES
// ============================================================================

/// Business profile as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualBusinessProfile {
    pub id: String,
    pub name: String,
    pub state: String,
    pub liked: bool,
    pub album: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<Vec<OperatingHours>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl IndividualBusinessProfile {
    /// Reshape a stored profile. Empty strings count as absent; present
    /// collections are copied as stored.
    pub fn from_record(profile: BusinessProfile, liked: bool, album: Vec<String>) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            state: profile.business_state,
            liked,
            album,
            profile_picture_url: non_empty(profile.profile_picture.and_then(|p| p.image_url)),
            description: non_empty(profile.description),
            address: non_empty(profile.address),
            website: non_empty(profile.website),
            operating_hours: profile.operating_hours,
            contact_info: profile.contact_info,
            tags: profile.tags,
        }
    }
}

/// Review as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualReview {
    pub business_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    pub id: String,
}

impl From<Review> for IndividualReview {
    fn from(review: Review) -> Self {
        Self {
            business_id: review.business_id,
            user_id: review.user_id,
            rating: review.rating,
            text: review.text,
            updated_at: review.updated_at,
            id: review.id,
        }
    }
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API error envelope; `data` is always `null`
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: (),
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: message,
            timestamp: Utc::now(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn no_blank_entries(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ValidationError::new("blank_entry"));
    }
    Ok(())
}

/// Body of the business-profile list endpoints
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfilesQuery {
    #[validate(custom(function = not_blank))]
    pub user_id: String,
    #[validate(custom(function = no_blank_entries))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = no_blank_entries))]
    pub business_states: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> BusinessProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn minimal_profile_serializes_without_optional_fields() {
        let record = profile(json!({ "id": "b1", "name": "Cafe", "businessState": "open" }));
        let shaped = IndividualBusinessProfile::from_record(record, true, vec![]);

        assert_eq!(
            serde_json::to_value(shaped).unwrap(),
            json!({ "id": "b1", "name": "Cafe", "state": "open", "liked": true, "album": [] })
        );
    }

    #[test]
    fn present_optional_fields_are_copied() {
        let record = profile(json!({
            "id": "b2",
            "name": "Bakery",
            "businessState": "closed",
            "profilePicture": { "imageUrl": "https://img/p.png" },
            "description": "Bread",
            "address": "1 Main St",
            "website": "https://bakery.example",
            "operatingHours": [{ "dayOfWeek": "MON", "opens": "08:00", "closes": "17:00" }],
            "contactInfo": { "email": "hi@bakery.example", "phoneNumber": "555-0100" },
            "tags": ["vegan"]
        }));
        let shaped = IndividualBusinessProfile::from_record(record, false, vec!["a.png".into()]);

        assert_eq!(
            serde_json::to_value(shaped).unwrap(),
            json!({
                "id": "b2",
                "name": "Bakery",
                "state": "closed",
                "liked": false,
                "album": ["a.png"],
                "profilePictureUrl": "https://img/p.png",
                "description": "Bread",
                "address": "1 Main St",
                "website": "https://bakery.example",
                "operatingHours": [{ "dayOfWeek": "MON", "opens": "08:00", "closes": "17:00" }],
                "contactInfo": { "email": "hi@bakery.example", "phoneNumber": "555-0100" },
                "tags": ["vegan"]
            })
        );
    }

    #[test]
    fn empty_strings_and_picture_without_url_are_omitted() {
        let record = profile(json!({
            "id": "b3",
            "name": "Shop",
            "businessState": "open",
            "profilePicture": {},
            "description": "",
            "website": null
        }));
        let shaped = IndividualBusinessProfile::from_record(record, false, vec![]);

        assert!(shaped.profile_picture_url.is_none());
        assert!(shaped.description.is_none());
        assert!(shaped.website.is_none());
    }

    #[test]
    fn user_without_liked_list_likes_nothing() {
        let user: UserProfile = serde_json::from_value(json!({ "id": "u1" })).unwrap();
        assert!(!user.likes("b1"));

        let user: UserProfile =
            serde_json::from_value(json!({ "id": "u1", "likedBusinesses": ["b1"] })).unwrap();
        assert!(user.likes("b1"));
        assert!(!user.likes("b2"));
    }

    #[test]
    fn review_maps_one_to_one() {
        let review: Review = serde_json::from_value(json!({
            "id": "r1",
            "businessId": "b1",
            "userId": "u1",
            "rating": 4,
            "text": "Great",
            "updatedAt": 1700000000000u64
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(IndividualReview::from(review)).unwrap(),
            json!({
                "businessId": "b1",
                "userId": "u1",
                "rating": 4,
                "text": "Great",
                "updatedAt": 1700000000000u64,
                "id": "r1"
            })
        );
    }

    #[test]
    fn review_without_rating_omits_it() {
        let review: Review =
            serde_json::from_value(json!({ "id": "r2", "businessId": "b1", "userId": "u1" }))
                .unwrap();

        assert_eq!(
            serde_json::to_value(IndividualReview::from(review)).unwrap(),
            json!({ "businessId": "b1", "userId": "u1", "id": "r2" })
        );
    }

    #[test]
    fn error_envelope_has_null_data() {
        let body = serde_json::to_value(ApiResponse::error("Business not found".into())).unwrap();

        assert_eq!(body["success"], json!(false));
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["error"], json!("Business not found"));
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn query_validation_rejects_blank_values() {
        let ok = BusinessProfilesQuery {
            user_id: "u1".into(),
            tags: Some(vec!["vegan".into()]),
            business_states: None,
        };
        assert!(ok.validate().is_ok());

        let blank_user = BusinessProfilesQuery {
            user_id: "  ".into(),
            ..Default::default()
        };
        assert!(blank_user.validate().is_err());

        let blank_tag = BusinessProfilesQuery {
            user_id: "u1".into(),
            tags: Some(vec!["".into()]),
            business_states: None,
        };
        assert!(blank_tag.validate().is_err());
    }
}
