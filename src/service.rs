//! Read-side query logic over the business, user, album and review tables.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ServiceError;
use crate::models::{
    AlbumImage, BusinessProfile, IndividualBusinessProfile, IndividualReview, Review, UserProfile,
};
use crate::store::{Condition, Item, RecordStore, ScanFilter, Table};

fn decode<T: DeserializeOwned>(table: Table, item: Item) -> Result<T, ServiceError> {
    serde_json::from_value(Value::Object(item)).map_err(|e| ServiceError::MalformedRecord {
        table,
        reason: e.to_string(),
    })
}

fn decode_all<T: DeserializeOwned>(table: Table, items: Vec<Item>) -> Result<Vec<T>, ServiceError> {
    items.into_iter().map(|item| decode(table, item)).collect()
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn RecordStore>,
    fetch_concurrency: usize,
}

impl QueryService {
    /// `fetch_concurrency` bounds how many profiles list operations assemble
    /// at once; 1 keeps them strictly sequential.
    pub fn new(store: Arc<dyn RecordStore>, fetch_concurrency: usize) -> Self {
        Self {
            store,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, ServiceError> {
        match self.store.get_item(Table::UserProfile, user_id).await? {
            Some(item) => decode(Table::UserProfile, item),
            None => Err(ServiceError::NotFound(format!(
                "User profile {user_id} not found"
            ))),
        }
    }

    async fn album(&self, business_id: &str) -> Result<Vec<String>, ServiceError> {
        let filter = ScanFilter::all_of(vec![Condition::equals("businessProfileId", business_id)]);
        let images: Vec<AlbumImage> =
            decode_all(Table::Album, self.store.scan(Table::Album, &filter).await?)?;

        Ok(images
            .into_iter()
            .filter_map(|image| {
                if image.image_url.is_none() {
                    log::warn!("Album image for {} has no imageUrl", image.business_profile_id);
                }
                image.image_url
            })
            .collect())
    }

    pub async fn get_business_profile(
        &self,
        business_id: &str,
        user_id: &str,
    ) -> Result<IndividualBusinessProfile, ServiceError> {
        let profile: BusinessProfile =
            match self.store.get_item(Table::BusinessProfile, business_id).await? {
                Some(item) => decode(Table::BusinessProfile, item)?,
                None => {
                    return Err(ServiceError::NotFound(format!(
                        "Business profile {business_id} not found"
                    )))
                }
            };

        let liked = self.user_profile(user_id).await?.likes(business_id);
        let album = self.album(business_id).await?;

        Ok(IndividualBusinessProfile::from_record(profile, liked, album))
    }

    /// Ids of businesses matching any of the given tags or states.
    ///
    /// Every clause is OR-ed, across both dimensions: `tags=["vegan"]`,
    /// `states=["open"]` yields businesses that are vegan *or* open.
    pub async fn filter_business_ids(
        &self,
        tags: Option<&[String]>,
        business_states: Option<&[String]>,
    ) -> Result<Vec<String>, ServiceError> {
        let mut conditions = Vec::new();
        for tag in tags.unwrap_or_default() {
            conditions.push(Condition::contains("tags", tag.as_str()));
        }
        for state in business_states.unwrap_or_default() {
            conditions.push(Condition::equals("businessState", state.as_str()));
        }

        let items = self
            .store
            .scan(Table::BusinessProfile, &ScanFilter::any_of(conditions))
            .await?;

        items
            .iter()
            .map(|item| {
                item.get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| ServiceError::MalformedRecord {
                        table: Table::BusinessProfile,
                        reason: "missing string id".to_string(),
                    })
            })
            .collect()
    }

    async fn profiles_for(
        &self,
        business_ids: Vec<String>,
        user_id: &str,
    ) -> Result<Vec<IndividualBusinessProfile>, ServiceError> {
        stream::iter(business_ids)
            .map(|business_id| async move { self.get_business_profile(&business_id, user_id).await })
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await
    }

    pub async fn list_business_profiles(
        &self,
        user_id: &str,
        tags: Option<&[String]>,
        business_states: Option<&[String]>,
    ) -> Result<Vec<IndividualBusinessProfile>, ServiceError> {
        let business_ids = self.filter_business_ids(tags, business_states).await?;
        self.profiles_for(business_ids, user_id).await
    }

    pub async fn list_liked_business_profiles(
        &self,
        user_id: &str,
        tags: Option<&[String]>,
        business_states: Option<&[String]>,
    ) -> Result<Vec<IndividualBusinessProfile>, ServiceError> {
        let user = self.user_profile(user_id).await?;
        if user.liked().is_empty() {
            return Ok(Vec::new());
        }

        let liked: HashSet<&str> = user.liked().iter().map(String::as_str).collect();
        let business_ids = self
            .filter_business_ids(tags, business_states)
            .await?
            .into_iter()
            .filter(|id| liked.contains(id.as_str()))
            .collect();

        self.profiles_for(business_ids, user_id).await
    }

    async fn reviews(&self, filter: ScanFilter) -> Result<Vec<IndividualReview>, ServiceError> {
        let reviews: Vec<Review> =
            decode_all(Table::Reviews, self.store.scan(Table::Reviews, &filter).await?)?;
        Ok(reviews.into_iter().map(IndividualReview::from).collect())
    }

    /// The review a user left for a business. Duplicates are not expected;
    /// the first match wins.
    pub async fn get_review(
        &self,
        business_id: &str,
        user_id: &str,
    ) -> Result<IndividualReview, ServiceError> {
        let filter = ScanFilter::all_of(vec![
            Condition::equals("businessId", business_id),
            Condition::equals("userId", user_id),
        ]);

        self.reviews(filter).await?.into_iter().next().ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Review for business {business_id} by user {user_id} not found"
            ))
        })
    }

    pub async fn list_business_reviews(
        &self,
        business_id: &str,
    ) -> Result<Vec<IndividualReview>, ServiceError> {
        self.reviews(ScanFilter::all_of(vec![Condition::equals("businessId", business_id)]))
            .await
    }

    pub async fn list_user_reviews(&self, user_id: &str) -> Result<Vec<IndividualReview>, ServiceError> {
        self.reviews(ScanFilter::all_of(vec![Condition::equals("userId", user_id)]))
            .await
    }
}
