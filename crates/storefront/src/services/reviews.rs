//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use ecomify_core::{ProductId, ReviewId, UserId};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::models::CurrentCustomer;

const TABLE: &str = "reviews";

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("Comment must be at most {MAX_COMMENT_CHARS} characters")]
    CommentTooLong,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A published review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    #[serde(default)]
    pub author_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/products/{id}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CreateReview {
    /// Check rating range and comment length.
    ///
    /// # Errors
    ///
    /// Returns error if the rating is outside 1-5 or the comment is too long.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::InvalidRating);
        }
        if self
            .comment
            .as_deref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
        {
            return Err(ReviewError::CommentTooLong);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct NewReview<'a> {
    product_id: ProductId,
    user_id: UserId,
    author_name: Option<&'a str>,
    rating: u8,
    title: Option<&'a str>,
    comment: Option<&'a str>,
}

/// Review reads and writes.
pub struct Reviews<'a> {
    backend: &'a BackendClient,
}

impl<'a> Reviews<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    #[instrument(skip(self))]
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewError> {
        let query = Query::new()
            .eq("product_id", product_id)
            .order("created_at", Direction::Desc);
        Ok(self
            .backend
            .table(TABLE, Caller::Anonymous)
            .select(&query)
            .await?)
    }

    /// Publish a review as the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the backend rejects the insert.
    #[instrument(skip(self, customer, review), fields(user_id = %customer.id))]
    pub async fn create(
        &self,
        customer: &CurrentCustomer,
        product_id: ProductId,
        review: &CreateReview,
    ) -> Result<Review, ReviewError> {
        review.validate()?;

        let row = NewReview {
            product_id,
            user_id: customer.id,
            author_name: customer.full_name.as_deref(),
            rating: review.rating,
            title: non_blank(review.title.as_deref()),
            comment: non_blank(review.comment.as_deref()),
        };
        Ok(self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .insert(&row)
            .await?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
