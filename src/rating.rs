//! File rating: one vote per user per file, with denormalized aggregates.
//!
//! Every vote is kept as a row keyed by (file, voter). The file's rating and
//! its owner's rating are running sums of those rows, adjusted incrementally
//! and never recomputed. The row and both sums are written in a single store
//! transaction, so concurrent votes on the same file serialize and the sums
//! always equal the rows they summarize.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::{Database, DatabaseError, ErrorKind};

pub const MIN_RATING: i32 = -10;
pub const MAX_RATING: i32 = 10;

/// A rating value known to lie in `MIN_RATING..=MAX_RATING`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote(i32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rating must be an integer between -10 and 10")]
pub struct InvalidVote;

impl Vote {
    pub fn new(value: i32) -> Result<Self, InvalidVote> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Vote(value))
        } else {
            Err(InvalidVote)
        }
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl FromStr for Vote {
    type Err = InvalidVote;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map_err(|_| InvalidVote).and_then(Vote::new)
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("File {0} not found")]
    FileNotFound(u64),
    #[error("Previous rating of file {file_id} by {voter} disappeared")]
    MissingPreviousVote { file_id: u64, voter: String },
    #[error("Storage error: {0}")]
    Store(#[from] DatabaseError),
}

/// What a call to [`RatingEngine::submit_vote`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this user; aggregates moved by the full rating
    Recorded,
    /// Vote replaced; aggregates moved by the difference
    Changed { previous: i32, delta: i64 },
    /// Same value as before; nothing written
    Unchanged,
}

/// Statements the rating engine issues against the relational store.
///
/// Each call is one transaction covering the vote row and both aggregates.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Insert a first vote and add it to the file's and owner's aggregates.
    /// Must report a duplicate (file, voter) as
    /// `ErrorKind::UniqueConstraintViolation` and write nothing. Returns the
    /// owner's username.
    async fn record_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<String, DatabaseError>;

    /// Replace an existing vote and move both aggregates by the difference.
    /// Returns the previous value; writes nothing when it equals `rating`.
    async fn change_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<i32, DatabaseError>;
}

#[async_trait]
impl RatingStore for Database {
    async fn record_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<String, DatabaseError> {
        self.record_file_rating(file_id, voter, rating)
    }

    async fn change_rating(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<i32, DatabaseError> {
        self.change_file_rating(file_id, voter, rating)
    }
}

pub struct RatingEngine {
    store: Arc<dyn RatingStore>,
}

impl RatingEngine {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store }
    }

    /// Record `voter`'s vote on a file, or change their existing vote.
    ///
    /// A fresh vote inserts the row and adds the rating to the file and to
    /// the file's owner. If the row already exists only the difference from
    /// the previous value is applied; an identical vote writes nothing.
    /// Errors other than the duplicate-row signal are returned as is.
    pub async fn submit_vote(
        &self,
        file_id: u64,
        voter: &str,
        vote: Vote,
    ) -> Result<VoteOutcome, RatingError> {
        let rating = vote.value();

        match self.store.record_rating(file_id, voter, rating).await {
            Ok(owner) => {
                tracing::debug!(file_id, voter, rating, owner = %owner, "Recorded vote");
                Ok(VoteOutcome::Recorded)
            }
            Err(e) if e.kind() == ErrorKind::UniqueConstraintViolation => {
                self.change_vote(file_id, voter, rating).await
            }
            Err(e) => Err(not_found_as_missing_file(file_id, e)),
        }
    }

    async fn change_vote(
        &self,
        file_id: u64,
        voter: &str,
        rating: i32,
    ) -> Result<VoteOutcome, RatingError> {
        let previous = match self.store.change_rating(file_id, voter, rating).await {
            Ok(previous) => previous,
            Err(DatabaseError::NotFound {
                table: "file_ratings",
                ..
            }) => {
                return Err(RatingError::MissingPreviousVote {
                    file_id,
                    voter: voter.to_string(),
                })
            }
            Err(e) => return Err(not_found_as_missing_file(file_id, e)),
        };

        if previous == rating {
            return Ok(VoteOutcome::Unchanged);
        }

        let delta = i64::from(rating) - i64::from(previous);
        tracing::debug!(file_id, voter, previous, rating, "Changed vote");
        Ok(VoteOutcome::Changed { previous, delta })
    }
}

fn not_found_as_missing_file(file_id: u64, e: DatabaseError) -> RatingError {
    match e {
        DatabaseError::NotFound { table: "files", .. } => RatingError::FileNotFound(file_id),
        e => RatingError::Store(e),
    }
}
