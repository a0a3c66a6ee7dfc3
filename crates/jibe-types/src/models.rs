use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An API-key holder. `userid` stays empty until an external process
/// binds the key to an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submitter {
    pub sid: i64,
    pub userid: Option<String>,
    pub free: bool,
    pub authcode: String,
    pub registeredat: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insult {
    pub iid: i64,
    pub content: String,
    pub used: i64,
    /// Owning submitter's `sid`, if any.
    pub by: Option<i64>,
    pub createdat: DateTime<Utc>,
    pub lastused: DateTime<Utc>,
}
