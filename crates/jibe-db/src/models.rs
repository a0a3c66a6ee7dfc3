/// Database row types — these map directly to SQLite rows.
/// Distinct from jibe-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct SubmitterRow {
    pub sid: i64,
    pub userid: Option<String>,
    pub free: bool,
    pub authcode: String,
    pub registeredat: String,
}

#[derive(Debug, Clone)]
pub struct InsultRow {
    pub iid: i64,
    pub content: String,
    pub used: i64,
    pub by: Option<i64>,
    pub createdat: String,
    pub lastused: String,
}
