use anyhow::Result;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params_from_iter};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use jibe_core::{Filter, FilterClause};

use crate::models::{InsultRow, SubmitterRow};
use crate::{Database, LOWER_FN, Store};

const SUBMITTER_COLUMNS: &str = "sid, userid, free, authcode, registeredat";
const INSULT_COLUMNS: &str = "iid, content, used, \"by\", createdat, lastused";

impl Store for Database {
    // -- Submitters --

    fn create_submitters(&self, count: usize) -> Result<Vec<SubmitterRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut created = Vec::with_capacity(count);
            for _ in 0..count {
                let authcode = Uuid::new_v4().to_string();
                let sql = "INSERT INTO submitter (authcode) VALUES (?1)";
                debug!("{} [{:?}]", sql, authcode);
                tx.execute(sql, [&authcode])?;
                let sid = tx.last_insert_rowid();
                let row = query_submitter_by_sid(&tx, sid)?
                    .ok_or_else(|| anyhow::anyhow!("Submitter {} vanished after insert", sid))?;
                created.push(row);
            }
            tx.commit()?;
            Ok(created)
        })
    }

    fn find_submitters(&self, filter: &Filter) -> Result<Vec<SubmitterRow>> {
        self.with_conn(|conn| {
            let (clause, params) = where_clause(filter);
            let sql = format!("SELECT {SUBMITTER_COLUMNS} FROM submitter{clause} ORDER BY sid");
            debug!("{} {:?}", sql, params);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), submitter_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn get_submitter(&self, sid: i64) -> Result<Option<SubmitterRow>> {
        self.with_conn(|conn| query_submitter_by_sid(conn, sid))
    }

    fn get_submitter_by_userid(&self, userid: &str) -> Result<Option<SubmitterRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SUBMITTER_COLUMNS} FROM submitter WHERE userid = ?1 ORDER BY sid LIMIT 1"
            );
            debug!("{} [{:?}]", sql, userid);
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([userid], submitter_from_row).optional()?;
            Ok(row)
        })
    }

    fn set_submitter_userid(&self, sid: i64, userid: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let sql = "UPDATE submitter SET userid = ?1, registeredat = datetime('now') WHERE sid = ?2";
            debug!("{} [{:?}, {}]", sql, userid, sid);
            let changed = conn.execute(sql, rusqlite::params![userid, sid])?;
            Ok(changed > 0)
        })
    }

    // -- Insults --

    fn create_insult(&self, content: &str, by: Option<i64>) -> Result<InsultRow> {
        self.with_conn(|conn| {
            let sql = "INSERT INTO insult (content, \"by\") VALUES (?1, ?2)";
            debug!("{} [{:?}, {:?}]", sql, content, by);
            conn.execute(sql, rusqlite::params![content, by])?;
            let iid = conn.last_insert_rowid();
            query_insult_by_iid(conn, iid)?
                .ok_or_else(|| anyhow::anyhow!("Insult {} vanished after insert", iid))
        })
    }

    fn insult_contents(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let sql = "SELECT content FROM insult ORDER BY iid";
            debug!("{}", sql);
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(rows)
        })
    }

    fn find_insults(&self, filter: &Filter) -> Result<Vec<InsultRow>> {
        self.with_conn(|conn| {
            let (clause, params) = where_clause(filter);
            let sql = format!("SELECT {INSULT_COLUMNS} FROM insult{clause} ORDER BY iid");
            debug!("{} {:?}", sql, params);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), insult_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn get_insult(&self, iid: i64) -> Result<Option<InsultRow>> {
        self.with_conn(|conn| query_insult_by_iid(conn, iid))
    }

    fn delete_insult(&self, iid: i64) -> Result<Option<InsultRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing = query_insult_by_iid(&tx, iid)?;
            if existing.is_some() {
                let sql = "DELETE FROM insult WHERE iid = ?1";
                debug!("{} [{}]", sql, iid);
                tx.execute(sql, [iid])?;
            }
            tx.commit()?;
            Ok(existing)
        })
    }
}

/// Renders a filter as ` WHERE ...` plus its bound parameters. An empty
/// filter renders as an empty string. Field names come from a fixed
/// schema, so they are interpolated (quoted) rather than bound.
fn where_clause(filter: &Filter) -> (String, Vec<SqlValue>) {
    if filter.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut conditions = Vec::with_capacity(filter.len());
    let mut params = Vec::new();
    for (field, clause) in filter {
        match clause {
            FilterClause::IsNull => conditions.push(format!("\"{field}\" IS NULL")),
            FilterClause::Like(pattern) => {
                params.push(SqlValue::Text(pattern.clone()));
                conditions.push(format!(
                    "{LOWER_FN}(\"{field}\") LIKE {LOWER_FN}(?{})",
                    params.len()
                ));
            }
            FilterClause::Equals(value) => {
                params.push(to_sql_value(value));
                conditions.push(format!("\"{field}\" = ?{}", params.len()));
            }
        }
    }

    (format!(" WHERE {}", conditions.join(" AND ")), params)
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn query_submitter_by_sid(conn: &Connection, sid: i64) -> Result<Option<SubmitterRow>> {
    let sql = format!("SELECT {SUBMITTER_COLUMNS} FROM submitter WHERE sid = ?1");
    debug!("{} [{}]", sql, sid);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([sid], submitter_from_row).optional()?;
    Ok(row)
}

fn query_insult_by_iid(conn: &Connection, iid: i64) -> Result<Option<InsultRow>> {
    let sql = format!("SELECT {INSULT_COLUMNS} FROM insult WHERE iid = ?1");
    debug!("{} [{}]", sql, iid);
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([iid], insult_from_row).optional()?;
    Ok(row)
}

fn submitter_from_row(row: &Row<'_>) -> rusqlite::Result<SubmitterRow> {
    Ok(SubmitterRow {
        sid: row.get(0)?,
        userid: row.get(1)?,
        free: row.get(2)?,
        authcode: row.get(3)?,
        registeredat: row.get(4)?,
    })
}

fn insult_from_row(row: &Row<'_>) -> rusqlite::Result<InsultRow> {
    Ok(InsultRow {
        iid: row.get(0)?,
        content: row.get(1)?,
        used: row.get(2)?,
        by: row.get(3)?,
        createdat: row.get(4)?,
        lastused: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jibe_core::build_filter;
    use jibe_core::filter::{INSULT_SCHEMA, SUBMITTER_SCHEMA};
    use serde_json::json;

    fn filter_of(v: Value, schema: jibe_core::Schema) -> Filter {
        build_filter(v.as_object().unwrap(), schema)
    }

    #[test]
    fn create_submitters_assigns_unique_authcodes() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_submitters(3).unwrap();
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|s| s.free && s.userid.is_none()));
        assert_ne!(created[0].authcode, created[1].authcode);
        assert_ne!(created[1].authcode, created[2].authcode);
        assert!(created[0].sid < created[1].sid);
    }

    #[test]
    fn find_submitters_by_null_and_boolean() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_submitters(2).unwrap();
        assert!(db.set_submitter_userid(created[0].sid, "alice").unwrap());

        let unbound = db.find_submitters(&filter_of(json!({"userid": null}), SUBMITTER_SCHEMA)).unwrap();
        assert_eq!(unbound.len(), 1);
        assert_eq!(unbound[0].sid, created[1].sid);

        let free = db.find_submitters(&filter_of(json!({"free": "true"}), SUBMITTER_SCHEMA)).unwrap();
        assert_eq!(free.len(), 2);

        let paid = db.find_submitters(&filter_of(json!({"free": false}), SUBMITTER_SCHEMA)).unwrap();
        assert!(paid.is_empty());
    }

    #[test]
    fn userid_lookup_and_pattern_match() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_submitters(1).unwrap();
        db.set_submitter_userid(created[0].sid, "Alice").unwrap();

        assert!(db.get_submitter_by_userid("Alice").unwrap().is_some());
        assert!(db.get_submitter_by_userid("bob").unwrap().is_none());

        let found = db.find_submitters(&filter_of(json!({"userid": "ali%"}), SUBMITTER_SCHEMA)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].userid.as_deref(), Some("Alice"));
    }

    #[test]
    fn set_userid_on_missing_submitter() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.set_submitter_userid(99, "ghost").unwrap());
    }

    #[test]
    fn create_and_find_insults() {
        let db = Database::open_in_memory().unwrap();
        let sub = db.create_submitters(1).unwrap().remove(0);

        let a = db.create_insult("You smell like a wet dog", None).unwrap();
        let b = db.create_insult("Your code is spaghetti", Some(sub.sid)).unwrap();
        assert_eq!(a.used, 0);
        assert_eq!(b.by, Some(sub.sid));

        assert_eq!(
            db.insult_contents().unwrap(),
            vec!["You smell like a wet dog".to_string(), "Your code is spaghetti".to_string()]
        );

        let by = db
            .find_insults(&filter_of(json!({"by": sub.sid.to_string()}), INSULT_SCHEMA))
            .unwrap();
        assert_eq!(by.len(), 1);
        assert_eq!(by[0].iid, b.iid);

        let orphans = db.find_insults(&filter_of(json!({"by": null}), INSULT_SCHEMA)).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].iid, a.iid);

        let dogs = db.find_insults(&filter_of(json!({"content": "%DOG%"}), INSULT_SCHEMA)).unwrap();
        assert_eq!(dogs.len(), 1);

        let all = db.find_insults(&Filter::new()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn pattern_match_folds_non_ascii_case() {
        let db = Database::open_in_memory().unwrap();
        db.create_insult("Ärgerlich, wie immer", None).unwrap();
        db.create_insult("ÇA SUFFIT", None).unwrap();

        let found = db
            .find_insults(&filter_of(json!({"content": "ärgerlich%"}), INSULT_SCHEMA))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "Ärgerlich, wie immer");

        let found = db
            .find_insults(&filter_of(json!({"content": "ça suffit"}), INSULT_SCHEMA))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn insult_requires_existing_submitter() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_insult("orphaned", Some(42)).is_err());
    }

    #[test]
    fn delete_insult_twice() {
        let db = Database::open_in_memory().unwrap();
        let row = db.create_insult("Short lived", None).unwrap();

        let deleted = db.delete_insult(row.iid).unwrap();
        assert_eq!(deleted.map(|r| r.content), Some("Short lived".to_string()));
        assert!(db.delete_insult(row.iid).unwrap().is_none());
        assert!(db.get_insult(row.iid).unwrap().is_none());
    }

    #[test]
    fn where_clause_quotes_and_numbers_params() {
        let filter = filter_of(json!({"by": 3, "content": "x%", "used": null}), INSULT_SCHEMA);
        let (sql, params) = where_clause(&filter);
        assert_eq!(
            sql,
            " WHERE \"by\" = ?1 AND unicode_lower(\"content\") LIKE unicode_lower(?2) AND \"used\" IS NULL"
        );
        assert_eq!(params, vec![SqlValue::Integer(3), SqlValue::Text("x%".into())]);
    }
}
