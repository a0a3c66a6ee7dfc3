use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use jibe_db::models::{InsultRow, SubmitterRow};
use jibe_types::models::{Insult, Submitter};

pub fn submitter_from_row(row: SubmitterRow) -> Submitter {
    Submitter {
        registeredat: parse_timestamp(&row.registeredat, "registeredat", "submitter", row.sid),
        sid: row.sid,
        userid: row.userid,
        free: row.free,
        authcode: row.authcode,
    }
}

pub fn insult_from_row(row: InsultRow) -> Insult {
    Insult {
        createdat: parse_timestamp(&row.createdat, "createdat", "insult", row.iid),
        lastused: parse_timestamp(&row.lastused, "lastused", "insult", row.iid),
        iid: row.iid,
        content: row.content,
        used: row.used,
        by: row.by,
    }
}

fn parse_timestamp(raw: &str, column: &str, table: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on {} {}: {}", column, raw, table, id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_timestamps() {
        let row = InsultRow {
            iid: 1,
            content: "x".into(),
            used: 0,
            by: None,
            createdat: "2024-03-05 10:11:12".into(),
            lastused: "2024-03-06T00:00:00Z".into(),
        };
        let insult = insult_from_row(row);
        assert_eq!(insult.createdat.year(), 2024);
        assert_eq!(insult.createdat.second(), 12);
        assert_eq!(insult.lastused.day(), 6);
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        let row = SubmitterRow {
            sid: 1,
            userid: None,
            free: true,
            authcode: "a".into(),
            registeredat: "yesterday-ish".into(),
        };
        assert_eq!(submitter_from_row(row).registeredat, DateTime::<Utc>::default());
    }
}
