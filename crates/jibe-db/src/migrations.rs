use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (submitter, insult)");
        conn.execute_batch(
            "
            CREATE TABLE submitter (
                sid           INTEGER PRIMARY KEY AUTOINCREMENT,
                userid        TEXT,
                free          INTEGER NOT NULL DEFAULT 1,
                authcode      TEXT NOT NULL UNIQUE,
                registeredat  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_submitter_userid ON submitter(userid);

            CREATE TABLE insult (
                iid        INTEGER PRIMARY KEY AUTOINCREMENT,
                content    TEXT NOT NULL CHECK (length(content) <= 4096),
                used       INTEGER NOT NULL DEFAULT 0 CHECK (used >= 0),
                \"by\"       INTEGER REFERENCES submitter(sid) ON DELETE SET NULL,
                createdat  TEXT NOT NULL DEFAULT (datetime('now')),
                lastused   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_insult_by ON insult(\"by\");

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
