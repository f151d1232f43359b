//! Schema migrations for the SQLite-backed graph store.
//!
//! Ported from `graphrag_agent.community.summary.dsa_schema.setup_dsa_schema`:
//! that module creates constraints/indexes `IF NOT EXISTS` and backfills
//! `last_compacted_at`/`summary_tokens` on existing communities, swallowing
//! "already exists" as success. SQLite's `IF NOT EXISTS` DDL makes that
//! swallow unnecessary — it is simply idempotent by construction, run
//! through the same versioned-migration-list mechanism the teacher's
//! storage layer uses.

/// A single schema migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "entities, relationships, communities, community deltas",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "DSA indexes on community_deltas(community_id, created_at)",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "backfill last_compacted_at/summary_tokens on existing communities",
        up: MIGRATION_V3_UP,
    },
];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    label TEXT NOT NULL DEFAULT 'Entity',
    properties TEXT NOT NULL DEFAULT '{}',
    embeddings TEXT
);

CREATE TABLE IF NOT EXISTS relationships (
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'RELATED',
    t_obs TEXT NOT NULL DEFAULT '[]',
    t_start TEXT NOT NULL DEFAULT '[]',
    t_end TEXT NOT NULL DEFAULT '[]',
    atomic_facts TEXT NOT NULL DEFAULT '[]',
    confidence REAL NOT NULL DEFAULT 1.0,
    properties TEXT NOT NULL DEFAULT '{}',
    embeddings TEXT,
    PRIMARY KEY (source_id, target_id, type)
);

CREATE TABLE IF NOT EXISTS communities (
    id TEXT PRIMARY KEY,
    level INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    full_content TEXT NOT NULL DEFAULT '',
    weight REAL NOT NULL DEFAULT 0.0,
    summary_tokens INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT,
    last_compacted_at TEXT
);

CREATE TABLE IF NOT EXISTS community_members (
    community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
    entity_id TEXT NOT NULL,
    PRIMARY KEY (community_id, entity_id)
);

CREATE TABLE IF NOT EXISTS community_deltas (
    id TEXT PRIMARY KEY,
    community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
    summary TEXT NOT NULL,
    summary_tokens INTEGER NOT NULL DEFAULT 0,
    related_entities TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    compacted_at TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
);
"#;

const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS community_delta_community_id ON community_deltas(community_id);
CREATE INDEX IF NOT EXISTS community_delta_created_at ON community_deltas(created_at);
"#;

/// Backfill-only, re-runnable by construction: both updates are guarded by a
/// `WHERE` clause that only matches rows still at their never-compacted
/// default, so applying this migration twice (or against a database that was
/// already up to date) touches zero rows the second time.
const MIGRATION_V3_UP: &str = r#"
UPDATE communities
SET last_compacted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
WHERE last_compacted_at IS NULL;

UPDATE communities
SET summary_tokens = length(summary) / 4
WHERE summary_tokens = 0 AND length(summary) > 0;
"#;

fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Apply every migration newer than the connection's current `user_version`,
/// in order. Idempotent: re-running against an up-to-date connection is a
/// no-op, matching the DSA schema setup's `IF NOT EXISTS`-guarded contract.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying schema migration"
            );
            conn.execute_batch(migration.up)?;
            conn.pragma_update(None, "user_version", migration.version)?;
            applied += 1;
        }
    }

    Ok(applied)
}
