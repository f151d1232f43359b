//! SQLite-backed [`GraphStore`] implementation.
//!
//! Uses the teacher's interior-mutability pattern: a single `Mutex<Connection>`
//! so every method takes `&self` and the store is `Send + Sync`, safe to hold
//! behind `Arc` across the async extraction path and the synchronous
//! writer/DSA code without `&mut` threading.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::kg::entity::{PropertyMap, PropertyValue};
use crate::kg::{TemporalEntity, TemporalRelationship};

use super::error::{Result, StoreError};
use super::graph_store::{Community, CommunityDelta, DeltaStatus, GraphStore};
use super::schema::apply_migrations;
use super::writer::MergeStrategy;

pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure_and_migrate(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_and_migrate(conn)
    }

    fn configure_and_migrate(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .or_else(|_| conn.execute_batch("PRAGMA foreign_keys = ON;"))?;
        apply_migrations(&conn).map_err(StoreError::Database)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn properties_to_json(properties: &PropertyMap) -> Result<String> {
        Ok(serde_json::to_string(properties)?)
    }

    fn properties_from_json(raw: &str) -> Result<PropertyMap> {
        Ok(serde_json::from_str(raw)?)
    }

    fn embeddings_to_json(embeddings: &Option<Vec<f32>>) -> Result<Option<String>> {
        match embeddings {
            Some(v) => Ok(Some(serde_json::to_string(v)?)),
            None => Ok(None),
        }
    }

    fn embeddings_from_json(raw: Option<String>) -> Result<Option<Vec<f32>>> {
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn row_to_entity(
        id: String,
        name: String,
        label: String,
        properties: String,
        embeddings: Option<String>,
    ) -> Result<TemporalEntity> {
        Ok(TemporalEntity {
            id,
            name,
            label,
            properties: Self::properties_from_json(&properties)?,
            embeddings: Self::embeddings_from_json(embeddings)?,
        })
    }

    fn row_to_relationship(
        source_id: String,
        target_id: String,
        r#type: String,
        t_obs: String,
        t_start: String,
        t_end: String,
        atomic_facts: String,
        confidence: f64,
        properties: String,
        embeddings: Option<String>,
    ) -> Result<TemporalRelationship> {
        Ok(TemporalRelationship {
            source_id,
            target_id,
            r#type,
            t_obs: serde_json::from_str(&t_obs)?,
            t_start: serde_json::from_str(&t_start)?,
            t_end: serde_json::from_str(&t_end)?,
            atomic_facts: serde_json::from_str(&atomic_facts)?,
            confidence,
            properties: Self::properties_from_json(&properties)?,
            embeddings: Self::embeddings_from_json(embeddings)?,
        })
    }

    fn row_to_community(
        id: String,
        level: i64,
        title: String,
        summary: String,
        full_content: String,
        weight: f64,
        summary_tokens: i64,
        updated_at: Option<String>,
        last_compacted_at: Option<String>,
    ) -> Community {
        Community {
            id,
            level,
            title,
            summary,
            full_content,
            weight,
            summary_tokens,
            updated_at,
            last_compacted_at,
        }
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn upsert_entity(&self, entity: &TemporalEntity) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let properties = Self::properties_to_json(&entity.properties)?;
        let embeddings = Self::embeddings_to_json(&entity.embeddings)?;
        conn.execute(
            "INSERT INTO entities (id, name, label, properties, embeddings)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                label = excluded.label,
                properties = excluded.properties,
                embeddings = COALESCE(excluded.embeddings, entities.embeddings)",
            params![entity.id, entity.name, entity.label, properties, embeddings],
        )?;
        Ok(())
    }

    async fn upsert_relationship(&self, relationship: &TemporalRelationship, strategy: MergeStrategy) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let properties = Self::properties_to_json(&relationship.properties)?;
        let embeddings = Self::embeddings_to_json(&relationship.embeddings)?;

        let existing: Option<(String, String, String, String)> = conn
            .query_row(
                "SELECT t_obs, t_start, t_end, atomic_facts FROM relationships
                 WHERE source_id = ?1 AND target_id = ?2 AND type = ?3",
                params![relationship.source_id, relationship.target_id, relationship.r#type],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let (t_obs, t_start, t_end, atomic_facts) = match (strategy, existing) {
            (MergeStrategy::Update, Some((eo, es, ee, ef))) => {
                let mut t_obs: Vec<f64> = serde_json::from_str(&eo)?;
                let mut t_start: Vec<f64> = serde_json::from_str(&es)?;
                let mut t_end: Vec<f64> = serde_json::from_str(&ee)?;
                let mut atomic_facts: Vec<String> = serde_json::from_str(&ef)?;
                t_obs.extend(relationship.t_obs.iter().copied());
                t_start.extend(relationship.t_start.iter().copied());
                t_end.extend(relationship.t_end.iter().copied());
                atomic_facts.extend(relationship.atomic_facts.iter().cloned());
                (
                    serde_json::to_string(&t_obs)?,
                    serde_json::to_string(&t_start)?,
                    serde_json::to_string(&t_end)?,
                    serde_json::to_string(&atomic_facts)?,
                )
            }
            _ => (
                serde_json::to_string(&relationship.t_obs)?,
                serde_json::to_string(&relationship.t_start)?,
                serde_json::to_string(&relationship.t_end)?,
                serde_json::to_string(&relationship.atomic_facts)?,
            ),
        };

        conn.execute(
            "INSERT INTO relationships
                (source_id, target_id, type, t_obs, t_start, t_end, atomic_facts, confidence, properties, embeddings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(source_id, target_id, type) DO UPDATE SET
                t_obs = excluded.t_obs,
                t_start = excluded.t_start,
                t_end = excluded.t_end,
                atomic_facts = excluded.atomic_facts,
                confidence = excluded.confidence,
                properties = excluded.properties,
                embeddings = excluded.embeddings",
            params![
                relationship.source_id,
                relationship.target_id,
                relationship.r#type,
                t_obs,
                t_start,
                t_end,
                atomic_facts,
                relationship.confidence,
                properties,
                embeddings
            ],
        )?;
        Ok(())
    }

    async fn get_entity(&self, id: &str) -> Result<Option<TemporalEntity>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, label, properties, embeddings FROM entities WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?
        .map(|(id, name, label, properties, embeddings)| {
            Self::row_to_entity(id, name, label, properties, embeddings)
        })
        .transpose()
    }

    async fn get_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        r#type: &str,
    ) -> Result<Option<TemporalRelationship>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT source_id, target_id, type, t_obs, t_start, t_end, atomic_facts, confidence, properties, embeddings
             FROM relationships WHERE source_id = ?1 AND target_id = ?2 AND type = ?3",
            params![source_id, target_id, r#type],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, f64>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, Option<String>>(9)?,
                ))
            },
        )
        .optional()?
        .map(|(s, t, ty, o, st, en, af, conf, props, emb)| {
            Self::row_to_relationship(s, t, ty, o, st, en, af, conf, props, emb)
        })
        .transpose()
    }

    async fn get_community(&self, id: &str) -> Result<Option<Community>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, level, title, summary, full_content, weight, summary_tokens, updated_at, last_compacted_at
             FROM communities WHERE id = ?1",
            params![id],
            |row| {
                Ok(Self::row_to_community(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    async fn list_communities(&self, level: i64) -> Result<Vec<Community>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, level, title, summary, full_content, weight, summary_tokens, updated_at, last_compacted_at
             FROM communities WHERE level = ?1 ORDER BY weight DESC",
        )?;
        let rows = stmt.query_map(params![level], |row| {
            Ok(Self::row_to_community(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn list_entities(&self) -> Result<Vec<TemporalEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name, label, properties, embeddings FROM entities")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, label, properties, embeddings) = row?;
            out.push(Self::row_to_entity(id, name, label, properties, embeddings)?);
        }
        Ok(out)
    }

    async fn list_relationships(&self) -> Result<Vec<TemporalRelationship>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source_id, target_id, type, t_obs, t_start, t_end, atomic_facts, confidence, properties, embeddings
             FROM relationships",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (s, t, ty, o, st, en, af, conf, props, emb) = row?;
            out.push(Self::row_to_relationship(s, t, ty, o, st, en, af, conf, props, emb)?);
        }
        Ok(out)
    }

    async fn communities_with_pending_deltas(&self) -> Result<Vec<Community>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT c.id, c.level, c.title, c.summary, c.full_content, c.weight,
                    c.summary_tokens, c.updated_at, c.last_compacted_at
             FROM communities c
             JOIN community_deltas d ON d.community_id = c.id
             WHERE d.status = 'pending'",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self::row_to_community(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn upsert_community(&self, community: &Community) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO communities
                (id, level, title, summary, full_content, weight, summary_tokens, updated_at, last_compacted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                level = excluded.level,
                title = excluded.title,
                summary = excluded.summary,
                full_content = excluded.full_content,
                weight = excluded.weight,
                summary_tokens = excluded.summary_tokens,
                updated_at = excluded.updated_at,
                last_compacted_at = excluded.last_compacted_at",
            params![
                community.id,
                community.level,
                community.title,
                community.summary,
                community.full_content,
                community.weight,
                community.summary_tokens,
                community.updated_at,
                community.last_compacted_at,
            ],
        )?;
        Ok(())
    }

    async fn community_member_ids(&self, community_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT entity_id FROM community_members WHERE community_id = ?1")?;
        let rows = stmt.query_map(params![community_id], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn set_community_members(&self, community_id: &str, entity_ids: &[String]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM community_members WHERE community_id = ?1", params![community_id])?;
        for entity_id in entity_ids {
            conn.execute(
                "INSERT OR IGNORE INTO community_members (community_id, entity_id) VALUES (?1, ?2)",
                params![community_id, entity_id],
            )?;
        }
        Ok(())
    }

    async fn relationships_among(&self, entity_ids: &[String]) -> Result<Vec<TemporalRelationship>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = entity_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT source_id, target_id, type, t_obs, t_start, t_end, atomic_facts, confidence, properties, embeddings
             FROM relationships WHERE source_id IN ({placeholders}) AND target_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut bound: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(entity_ids.len() * 2);
        for id in entity_ids {
            bound.push(id);
        }
        for id in entity_ids {
            bound.push(id);
        }
        let rows = stmt.query_map(bound.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (s, t, ty, o, st, en, af, conf, props, emb) = row?;
            out.push(Self::row_to_relationship(s, t, ty, o, st, en, af, conf, props, emb)?);
        }
        Ok(out)
    }

    async fn insert_delta(&self, delta: &CommunityDelta) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let related = serde_json::to_string(&delta.related_entities)?;
        conn.execute(
            "INSERT INTO community_deltas
                (id, community_id, summary, summary_tokens, related_entities, created_at, compacted_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                delta.id,
                delta.community_id,
                delta.summary,
                delta.summary_tokens,
                related,
                delta.created_at,
                delta.compacted_at,
                delta.status.as_str(),
            ],
        )?;
        Ok(())
    }

    async fn pending_deltas(&self, community_id: &str) -> Result<Vec<CommunityDelta>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, community_id, summary, summary_tokens, related_entities, created_at, compacted_at, status
             FROM community_deltas WHERE community_id = ?1 AND status = 'pending' ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![community_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, community_id, summary, summary_tokens, related, created_at, compacted_at, status) = row?;
            out.push(CommunityDelta {
                id,
                community_id,
                summary,
                summary_tokens,
                related_entities: serde_json::from_str(&related)?,
                created_at,
                compacted_at,
                status: DeltaStatus::parse(&status),
            });
        }
        Ok(out)
    }

    async fn mark_deltas_compacted(&self, delta_ids: &[String], compacted_at: &str) -> Result<()> {
        if delta_ids.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = delta_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "UPDATE community_deltas SET status = 'compacted', compacted_at = ? WHERE id IN ({placeholders})"
        );
        let mut bound: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(delta_ids.len() + 1);
        bound.push(&compacted_at);
        for id in delta_ids {
            bound.push(id);
        }
        conn.execute(&sql, bound.as_slice())?;
        Ok(())
    }

    async fn delete_compacted_deltas_older_than(&self, cutoff: &str) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM community_deltas WHERE status = 'compacted' AND compacted_at IS NOT NULL AND compacted_at < ?1",
            params![cutoff],
        )?;
        Ok(affected as u64)
    }

    async fn health_check(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entity_roundtrip() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let mut entity = TemporalEntity::new("alice", "Alice");
        entity.properties.insert("role".into(), PropertyValue::String("founder".into()));
        store.upsert_entity(&entity).await.unwrap();

        let loaded = store.get_entity("alice").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Alice");
        assert_eq!(
            loaded.properties.get("role"),
            Some(&PropertyValue::String("founder".into()))
        );
    }

    #[tokio::test]
    async fn relationship_update_strategy_accumulates_observations() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let mut rel = TemporalRelationship::new("alice", "acme");
        rel.observe(1704067200.0, "Alice joined Acme in 2022.");
        store.upsert_relationship(&rel, MergeStrategy::Update).await.unwrap();

        let mut rel2 = TemporalRelationship::new("alice", "acme");
        rel2.observe(1717200000.0, "Alice mentioned again.");
        store.upsert_relationship(&rel2, MergeStrategy::Update).await.unwrap();

        let stored = store
            .get_relationship("alice", "acme", "RELATED")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.t_obs, vec![1704067200.0, 1717200000.0]);
        assert_eq!(stored.atomic_facts.len(), 2);
    }

    #[tokio::test]
    async fn relationship_replace_strategy_overwrites() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let mut rel = TemporalRelationship::new("alice", "acme");
        rel.observe(1.0, "first");
        store.upsert_relationship(&rel, MergeStrategy::Update).await.unwrap();

        let mut rel2 = TemporalRelationship::new("alice", "acme");
        rel2.observe(2.0, "second");
        store.upsert_relationship(&rel2, MergeStrategy::Replace).await.unwrap();

        let stored = store.get_relationship("alice", "acme", "RELATED").await.unwrap().unwrap();
        assert_eq!(stored.t_obs, vec![2.0]);
        assert_eq!(stored.atomic_facts, vec!["second".to_string()]);
    }

    #[tokio::test]
    async fn pending_deltas_ordered_by_created_at_ascending() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        store
            .upsert_community(&Community {
                id: "c1".into(),
                level: 0,
                title: "C1".into(),
                summary: "".into(),
                full_content: "base".into(),
                weight: 1.0,
                summary_tokens: 0,
                updated_at: None,
                last_compacted_at: None,
            })
            .await
            .unwrap();

        for (id, ts) in [("d2", "2024-02-01"), ("d1", "2024-01-01")] {
            store
                .insert_delta(&CommunityDelta {
                    id: id.into(),
                    community_id: "c1".into(),
                    summary: id.into(),
                    summary_tokens: 1,
                    related_entities: vec![],
                    created_at: ts.into(),
                    compacted_at: None,
                    status: DeltaStatus::Pending,
                })
                .await
                .unwrap();
        }

        let deltas = store.pending_deltas("c1").await.unwrap();
        assert_eq!(deltas.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["d1", "d2"]);
    }
}
