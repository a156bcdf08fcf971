//! SQLite-backed graph store driver.
//!
//! The reference graph backend: one database file with `entities` and
//! `relationships` tables. Node identifiers are deterministic
//! (`"model:Model Y"`, `"brand:特斯拉"`), so reseeding an existing file is
//! idempotent. Thread-safe via an internal mutex on the connection.

use crate::adapter::{
    DriverError, GraphDriver, GraphQuery, GraphRow, GraphRowKind, RelationshipType,
};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// The kinds of node the graph schema models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Brand,
    Series,
    Model,
    Persona,
    Review,
    Dimension,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Brand => "brand",
            NodeKind::Series => "series",
            NodeKind::Model => "model",
            NodeKind::Persona => "persona",
            NodeKind::Review => "review",
            NodeKind::Dimension => "dimension",
        }
    }
}

/// SQLite-backed graph driver.
pub struct SqliteGraphDriver {
    conn: Mutex<Connection>,
}

impl SqliteGraphDriver {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let conn = Connection::open(path)
            .map_err(|e| DriverError::Misconfigured(format!("cannot open graph db: {e}")))?;
        Self::init_schema(&conn)
            .map_err(|e| DriverError::Misconfigured(format!("cannot init graph schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DriverError::Misconfigured(format!("cannot open graph db: {e}")))?;
        Self::init_schema(&conn)
            .map_err(|e| DriverError::Misconfigured(format!("cannot init graph schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                properties_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
            CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);

            CREATE TABLE IF NOT EXISTS relationships (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                rel_type TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                FOREIGN KEY (source_id) REFERENCES entities(id),
                FOREIGN KEY (target_id) REFERENCES entities(id)
            );
            CREATE INDEX IF NOT EXISTS idx_relationships_type ON relationships(rel_type);
            CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DriverError> {
        self.conn
            .lock()
            .map_err(|_| DriverError::Unavailable("graph connection lock poisoned".into()))
    }

    /// Upsert a node. Returns its deterministic identifier.
    pub fn add_entity(
        &self,
        kind: NodeKind,
        name: &str,
        properties: &serde_json::Value,
    ) -> Result<String, DriverError> {
        let id = format!("{}:{}", kind.as_str(), name);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entities (id, kind, name, properties_json) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET properties_json = excluded.properties_json",
            params![id, kind.as_str(), name, properties.to_string()],
        )
        .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        Ok(id)
    }

    /// Upsert a relationship between two existing nodes.
    pub fn add_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        rel_type: RelationshipType,
        properties: &serde_json::Value,
    ) -> Result<String, DriverError> {
        let id = format!("{}:{}->{}", rel_type.as_str(), source_id, target_id);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO relationships (id, source_id, target_id, rel_type, properties_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET properties_json = excluded.properties_json",
            params![id, source_id, target_id, rel_type.as_str(), properties.to_string()],
        )
        .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        Ok(id)
    }

    fn node_row(
        id: String,
        kind: String,
        name: String,
        properties_json: String,
    ) -> Result<GraphRow, DriverError> {
        let mut payload: serde_json::Value = serde_json::from_str(&properties_json)
            .map_err(|e| DriverError::Malformed(format!("bad properties json: {e}")))?;
        if !payload.is_object() {
            payload = serde_json::json!({});
        }
        if let serde_json::Value::Object(ref mut map) = payload {
            map.insert("kind".into(), serde_json::Value::String(kind));
            map.insert("name".into(), serde_json::Value::String(name.clone()));
        }
        Ok(GraphRow {
            id,
            kind: GraphRowKind::Node,
            label: name,
            payload,
        })
    }

    /// Nodes whose name matches the filter (all nodes when unfiltered).
    fn matching_nodes(
        conn: &Connection,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<GraphRow>, DriverError> {
        let (sql, bound): (String, Vec<Box<dyn rusqlite::ToSql>>) = if names.is_empty() {
            (
                "SELECT id, kind, name, properties_json FROM entities
                 WHERE kind NOT IN ('review') ORDER BY id LIMIT ?1"
                    .into(),
                vec![Box::new(limit as i64)],
            )
        } else {
            let placeholders = vec!["?"; names.len()].join(", ");
            let mut bound: Vec<Box<dyn rusqlite::ToSql>> = names
                .iter()
                .map(|n| Box::new(n.clone()) as Box<dyn rusqlite::ToSql>)
                .collect();
            bound.push(Box::new(limit as i64));
            (
                format!(
                    "SELECT id, kind, name, properties_json FROM entities
                     WHERE name IN ({placeholders}) ORDER BY id LIMIT ?{}",
                    names.len() + 1
                ),
                bound,
            )
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, kind, name, props) =
                row.map_err(|e| DriverError::Unavailable(e.to_string()))?;
            out.push(Self::node_row(id, kind, name, props)?);
        }
        Ok(out)
    }

    /// Relationships of one type touching the filtered names (unfiltered
    /// when no names given), with the node on the far side included.
    #[allow(clippy::type_complexity)]
    fn matching_relationships(
        conn: &Connection,
        rel_type: RelationshipType,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<(GraphRow, GraphRow)>, DriverError> {
        let base = "SELECT r.id, r.properties_json,
                    s.id, s.kind, s.name, s.properties_json,
                    t.id, t.kind, t.name, t.properties_json
             FROM relationships r
             JOIN entities s ON s.id = r.source_id
             JOIN entities t ON t.id = r.target_id
             WHERE r.rel_type = ?1";
        let (sql, bound): (String, Vec<Box<dyn rusqlite::ToSql>>) = if names.is_empty() {
            (
                format!("{base} ORDER BY r.id LIMIT ?2"),
                vec![
                    Box::new(rel_type.as_str().to_string()),
                    Box::new(limit as i64),
                ],
            )
        } else {
            let source_ph: Vec<String> =
                (0..names.len()).map(|i| format!("?{}", i + 2)).collect();
            let target_ph: Vec<String> = (0..names.len())
                .map(|i| format!("?{}", i + 2 + names.len()))
                .collect();
            let mut bound: Vec<Box<dyn rusqlite::ToSql>> =
                vec![Box::new(rel_type.as_str().to_string())];
            for name in names.iter().chain(names.iter()) {
                bound.push(Box::new(name.clone()));
            }
            bound.push(Box::new(limit as i64));
            (
                format!(
                    "{base} AND (s.name IN ({}) OR t.name IN ({})) ORDER BY r.id LIMIT ?{}",
                    source_ph.join(", "),
                    target_ph.join(", "),
                    2 + names.len() * 2
                ),
                bound,
            )
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            })
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let (
                rel_id,
                rel_props,
                s_id,
                s_kind,
                s_name,
                s_props,
                t_id,
                t_kind,
                t_name,
                t_props,
            ) = row.map_err(|e| DriverError::Unavailable(e.to_string()))?;

            let mut payload: serde_json::Value = serde_json::from_str(&rel_props)
                .map_err(|e| DriverError::Malformed(format!("bad properties json: {e}")))?;
            if !payload.is_object() {
                payload = serde_json::json!({});
            }
            if let serde_json::Value::Object(ref mut map) = payload {
                map.insert(
                    "type".into(),
                    serde_json::Value::String(rel_type.as_str().into()),
                );
                map.insert("source".into(), serde_json::Value::String(s_name.clone()));
                map.insert("target".into(), serde_json::Value::String(t_name.clone()));
            }
            let rel = GraphRow {
                id: rel_id,
                kind: GraphRowKind::Relationship,
                label: format!("{} {} {}", s_name, rel_type.as_str(), t_name),
                payload,
            };

            // Surface the node on the far side of the match too: a filter on
            // "Model Y" wants the review text, not just the EVALUATES edge.
            let far = if names.contains(&s_name) {
                Self::node_row(t_id, t_kind, t_name, t_props)?
            } else {
                Self::node_row(s_id, s_kind, s_name, s_props)?
            };
            out.push((rel, far));
        }
        Ok(out)
    }
}

#[async_trait]
impl GraphDriver for SqliteGraphDriver {
    async fn fetch(&self, query: &GraphQuery) -> Result<Vec<GraphRow>, DriverError> {
        let names: Vec<String> = query
            .entity_filter
            .iter()
            .map(|e| e.name.clone())
            .collect();

        let conn = self.lock()?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut rows = Vec::new();

        if !names.is_empty() {
            for row in Self::matching_nodes(&conn, &names, query.limit)? {
                if seen.insert(row.id.clone()) {
                    rows.push(row);
                }
            }
        }

        for rel_type in &query.relationship_types {
            if rows.len() >= query.limit {
                break;
            }
            for (rel, far) in
                Self::matching_relationships(&conn, *rel_type, &names, query.limit)?
            {
                if seen.insert(rel.id.clone()) {
                    rows.push(rel);
                }
                if seen.insert(far.id.clone()) {
                    rows.push(far);
                }
            }
        }

        rows.truncate(query.limit);
        Ok(rows)
    }
}
