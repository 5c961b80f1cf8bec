//! SQLite-backed catalog store with FTS5 + int8 vector search.
//!
//! One `lego_sets` row per set, keyed by the provider-assigned set number.
//! Full-text search runs over name/theme/description via an external-content
//! FTS5 table; semantic search runs over a pre-normalized in-memory matrix of
//! dequantized embeddings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, quantize_uint8};
use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use bricksage_core::{Error, LegoSet, Result};

/// SQLite store for normalized LEGO set records.
pub struct CatalogStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    /// Pre-loaded normalized embedding matrix for vector search: (N, dim) float32.
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    /// Normalized embeddings, shape (N, dim).
    matrix: Array2<f32>,
    /// Set IDs corresponding to each row.
    set_ids: Vec<String>,
    /// Whether the matrix needs reloading.
    dirty: bool,
}

impl CatalogStore {
    /// Open or create the catalog store.
    ///
    /// `db_dir` is the directory (e.g., `data/catalogdb/`). The file will be
    /// `db_dir/bricksage.db`.
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("bricksage.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                set_ids: Vec::new(),
                dirty: true,
            }),
        };

        // Clean up embeddings left behind by databases that predate
        // foreign-key enforcement, then load the search matrix.
        let pruned = store.prune_orphan_embeddings()?;
        if pruned > 0 {
            info!("Pruned {} orphan embeddings", pruned);
        }
        store.load_embedding_matrix()?;

        let set_count = store.count_sets()?;
        info!(
            "CatalogStore initialized: {} sets, dim={}, path={}",
            set_count,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -65536;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Set CRUD
    // ---------------------------------------------------------------

    /// Insert or update a set record. The upsert keeps the rowid stable so
    /// the external-content FTS index stays in sync through the UPDATE trigger.
    pub fn upsert_set(&self, set: &LegoSet) -> Result<()> {
        let now = now_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO lego_sets (set_id, name, theme, piece_count, price, release_year, description, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(set_id) DO UPDATE SET \
                 name = excluded.name, \
                 theme = excluded.theme, \
                 piece_count = excluded.piece_count, \
                 price = excluded.price, \
                 release_year = excluded.release_year, \
                 description = excluded.description, \
                 updated_at = ?8",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            set.set_id,
            set.name,
            set.theme,
            set.piece_count as i64,
            set.price,
            set.release_year,
            set.description,
            now,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    /// Get a set by ID.
    pub fn get_set(&self, set_id: &str) -> Result<Option<LegoSet>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM lego_sets WHERE set_id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![set_id], |row| Ok(Self::row_to_set(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Delete a set and its embedding (cascade). Returns true if it existed.
    pub fn delete_set(&self, set_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM lego_sets WHERE set_id = ?1", params![set_id])
            .map_err(|e| Error::Database(e.to_string()))?;
        if count > 0 {
            drop(conn);
            self.embedding_matrix.lock().dirty = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Count total sets.
    pub fn count_sets(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM lego_sets", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    /// Get sets with pagination. Returns (sets, total_count).
    pub fn get_sets_paginated(
        &self,
        page: usize,
        page_size: usize,
        ascending: bool,
    ) -> Result<(Vec<LegoSet>, i64)> {
        let total = self.count_sets()?;
        let order = if ascending { "ASC" } else { "DESC" };
        let offset = (page.saturating_sub(1)) * page_size;

        let conn = self.conn.lock();
        let sql = format!(
            "SELECT * FROM lego_sets ORDER BY created_at {} LIMIT ?1 OFFSET ?2",
            order
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![page_size as i64, offset as i64], |row| {
                Ok(Self::row_to_set(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let sets: Vec<LegoSet> = rows.filter_map(|r| r.ok()).collect();
        Ok((sets, total))
    }

    /// Get all sets.
    pub fn get_all_sets(&self, ascending: bool) -> Result<Vec<LegoSet>> {
        let order = if ascending { "ASC" } else { "DESC" };
        let conn = self.conn.lock();
        let sql = format!("SELECT * FROM lego_sets ORDER BY created_at {}", order);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_set(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Name substring lookup — the structured query the assistant issues.
    pub fn find_by_name(&self, fragment: &str, limit: usize) -> Result<Vec<LegoSet>> {
        let pattern = format!("%{}%", fragment);
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM lego_sets WHERE name LIKE ?1 LIMIT ?2")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(Self::row_to_set(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Structured filter query over stored sets.
    pub fn filter_sets(&self, filter: &SetFilter) -> Result<Vec<LegoSet>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut bound: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(theme) = &filter.theme {
            clauses.push("LOWER(theme) = LOWER(?)");
            bound.push(Box::new(theme.clone()));
        }
        if let Some(year) = filter.year {
            clauses.push("release_year = ?");
            bound.push(Box::new(year));
        }
        if let Some(min_year) = filter.min_year {
            clauses.push("release_year >= ?");
            bound.push(Box::new(min_year));
        }
        if let Some(max_year) = filter.max_year {
            clauses.push("release_year <= ?");
            bound.push(Box::new(max_year));
        }
        if let Some(min_pieces) = filter.min_pieces {
            clauses.push("piece_count >= ?");
            bound.push(Box::new(min_pieces as i64));
        }
        if let Some(max_pieces) = filter.max_pieces {
            clauses.push("piece_count <= ?");
            bound.push(Box::new(max_pieces as i64));
        }
        if let Some(min_price) = filter.min_price {
            clauses.push("price >= ?");
            bound.push(Box::new(min_price));
        }
        if let Some(max_price) = filter.max_price {
            clauses.push("price <= ?");
            bound.push(Box::new(max_price));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM lego_sets{} ORDER BY {} LIMIT {}",
            where_clause,
            filter.order.sql(),
            filter.limit.max(1)
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter().map(|p| p.as_ref())), |row| {
                Ok(Self::row_to_set(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Embeddings
    // ---------------------------------------------------------------

    /// Store a quantized embedding for a set.
    pub fn store_embedding(&self, set_id: &str, embedding: &Array1<f32>) -> Result<()> {
        let (q_bytes, scale, offset) = quantize_uint8(embedding);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO set_embeddings (set_id, embedding, scale, offset_val) \
             VALUES (?1, ?2, ?3, ?4)",
            params![set_id, q_bytes, scale, offset],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);
        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    /// Append a single embedding to the in-memory matrix without full reload.
    pub fn append_to_matrix(&self, set_id: &str, embedding: &Array1<f32>) -> Result<()> {
        self.ensure_matrix_loaded()?;

        let norm = embedding.dot(embedding).sqrt();
        if norm < 1e-9 {
            return Ok(());
        }
        let normalized = embedding / norm;

        let mut mat = self.embedding_matrix.lock();
        if let Some(pos) = mat.set_ids.iter().position(|id| id == set_id) {
            mat.matrix.row_mut(pos).assign(&normalized);
        } else {
            if mat.matrix.nrows() == 0 {
                mat.matrix = normalized.insert_axis(Axis(0)).to_owned();
            } else {
                mat.matrix
                    .push(Axis(0), normalized.view())
                    .map_err(|e| Error::Internal(format!("Matrix append failed: {}", e)))?;
            }
            mat.set_ids.push(set_id.to_string());
        }
        mat.dirty = false;
        Ok(())
    }

    /// Sets that have no stored embedding yet (feeds the embedding worker).
    pub fn sets_without_embedding(&self, limit: usize) -> Result<Vec<LegoSet>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT l.* FROM lego_sets l \
                 LEFT JOIN set_embeddings se ON l.set_id = se.set_id \
                 WHERE se.set_id IS NULL \
                 ORDER BY l.created_at ASC LIMIT ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| Ok(Self::row_to_set(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // BM25 Search (FTS5)
    // ---------------------------------------------------------------

    /// Full-text search over name/theme/description using FTS5 BM25 ranking.
    pub fn bm25_search(&self, query: &str, top_k: usize) -> Result<Vec<SetHit>> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let sql = "SELECT l.*, sets_fts.rank AS bm25_score \
                   FROM sets_fts \
                   JOIN lego_sets l ON l.rowid = sets_fts.rowid \
                   WHERE sets_fts MATCH ?1 \
                   ORDER BY sets_fts.rank \
                   LIMIT ?2";

        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![fts_query, top_k as i64], |row| {
                let bm25_score: f64 = row.get("bm25_score").unwrap_or(0.0);
                Ok(SetHit {
                    set: Self::row_to_set(row),
                    score: -bm25_score, // FTS5 rank is negative; negate for positive
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Sanitize a user query for FTS5 MATCH syntax.
    /// Wraps each token in double quotes and joins with OR.
    fn sanitize_fts_query(query: &str) -> String {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.replace('"', ""))
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{}\"", t))
            .collect();
        if tokens.is_empty() {
            return String::new();
        }
        tokens.join(" OR ")
    }

    // ---------------------------------------------------------------
    // Vector Search
    // ---------------------------------------------------------------

    /// Load and normalize all set embeddings into a matrix for fast search.
    fn load_embedding_matrix(&self) -> Result<()> {
        let mut set_ids = Vec::new();
        let mut embeddings: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT se.set_id, se.embedding, se.scale, se.offset_val \
                     FROM set_embeddings se \
                     JOIN lego_sets l ON l.set_id = se.set_id",
                )
                .map_err(|e| Error::Database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let set_id: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let scale: f64 = row.get(2)?;
                    let offset: f64 = row.get(3)?;
                    Ok((set_id, blob, scale as f32, offset as f32))
                })
                .map_err(|e| Error::Database(e.to_string()))?;

            for row in rows {
                let (sid, blob, scale, offset) =
                    row.map_err(|e| Error::Database(e.to_string()))?;
                let emb = dequantize_uint8(&blob, scale, offset);
                set_ids.push(sid);
                embeddings.push(emb);
            }
        } // conn and stmt dropped here

        let mut mat = self.embedding_matrix.lock();
        if embeddings.is_empty() {
            mat.matrix = Array2::zeros((0, self.embedding_dim));
            mat.set_ids = Vec::new();
            mat.dirty = false;
            return Ok(());
        }

        // Stack into matrix and normalize rows
        let n = embeddings.len();
        let dim = self.embedding_dim;
        let mut matrix = Array2::zeros((n, dim));
        for (i, emb) in embeddings.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }

        // Normalize rows for cosine similarity via dot product
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }

        mat.matrix = matrix;
        mat.set_ids = set_ids;
        mat.dirty = false;
        debug!("Loaded {} set embeddings into matrix", n);
        Ok(())
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        if self.embedding_matrix.lock().dirty {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    /// Cosine similarity search using the pre-loaded normalized matrix.
    pub fn vector_search(&self, query_embedding: &Array1<f32>, top_k: usize) -> Result<Vec<SetHit>> {
        self.ensure_matrix_loaded()?;

        let mat = self.embedding_matrix.lock();
        if mat.matrix.nrows() == 0 {
            return Ok(Vec::new());
        }

        // Normalize query
        let q_norm = query_embedding.dot(query_embedding).sqrt();
        if q_norm < 1e-9 {
            return Ok(Vec::new());
        }
        let q = query_embedding / q_norm;

        // Matrix multiply: (N, dim) @ (dim,) → (N,)
        let similarities = mat.matrix.dot(&q);

        // Get top-k indices
        let k = top_k.min(similarities.len());
        let mut indexed: Vec<(usize, f32)> = similarities
            .iter()
            .enumerate()
            .map(|(i, &s)| (i, s))
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed.truncate(k);

        let top_set_ids: Vec<(String, f64)> = indexed
            .iter()
            .map(|&(i, s)| (mat.set_ids[i].clone(), s as f64))
            .collect();
        drop(mat);

        // Fetch set data for top hits
        let mut results = Vec::with_capacity(k);
        for (sid, score) in top_set_ids {
            if let Some(set) = self.get_set(&sid)? {
                results.push(SetHit { set, score });
            }
        }
        Ok(results)
    }

    // ---------------------------------------------------------------
    // Reciprocal Rank Fusion
    // ---------------------------------------------------------------

    /// Fuse BM25 and vector search results using Reciprocal Rank Fusion.
    /// RRF score = sum(1 / (k + rank)) across result lists.
    pub fn reciprocal_rank_fusion(
        bm25_results: &[SetHit],
        vector_results: &[SetHit],
        k: usize,
    ) -> Vec<SetHit> {
        let mut rrf_scores: HashMap<&str, f64> = HashMap::new();
        let mut set_map: HashMap<&str, &SetHit> = HashMap::new();

        for (rank, hit) in bm25_results.iter().enumerate() {
            *rrf_scores.entry(hit.set.set_id.as_str()).or_insert(0.0) +=
                1.0 / (k as f64 + rank as f64 + 1.0);
            set_map.entry(hit.set.set_id.as_str()).or_insert(hit);
        }

        for (rank, hit) in vector_results.iter().enumerate() {
            *rrf_scores.entry(hit.set.set_id.as_str()).or_insert(0.0) +=
                1.0 / (k as f64 + rank as f64 + 1.0);
            set_map.entry(hit.set.set_id.as_str()).or_insert(hit);
        }

        let mut sorted: Vec<(&str, f64)> = rrf_scores.into_iter().collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        sorted
            .into_iter()
            .filter_map(|(sid, score)| {
                set_map.get(sid).map(|hit| SetHit {
                    set: hit.set.clone(),
                    score,
                })
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Hybrid Search (BM25 + Vector → RRF)
    // ---------------------------------------------------------------

    /// Combined BM25 + vector search with RRF fusion.
    pub fn hybrid_search(
        &self,
        query: &str,
        query_embedding: &Array1<f32>,
        bm25_top_k: usize,
        vector_top_k: usize,
        rrf_k: usize,
    ) -> Result<Vec<SetHit>> {
        let bm25_hits = self.bm25_search(query, bm25_top_k)?;
        let vector_hits = self.vector_search(query_embedding, vector_top_k)?;
        Ok(Self::reciprocal_rank_fusion(&bm25_hits, &vector_hits, rrf_k))
    }

    // ---------------------------------------------------------------
    // Maintenance
    // ---------------------------------------------------------------

    /// Remove embeddings whose set no longer exists.
    pub fn prune_orphan_embeddings(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "DELETE FROM set_embeddings WHERE set_id NOT IN (SELECT set_id FROM lego_sets)",
                [],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        if count > 0 {
            drop(conn);
            self.embedding_matrix.lock().dirty = true;
        }
        Ok(count)
    }

    /// Evict the oldest N sets by created_at timestamp.
    pub fn evict_oldest_sets(&self, count: usize) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn
            .execute(
                "DELETE FROM lego_sets WHERE set_id IN (
                    SELECT set_id FROM lego_sets ORDER BY created_at ASC LIMIT ?1
                )",
                [count],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        if deleted > 0 {
            drop(conn);
            self.embedding_matrix.lock().dirty = true;
        }
        Ok(deleted)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let set_count = self.count_sets()?;

        let conn = self.conn.lock();
        let emb_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM set_embeddings", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        let themes: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT theme) FROM lego_sets WHERE theme != ''",
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        let mat = self.embedding_matrix.lock();
        let matrix_rows = mat.matrix.nrows();
        let matrix_loaded = matrix_rows > 0;

        Ok(StoreStats {
            total_sets: set_count,
            embeddings_stored: emb_count,
            themes,
            embedding_dimension: self.embedding_dim,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
            matrix_loaded,
            matrix_rows,
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping
    // ---------------------------------------------------------------

    fn row_to_set(row: &rusqlite::Row<'_>) -> LegoSet {
        LegoSet {
            set_id: row.get("set_id").unwrap_or_default(),
            name: row.get("name").unwrap_or_default(),
            theme: row.get("theme").unwrap_or_default(),
            piece_count: row.get::<_, i64>("piece_count").unwrap_or(0) as u32,
            price: row.get("price").ok().flatten(),
            release_year: row.get("release_year").ok().flatten(),
            description: row.get("description").ok().flatten(),
        }
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (CatalogStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path(), 384).unwrap();
        (store, dir)
    }

    fn sample_set(set_id: &str, name: &str, theme: &str) -> LegoSet {
        LegoSet {
            set_id: set_id.into(),
            name: name.into(),
            theme: theme.into(),
            piece_count: 500,
            price: Some(49.99),
            release_year: Some(2020),
            description: Some(format!("A {} set called {}", theme, name)),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let (store, _dir) = test_store();

        let set = sample_set("75192", "Millennium Falcon", "Star Wars");
        store.upsert_set(&set).unwrap();

        let loaded = store.get_set("75192").unwrap().unwrap();
        assert_eq!(loaded.name, "Millennium Falcon");
        assert_eq!(loaded.theme, "Star Wars");
        assert_eq!(loaded.piece_count, 500);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("10276", "Colosseum", "Creator Expert"))
            .unwrap();

        let mut updated = sample_set("10276", "Colosseum", "Creator Expert");
        updated.piece_count = 9036;
        updated.price = Some(549.99);
        store.upsert_set(&updated).unwrap();

        assert_eq!(store.count_sets().unwrap(), 1);
        let loaded = store.get_set("10276").unwrap().unwrap();
        assert_eq!(loaded.piece_count, 9036);
        assert_eq!(loaded.price, Some(549.99));
    }

    #[test]
    fn test_bm25_search_finds_by_name_and_theme() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let hits = store.bm25_search("millennium falcon", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].set.set_id, "75192");

        // Theme terms are indexed too
        let hits = store.bm25_search("star wars", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].set.set_id, "75192");
    }

    #[test]
    fn test_bm25_search_after_update_sees_new_text() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("31058", "Mighty Dinosaurs", "Creator"))
            .unwrap();

        let mut renamed = sample_set("31058", "Roaring T-Rex", "Creator");
        renamed.description = Some("Rebuildable dinosaur model".into());
        store.upsert_set(&renamed).unwrap();

        let hits = store.bm25_search("dinosaur", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].set.name, "Roaring T-Rex");
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let (store, _dir) = test_store();
        store
            .upsert_set(&sample_set("1234", "Test", "City"))
            .unwrap();
        assert!(store.bm25_search("", 10).unwrap().is_empty());
        assert!(store.bm25_search("\"\"", 10).unwrap().is_empty());
    }

    #[test]
    fn test_delete_cascades_embedding() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();

        let mut emb = Array1::zeros(384);
        emb[0] = 1.0;
        store.store_embedding("75192", &emb).unwrap();

        assert!(store.delete_set("75192").unwrap());
        assert!(store.get_set("75192").unwrap().is_none());
        assert_eq!(store.get_stats().unwrap().embeddings_stored, 0);
        assert!(!store.delete_set("75192").unwrap());
    }

    #[test]
    fn test_find_by_name() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("75257", "Millennium Falcon Microfighter", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let found = store.find_by_name("Falcon", 10).unwrap();
        assert_eq!(found.len(), 2);

        let found = store.find_by_name("Downtown", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].set_id, "60380");
    }

    #[test]
    fn test_filter_by_theme_and_order() {
        let (store, _dir) = test_store();

        let mut old = sample_set("7140", "X-wing Fighter", "Star Wars");
        old.release_year = Some(1999);
        old.piece_count = 263;
        store.upsert_set(&old).unwrap();

        let mut new = sample_set("75192", "Millennium Falcon", "Star Wars");
        new.release_year = Some(2017);
        new.piece_count = 7541;
        store.upsert_set(&new).unwrap();

        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let filter = SetFilter {
            theme: Some("star wars".into()),
            order: SetOrder::Oldest,
            ..Default::default()
        };
        let sets = store.filter_sets(&filter).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].set_id, "7140");

        let filter = SetFilter {
            theme: Some("Star Wars".into()),
            order: SetOrder::MostPieces,
            ..Default::default()
        };
        let sets = store.filter_sets(&filter).unwrap();
        assert_eq!(sets[0].set_id, "75192");
    }

    #[test]
    fn test_filter_by_pieces_and_price() {
        let (store, _dir) = test_store();

        let mut small = sample_set("30495", "AT-ST", "Star Wars");
        small.piece_count = 79;
        small.price = Some(4.99);
        store.upsert_set(&small).unwrap();

        let mut big = sample_set("75192", "Millennium Falcon", "Star Wars");
        big.piece_count = 7541;
        big.price = Some(849.99);
        store.upsert_set(&big).unwrap();

        let filter = SetFilter {
            min_pieces: Some(1000),
            ..Default::default()
        };
        let sets = store.filter_sets(&filter).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].set_id, "75192");

        let filter = SetFilter {
            max_price: Some(50.0),
            ..Default::default()
        };
        let sets = store.filter_sets(&filter).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].set_id, "30495");
    }

    #[test]
    fn test_vector_search_ranks_by_similarity() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let mut emb1 = Array1::zeros(384);
        emb1[0] = 1.0;
        emb1[1] = 0.5;

        let mut emb2 = Array1::zeros(384);
        emb2[0] = 0.1;
        emb2[2] = 1.0;

        store.store_embedding("75192", &emb1).unwrap();
        store.store_embedding("60380", &emb2).unwrap();

        let mut query = Array1::zeros(384);
        query[0] = 1.0;
        query[1] = 0.3;

        let results = store.vector_search(&query, 5).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].set.set_id, "75192");
    }

    #[test]
    fn test_vector_search_empty_store_and_zero_query() {
        let (store, _dir) = test_store();
        let query = Array1::zeros(384);
        assert!(store.vector_search(&query, 5).unwrap().is_empty());

        store
            .upsert_set(&sample_set("1234", "Test", "City"))
            .unwrap();
        let mut emb = Array1::zeros(384);
        emb[0] = 1.0;
        store.store_embedding("1234", &emb).unwrap();

        // Zero-norm query yields nothing
        assert!(store.vector_search(&Array1::zeros(384), 5).unwrap().is_empty());
    }

    #[test]
    fn test_hybrid_search_fuses_both_lists() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let mut emb1 = Array1::zeros(384);
        emb1[0] = 1.0;
        let mut emb2 = Array1::zeros(384);
        emb2[1] = 1.0;
        store.store_embedding("75192", &emb1).unwrap();
        store.store_embedding("60380", &emb2).unwrap();

        let mut query = Array1::zeros(384);
        query[0] = 1.0;

        // "falcon" matches 75192 in BM25; query vector also closest to 75192,
        // so it must fuse to the top.
        let results = store.hybrid_search("falcon", &query, 10, 10, 60).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].set.set_id, "75192");
    }

    #[test]
    fn test_rrf_prefers_items_in_both_lists() {
        let a = SetHit {
            set: sample_set("1", "A", "City"),
            score: 5.0,
        };
        let b = SetHit {
            set: sample_set("2", "B", "City"),
            score: 4.0,
        };
        let c = SetHit {
            set: sample_set("3", "C", "City"),
            score: 0.9,
        };

        // "2" appears in both lists, "1" and "3" in one each.
        let fused = CatalogStore::reciprocal_rank_fusion(
            &[a.clone(), b.clone()],
            &[b.clone(), c.clone()],
            60,
        );
        assert_eq!(fused[0].set.set_id, "2");
    }

    #[test]
    fn test_sets_without_embedding() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("1111", "First", "City"))
            .unwrap();
        store
            .upsert_set(&sample_set("2222", "Second", "City"))
            .unwrap();

        let mut emb = Array1::zeros(384);
        emb[0] = 1.0;
        store.store_embedding("1111", &emb).unwrap();

        let pending = store.sets_without_embedding(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].set_id, "2222");
    }

    #[test]
    fn test_pagination() {
        let (store, _dir) = test_store();

        for i in 0..5 {
            store
                .upsert_set(&sample_set(&format!("100{}", i), &format!("Set {}", i), "City"))
                .unwrap();
        }

        let (sets, total) = store.get_sets_paginated(1, 2, false).unwrap();
        assert_eq!(total, 5);
        assert_eq!(sets.len(), 2);

        let (sets2, _) = store.get_sets_paginated(3, 2, false).unwrap();
        assert_eq!(sets2.len(), 1);
    }

    #[test]
    fn test_prune_is_noop_on_consistent_store() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        let mut emb = Array1::zeros(384);
        emb[0] = 1.0;
        store.store_embedding("75192", &emb).unwrap();

        // Cascade already removed the embedding, so nothing is left to prune
        store.delete_set("75192").unwrap();
        assert_eq!(store.prune_orphan_embeddings().unwrap(), 0);
    }

    #[test]
    fn test_evict_oldest() {
        let (store, _dir) = test_store();

        for i in 0..4 {
            store
                .upsert_set(&sample_set(&format!("100{}", i), &format!("Set {}", i), "City"))
                .unwrap();
        }

        let evicted = store.evict_oldest_sets(2).unwrap();
        assert_eq!(evicted, 2);
        assert_eq!(store.count_sets().unwrap(), 2);
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();

        store
            .upsert_set(&sample_set("75192", "Millennium Falcon", "Star Wars"))
            .unwrap();
        store
            .upsert_set(&sample_set("60380", "Downtown", "City"))
            .unwrap();

        let mut emb = Array1::zeros(384);
        emb[5] = 1.0;
        store.store_embedding("75192", &emb).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_sets, 2);
        assert_eq!(stats.embeddings_stored, 1);
        assert_eq!(stats.themes, 2);
        assert_eq!(stats.embedding_dimension, 384);
    }
}
