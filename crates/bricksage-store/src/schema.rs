//! Database schema SQL for the set catalog.

/// Core tables: lego_sets, set_embeddings.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS lego_sets (
    set_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    theme TEXT NOT NULL DEFAULT '',
    piece_count INTEGER NOT NULL DEFAULT 0,
    price REAL,
    release_year INTEGER,
    description TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_sets_theme ON lego_sets(theme);
CREATE INDEX IF NOT EXISTS idx_sets_year ON lego_sets(release_year);
CREATE INDEX IF NOT EXISTS idx_sets_pieces ON lego_sets(piece_count);

CREATE TABLE IF NOT EXISTS set_embeddings (
    set_id TEXT PRIMARY KEY REFERENCES lego_sets(set_id) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL
);
"#;

/// FTS5 virtual table for full-text search over name, theme, description.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS sets_fts USING fts5(
    name, theme, description,
    content='lego_sets', content_rowid='rowid',
    tokenize='porter unicode61'
);
"#;

/// Triggers to keep the FTS index in sync with lego_sets.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS sets_ai AFTER INSERT ON lego_sets BEGIN
    INSERT INTO sets_fts(rowid, name, theme, description)
    VALUES (new.rowid, new.name, new.theme, COALESCE(new.description, ''));
END;

CREATE TRIGGER IF NOT EXISTS sets_ad AFTER DELETE ON lego_sets BEGIN
    INSERT INTO sets_fts(sets_fts, rowid, name, theme, description)
    VALUES ('delete', old.rowid, old.name, old.theme, COALESCE(old.description, ''));
END;

CREATE TRIGGER IF NOT EXISTS sets_au AFTER UPDATE ON lego_sets BEGIN
    INSERT INTO sets_fts(sets_fts, rowid, name, theme, description)
    VALUES ('delete', old.rowid, old.name, old.theme, COALESCE(old.description, ''));
    INSERT INTO sets_fts(rowid, name, theme, description)
    VALUES (new.rowid, new.name, new.theme, COALESCE(new.description, ''));
END;
"#;
