//! SQL schema for the Versus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Directory entries for content items registered by the content service.
CREATE TABLE IF NOT EXISTS candidates (
    candidate_id  TEXT PRIMARY KEY,
    author_id     TEXT NOT NULL,
    wins          INTEGER NOT NULL DEFAULT 0 CHECK (wins >= 0),
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    match_id    TEXT PRIMARY KEY,
    bracket_id  TEXT NOT NULL,
    candidate_a TEXT NOT NULL,
    candidate_b TEXT NOT NULL,
    votes_a     INTEGER NOT NULL DEFAULT 0 CHECK (votes_a >= 0),
    votes_b     INTEGER NOT NULL DEFAULT 0 CHECK (votes_b >= 0),
    is_final    INTEGER NOT NULL DEFAULT 0,
    is_closed   INTEGER NOT NULL DEFAULT 0,
    winner      TEXT,              -- candidate id; NULL while open
    created_at  TEXT NOT NULL,     -- RFC 3339 UTC, microseconds
    closed_at   TEXT,              -- NULL while open
    CHECK (candidate_a != candidate_b),
    -- closure sets all three fields together, reset clears all three
    CHECK ((is_closed = 0 AND winner IS NULL     AND closed_at IS NULL)
        OR (is_closed = 1 AND winner IS NOT NULL AND closed_at IS NOT NULL))
);

-- At most one final per bracket; final synthesis relies on this for its
-- create-if-absent insert.
CREATE UNIQUE INDEX IF NOT EXISTS matches_single_final_idx
    ON matches(bracket_id) WHERE is_final = 1;
CREATE INDEX IF NOT EXISTS matches_bracket_idx ON matches(bracket_id);
CREATE INDEX IF NOT EXISTS matches_open_idx    ON matches(is_closed, created_at);

-- One decision per (voter, match). Rows are never updated.
CREATE TABLE IF NOT EXISTS votes (
    voter_id    TEXT NOT NULL,
    match_id    TEXT NOT NULL REFERENCES matches(match_id) ON DELETE CASCADE,
    choice      TEXT NOT NULL CHECK (choice IN ('A', 'B')),
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (voter_id, match_id)
);

CREATE INDEX IF NOT EXISTS votes_match_idx ON votes(match_id);

PRAGMA user_version = 1;
";
