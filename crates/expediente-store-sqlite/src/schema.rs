//! SQL schema for the Expediente SQLite store.
//!
//! Executed once at connection startup. The layout version is recorded in
//! `PRAGMA user_version`; payload schema versions are tracked per row in
//! `form_instances.schema_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Owned by the intake workflow; forms only read these rows.
CREATE TABLE IF NOT EXISTS subjects (
    subject_id                 TEXT PRIMARY KEY,
    given_names                TEXT NOT NULL,
    surnames                   TEXT NOT NULL,
    birth_date                 TEXT,            -- YYYY-MM-DD
    birthplace                 TEXT,
    address                    TEXT,
    intake_date                TEXT,            -- YYYY-MM-DD
    administrative_case_number TEXT,
    judicial_case_number       TEXT,
    center                     TEXT,
    active                     INTEGER NOT NULL DEFAULT 1,
    created_at                 TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attention_types (
    attention_type_id TEXT PRIMARY KEY,
    role              TEXT NOT NULL UNIQUE,
    name              TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attentions (
    attention_id      TEXT PRIMARY KEY,
    subject_id        TEXT NOT NULL REFERENCES subjects(subject_id),
    attention_type_id TEXT NOT NULL REFERENCES attention_types(attention_type_id),
    professional      TEXT NOT NULL,
    occurred_at       TEXT NOT NULL,
    reason            TEXT NOT NULL,
    status            TEXT NOT NULL DEFAULT 'registered'
);

-- Historical instances are kept; the newest per (subject, form_type) is the
-- current one.
CREATE TABLE IF NOT EXISTS form_instances (
    form_id        TEXT PRIMARY KEY,
    subject_id     TEXT NOT NULL REFERENCES subjects(subject_id),
    form_type      TEXT NOT NULL,
    schema_version INTEGER NOT NULL,
    payload_json   TEXT NOT NULL,
    created_at     TEXT NOT NULL,   -- ISO 8601 UTC; never updated
    updated_at     TEXT NOT NULL,
    attention_id   TEXT REFERENCES attentions(attention_id)
);

CREATE INDEX IF NOT EXISTS subjects_active_idx ON subjects(active);
CREATE INDEX IF NOT EXISTS attentions_subject_idx ON attentions(subject_id);
CREATE INDEX IF NOT EXISTS form_instances_latest_idx
    ON form_instances(subject_id, form_type, created_at);

PRAGMA user_version = 1;
";
