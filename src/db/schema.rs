//! Database schema and migrations for HireOn.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    fullname    TEXT NOT NULL,
    email       TEXT NOT NULL,
    password    TEXT NOT NULL,           -- Argon2 hash
    role        TEXT NOT NULL DEFAULT 'student',  -- 'student', 'recruiter', 'superadmin'
    profile_photo TEXT,
    created_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX idx_users_email_nocase ON users(email COLLATE NOCASE);
CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: jobs
    r#"
CREATE TABLE jobs (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    company_name TEXT NOT NULL DEFAULT '',
    created_by   INTEGER NOT NULL REFERENCES users(id),
    created_at   TEXT NOT NULL
);

CREATE INDEX idx_jobs_created_by ON jobs(created_by);
"#,
    // v3: applications
    r#"
CREATE TABLE applications (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id       INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    applicant_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status       TEXT NOT NULL DEFAULT 'pending',  -- 'pending', 'accepted', 'rejected'
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE(job_id, applicant_id)
);

CREATE INDEX idx_applications_applicant_id ON applications(applicant_id);
CREATE INDEX idx_applications_status ON applications(status);
"#,
    // v4: per-user chat clear watermarks
    r#"
CREATE TABLE chat_clear_marks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id  INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    cleared_at      TEXT NOT NULL,
    UNIQUE(application_id, user_id)
);
"#,
    // v5: chat messages
    r#"
CREATE TABLE messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id  INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    job_id          INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    sender_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    receiver_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    body            TEXT NOT NULL,
    reply_to_id     INTEGER REFERENCES messages(id) ON DELETE SET NULL,
    is_deleted      INTEGER NOT NULL DEFAULT 0,
    deleted_at      TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX idx_messages_application_created ON messages(application_id, created_at);
CREATE INDEX idx_messages_reply_to_id ON messages(reply_to_id);
"#,
];
