pub const SCHEMA: &str = r#"
-- users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    first_name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- shows table (flushed as a whole when the schedule roster changes)
CREATE TABLE IF NOT EXISTS shows (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    link TEXT NOT NULL UNIQUE,
    airing_day TEXT NOT NULL,
    airing_time TEXT NOT NULL
);

-- subscriptions table
CREATE TABLE IF NOT EXISTS subscriptions (
    user_id INTEGER NOT NULL,
    show_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, show_id)
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_show_id ON subscriptions(show_id);
"#;
