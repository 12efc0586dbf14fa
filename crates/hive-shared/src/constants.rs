/// Application name
pub const APP_NAME: &str = "DesignHive";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// File name of the SQLite database inside the platform data directory
pub const DATABASE_FILE_NAME: &str = "designhive.db";

/// Deadline applied to every store call, in milliseconds
pub const DEFAULT_STORE_DEADLINE_MS: u64 = 5_000;

/// Optimistic attempts for a like/unlike counter update before giving up
pub const DEFAULT_LIKE_RETRY_BUDGET: u32 = 5;

/// Tag categories carried by every post, in serialization order
pub const TAG_CATEGORIES: [&str; 5] = [
    "designDisciplines",
    "designProcess",
    "tools",
    "learningGoals",
    "competitionInvolvement",
];
