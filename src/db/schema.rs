//! Shape of the probe table.
//!
//! The probe only ever appends to this table; rows are never read back.

pub const TABLE_NAME: &str = "busy_table";

/// Status written with every probe row
pub const STATUS_IDLE: &str = "idle";

pub const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS busy_table (
        id SERIAL PRIMARY KEY,
        description VARCHAR(255),
        status VARCHAR(50),
        time TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub const INSERT_SQL: &str = "INSERT INTO busy_table (description, status) VALUES ($1, $2)";

/// SQLite rendition of the probe table, used by the integration tests
#[cfg(test)]
pub const SQLITE_CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS busy_table (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT,
        status TEXT,
        time TEXT DEFAULT CURRENT_TIMESTAMP
    )
"#;

#[cfg(test)]
pub const SQLITE_INSERT_SQL: &str = "INSERT INTO busy_table (description, status) VALUES (?, ?)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_target_probe_table() {
        for sql in [CREATE_TABLE_SQL, INSERT_SQL, SQLITE_CREATE_TABLE_SQL, SQLITE_INSERT_SQL] {
            assert!(sql.contains(TABLE_NAME), "{sql}");
        }
    }

    #[test]
    fn test_insert_is_parameterized() {
        assert!(INSERT_SQL.contains("$1") && INSERT_SQL.contains("$2"));
        assert_eq!(SQLITE_INSERT_SQL.matches('?').count(), 2);
    }
}
