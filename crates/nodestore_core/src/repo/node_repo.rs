//! Node repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist and query node records in the single `nodes` collection.
//! - Render query predicates into parameterized SQL.
//! - Translate store constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths call `NodeRecord::validate()` before SQL mutations.
//! - `category` is never rewritten by `update_node`.
//! - Query results are returned in insertion order.
//! - Rows that cannot be decoded are reported, never skipped.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::kind::{registry, NodeKind};
use crate::model::node::{NodeId, NodeRecord, NodeValidationError};
use crate::query::predicate::{Literal, Operator, Predicate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT id, category, name, number FROM nodes";
const REQUIRED_COLUMNS: &[&str] = &["id", "category", "name", "number"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for node persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NodeValidationError),
    Db(DbError),
    /// No row with this id exists.
    NotFound(NodeId),
    /// A row with this id already exists.
    DuplicateId(NodeId),
    /// The store-level singleton index rejected the insert.
    SingletonConflict(NodeKind),
    /// `update_node` attempted to change the stored discriminator.
    CategoryImmutable {
        id: NodeId,
        stored: NodeKind,
        requested: NodeKind,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "node not found: {id}"),
            Self::DuplicateId(id) => write!(f, "node already exists: {id}"),
            Self::SingletonConflict(kind) => {
                write!(f, "a {kind} node already exists and only one is allowed")
            }
            Self::CategoryImmutable {
                id,
                stored,
                requested,
            } => write!(
                f,
                "node {id} is stored as {stored}; category cannot change to {requested}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "node repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "node repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "node repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted node data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeValidationError> for RepoError {
    fn from(value: NodeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store collaborator used by the node service.
///
/// `None` predicates are unconstrained and match every record.
pub trait NodeRepository {
    fn insert_node(&self, record: &NodeRecord) -> RepoResult<NodeId>;
    fn update_node(&self, record: &NodeRecord) -> RepoResult<()>;
    fn get_node(&self, id: NodeId) -> RepoResult<Option<NodeRecord>>;
    fn query_nodes(&self, predicate: Option<&Predicate>) -> RepoResult<Vec<NodeRecord>>;
    fn count_nodes(&self, predicate: Option<&Predicate>) -> RepoResult<u64>;
    /// Removes every record. Returns the number of removed rows.
    fn clear_nodes(&self) -> RepoResult<usize>;
}

/// SQLite-backed node repository.
pub struct SqliteNodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for foreign schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NodeRepository for SqliteNodeRepository<'_> {
    fn insert_node(&self, record: &NodeRecord) -> RepoResult<NodeId> {
        record.validate()?;

        let result = self.conn.execute(
            "INSERT INTO nodes (id, category, name, number) VALUES (?1, ?2, ?3, ?4);",
            params![
                record.id.to_string(),
                registry().spec(record.category).discriminator,
                record.name.as_str(),
                record.number,
            ],
        );

        match result {
            Ok(_) => Ok(record.id),
            Err(err) => Err(map_insert_error(err, record)),
        }
    }

    fn update_node(&self, record: &NodeRecord) -> RepoResult<()> {
        record.validate()?;

        let stored = self.get_node(record.id)?.ok_or(RepoError::NotFound(record.id))?;
        if stored.category != record.category {
            return Err(RepoError::CategoryImmutable {
                id: record.id,
                stored: stored.category,
                requested: record.category,
            });
        }

        self.conn.execute(
            "UPDATE nodes
             SET
                name = ?2,
                number = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.id.to_string(), record.name.as_str(), record.number],
        )?;

        Ok(())
    }

    fn get_node(&self, id: NodeId) -> RepoResult<Option<NodeRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }

    fn query_nodes(&self, predicate: Option<&Predicate>) -> RepoResult<Vec<NodeRecord>> {
        let (where_sql, bind_values) = where_clause(predicate);
        let sql = format!("{NODE_SELECT_SQL}{where_sql} ORDER BY rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_node_row(row)?);
        }
        Ok(records)
    }

    fn count_nodes(&self, predicate: Option<&Predicate>) -> RepoResult<u64> {
        let (where_sql, bind_values) = where_clause(predicate);
        let sql = format!("SELECT COUNT(*) FROM nodes{where_sql};");

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn clear_nodes(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM nodes;", [])?)
    }
}

fn where_clause(predicate: Option<&Predicate>) -> (String, Vec<Value>) {
    let mut bind_values = Vec::new();
    match predicate {
        Some(predicate) => {
            let sql = predicate_sql(predicate, &mut bind_values);
            (format!(" WHERE {sql}"), bind_values)
        }
        None => (String::new(), bind_values),
    }
}

/// Renders `predicate` as a SQL boolean expression, appending bind values in
/// placeholder order.
pub(crate) fn predicate_sql(predicate: &Predicate, bind_values: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Compare { field, op, value } => {
            let column = field.as_str();
            bind_values.push(literal_value(value));
            match op {
                Operator::Eq => format!("{column} = ?"),
                Operator::Ne => format!("{column} <> ?"),
                Operator::Lt => format!("{column} < ?"),
                Operator::Lte => format!("{column} <= ?"),
                Operator::Gt => format!("{column} > ?"),
                Operator::Gte => format!("{column} >= ?"),
                Operator::Contains => format!("instr({column}, ?) > 0"),
                Operator::StartsWith => format!("instr({column}, ?) = 1"),
            }
        }
        Predicate::And(members) => group_sql(members, " AND ", "1 = 1", bind_values),
        Predicate::Or(members) => group_sql(members, " OR ", "1 = 0", bind_values),
    }
}

fn group_sql(
    members: &[Predicate],
    separator: &str,
    empty: &str,
    bind_values: &mut Vec<Value>,
) -> String {
    if members.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = members
        .iter()
        .map(|member| predicate_sql(member, bind_values))
        .collect();
    format!("({})", parts.join(separator))
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Text(value) => Value::Text(value.clone()),
        Literal::Integer(value) => Value::Integer(*value),
    }
}

fn map_insert_error(err: rusqlite::Error, record: &NodeRecord) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains("nodes.category") {
                return RepoError::SingletonConflict(record.category);
            }
            if message.contains("nodes.id") {
                return RepoError::DuplicateId(record.id);
            }
        }
    }
    err.into()
}

fn parse_node_row(row: &Row<'_>) -> RepoResult<NodeRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in nodes.id"))
    })?;

    let category_text: String = row.get("category")?;
    let category = NodeKind::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in nodes.category"
        ))
    })?;

    let record = NodeRecord {
        id,
        category,
        name: row.get("name")?,
        number: row.get("number")?,
    };
    record.validate()?;
    Ok(record)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "nodes")? {
        return Err(RepoError::MissingRequiredTable("nodes"));
    }

    for column in REQUIRED_COLUMNS.iter().copied() {
        if !table_has_column(conn, "nodes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "nodes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::predicate_sql;
    use crate::query::predicate::{Field, Operator, Predicate};
    use rusqlite::types::Value;

    #[test]
    fn renders_fixed_and_caller_predicates_with_ordered_binds() {
        let predicate = (Predicate::eq(Field::Category, "folder")
            | Predicate::eq(Field::Category, "dashboard"))
            & Predicate::eq(Field::Name, "Dashboard");
        let mut binds = Vec::new();
        let sql = predicate_sql(&predicate, &mut binds);

        assert_eq!(sql, "((category = ? OR category = ?) AND name = ?)");
        assert_eq!(
            binds,
            vec![
                Value::Text("folder".to_string()),
                Value::Text("dashboard".to_string()),
                Value::Text("Dashboard".to_string()),
            ]
        );
    }

    #[test]
    fn renders_substring_operators_and_empty_groups() {
        let mut binds = Vec::new();
        let contains = Predicate::compare(Field::Name, Operator::Contains, "Raw").unwrap();
        assert_eq!(predicate_sql(&contains, &mut binds), "instr(name, ?) > 0");
        assert_eq!(
            predicate_sql(&Predicate::And(Vec::new()), &mut binds),
            "1 = 1"
        );
        assert_eq!(
            predicate_sql(&Predicate::Or(Vec::new()), &mut binds),
            "1 = 0"
        );
        assert_eq!(binds.len(), 1);
    }
}
