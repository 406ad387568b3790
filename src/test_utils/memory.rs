//! A scripted in-memory driver.
//!
//! `MemoryConnection` understands just enough SQL (CREATE TABLE, INSERT,
//! SELECT, UPDATE, DELETE, TRUNCATE, SHOW TABLES, SHOW COLUMNS) to run the
//! engine end to end without a real database. Anything it cannot parse can be
//! scripted per statement with [`MemoryConnection::script`]. Failure injection
//! and call counters make driver-level error paths testable.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::DbConfig;
use crate::driver::{ClientConnection, Connector, DriverError, StatementHandle};
use crate::types::FieldValue;

/// Where an injected failure fires inside the statement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Prepare,
    Bind,
    Execute,
    DescribeColumns,
    Fetch,
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
    next_id: i64,
}

impl MemoryTable {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// The `id` column is auto-assigned when it exists but is absent from an
    /// insert's column list.
    fn auto_id_index(&self, inserted: &[String]) -> Option<usize> {
        let idx = self.columns.iter().position(|c| c == "id")?;
        if inserted.iter().any(|c| c == "id") {
            None
        } else {
            Some(idx)
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedResult {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
}

#[derive(Debug)]
struct ArmedFailure {
    point: FailurePoint,
    skips: usize,
    error: DriverError,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    scripts: HashMap<String, ScriptedResult>,
    armed: Option<ArmedFailure>,
    prepare_calls: usize,
    bind_calls: usize,
    execute_calls: usize,
    released_statements: usize,
}

impl MemoryState {
    fn take_failure(&mut self, point: FailurePoint) -> Option<DriverError> {
        match &mut self.armed {
            Some(armed) if armed.point == point => {
                if armed.skips > 0 {
                    armed.skips -= 1;
                    return None;
                }
                self.armed.take().map(|a| a.error)
            }
            _ => None,
        }
    }
}

/// Connector for [`MemoryConnection`]. `failing()` builds one whose
/// `establish` always errors, for exercising the connect-failure path.
#[derive(Debug, Default, Clone)]
pub struct MemoryConnector {
    fail_connect: bool,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail_connect: true }
    }
}

impl Connector for MemoryConnector {
    type Conn = MemoryConnection;

    fn establish(&self, config: &DbConfig) -> Result<MemoryConnection, DriverError> {
        if self.fail_connect {
            return Err(DriverError::new(
                2002,
                format!("can't reach server on '{}'", config.host),
            ));
        }
        Ok(MemoryConnection::new(config.dbname.clone()))
    }
}

/// In-memory connection holding tables, scripted results, and counters.
#[derive(Debug)]
pub struct MemoryConnection {
    dbname: String,
    state: RefCell<MemoryState>,
}

impl MemoryConnection {
    pub fn new(dbname: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            state: RefCell::new(MemoryState::default()),
        }
    }

    /// Registers an empty table. Column order is the storage order; a first
    /// or later column named `id` becomes the auto-increment key.
    pub fn create_table(&self, name: &str, columns: &[&str]) {
        let table = MemoryTable::new(columns.iter().map(|c| (*c).to_string()).collect());
        self.state.borrow_mut().tables.insert(name.to_string(), table);
    }

    /// Inserts rows directly, bypassing SQL. Rows must match the table width.
    pub fn seed_rows(&self, table: &str, rows: Vec<Vec<FieldValue>>) {
        let mut state = self.state.borrow_mut();
        if let Some(t) = state.tables.get_mut(table) {
            for row in rows {
                if let Some(idx) = t.columns.iter().position(|c| c == "id")
                    && let Some(FieldValue::Int(id)) = row.get(idx)
                {
                    t.next_id = t.next_id.max(id + 1);
                }
                t.rows.push(row);
            }
        }
    }

    /// Cans a result for one exact SQL text. Scripted statements take
    /// precedence over the parser, so joins or vendor syntax the parser does
    /// not understand can still be exercised.
    pub fn script(&self, sql: &str, columns: &[&str], rows: Vec<Vec<FieldValue>>) {
        let result = ScriptedResult {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
        };
        self.state.borrow_mut().scripts.insert(sql.to_string(), result);
    }

    /// Arms a one-shot failure at the given lifecycle point. The next call
    /// that reaches that point consumes it and returns the error.
    pub fn fail_next(&self, point: FailurePoint, code: i32, message: &str) {
        self.fail_after(point, 0, code, message);
    }

    /// Like [`MemoryConnection::fail_next`], but lets `skips` matching calls
    /// through first. Useful for failing one row in the middle of a batch.
    pub fn fail_after(&self, point: FailurePoint, skips: usize, code: i32, message: &str) {
        self.state.borrow_mut().armed = Some(ArmedFailure {
            point,
            skips,
            error: DriverError::new(code, message),
        });
    }

    pub fn prepare_count(&self) -> usize {
        self.state.borrow().prepare_calls
    }

    pub fn bind_count(&self) -> usize {
        self.state.borrow().bind_calls
    }

    pub fn execute_count(&self) -> usize {
        self.state.borrow().execute_calls
    }

    /// How many statement handles have been dropped or closed.
    pub fn released_count(&self) -> usize {
        self.state.borrow().released_statements
    }

    /// Raw stored rows for a table, escaped exactly as they sit at rest.
    pub fn table_rows(&self, table: &str) -> Vec<Vec<FieldValue>> {
        self.state
            .borrow()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn plan(&self, sql: &str) -> Result<(Plan, Vec<String>), DriverError> {
        let state = self.state.borrow();
        if let Some(script) = state.scripts.get(sql) {
            return Ok((Plan::Scripted(script.clone()), Vec::new()));
        }

        if let Some(caps) = CREATE_RE.captures(sql) {
            let columns = split_idents(&caps[2]);
            return Ok((
                Plan::Create {
                    table: caps[1].to_string(),
                    columns,
                },
                Vec::new(),
            ));
        }
        if let Some(caps) = INSERT_RE.captures(sql) {
            let table = caps[1].to_string();
            let columns = split_idents(&caps[2]);
            let stored = state
                .tables
                .get(&table)
                .ok_or_else(|| no_such_table(&table))?;
            for col in &columns {
                if !stored.columns.contains(col) {
                    return Err(unknown_column(col, &table));
                }
            }
            return Ok((Plan::Insert { table, columns }, Vec::new()));
        }
        if let Some(caps) = SELECT_RE.captures(sql) {
            let table = caps[2].to_string();
            let stored = state
                .tables
                .get(&table)
                .ok_or_else(|| no_such_table(&table))?;
            let projection = caps[1].trim();
            let columns = if projection == "*" {
                stored.columns.clone()
            } else {
                let named = split_idents(projection);
                for col in &named {
                    if !stored.columns.contains(col) {
                        return Err(unknown_column(col, &table));
                    }
                }
                named
            };
            let filter = caps.get(3).map(|m| m.as_str().to_string());
            return Ok((
                Plan::Select {
                    table,
                    columns: columns.clone(),
                    filter,
                },
                columns,
            ));
        }
        if let Some(caps) = UPDATE_RE.captures(sql) {
            let table = caps[1].to_string();
            let set_columns: Vec<String> = caps[2]
                .split(',')
                .filter_map(|part| part.split('=').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !state.tables.contains_key(&table) {
                return Err(no_such_table(&table));
            }
            let filter = caps.get(3).map(|m| m.as_str().to_string());
            return Ok((
                Plan::Update {
                    table,
                    set_columns,
                    filter,
                },
                Vec::new(),
            ));
        }
        if let Some(caps) = DELETE_RE.captures(sql) {
            let table = caps[1].to_string();
            if !state.tables.contains_key(&table) {
                return Err(no_such_table(&table));
            }
            let filter = caps.get(2).map(|m| m.as_str().to_string());
            return Ok((Plan::Delete { table, filter }, Vec::new()));
        }
        if let Some(caps) = TRUNCATE_RE.captures(sql) {
            let table = caps[1].to_string();
            if !state.tables.contains_key(&table) {
                return Err(no_such_table(&table));
            }
            return Ok((Plan::Truncate { table }, Vec::new()));
        }
        if SHOW_TABLES_RE.is_match(sql) {
            return Ok((Plan::ShowTables, vec![format!("Tables_in_{}", self.dbname)]));
        }
        if let Some(caps) = SHOW_COLUMNS_RE.captures(sql) {
            let table = caps[1].to_string();
            if !state.tables.contains_key(&table) {
                return Err(no_such_table(&table));
            }
            return Ok((Plan::ShowColumns { table }, vec!["Field".to_string()]));
        }
        Ok((Plan::Noop, Vec::new()))
    }
}

impl ClientConnection for MemoryConnection {
    type Statement<'conn>
        = MemoryStatement<'conn>
    where
        Self: 'conn;

    fn prepare(&self, sql: &str) -> Result<MemoryStatement<'_>, DriverError> {
        {
            let mut state = self.state.borrow_mut();
            state.prepare_calls += 1;
            if let Some(err) = state.take_failure(FailurePoint::Prepare) {
                return Err(err);
            }
        }
        let (plan, columns) = self.plan(sql)?;
        Ok(MemoryStatement {
            conn: self,
            plan,
            placeholders: sql.matches('?').count(),
            bound: Vec::new(),
            columns,
            buffered: VecDeque::new(),
            affected: 0,
            insert_id: 0,
        })
    }
}

static CREATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*create\s+table\s+([A-Za-z0-9_]+)\s*\(([^)]*)\)\s*$")
        .expect("create pattern")
});
static INSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*insert\s+into\s+([A-Za-z0-9_]+)\s*\(([^)]*)\)\s*values\s*\(.*\)\s*$")
        .expect("insert pattern")
});
static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*select\s+(.+?)\s+from\s+([A-Za-z0-9_]+)\s*(?:where\s+([A-Za-z0-9_]+)\s*=\s*\?)?\s*$",
    )
    .expect("select pattern")
});
static UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*update\s+([A-Za-z0-9_]+)\s+set\s+(.+?)\s*(?:where\s+([A-Za-z0-9_]+)\s*=\s*\?)?\s*$",
    )
    .expect("update pattern")
});
static DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*delete\s+from\s+([A-Za-z0-9_]+)\s*(?:where\s+([A-Za-z0-9_]+)\s*=\s*\?)?\s*$",
    )
    .expect("delete pattern")
});
static TRUNCATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*truncate\s+(?:table\s+)?([A-Za-z0-9_]+)\s*$").expect("truncate pattern")
});
static SHOW_TABLES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*show\s+tables\s*$").expect("show tables pattern"));
static SHOW_COLUMNS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*show\s+columns\s+from\s+([A-Za-z0-9_]+)\s*$")
        .expect("show columns pattern")
});

fn split_idents(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|part| part.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn no_such_table(table: &str) -> DriverError {
    DriverError::new(1146, format!("table '{table}' doesn't exist"))
}

fn unknown_column(column: &str, table: &str) -> DriverError {
    DriverError::new(1054, format!("unknown column '{column}' in '{table}'"))
}

#[derive(Debug, Clone)]
enum Plan {
    Scripted(ScriptedResult),
    Create { table: String, columns: Vec<String> },
    Insert { table: String, columns: Vec<String> },
    Select {
        table: String,
        columns: Vec<String>,
        filter: Option<String>,
    },
    Update {
        table: String,
        set_columns: Vec<String>,
        filter: Option<String>,
    },
    Delete { table: String, filter: Option<String> },
    Truncate { table: String },
    ShowTables,
    ShowColumns { table: String },
    Noop,
}

/// Prepared statement over a [`MemoryConnection`].
#[derive(Debug)]
pub struct MemoryStatement<'conn> {
    conn: &'conn MemoryConnection,
    plan: Plan,
    placeholders: usize,
    bound: Vec<FieldValue>,
    columns: Vec<String>,
    buffered: VecDeque<Vec<FieldValue>>,
    affected: u64,
    insert_id: u64,
}

impl MemoryStatement<'_> {
    fn run_plan(&mut self) -> Result<(), DriverError> {
        let plan = self.plan.clone();
        let mut state = self.conn.state.borrow_mut();
        match &plan {
            Plan::Scripted(script) => {
                self.columns = script.columns.clone();
                self.buffered = script.rows.iter().cloned().collect();
            }
            Plan::Create { table, columns } => {
                if state.tables.contains_key(table) {
                    return Err(DriverError::new(1050, format!("table '{table}' already exists")));
                }
                state
                    .tables
                    .insert(table.clone(), MemoryTable::new(columns.clone()));
            }
            Plan::Insert { table, columns } => {
                let stored = state
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| no_such_table(table))?;
                if self.bound.len() != columns.len() {
                    return Err(DriverError::new(
                        2031,
                        "no data supplied for parameters in prepared statement",
                    ));
                }
                let auto = stored.auto_id_index(columns);
                let mut row = vec![FieldValue::Null; stored.columns.len()];
                for (col, value) in columns.iter().zip(self.bound.iter()) {
                    if let Some(idx) = stored.columns.iter().position(|c| c == col) {
                        row[idx] = value.clone();
                    }
                }
                if let Some(idx) = auto {
                    let id = stored.next_id;
                    stored.next_id += 1;
                    row[idx] = FieldValue::Int(id);
                    self.insert_id = u64::try_from(id).unwrap_or(0);
                }
                stored.rows.push(row);
                self.affected = 1;
            }
            Plan::Select {
                table,
                columns,
                filter,
            } => {
                let stored = state
                    .tables
                    .get(table)
                    .ok_or_else(|| no_such_table(table))?;
                let indices: Vec<usize> = columns
                    .iter()
                    .filter_map(|c| stored.columns.iter().position(|sc| sc == c))
                    .collect();
                let filter_idx = filter
                    .as_ref()
                    .and_then(|c| stored.columns.iter().position(|sc| sc == c));
                for row in &stored.rows {
                    if let Some(idx) = filter_idx
                        && row.get(idx) != self.bound.first()
                    {
                        continue;
                    }
                    let projected: Vec<FieldValue> = indices
                        .iter()
                        .map(|&i| row.get(i).cloned().unwrap_or(FieldValue::Null))
                        .collect();
                    self.buffered.push_back(projected);
                }
            }
            Plan::Update {
                table,
                set_columns,
                filter,
            } => {
                let stored = state
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| no_such_table(table))?;
                let set_indices: Vec<usize> = set_columns
                    .iter()
                    .filter_map(|c| stored.columns.iter().position(|sc| sc == c))
                    .collect();
                let filter_idx = filter
                    .as_ref()
                    .and_then(|c| stored.columns.iter().position(|sc| sc == c));
                let filter_value = self.bound.get(set_columns.len()).cloned();
                for row in &mut stored.rows {
                    if let (Some(idx), Some(value)) = (filter_idx, &filter_value)
                        && row.get(idx) != Some(value)
                    {
                        continue;
                    }
                    for (slot, col_idx) in set_indices.iter().enumerate() {
                        if let Some(value) = self.bound.get(slot) {
                            row[*col_idx] = value.clone();
                        }
                    }
                    self.affected += 1;
                }
            }
            Plan::Delete { table, filter } => {
                let stored = state
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| no_such_table(table))?;
                let filter_idx = filter
                    .as_ref()
                    .and_then(|c| stored.columns.iter().position(|sc| sc == c));
                let before = stored.rows.len();
                if let Some(idx) = filter_idx {
                    let needle = self.bound.first().cloned();
                    stored
                        .rows
                        .retain(|row| row.get(idx).cloned() != needle);
                } else {
                    stored.rows.clear();
                }
                self.affected = (before - stored.rows.len()) as u64;
            }
            Plan::Truncate { table } => {
                let stored = state
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| no_such_table(table))?;
                stored.rows.clear();
                stored.next_id = 1;
            }
            Plan::ShowTables => {
                let mut names: Vec<&String> = state.tables.keys().collect();
                names.sort();
                for name in names {
                    self.buffered
                        .push_back(vec![FieldValue::Text(name.clone())]);
                }
            }
            Plan::ShowColumns { table } => {
                let stored = state
                    .tables
                    .get(table)
                    .ok_or_else(|| no_such_table(table))?;
                for column in &stored.columns {
                    self.buffered
                        .push_back(vec![FieldValue::Text(column.clone())]);
                }
            }
            Plan::Noop => {}
        }
        Ok(())
    }
}

impl StatementHandle for MemoryStatement<'_> {
    fn expected_param_count(&self) -> usize {
        self.placeholders
    }

    fn bind(&mut self, values: &[FieldValue]) -> Result<(), DriverError> {
        let mut state = self.conn.state.borrow_mut();
        state.bind_calls += 1;
        if let Some(err) = state.take_failure(FailurePoint::Bind) {
            return Err(err);
        }
        drop(state);
        if values.len() != self.placeholders {
            return Err(DriverError::new(
                2031,
                "no data supplied for parameters in prepared statement",
            ));
        }
        self.bound = values.to_vec();
        Ok(())
    }

    fn execute(&mut self) -> Result<(), DriverError> {
        {
            let mut state = self.conn.state.borrow_mut();
            state.execute_calls += 1;
            if let Some(err) = state.take_failure(FailurePoint::Execute) {
                return Err(err);
            }
        }
        self.affected = 0;
        self.insert_id = 0;
        self.buffered.clear();
        self.run_plan()
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_insert_id(&self) -> u64 {
        self.insert_id
    }

    fn describe_columns(&self) -> Result<Vec<String>, DriverError> {
        let mut state = self.conn.state.borrow_mut();
        if let Some(err) = state.take_failure(FailurePoint::DescribeColumns) {
            return Err(err);
        }
        Ok(self.columns.clone())
    }

    fn fetch_next(&mut self) -> Result<Option<Vec<FieldValue>>, DriverError> {
        {
            let mut state = self.conn.state.borrow_mut();
            if let Some(err) = state.take_failure(FailurePoint::Fetch) {
                return Err(err);
            }
        }
        Ok(self.buffered.pop_front())
    }
}

impl Drop for MemoryStatement<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.conn.state.try_borrow_mut() {
            state.released_statements += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> MemoryConnection {
        let conn = MemoryConnection::new("testdb");
        conn.create_table("pets", &["id", "name", "age"]);
        conn
    }

    #[test]
    fn insert_assigns_ids_in_order() {
        let conn = conn();
        for name in ["rex", "milo"] {
            let mut stmt = conn
                .prepare("INSERT INTO pets (name, age) VALUES (?, ?)")
                .unwrap();
            stmt.bind(&[FieldValue::Text(name.into()), FieldValue::Int(3)])
                .unwrap();
            stmt.execute().unwrap();
        }
        let rows = conn.table_rows("pets");
        assert_eq!(rows[0][0], FieldValue::Int(1));
        assert_eq!(rows[1][0], FieldValue::Int(2));
    }

    #[test]
    fn select_filters_and_projects() {
        let conn = conn();
        conn.seed_rows(
            "pets",
            vec![
                vec![
                    FieldValue::Int(1),
                    FieldValue::Text("rex".into()),
                    FieldValue::Int(3),
                ],
                vec![
                    FieldValue::Int(2),
                    FieldValue::Text("milo".into()),
                    FieldValue::Int(5),
                ],
            ],
        );
        let mut stmt = conn
            .prepare("SELECT name FROM pets WHERE id = ?")
            .unwrap();
        stmt.bind(&[FieldValue::Int(2)]).unwrap();
        stmt.execute().unwrap();
        assert_eq!(stmt.describe_columns().unwrap(), vec!["name"]);
        assert_eq!(
            stmt.fetch_next().unwrap(),
            Some(vec![FieldValue::Text("milo".into())])
        );
        assert_eq!(stmt.fetch_next().unwrap(), None);
    }

    #[test]
    fn unknown_table_fails_at_prepare() {
        let conn = conn();
        let err = conn.prepare("SELECT * FROM nope").unwrap_err();
        assert_eq!(err.code, 1146);
    }

    #[test]
    fn injected_failure_fires_once() {
        let conn = conn();
        conn.fail_next(FailurePoint::Execute, 1213, "deadlock found");
        let mut stmt = conn.prepare("DELETE FROM pets").unwrap();
        stmt.bind(&[]).unwrap();
        assert_eq!(stmt.execute().unwrap_err().code, 1213);
        assert!(stmt.execute().is_ok());
    }

    #[test]
    fn counters_track_lifecycle() {
        let conn = conn();
        {
            let mut stmt = conn.prepare("TRUNCATE pets").unwrap();
            stmt.bind(&[]).unwrap();
            stmt.execute().unwrap();
        }
        assert_eq!(conn.prepare_count(), 1);
        assert_eq!(conn.bind_count(), 1);
        assert_eq!(conn.execute_count(), 1);
        assert_eq!(conn.released_count(), 1);
    }

    #[test]
    fn scripted_results_take_precedence() {
        let conn = conn();
        let sql = "SELECT p.id, o.id FROM pets p JOIN orders o ON o.pet = p.id";
        conn.script(
            sql,
            &["id", "id"],
            vec![vec![FieldValue::Int(1), FieldValue::Int(9)]],
        );
        let mut stmt = conn.prepare(sql).unwrap();
        stmt.bind(&[]).unwrap();
        stmt.execute().unwrap();
        assert_eq!(stmt.describe_columns().unwrap(), vec!["id", "id"]);
        assert_eq!(
            stmt.fetch_next().unwrap(),
            Some(vec![FieldValue::Int(1), FieldValue::Int(9)])
        );
    }

    #[test]
    fn show_tables_uses_database_name() {
        let conn = conn();
        let mut stmt = conn.prepare("SHOW TABLES").unwrap();
        stmt.bind(&[]).unwrap();
        stmt.execute().unwrap();
        assert_eq!(stmt.describe_columns().unwrap(), vec!["Tables_in_testdb"]);
        assert_eq!(
            stmt.fetch_next().unwrap(),
            Some(vec![FieldValue::Text("pets".into())])
        );
    }
}
