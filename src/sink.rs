use log::info;
use rusqlite::{params_from_iter, Connection};
use rusqlite::types::Value;
use crate::errors::SinkError;
use crate::table::{ColumnType, Table};

/// Replaces the content of a table in a SQLite database with the given table
///
/// # Arguments
///
/// * 'db_path' - path to the database file, created if it doesn't exist
/// * 'table_name' - name of the table to replace
/// * 'table' - the rows to store
pub fn load_table(db_path: &str, table_name: &str, table: &Table) -> Result<usize, SinkError> {
    let mut conn = Connection::open(db_path)?;
    let rows = replace_table(&mut conn, table_name, table)?;

    info!("replaced table {} in {} with {} rows", table_name, db_path, rows);

    Ok(rows)
}

/// Drops and recreates the table with column types inferred from the cell values, then
/// inserts all rows. Everything runs in one transaction.
///
/// # Arguments
///
/// * 'conn' - database connection
/// * 'table_name' - name of the table to replace
/// * 'table' - the rows to store
pub fn replace_table(conn: &mut Connection, table_name: &str, table: &Table) -> Result<usize, SinkError> {
    if table.headers.is_empty() {
        return Err(SinkError::from("table has no columns"));
    }

    let types = (0..table.headers.len())
        .map(|i| table.column_type(i))
        .collect::<Vec<ColumnType>>();

    let columns = table.headers
        .iter()
        .zip(&types)
        .map(|(h, t)| format!("{} {}", quote_ident(h), t))
        .collect::<Vec<String>>()
        .join(", ");

    let placeholders = (1..=table.headers.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<String>>()
        .join(", ");

    let name = quote_ident(table_name);
    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", name), [])?;
    tx.execute(&format!("CREATE TABLE {} ({})", name, columns), [])?;
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", name, placeholders))?;
        for row in &table.rows {
            let values = row.iter().zip(&types).map(|(c, t)| sql_value(c.as_deref(), *t));
            stmt.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(table.rows.len())
}

/// Converts a cell to a SQLite value of the column type, empty cells become NULL
fn sql_value(cell: Option<&str>, column_type: ColumnType) -> Value {
    match (cell, column_type) {
        (None, _) => Value::Null,
        (Some(c), ColumnType::Integer) => c.parse::<i64>().map(Value::Integer).unwrap_or(Value::Null),
        (Some(c), ColumnType::Real) => c.parse::<f64>().map(Value::Real).unwrap_or(Value::Null),
        (Some(c), ColumnType::Text) => Value::Text(c.to_string()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
