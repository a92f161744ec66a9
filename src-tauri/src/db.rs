use std::{fs, path::PathBuf};

use rusqlite::Connection;
use tauri::{AppHandle, Manager};

use crate::error::StoreError;

fn db_path(app: &AppHandle) -> Result<PathBuf, StoreError> {
    let data_dir = app
        .path()
        .app_data_dir()
        .map_err(|err| StoreError::Location(err.to_string()))?;
    fs::create_dir_all(&data_dir).map_err(|err| StoreError::Location(err.to_string()))?;
    Ok(data_dir.join("ledger.sqlite"))
}

pub fn open_app_connection(app: &AppHandle) -> Result<Connection, StoreError> {
    let path = db_path(app)?;
    open_connection(path)
}

pub fn open_connection(path: PathBuf) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS transfers (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          date TEXT NOT NULL,
          amount REAL NOT NULL
        );",
    )?;
    Ok(())
}
