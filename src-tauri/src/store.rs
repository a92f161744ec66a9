use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::db;
use crate::error::StoreError;
use crate::ledger::{sort_transfers, NewTransfer, TransferRecord, STORED_DATE_FORMAT};

pub type ChangeListener = Box<dyn Fn(Vec<TransferRecord>) + Send + Sync>;

type ListenerMap = Mutex<BTreeMap<u64, Arc<ChangeListener>>>;

/// Collection of transfers with a live change feed.
pub trait LedgerStore: Send + Sync {
    /// Registers `on_change`, calls it once with the current collection and
    /// again with the full re-sorted collection after every change.
    /// Listeners must not write to the store they are subscribed to.
    fn subscribe(&self, on_change: ChangeListener) -> Result<Subscription, StoreError>;

    fn append(&self, transfer: NewTransfer) -> Result<TransferRecord, StoreError>;

    fn remove(&self, id: i64) -> Result<bool, StoreError>;

    /// Entire collection, newest first.
    fn load_all(&self) -> Result<Vec<TransferRecord>, StoreError>;
}

/// Handle to a registered listener. Releasing or dropping it stops delivery.
#[must_use = "dropping a subscription releases it immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut map) = listeners.lock() {
                map.remove(&self.id);
                debug!(subscription = self.id, "subscription released");
            }
        }
    }
}

pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
    listeners: Arc<ListenerMap>,
    next_listener: AtomicU64,
    // Held across load and delivery so snapshots arrive in commit order.
    publishing: Mutex<()>,
}

impl SqliteLedgerStore {
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            listeners: Arc::new(Mutex::new(BTreeMap::new())),
            next_listener: AtomicU64::new(1),
            publishing: Mutex::new(()),
        })
    }

    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        Self::new(db::open_connection(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    fn query_all(conn: &Connection) -> Result<Vec<TransferRecord>, StoreError> {
        let mut stmt = conn.prepare("SELECT id, date, amount FROM transfers")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut transfers = Vec::new();
        for row in rows {
            let (id, date, amount) = row?;
            let date = NaiveDateTime::parse_from_str(&date, STORED_DATE_FORMAT)
                .map_err(|_| StoreError::MalformedDate(date))?;
            transfers.push(TransferRecord { id, date, amount });
        }
        sort_transfers(&mut transfers);
        Ok(transfers)
    }

    /// The write has already committed; a failed delivery must not be
    /// reported as a failed write.
    fn publish_after_write(&self, op: &'static str) {
        if let Err(err) = self.publish() {
            warn!(op, error = %err, "ledger change not delivered");
        }
    }

    fn publish(&self) -> Result<(), StoreError> {
        let _order = self.publishing.lock().map_err(|_| StoreError::Poisoned)?;
        let transfers = self.load_all()?;
        let listeners: Vec<Arc<ChangeListener>> = self
            .listeners
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .values()
            .cloned()
            .collect();
        debug!(
            listeners = listeners.len(),
            transfers = transfers.len(),
            "publishing ledger change"
        );
        for listener in listeners {
            listener(transfers.clone());
        }
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn subscribe(&self, on_change: ChangeListener) -> Result<Subscription, StoreError> {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(on_change);
        self.listeners
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(id, Arc::clone(&listener));
        let subscription = Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        };
        listener(self.load_all()?);
        Ok(subscription)
    }

    fn append(&self, transfer: NewTransfer) -> Result<TransferRecord, StoreError> {
        let record = {
            let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
            conn.execute(
                "INSERT INTO transfers (date, amount) VALUES (?1, ?2)",
                params![
                    transfer.date.format(STORED_DATE_FORMAT).to_string(),
                    transfer.amount
                ],
            )?;
            TransferRecord {
                id: conn.last_insert_rowid(),
                date: transfer.date,
                amount: transfer.amount,
            }
        };
        self.publish_after_write("append");
        Ok(record)
    }

    fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let removed = {
            let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
            conn.execute("DELETE FROM transfers WHERE id = ?1", params![id])?
        };
        if removed > 0 {
            self.publish_after_write("remove");
        }
        Ok(removed > 0)
    }

    fn load_all(&self) -> Result<Vec<TransferRecord>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        Self::query_all(&conn)
    }
}
