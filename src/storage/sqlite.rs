use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{
    Car, Customer, NewCar, NewCustomer, Storage, StorageRead, StorageTx, StorageWrite,
};

const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

/// A write transaction on its own connection.
///
/// Dropping it without calling [`StorageTx::commit`] rolls every write back.
pub struct SqliteTx {
    conn: Connection,
    finished: bool,
}

impl StorageTx for SqliteTx {
    fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.conn.execute_batch("ROLLBACK") {
            log::error!("Failed to roll back abandoned transaction: {}", err);
        }
    }
}

fn open_conn(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(500))?;
    Ok(conn)
}

fn map_car_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        color: row.get(3)?,
        year: row.get(4)?,
    })
}

fn map_customer_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
    })
}

fn db_load_car(conn: &Connection, id: i64) -> rusqlite::Result<Option<Car>> {
    conn.query_row(
        "SELECT id, make, model, color, year FROM car WHERE id = ?1",
        params![id],
        map_car_row,
    )
    .optional()
}

fn db_list_cars(conn: &Connection) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare("SELECT id, make, model, color, year FROM car ORDER BY id")?;
    let mapped = stmt
        .query_map([], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_load_customer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        "SELECT id, name, phone FROM customer WHERE id = ?1",
        params![id],
        map_customer_row,
    )
    .optional()
}

fn db_list_customers(conn: &Connection) -> rusqlite::Result<Vec<Customer>> {
    let mut stmt = conn.prepare("SELECT id, name, phone FROM customer ORDER BY id")?;
    let mapped = stmt
        .query_map([], map_customer_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_list_customer_cars(conn: &Connection, customer_id: i64) -> rusqlite::Result<Vec<Car>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT car.id, car.make, car.model, car.color, car.year
        FROM car
        JOIN customer_car_association AS assoc ON assoc.car_id = car.id
        WHERE assoc.customer_id = ?1
        ORDER BY car.id
        "#,
    )?;
    let mapped = stmt
        .query_map(params![customer_id], map_car_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_insert_car(conn: &Connection, car: &NewCar) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO car (make, model, color, year) VALUES (?1, ?2, ?3, ?4)",
        params![car.make, car.model, car.color, car.year],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_delete_car(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM car WHERE id = ?1", params![id])
}

fn db_insert_customer(conn: &Connection, customer: &NewCustomer) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO customer (name, phone) VALUES (?1, ?2)",
        params![customer.name, customer.phone],
    )?;
    Ok(conn.last_insert_rowid())
}

fn db_update_customer(conn: &Connection, customer: &Customer) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE customer SET name = ?1, phone = ?2 WHERE id = ?3",
        params![customer.name, customer.phone, customer.id],
    )
}

fn db_delete_customer(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM customer WHERE id = ?1", params![id])
}

fn db_assign_car(conn: &Connection, customer_id: i64, car_id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO customer_car_association (customer_id, car_id) VALUES (?1, ?2)",
        params![customer_id, car_id],
    )?;
    Ok(rows > 0)
}

fn db_unassign_car(conn: &Connection, customer_id: i64, car_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM customer_car_association WHERE customer_id = ?1 AND car_id = ?2",
        params![customer_id, car_id],
    )
}

impl StorageRead for SqliteTx {
    fn load_car(&self, id: i64) -> Result<Option<Car>> {
        Ok(db_load_car(&self.conn, id)?)
    }

    fn list_cars(&self) -> Result<Vec<Car>> {
        Ok(db_list_cars(&self.conn)?)
    }

    fn load_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(db_load_customer(&self.conn, id)?)
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(db_list_customers(&self.conn)?)
    }

    fn list_customer_cars(&self, customer_id: i64) -> Result<Vec<Car>> {
        Ok(db_list_customer_cars(&self.conn, customer_id)?)
    }
}

impl StorageWrite for SqliteTx {
    fn insert_car(&self, car: &NewCar) -> Result<i64> {
        Ok(db_insert_car(&self.conn, car)?)
    }

    fn delete_car(&self, id: i64) -> Result<usize> {
        Ok(db_delete_car(&self.conn, id)?)
    }

    fn insert_customer(&self, customer: &NewCustomer) -> Result<i64> {
        Ok(db_insert_customer(&self.conn, customer)?)
    }

    fn update_customer(&self, customer: &Customer) -> Result<usize> {
        Ok(db_update_customer(&self.conn, customer)?)
    }

    fn delete_customer(&self, id: i64) -> Result<usize> {
        Ok(db_delete_customer(&self.conn, id)?)
    }

    fn assign_car(&self, customer_id: i64, car_id: i64) -> Result<bool> {
        Ok(db_assign_car(&self.conn, customer_id, car_id)?)
    }

    fn unassign_car(&self, customer_id: i64, car_id: i64) -> Result<usize> {
        Ok(db_unassign_car(&self.conn, customer_id, car_id)?)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = open_conn(&self.path)?;
        conn.execute_batch("BEGIN IMMEDIATE")?;

        Ok(SqliteTx {
            conn,
            finished: false,
        })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let path = format!("{}{}", self.path, suffix);
            if std::path::Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = open_conn(&self.path)?;
        Self::migrate(&conn)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE car (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                color TEXT NOT NULL,
                year INTEGER NOT NULL
            );
            CREATE TABLE customer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL
            );
            CREATE TABLE customer_car_association (
                customer_id INTEGER NOT NULL REFERENCES customer(id) ON DELETE CASCADE,
                car_id INTEGER NOT NULL REFERENCES car(id) ON DELETE CASCADE,
                PRIMARY KEY (customer_id, car_id)
            );
            CREATE INDEX customer_car_association_car_idx
                ON customer_car_association(car_id);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl StorageRead for SqliteStorage {
    fn load_car(&self, id: i64) -> Result<Option<Car>> {
        let row = self.with_conn(|conn| db_load_car(conn, id))?;
        Ok(row)
    }

    fn list_cars(&self) -> Result<Vec<Car>> {
        let rows = self.with_conn(db_list_cars)?;
        Ok(rows)
    }

    fn load_customer(&self, id: i64) -> Result<Option<Customer>> {
        let row = self.with_conn(|conn| db_load_customer(conn, id))?;
        Ok(row)
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = self.with_conn(db_list_customers)?;
        Ok(rows)
    }

    fn list_customer_cars(&self, customer_id: i64) -> Result<Vec<Car>> {
        let rows = self.with_conn(|conn| db_list_customer_cars(conn, customer_id))?;
        Ok(rows)
    }
}
