pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Car, Customer, NewCar, NewCustomer, Storage, StorageRead, StorageTx, StorageWrite};
