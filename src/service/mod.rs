mod error;

pub use error::ServiceError;

use error::persistence;

use crate::storage::{
    Car, Customer, NewCar, NewCustomer, Storage, StorageRead, StorageTx, StorageWrite,
};

/// Car fields as received from a client, before presence checks.
#[derive(Clone, Debug, Default)]
pub struct CarDraft {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct CustomerDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Partial customer update; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Record keeping for cars, customers and the links between them.
///
/// Every write runs in a single storage transaction which is committed only
/// after all of its statements succeed and rolled back otherwise.
#[derive(Clone)]
pub struct RecordService<S> {
    storage: S,
}

impl<S: Storage> RecordService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn create_car(&self, draft: CarDraft) -> Result<i64, ServiceError> {
        let car = validate_car(draft).inspect_err(|err| {
            log::warn!("create_car rejected: {}", err);
        })?;
        let id = self.write("create_car", |tx| {
            tx.insert_car(&car).map_err(|e| persistence("create_car", e))
        })?;
        log::info!(
            "🚗 Car {} created: {} {} ({}, {})",
            id,
            car.make,
            car.model,
            car.color,
            car.year
        );
        Ok(id)
    }

    pub fn list_cars(&self) -> Result<Vec<Car>, ServiceError> {
        self.storage
            .list_cars()
            .map_err(|e| persistence("list_cars", e))
    }

    pub fn get_car(&self, id: i64) -> Result<Car, ServiceError> {
        self.storage
            .load_car(id)
            .map_err(|e| persistence("get_car", e))?
            .ok_or_else(|| car_not_found(id))
    }

    pub fn delete_car(&self, id: i64) -> Result<(), ServiceError> {
        self.write("delete_car", |tx| {
            let rows = tx.delete_car(id).map_err(|e| persistence("delete_car", e))?;
            if rows == 0 {
                return Err(car_not_found(id));
            }
            Ok(())
        })?;
        log::info!("🗑️ Car {} deleted", id);
        Ok(())
    }

    pub fn create_customer(&self, draft: CustomerDraft) -> Result<i64, ServiceError> {
        let customer = validate_customer(draft).inspect_err(|err| {
            log::warn!("create_customer rejected: {}", err);
        })?;
        let id = self.write("create_customer", |tx| {
            tx.insert_customer(&customer)
                .map_err(|e| persistence("create_customer", e))
        })?;
        log::info!("👤 Customer {} created: {}", id, customer.name);
        Ok(id)
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>, ServiceError> {
        self.storage
            .list_customers()
            .map_err(|e| persistence("list_customers", e))
    }

    pub fn get_customer(&self, id: i64) -> Result<Customer, ServiceError> {
        self.storage
            .load_customer(id)
            .map_err(|e| persistence("get_customer", e))?
            .ok_or_else(|| customer_not_found(id))
    }

    pub fn update_customer(&self, id: i64, patch: CustomerPatch) -> Result<Customer, ServiceError> {
        let updated = self.write("update_customer", |tx| {
            let current = tx
                .load_customer(id)
                .map_err(|e| persistence("update_customer", e))?
                .ok_or_else(|| customer_not_found(id))?;

            let updated = Customer {
                id,
                name: patch.name.unwrap_or(current.name),
                phone: patch.phone.unwrap_or(current.phone),
            };
            let missing = missing_fields(&[("name", &updated.name), ("phone", &updated.phone)]);
            if !missing.is_empty() {
                let err = invalid("customer", &missing);
                log::warn!("update_customer {} rejected: {}", id, err);
                return Err(err);
            }

            tx.update_customer(&updated)
                .map_err(|e| persistence("update_customer", e))?;
            Ok(updated)
        })?;
        log::info!("✏️ Customer {} updated", id);
        Ok(updated)
    }

    pub fn delete_customer(&self, id: i64) -> Result<(), ServiceError> {
        self.write("delete_customer", |tx| {
            let rows = tx
                .delete_customer(id)
                .map_err(|e| persistence("delete_customer", e))?;
            if rows == 0 {
                return Err(customer_not_found(id));
            }
            Ok(())
        })?;
        log::info!("🗑️ Customer {} deleted", id);
        Ok(())
    }

    pub fn list_customer_cars(&self, customer_id: i64) -> Result<Vec<Car>, ServiceError> {
        self.get_customer(customer_id)?;
        self.storage
            .list_customer_cars(customer_id)
            .map_err(|e| persistence("list_customer_cars", e))
    }

    pub fn assign_car(&self, customer_id: i64, car_id: i64) -> Result<(), ServiceError> {
        let inserted = self.write("assign_car", |tx| {
            let customer = tx
                .load_customer(customer_id)
                .map_err(|e| persistence("assign_car", e))?;
            if customer.is_none() {
                return Err(customer_not_found(customer_id));
            }
            let car = tx.load_car(car_id).map_err(|e| persistence("assign_car", e))?;
            if car.is_none() {
                return Err(car_not_found(car_id));
            }
            tx.assign_car(customer_id, car_id)
                .map_err(|e| persistence("assign_car", e))
        })?;
        if inserted {
            log::info!("🔗 Car {} assigned to customer {}", car_id, customer_id);
        } else {
            log::debug!("Car {} already assigned to customer {}", car_id, customer_id);
        }
        Ok(())
    }

    pub fn unassign_car(&self, customer_id: i64, car_id: i64) -> Result<(), ServiceError> {
        self.write("unassign_car", |tx| {
            let rows = tx
                .unassign_car(customer_id, car_id)
                .map_err(|e| persistence("unassign_car", e))?;
            if rows == 0 {
                return Err(ServiceError::NotFound(format!(
                    "Car {car_id} is not assigned to customer {customer_id}."
                )));
            }
            Ok(())
        })?;
        log::info!("✂️ Car {} unassigned from customer {}", car_id, customer_id);
        Ok(())
    }

    fn write<T, F>(&self, operation: &'static str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&S::Tx) -> Result<T, ServiceError>,
    {
        let tx = self
            .storage
            .begin_tx()
            .map_err(|e| persistence(operation, e))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| persistence(operation, e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::error!("{} rollback failed: {:#}", operation, rollback_err);
                }
                Err(err)
            }
        }
    }
}

fn validate_car(draft: CarDraft) -> Result<NewCar, ServiceError> {
    let make = draft.make.unwrap_or_default();
    let model = draft.model.unwrap_or_default();
    let color = draft.color.unwrap_or_default();
    let year = draft.year.unwrap_or(0);

    let mut missing = missing_fields(&[("make", &make), ("model", &model), ("color", &color)]);
    if year == 0 {
        missing.push("year");
    }
    if !missing.is_empty() {
        return Err(invalid("car", &missing));
    }

    Ok(NewCar {
        make,
        model,
        color,
        year,
    })
}

fn validate_customer(draft: CustomerDraft) -> Result<NewCustomer, ServiceError> {
    let name = draft.name.unwrap_or_default();
    let phone = draft.phone.unwrap_or_default();

    let missing = missing_fields(&[("name", &name), ("phone", &phone)]);
    if !missing.is_empty() {
        return Err(invalid("customer", &missing));
    }

    Ok(NewCustomer { name, phone })
}

fn missing_fields(fields: &[(&'static str, &String)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect()
}

fn invalid(resource: &str, missing: &[&str]) -> ServiceError {
    ServiceError::Validation(format!(
        "Invalid {resource} data: missing or empty {}.",
        missing.join(", ")
    ))
}

fn car_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Car {id} not found."))
}

fn customer_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Customer {id} not found."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStorage, StorageRead, StorageTx, StorageWrite};
    use anyhow::anyhow;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_file(prefix: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("{}_{}.db", prefix, nanos));
        p
    }

    fn sqlite(prefix: &str) -> SqliteStorage {
        let storage = SqliteStorage::new(unique_temp_file(prefix));
        storage.init().unwrap();
        storage
    }

    fn corolla() -> CarDraft {
        CarDraft {
            make: Some("Toyota".to_string()),
            model: Some("Corolla".to_string()),
            color: Some("Red".to_string()),
            year: Some(2020),
        }
    }

    fn alice() -> CustomerDraft {
        CustomerDraft {
            name: Some("Alice".to_string()),
            phone: Some("555-0100".to_string()),
        }
    }

    #[test]
    fn create_car_roundtrips_fields() {
        let service = RecordService::new(sqlite("svc_car"));
        let id = service.create_car(corolla()).unwrap();

        let car = service.get_car(id).unwrap();
        assert_eq!(
            car,
            Car {
                id,
                make: "Toyota".to_string(),
                model: "Corolla".to_string(),
                color: "Red".to_string(),
                year: 2020,
            }
        );
    }

    #[test]
    fn create_car_rejects_missing_or_falsy_fields() {
        let service = RecordService::new(sqlite("svc_car_invalid"));

        let drafts = [
            CarDraft {
                make: None,
                ..corolla()
            },
            CarDraft {
                color: Some(String::new()),
                ..corolla()
            },
            CarDraft {
                year: Some(0),
                ..corolla()
            },
            CarDraft::default(),
        ];
        for draft in drafts {
            let err = service.create_car(draft).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        }

        assert!(service.list_cars().unwrap().is_empty());
    }

    #[test]
    fn validation_message_names_missing_fields() {
        let err = validate_car(CarDraft {
            make: Some("Toyota".to_string()),
            ..CarDraft::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid car data: missing or empty model, color, year."
        );
    }

    #[test]
    fn delete_unknown_ids_are_not_found() {
        let service = RecordService::new(sqlite("svc_delete_missing"));
        service.create_car(corolla()).unwrap();

        assert_eq!(
            service.delete_car(999).unwrap_err(),
            ServiceError::NotFound("Car 999 not found.".to_string())
        );
        assert!(matches!(
            service.delete_customer(999),
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(service.list_cars().unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_row_from_listing() {
        let service = RecordService::new(sqlite("svc_delete"));
        let keep = service.create_car(corolla()).unwrap();
        let gone = service.create_car(corolla()).unwrap();

        service.delete_car(gone).unwrap();

        let ids: Vec<i64> = service.list_cars().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![keep]);
        assert_eq!(service.list_cars().unwrap(), service.list_cars().unwrap());
        assert!(matches!(service.get_car(gone), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn update_customer_with_only_phone_keeps_name() {
        let service = RecordService::new(sqlite("svc_update"));
        let id = service.create_customer(alice()).unwrap();

        service
            .update_customer(
                id,
                CustomerPatch {
                    name: None,
                    phone: Some("555-0199".to_string()),
                },
            )
            .unwrap();

        let customer = service.get_customer(id).unwrap();
        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.phone, "555-0199");
    }

    #[test]
    fn update_customer_rejects_empty_result() {
        let service = RecordService::new(sqlite("svc_update_invalid"));
        let id = service.create_customer(alice()).unwrap();

        let err = service
            .update_customer(
                id,
                CustomerPatch {
                    name: Some(String::new()),
                    phone: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.get_customer(id).unwrap().name, "Alice");
    }

    #[test]
    fn update_unknown_customer_is_not_found() {
        let service = RecordService::new(sqlite("svc_update_missing"));
        let err = service
            .update_customer(7, CustomerPatch::default())
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Customer 7 not found.".to_string()));
    }

    #[test]
    fn create_customer_requires_name_and_phone() {
        let service = RecordService::new(sqlite("svc_customer_invalid"));
        let err = service
            .create_customer(CustomerDraft {
                name: Some("Bob".to_string()),
                phone: Some(String::new()),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.list_customers().unwrap().is_empty());
    }

    #[test]
    fn assign_and_unassign_cars() {
        let service = RecordService::new(sqlite("svc_assign"));
        let customer = service.create_customer(alice()).unwrap();
        let car = service.create_car(corolla()).unwrap();

        service.assign_car(customer, car).unwrap();
        service.assign_car(customer, car).unwrap();
        let cars = service.list_customer_cars(customer).unwrap();
        assert_eq!(cars.len(), 1);

        assert!(matches!(
            service.assign_car(customer, car + 1),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.assign_car(customer + 1, car),
            Err(ServiceError::NotFound(_))
        ));

        service.unassign_car(customer, car).unwrap();
        assert!(service.list_customer_cars(customer).unwrap().is_empty());
        assert!(matches!(
            service.unassign_car(customer, car),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_customer_keeps_assigned_cars() {
        let service = RecordService::new(sqlite("svc_delete_customer"));
        let customer = service.create_customer(alice()).unwrap();
        let car = service.create_car(corolla()).unwrap();
        service.assign_car(customer, car).unwrap();

        service.delete_customer(customer).unwrap();

        assert!(service.get_car(car).is_ok());
        assert!(matches!(
            service.list_customer_cars(customer),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn storage_failure_during_create_rolls_back() {
        let inner = sqlite("svc_flaky_create");
        let service = RecordService::new(FlakyStorage::new(inner.clone()));

        let err = service.create_car(corolla()).unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(inner.list_cars().unwrap().is_empty());

        let err = service.create_customer(alice()).unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(inner.list_customers().unwrap().is_empty());
    }

    #[test]
    fn storage_failure_during_update_rolls_back() {
        let inner = sqlite("svc_flaky_update");
        let id = RecordService::new(inner.clone())
            .create_customer(alice())
            .unwrap();
        let service = RecordService::new(FlakyStorage::new(inner.clone()));

        let err = service
            .update_customer(
                id,
                CustomerPatch {
                    name: Some("Mallory".to_string()),
                    phone: Some("555-0666".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));

        let customer = inner.load_customer(id).unwrap().unwrap();
        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.phone, "555-0100");
    }

    /// Performs every write, then reports a failure as if the disk gave out.
    #[derive(Clone)]
    struct FlakyStorage {
        inner: SqliteStorage,
    }

    impl FlakyStorage {
        fn new(inner: SqliteStorage) -> Self {
            Self { inner }
        }
    }

    struct FlakyTx {
        inner: <SqliteStorage as Storage>::Tx,
    }

    impl StorageRead for FlakyStorage {
        fn load_car(&self, id: i64) -> anyhow::Result<Option<Car>> {
            self.inner.load_car(id)
        }

        fn list_cars(&self) -> anyhow::Result<Vec<Car>> {
            self.inner.list_cars()
        }

        fn load_customer(&self, id: i64) -> anyhow::Result<Option<Customer>> {
            self.inner.load_customer(id)
        }

        fn list_customers(&self) -> anyhow::Result<Vec<Customer>> {
            self.inner.list_customers()
        }

        fn list_customer_cars(&self, customer_id: i64) -> anyhow::Result<Vec<Car>> {
            self.inner.list_customer_cars(customer_id)
        }
    }

    impl Storage for FlakyStorage {
        type Tx = FlakyTx;

        fn begin_tx(&self) -> anyhow::Result<Self::Tx> {
            Ok(FlakyTx {
                inner: self.inner.begin_tx()?,
            })
        }
    }

    impl StorageRead for FlakyTx {
        fn load_car(&self, id: i64) -> anyhow::Result<Option<Car>> {
            self.inner.load_car(id)
        }

        fn list_cars(&self) -> anyhow::Result<Vec<Car>> {
            self.inner.list_cars()
        }

        fn load_customer(&self, id: i64) -> anyhow::Result<Option<Customer>> {
            self.inner.load_customer(id)
        }

        fn list_customers(&self) -> anyhow::Result<Vec<Customer>> {
            self.inner.list_customers()
        }

        fn list_customer_cars(&self, customer_id: i64) -> anyhow::Result<Vec<Car>> {
            self.inner.list_customer_cars(customer_id)
        }
    }

    impl StorageWrite for FlakyTx {
        fn insert_car(&self, car: &NewCar) -> anyhow::Result<i64> {
            self.inner.insert_car(car)?;
            Err(anyhow!("disk I/O error"))
        }

        fn delete_car(&self, id: i64) -> anyhow::Result<usize> {
            self.inner.delete_car(id)?;
            Err(anyhow!("disk I/O error"))
        }

        fn insert_customer(&self, customer: &NewCustomer) -> anyhow::Result<i64> {
            self.inner.insert_customer(customer)?;
            Err(anyhow!("disk I/O error"))
        }

        fn update_customer(&self, customer: &Customer) -> anyhow::Result<usize> {
            self.inner.update_customer(customer)?;
            Err(anyhow!("disk I/O error"))
        }

        fn delete_customer(&self, id: i64) -> anyhow::Result<usize> {
            self.inner.delete_customer(id)?;
            Err(anyhow!("disk I/O error"))
        }

        fn assign_car(&self, customer_id: i64, car_id: i64) -> anyhow::Result<bool> {
            self.inner.assign_car(customer_id, car_id)?;
            Err(anyhow!("disk I/O error"))
        }

        fn unassign_car(&self, customer_id: i64, car_id: i64) -> anyhow::Result<usize> {
            self.inner.unassign_car(customer_id, car_id)?;
            Err(anyhow!("disk I/O error"))
        }
    }

    impl StorageTx for FlakyTx {
        fn commit(self) -> anyhow::Result<()> {
            self.inner.commit()
        }

        fn rollback(self) -> anyhow::Result<()> {
            self.inner.rollback()
        }
    }
}
