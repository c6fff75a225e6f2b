#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub color: String,
    pub year: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub color: String,
    pub year: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
}

pub trait StorageRead {
    fn load_car(&self, id: i64) -> anyhow::Result<Option<Car>>;
    fn list_cars(&self) -> anyhow::Result<Vec<Car>>;
    fn load_customer(&self, id: i64) -> anyhow::Result<Option<Customer>>;
    fn list_customers(&self) -> anyhow::Result<Vec<Customer>>;
    fn list_customer_cars(&self, customer_id: i64) -> anyhow::Result<Vec<Car>>;
}

pub trait StorageWrite {
    /// Inserts a car and returns its assigned id.
    fn insert_car(&self, car: &NewCar) -> anyhow::Result<i64>;
    /// Returns the number of deleted rows.
    fn delete_car(&self, id: i64) -> anyhow::Result<usize>;
    fn insert_customer(&self, customer: &NewCustomer) -> anyhow::Result<i64>;
    fn update_customer(&self, customer: &Customer) -> anyhow::Result<usize>;
    fn delete_customer(&self, id: i64) -> anyhow::Result<usize>;
    /// Links a car to a customer. Returns false if the pair already existed.
    fn assign_car(&self, customer_id: i64, car_id: i64) -> anyhow::Result<bool>;
    fn unassign_car(&self, customer_id: i64, car_id: i64) -> anyhow::Result<usize>;
}

pub trait StorageTx: StorageRead + StorageWrite {
    fn commit(self) -> anyhow::Result<()>;
    fn rollback(self) -> anyhow::Result<()>;
}

pub trait Storage: StorageRead {
    type Tx: StorageTx;

    fn begin_tx(&self) -> anyhow::Result<Self::Tx>;
}
