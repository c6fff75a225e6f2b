use serde::{Deserialize, Serialize};

use crate::{
    service::{CarDraft, CustomerDraft, CustomerPatch, ServiceError},
    storage::{Car, Customer},
};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarResponse {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub color: String,
    pub year: i64,
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            make: car.make,
            model: car.model,
            color: car.color,
            year: car.year,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CarsResponse {
    pub cars: Vec<CarResponse>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CustomersResponse {
    pub customers: Vec<CustomerResponse>,
}

/// `year` may arrive as a JSON number or as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct CarRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub year: Option<YearValue>,
}

impl TryFrom<CarRequest> for CarDraft {
    type Error = ServiceError;

    fn try_from(request: CarRequest) -> Result<Self, Self::Error> {
        let year = match request.year {
            Some(YearValue::Number(n)) => Some(n),
            Some(YearValue::Text(text)) if text.trim().is_empty() => None,
            Some(YearValue::Text(text)) => Some(text.trim().parse::<i64>().map_err(|_| {
                ServiceError::Validation(format!("Invalid car data: year {text:?} is not an integer."))
            })?),
            None => None,
        };
        Ok(CarDraft {
            make: request.make,
            model: request.model,
            color: request.color,
            year,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl From<CustomerRequest> for CustomerDraft {
    fn from(request: CustomerRequest) -> Self {
        Self {
            name: request.name,
            phone: request.phone,
        }
    }
}

impl From<CustomerRequest> for CustomerPatch {
    fn from(request: CustomerRequest) -> Self {
        Self {
            name: request.name,
            phone: request.phone,
        }
    }
}
