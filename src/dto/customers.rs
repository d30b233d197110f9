use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, Customer, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// Customer joined with its account record for the admin view.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerWithAccount {
    pub customer: Customer,
    pub account: Option<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<CustomerWithAccount>,
}
