pub mod auth;
pub mod books;
pub mod customers;
pub mod mfr_orders;
pub mod reports;
pub mod sales;
pub mod users;
