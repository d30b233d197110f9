pub mod audit_logs;
pub mod books;
pub mod customers;
pub mod employees;
pub mod mfr_order_items;
pub mod mfr_orders;
pub mod sale_items;
pub mod sales;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use books::Entity as Books;
pub use customers::Entity as Customers;
pub use employees::Entity as Employees;
pub use mfr_order_items::Entity as MfrOrderItems;
pub use mfr_orders::Entity as MfrOrders;
pub use sale_items::Entity as SaleItems;
pub use sales::Entity as Sales;
pub use users::Entity as Users;
