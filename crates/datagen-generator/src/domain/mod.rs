//! Domain producers, one module per event family.

pub mod badge;
pub mod customer;
pub mod followup;
pub mod online;
pub mod order;
pub mod order_pattern;
pub mod product;
pub mod returns;
pub mod review;
pub mod sensor;
pub mod stock;
pub mod transaction;
