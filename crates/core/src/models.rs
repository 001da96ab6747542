pub mod actor;
pub mod appointment;
pub mod availability;
pub mod customer;
pub mod time_label;
pub mod trainer;
