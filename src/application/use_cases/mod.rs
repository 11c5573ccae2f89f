pub mod billing;
pub mod customer;
pub mod pause;
pub mod payment;
pub mod plan;
pub mod subscription;
