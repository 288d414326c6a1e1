//! Request handlers

pub mod chaincode;
pub mod health;
