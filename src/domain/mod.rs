pub mod connection;
pub mod payment;
pub mod ports;
pub mod proposal;
pub mod wallet;
