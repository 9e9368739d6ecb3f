//! Subscription Orders - Plan purchases settled through a payment gateway
//!
//! This crate implements the order lifecycle for subscription plans:
//! pending orders, hosted checkout through XunhuPay, verified payment
//! callbacks, manual settlement and timed expiry of unpaid orders.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
