//! Integration tests

mod control_test;
mod e2e_test;
mod engine_test;
mod monitor_test;
