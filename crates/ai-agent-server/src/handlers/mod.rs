pub mod diagnostics;
pub mod health;
pub mod test_endpoint;
pub mod webhook;
