pub mod chat;
pub mod webhook;

pub use chat::*;
pub use webhook::*;
