pub mod database;

pub use database::{EntityDraft, EventDb};
