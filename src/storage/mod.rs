pub mod canonical;
pub mod ephemeral;
pub mod flexible;

pub use canonical::{CanonicalStore, InMemoryCanonicalStore};
pub use ephemeral::{EphemeralStore, InMemoryEphemeralStore};
pub use flexible::{FlexibleStore, InMemoryFlexibleStore};
