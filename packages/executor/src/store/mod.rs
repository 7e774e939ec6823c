pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use traits::{ChallengeStore, SubmissionStore};
