pub mod inference;
pub mod models;
pub mod pii;

pub use models::events::{BookingLifecycleEvent, LifecycleKind};
pub use inference::InferenceConfig;
pub use pii::Masked;
