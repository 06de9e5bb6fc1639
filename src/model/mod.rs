pub mod locker;

pub use locker::{LockerRecord, RenderMode};
