pub mod ab;
pub mod spinlock;
pub mod storage;

pub use ab::{Side, SideArray};
pub use spinlock::Spinlock;
