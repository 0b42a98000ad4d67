//! Data models for the kiosk

pub mod item;
pub mod loan;
pub mod member;
pub mod visit;

// Re-export commonly used types
pub use item::{CatalogItem, ItemStatus};
pub use loan::Loan;
pub use member::Member;
pub use visit::Visit;
