pub mod ad_slot;
pub mod error;
pub mod page;
