//! Identifier and money types shared by every layer of the workspace.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{OrderId, ProductId};
