pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod seed;

pub use common::{Money, OrderId, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    NewOrder, NewProduct, Order, OrderLineItem, OrderStatus, ParseStatusError, Product,
    ProductPatch,
};
pub use postgres::PostgresStore;
pub use query::{Page, PageRequest};
pub use repository::{
    MissingProduct, OrderRepository, ProductRepository, StatusTransition, StockChange, Store,
};
