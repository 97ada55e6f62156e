pub mod product;
pub mod repository;

pub use product::{CatalogError, Product};
pub use repository::ProductRepository;
