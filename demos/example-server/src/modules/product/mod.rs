pub mod controller;
pub mod error;
pub mod model;
pub mod repository;
pub mod service;

pub use controller::router;
pub use error::product_classifier;
pub use repository::InMemoryProductRepository;
pub use service::ProductService;
