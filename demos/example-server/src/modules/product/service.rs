use super::error::ProductError;
use super::model::{CreateProductRequest, Product};
use super::repository::ProductRepository;
use std::sync::Arc;
use uuid::Uuid;

pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    pub fn create(&self, req: CreateProductRequest) -> Result<Product, ProductError> {
        if req.price <= 0.0 {
            return Err(ProductError::InvalidPrice(req.price));
        }
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            price: req.price,
        };
        self.repository.save(product.clone())?;
        Ok(product)
    }

    pub fn get(&self, id: String) -> Result<Product, ProductError> {
        self.repository
            .find_by_id(&id)?
            .ok_or(ProductError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<Product>, ProductError> {
        self.repository.find_all()
    }
}
