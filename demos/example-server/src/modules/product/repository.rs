use super::error::ProductError;
use super::model::Product;
use dashmap::DashMap;

pub trait ProductRepository: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<Product>, ProductError>;
    fn save(&self, product: Product) -> Result<(), ProductError>;
    fn find_all(&self) -> Result<Vec<Product>, ProductError>;
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: DashMap<String, Product>,
}

impl ProductRepository for InMemoryProductRepository {
    fn find_by_id(&self, id: &str) -> Result<Option<Product>, ProductError> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    fn save(&self, product: Product) -> Result<(), ProductError> {
        self.products.insert(product.id.clone(), product);
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.iter().map(|p| p.value().clone()).collect())
    }
}
