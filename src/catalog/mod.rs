//! Product catalog and shopping cart
//!
//! Sellers (users and admins) manage their own products, admins may manage
//! any. Deleting a product only hides it. Carts belong to plain users.

pub mod database;
pub mod models;
pub mod routes;

pub use database::{CartRepository, ProductRepository};
pub use models::{CartLine, Product};
pub use routes::catalog_router;

use crate::db::Database;

/// Shared state for the catalog handlers
#[derive(Clone)]
pub struct CatalogState {
    pub products: ProductRepository,
    pub cart: CartRepository,
}

impl CatalogState {
    pub fn new(db: Database) -> Self {
        Self {
            products: ProductRepository::new(db.clone()),
            cart: CartRepository::new(db),
        }
    }
}
