//! Product and cart repositories
//!
//! Plain parameterized queries over the shared connection.

use rusqlite::{params, OptionalExtension, Row};

use super::models::{CartLine, NewProduct, Product, ProductChanges};
use crate::db::{Database, StoreResult};

const PRODUCT_COLUMNS: &str =
    "id, title, description, price, stock, category, seller_id, image_base64, active";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        stock: row.get(4)?,
        category: row.get(5)?,
        seller_id: row.get(6)?,
        image_base64: row.get(7)?,
        active: row.get::<_, i32>(8)? != 0,
    })
}

#[derive(Clone)]
pub struct ProductRepository {
    db: Database,
}

impl ProductRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, product: &NewProduct) -> StoreResult<Product> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (title, description, price, stock, category, seller_id, image_base64)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    product.title,
                    product.description,
                    product.price,
                    product.stock,
                    product.category,
                    product.seller_id,
                    product.image_base64,
                ],
            )?;
            Ok(Product {
                id: conn.last_insert_rowid(),
                title: product.title.clone(),
                description: product.description.clone(),
                price: product.price,
                stock: product.stock,
                category: product.category.clone(),
                seller_id: product.seller_id.clone(),
                image_base64: product.image_base64.clone(),
                active: true,
            })
        })
    }

    pub fn list_active(&self) -> StoreResult<Vec<Product>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products WHERE active = 1 ORDER BY id",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt.query_map([], product_from_row)?;
            rows.collect()
        })
    }

    pub fn list_by_seller(&self, seller_id: &str) -> StoreResult<Vec<Product>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM products WHERE seller_id = ?1 AND active = 1 ORDER BY id",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![seller_id], product_from_row)?;
            rows.collect()
        })
    }

    /// Active product by id; deleted products are not found
    pub fn find_active(&self, id: i64) -> StoreResult<Option<Product>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM products WHERE id = ?1 AND active = 1",
                    PRODUCT_COLUMNS
                ),
                params![id],
                product_from_row,
            )
            .optional()
        })
    }

    /// Apply `changes`, keeping stored values for unset fields. Returns rows changed.
    pub fn update(&self, id: i64, changes: &ProductChanges) -> StoreResult<usize> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE products SET
                    title = COALESCE(?1, title),
                    description = COALESCE(?2, description),
                    price = COALESCE(?3, price),
                    stock = COALESCE(?4, stock),
                    category = COALESCE(?5, category),
                    image_base64 = COALESCE(?6, image_base64)
                 WHERE id = ?7 AND active = 1",
                params![
                    changes.title,
                    changes.description,
                    changes.price,
                    changes.stock,
                    changes.category,
                    changes.image_base64,
                    id,
                ],
            )
        })
    }

    /// Soft delete. Returns rows changed.
    pub fn deactivate(&self, id: i64) -> StoreResult<usize> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE products SET active = 0 WHERE id = ?1 AND active = 1",
                params![id],
            )
        })
    }
}

#[derive(Clone)]
pub struct CartRepository {
    db: Database,
}

impl CartRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn lines(&self, user_id: &str) -> StoreResult<Vec<CartLine>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT products.id, products.title, products.price, cart_items.quantity
                 FROM cart_items
                 JOIN products ON cart_items.product_id = products.id
                 WHERE cart_items.user_id = ?1
                 ORDER BY cart_items.id",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(CartLine {
                    product_id: row.get(0)?,
                    title: row.get(1)?,
                    price: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?;
            rows.collect()
        })
    }

    /// Insert a line, or add to the quantity of the existing one
    pub fn add(&self, user_id: &str, product_id: i64, quantity: i64) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cart_items (user_id, product_id, quantity) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity",
                params![user_id, product_id, quantity],
            )?;
            Ok(())
        })
    }

    pub fn set_quantity(&self, user_id: &str, product_id: i64, quantity: i64) -> StoreResult<usize> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE cart_items SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3",
                params![quantity, user_id, product_id],
            )
        })
    }

    pub fn remove(&self, user_id: &str, product_id: i64) -> StoreResult<usize> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
                params![user_id, product_id],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (ProductRepository, CartRepository) {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO accounts (id, name, email, password_hash, created_at, updated_at)
                 VALUES ('seller', 'Sally Seller', 'sally@example.com', 'h', 'now', 'now'),
                        ('buyer', 'Bruno Buyer', 'bruno@example.com', 'h', 'now', 'now');",
            )
        })
        .unwrap();
        (ProductRepository::new(db.clone()), CartRepository::new(db))
    }

    fn mug(seller: &str) -> NewProduct {
        NewProduct {
            title: "Coffee mug".to_string(),
            description: "Large ceramic mug".to_string(),
            price: 12.5,
            stock: 10,
            category: "kitchen".to_string(),
            seller_id: seller.to_string(),
            image_base64: None,
        }
    }

    #[test]
    fn test_create_list_and_soft_delete() {
        let (products, _) = seeded();
        let created = products.create(&mug("seller")).unwrap();
        assert!(created.active);

        assert_eq!(products.list_active().unwrap().len(), 1);
        assert_eq!(products.list_by_seller("seller").unwrap().len(), 1);
        assert!(products.list_by_seller("buyer").unwrap().is_empty());

        assert_eq!(products.deactivate(created.id).unwrap(), 1);
        assert_eq!(products.deactivate(created.id).unwrap(), 0);
        assert!(products.find_active(created.id).unwrap().is_none());
        assert!(products.list_active().unwrap().is_empty());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let (products, _) = seeded();
        let created = products.create(&mug("seller")).unwrap();

        let changes = ProductChanges {
            price: Some(15.0),
            ..Default::default()
        };
        assert_eq!(products.update(created.id, &changes).unwrap(), 1);

        let updated = products.find_active(created.id).unwrap().unwrap();
        assert_eq!(updated.price, 15.0);
        assert_eq!(updated.title, "Coffee mug");
        assert_eq!(products.update(999, &changes).unwrap(), 0);
    }

    #[test]
    fn test_cart_add_accumulates_quantity() {
        let (products, cart) = seeded();
        let mug = products.create(&mug("seller")).unwrap();

        cart.add("buyer", mug.id, 2).unwrap();
        cart.add("buyer", mug.id, 3).unwrap();

        let lines = cart.lines("buyer").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].title, "Coffee mug");
        assert!(cart.lines("seller").unwrap().is_empty());
    }

    #[test]
    fn test_cart_update_and_remove_report_missing_lines() {
        let (products, cart) = seeded();
        let mug = products.create(&mug("seller")).unwrap();

        assert_eq!(cart.set_quantity("buyer", mug.id, 4).unwrap(), 0);
        cart.add("buyer", mug.id, 1).unwrap();
        assert_eq!(cart.set_quantity("buyer", mug.id, 4).unwrap(), 1);
        assert_eq!(cart.lines("buyer").unwrap()[0].quantity, 4);

        assert_eq!(cart.remove("buyer", mug.id).unwrap(), 1);
        assert_eq!(cart.remove("buyer", mug.id).unwrap(), 0);
    }
}
