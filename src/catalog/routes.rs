//! Catalog REST API routes

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde_json::json;

use super::{
    models::{CartItemRequest, CreateProductRequest, Product, UpdateProductRequest},
    CatalogState,
};
use crate::auth::{access_gate, AccessGate, AuthService, Identity, Role};
use crate::error::{Result, StorefrontError};
use crate::extract::JsonBody;
use crate::response::ApiResponse;

/// Product and cart routes, mounted at the root
pub fn catalog_router(catalog: CatalogState, auth: Arc<AuthService>) -> Router {
    let public = Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(show_product))
        .with_state(catalog.clone());

    let sellers = Router::new()
        .route("/products/mine", get(my_products))
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::with_roles(auth.clone(), &[Role::User, Role::Admin]),
            access_gate,
        ))
        .with_state(catalog.clone());

    let cart = Router::new()
        .route("/cart", get(show_cart))
        .route("/cart/items", post(add_to_cart).put(update_cart_item))
        .route("/cart/items/{product_id}", delete(remove_from_cart))
        .route_layer(middleware::from_fn_with_state(
            AccessGate::with_roles(auth, &[Role::User]),
            access_gate,
        ))
        .with_state(catalog);

    public.merge(sellers).merge(cart)
}

fn parse_id(raw: &str, missing: StorefrontError) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| missing)
}

/// Load an active product the caller may change.
fn owned_product(catalog: &CatalogState, raw_id: &str, identity: &Identity) -> Result<Product> {
    let id = parse_id(raw_id, StorefrontError::ProductNotFound)?;
    let product = catalog
        .products
        .find_active(id)?
        .ok_or(StorefrontError::ProductNotFound)?;

    if identity.role != Role::Admin && product.seller_id != identity.id {
        return Err(StorefrontError::Forbidden);
    }
    Ok(product)
}

// ============================================================================
// Products
// ============================================================================

/// GET /products
async fn list_products(State(catalog): State<CatalogState>) -> Result<ApiResponse> {
    let products = catalog.products.list_active()?;
    Ok(ApiResponse::success("OK", "Products found").with_data(json!({ "products": products })))
}

/// GET /products/{id}
async fn show_product(
    State(catalog): State<CatalogState>,
    Path(id): Path<String>,
) -> Result<ApiResponse> {
    let id = parse_id(&id, StorefrontError::ProductNotFound)?;
    let product = catalog
        .products
        .find_active(id)?
        .ok_or(StorefrontError::ProductNotFound)?;
    Ok(ApiResponse::success("OK", "Product found").with_data(json!({ "product": product })))
}

/// GET /products/mine
async fn my_products(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse> {
    let products = catalog.products.list_by_seller(&identity.id)?;
    Ok(ApiResponse::success("OK", "Products found").with_data(json!({ "products": products })))
}

/// POST /products
async fn create_product(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<CreateProductRequest>,
) -> Result<ApiResponse> {
    let product = catalog.products.create(&req.validate(&identity.id)?)?;
    log::info!("Product {} created by {}", product.id, identity.email);

    Ok(ApiResponse::success("PRODUCT_CREATED", "Product created")
        .with_status(StatusCode::CREATED)
        .with_data(json!({ "product": product })))
}

/// PUT /products/{id}
async fn update_product(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateProductRequest>,
) -> Result<ApiResponse> {
    let product = owned_product(&catalog, &id, &identity)?;
    let changes = req.validate()?;

    if catalog.products.update(product.id, &changes)? == 0 {
        return Err(StorefrontError::ProductNotFound);
    }
    let updated = catalog
        .products
        .find_active(product.id)?
        .ok_or(StorefrontError::ProductNotFound)?;

    Ok(ApiResponse::success("PRODUCT_UPDATED", "Product updated")
        .with_data(json!({ "product": updated })))
}

/// DELETE /products/{id} - hides the product, rows are kept
async fn delete_product(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<ApiResponse> {
    let product = owned_product(&catalog, &id, &identity)?;
    if catalog.products.deactivate(product.id)? == 0 {
        return Err(StorefrontError::ProductNotFound);
    }
    log::info!("Product {} deleted by {}", product.id, identity.email);

    Ok(ApiResponse::success("PRODUCT_DELETED", "Product deleted"))
}

// ============================================================================
// Cart
// ============================================================================

fn cart_response(
    catalog: &CatalogState,
    identity: &Identity,
    code: &str,
    message: &str,
) -> Result<ApiResponse> {
    let lines = catalog.cart.lines(&identity.id)?;
    Ok(ApiResponse::success(code, message).with_data(json!({ "cart": lines })))
}

/// GET /cart
async fn show_cart(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiResponse> {
    cart_response(&catalog, &identity, "OK", "Cart found")
}

/// POST /cart/items
async fn add_to_cart(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<CartItemRequest>,
) -> Result<ApiResponse> {
    let (product_id, quantity) = req.validate()?;
    catalog
        .products
        .find_active(product_id)?
        .ok_or(StorefrontError::ProductNotFound)?;

    catalog.cart.add(&identity.id, product_id, quantity)?;
    cart_response(&catalog, &identity, "PRODUCT_ADDED", "Product added to cart")
}

/// PUT /cart/items
async fn update_cart_item(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<CartItemRequest>,
) -> Result<ApiResponse> {
    let (product_id, quantity) = req.validate()?;
    if catalog.cart.set_quantity(&identity.id, product_id, quantity)? == 0 {
        return Err(StorefrontError::CartItemNotFound);
    }
    cart_response(&catalog, &identity, "QUANTITY_UPDATED", "Quantity updated")
}

/// DELETE /cart/items/{product_id}
async fn remove_from_cart(
    State(catalog): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(product_id): Path<String>,
) -> Result<ApiResponse> {
    let product_id = parse_id(&product_id, StorefrontError::CartItemNotFound)?;
    if catalog.cart.remove(&identity.id, product_id)? == 0 {
        return Err(StorefrontError::CartItemNotFound);
    }
    cart_response(&catalog, &identity, "PRODUCT_REMOVED", "Product removed from cart")
}
