// In-process stand-in for the storefront API, recording every write.
#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub method: &'static str,
    pub path: String,
    pub fields: Vec<(String, String)>,
    pub request_id: Option<String>,
}

impl RecordedWrite {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[derive(Debug, Default)]
pub struct FakeShop {
    pub categories: Vec<Value>,
    pub products: Vec<Value>,
    pub writes: Vec<RecordedWrite>,
    pub fail_order_item_at: Option<usize>,
    pub omit_order_id: bool,
    order_items_seen: usize,
    next_id: i64,
}

impl FakeShop {
    pub fn with_products(products: Vec<Value>) -> Self {
        Self {
            categories: vec![json!({
                "id": 1,
                "name": "Anime Apparel",
                "description": "Hoodies and tees",
                "created_at": "2024-05-01T10:00:00.123456"
            })],
            products,
            next_id: 100,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub fn product(id: i64, name: &str, price: f64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "price": price,
        "stock": stock,
        "image_url": null,
        "category_id": 1,
        "created_at": "2024-05-01T10:00:00"
    })
}

#[derive(Debug, Clone)]
pub struct ShopHandle(Arc<Mutex<FakeShop>>);

impl ShopHandle {
    pub fn lock(&self) -> MutexGuard<'_, FakeShop> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }
}

type Reply = (StatusCode, Json<Value>);

pub async fn spawn(shop: FakeShop) -> anyhow::Result<(String, ShopHandle)> {
    let handle = ShopHandle(Arc::new(Mutex::new(shop)));

    let api = Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
        .route("/categories/{id}/products", get(category_products))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/orders", post(create_order))
        .route("/order_items", post(create_order_item));
    let app = Router::new().nest("/api", api).with_state(handle.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("http://{addr}/api"), handle))
}

fn not_found(what: &str) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
}

fn find(items: &[Value], id: i64) -> Option<Value> {
    items
        .iter()
        .find(|item| item["id"].as_i64() == Some(id))
        .cloned()
}

fn find_mut(items: &mut [Value], id: i64) -> Option<&mut Value> {
    items.iter_mut().find(|item| item["id"].as_i64() == Some(id))
}

fn apply_text_fields(item: &mut Value, fields: &[(String, String)]) {
    for (name, value) in fields {
        if matches!(name.as_str(), "name" | "description" | "image_url") {
            item[name.as_str()] = json!(value);
        }
    }
}

async fn read_fields(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap_or_default();
        fields.push((name, value));
    }
    fields
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn record(
    shop: &mut FakeShop,
    method: &'static str,
    path: String,
    fields: Vec<(String, String)>,
    headers: &HeaderMap,
) {
    shop.writes.push(RecordedWrite {
        method,
        path,
        fields,
        request_id: request_id(headers),
    });
}

async fn list_categories(State(shop): State<ShopHandle>) -> Json<Value> {
    Json(Value::Array(shop.lock().categories.clone()))
}

async fn get_category(State(shop): State<ShopHandle>, Path(id): Path<i64>) -> Reply {
    match find(&shop.lock().categories, id) {
        Some(category) => (StatusCode::OK, Json(category)),
        None => not_found("Category"),
    }
}

async fn category_products(State(shop): State<ShopHandle>, Path(id): Path<i64>) -> Json<Value> {
    let products = shop
        .lock()
        .products
        .iter()
        .filter(|product| product["category_id"].as_i64() == Some(id))
        .cloned()
        .collect();
    Json(Value::Array(products))
}

async fn create_category(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    let id = shop.next_id();
    let name = fields
        .iter()
        .find(|(field, _)| field == "name")
        .map(|(_, value)| value.clone());
    shop.categories.push(json!({ "id": id, "name": name, "description": null }));
    record(&mut shop, "POST", "/categories".into(), fields, &headers);
    (
        StatusCode::OK,
        Json(json!({ "message": "Category created", "category_id": id })),
    )
}

async fn update_category(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    record(&mut shop, "PATCH", format!("/categories/{id}"), fields.clone(), &headers);
    let Some(category) = find_mut(&mut shop.categories, id) else {
        return not_found("Category");
    };
    apply_text_fields(category, &fields);
    (
        StatusCode::OK,
        Json(json!({ "message": "Category updated", "category_id": id })),
    )
}

async fn delete_category(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut shop = shop.lock();
    record(&mut shop, "DELETE", format!("/categories/{id}"), Vec::new(), &headers);
    let before = shop.categories.len();
    shop.categories.retain(|c| c["id"].as_i64() != Some(id));
    if shop.categories.len() == before {
        return not_found("Category");
    }
    (StatusCode::OK, Json(json!({ "message": "Category deleted" })))
}

async fn list_products(State(shop): State<ShopHandle>) -> Json<Value> {
    Json(Value::Array(shop.lock().products.clone()))
}

async fn get_product(State(shop): State<ShopHandle>, Path(id): Path<i64>) -> Reply {
    match find(&shop.lock().products, id) {
        Some(product) => (StatusCode::OK, Json(product)),
        None => not_found("Product"),
    }
}

async fn create_product(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    let id = shop.next_id();
    record(&mut shop, "POST", "/products".into(), fields, &headers);
    (
        StatusCode::OK,
        Json(json!({ "message": "Product created", "product_id": id })),
    )
}

async fn update_product(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    record(&mut shop, "PATCH", format!("/products/{id}"), fields.clone(), &headers);
    let Some(product) = find_mut(&mut shop.products, id) else {
        return not_found("Product");
    };
    apply_text_fields(product, &fields);
    for (name, value) in &fields {
        match name.as_str() {
            "price" => product["price"] = json!(value.parse::<f64>().unwrap_or_default()),
            "stock" => product["stock"] = json!(value.parse::<u32>().unwrap_or_default()),
            _ => {}
        }
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Product updated", "product_id": id })),
    )
}

async fn delete_product(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut shop = shop.lock();
    record(&mut shop, "DELETE", format!("/products/{id}"), Vec::new(), &headers);
    let before = shop.products.len();
    shop.products.retain(|p| p["id"].as_i64() != Some(id));
    if shop.products.len() == before {
        return not_found("Product");
    }
    (StatusCode::OK, Json(json!({ "message": "Product deleted" })))
}

async fn create_order(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    let id = shop.next_id();
    record(&mut shop, "POST", "/orders".into(), fields, &headers);
    if shop.omit_order_id {
        return (StatusCode::OK, Json(json!({ "message": "Order created" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Order created", "order_id": id })),
    )
}

async fn create_order_item(
    State(shop): State<ShopHandle>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let mut shop = shop.lock();
    record(&mut shop, "POST", "/order_items".into(), fields, &headers);

    let attempt = shop.order_items_seen;
    shop.order_items_seen += 1;
    if shop.fail_order_item_at == Some(attempt) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Not enough stock available" })),
        );
    }

    let id = shop.next_id();
    (
        StatusCode::OK,
        Json(json!({ "message": "Order item added", "order_item_id": id })),
    )
}
