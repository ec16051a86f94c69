//! JSON API over the catalog store: admin CRUD, storefront reads and bulk CSV.

use axum::{extract::{Path, Query, State}, http::{header, StatusCode}, response::IntoResponse, routing::{get, post, put}, Json, Router};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::catalog::store::{self, BulkField, CatalogStore, ImportSummary, Paginated, ProductFilter, ProductView, StorefrontQuery};
use crate::domain::aggregates::{
    Banner, BannerDraft, BannerPatch, Category, CategoryPatch, EntityKind, NewCategory, NewReference, NewStatus, Page, PageDraft, PagePatch, Product,
    ProductDraft, ProductPatch, ReferenceEntity, ReferencePatch, Status, StatusPatch, StoreConfig,
};
use crate::domain::category_tree::FlatCategory;
use crate::domain::pricing::FinancialField;
use crate::CatalogError;

/// The snapshot mutex guards the file path so writes land in mutation order.
#[derive(Clone)]
pub struct AppState { pub store: Arc<RwLock<CatalogStore>>, pub snapshot: Option<Arc<Mutex<PathBuf>>> }

impl AppState {
    pub fn new(store: CatalogStore, snapshot_path: Option<PathBuf>) -> Self {
        Self { store: Arc::new(RwLock::new(store)), snapshot: snapshot_path.map(|p| Arc::new(Mutex::new(p))) }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-catalog"})) }))
        .route("/api/v1/products", get(list_products).post(create_product).put(replace_products))
        .route("/api/v1/products/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/api/v1/products/:id/financials", put(edit_financials))
        .route("/api/v1/next-product-id", get(next_product_id))
        .route("/api/v1/bulk/assign", post(bulk_assign))
        .route("/api/v1/bulk/delete", post(bulk_delete))
        .route("/api/v1/storefront/products", get(storefront_products))
        .route("/api/v1/storefront/pages/:slug", get(storefront_page))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/:id", put(update_category).delete(delete_category))
        .route("/api/v1/category-tree", get(category_tree))
        .route("/api/v1/statuses", get(list_statuses).post(create_status))
        .route("/api/v1/statuses/:id", put(update_status).delete(delete_status))
        .route("/api/v1/references/:kind", get(list_references).post(create_reference))
        .route("/api/v1/references/:kind/:id", put(update_reference).delete(delete_reference))
        .route("/api/v1/banners", get(list_banners).post(create_banner))
        .route("/api/v1/banners/:id", put(update_banner).delete(delete_banner))
        .route("/api/v1/pages", get(list_pages).post(create_page))
        .route("/api/v1/pages/:id", put(update_page).delete(delete_page))
        .route("/api/v1/config", get(get_config).put(replace_config))
        .route("/api/v1/import", post(import_csv))
        .route("/api/v1/export", get(export_csv))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

fn reject(e: CatalogError) -> (StatusCode, String) {
    let status = match &e {
        CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        CatalogError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CatalogError::Parse { .. } | CatalogError::Validation(_) | CatalogError::CategoryCycle { .. } | CatalogError::DuplicateSlug(_) => StatusCode::BAD_REQUEST,
    };
    (status, e.to_string())
}

/// Drains pending events into the log and rewrites the snapshot, if any.
/// The catalog is encoded under the write lock; the file write happens after
/// the lock is released.
async fn commit(s: &AppState, mut store: RwLockWriteGuard<'_, CatalogStore>) -> Result<(), (StatusCode, String)> {
    for event in store.take_events() { debug!(?event, "catalog event"); }
    let Some(snapshot) = &s.snapshot else { return Ok(()) };
    let bytes = store::encode_snapshot(store.catalog()).map_err(reject)?;
    let path = snapshot.lock().await;
    drop(store);
    store::write_snapshot(&path, &bytes).await.map_err(reject)
}

// Products

async fn list_products(State(s): State<AppState>, Query(f): Query<ProductFilter>) -> ApiResult<Vec<Product>> {
    let store = s.store.read().await;
    Ok(Json(store.list_products(&f)))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<ProductView> {
    let store = s.store.read().await;
    store.product_view(&id).map(Json).map_err(reject)
}

async fn create_product(State(s): State<AppState>, Json(draft): Json<ProductDraft>) -> ApiResult<Product> {
    let mut store = s.store.write().await;
    let product = store.add_product(draft).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(product))
}

async fn update_product(State(s): State<AppState>, Path(id): Path<String>, Json(patch): Json<ProductPatch>) -> ApiResult<Product> {
    let mut store = s.store.write().await;
    let product = store.update_product(&id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(product))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_product(&id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_products(State(s): State<AppState>, Json(products): Json<Vec<Product>>) -> ApiResult<Vec<Product>> {
    let mut store = s.store.write().await;
    store.replace_products(products).map_err(reject)?;
    let products = store.catalog().products.clone();
    commit(&s, store).await?;
    Ok(Json(products))
}

async fn next_product_id(State(s): State<AppState>) -> ApiResult<serde_json::Value> {
    let store = s.store.read().await;
    let id = store.next_product_id().map_err(reject)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

#[derive(Debug, Deserialize)] pub struct FinancialEdit { pub field: FinancialField, pub value: f64 }

async fn edit_financials(State(s): State<AppState>, Path(id): Path<String>, Json(edit): Json<FinancialEdit>) -> ApiResult<Product> {
    let mut store = s.store.write().await;
    let product = store.edit_financials(&id, edit.field, edit.value).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)] pub struct BulkAssign { pub ids: Vec<String>, pub field: BulkField, pub value: String }
#[derive(Debug, Deserialize)] pub struct BulkDelete { pub ids: Vec<String> }

async fn bulk_assign(State(s): State<AppState>, Json(req): Json<BulkAssign>) -> ApiResult<serde_json::Value> {
    let mut store = s.store.write().await;
    let updated = store.bulk_assign(&req.ids, req.field, &req.value).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

async fn bulk_delete(State(s): State<AppState>, Json(req): Json<BulkDelete>) -> ApiResult<serde_json::Value> {
    let mut store = s.store.write().await;
    let deleted = store.bulk_delete(&req.ids);
    commit(&s, store).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

// Storefront

async fn storefront_products(State(s): State<AppState>, Query(q): Query<StorefrontQuery>) -> ApiResult<Paginated<ProductView>> {
    let store = s.store.read().await;
    Ok(Json(store.storefront(&q)))
}

async fn storefront_page(State(s): State<AppState>, Path(slug): Path<String>) -> ApiResult<Page> {
    let store = s.store.read().await;
    store.visible_page(&slug).cloned().map(Json).map_err(reject)
}

// Categories

async fn list_categories(State(s): State<AppState>) -> ApiResult<Vec<Category>> {
    let store = s.store.read().await;
    Ok(Json(store.categories().to_vec()))
}

async fn category_tree(State(s): State<AppState>) -> ApiResult<Vec<FlatCategory>> {
    let store = s.store.read().await;
    Ok(Json(store.category_tree()))
}

async fn create_category(State(s): State<AppState>, Json(new): Json<NewCategory>) -> ApiResult<Category> {
    let mut store = s.store.write().await;
    let category = store.add_category(new).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(category))
}

async fn update_category(State(s): State<AppState>, Path(id): Path<String>, Json(patch): Json<CategoryPatch>) -> ApiResult<Category> {
    let mut store = s.store.write().await;
    let category = store.update_category(&id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(category))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_category(&id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Statuses

async fn list_statuses(State(s): State<AppState>) -> ApiResult<Vec<Status>> {
    let store = s.store.read().await;
    Ok(Json(store.statuses().to_vec()))
}

async fn create_status(State(s): State<AppState>, Json(new): Json<NewStatus>) -> ApiResult<Status> {
    let mut store = s.store.write().await;
    let status = store.add_status(new).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(status))
}

async fn update_status(State(s): State<AppState>, Path(id): Path<String>, Json(patch): Json<StatusPatch>) -> ApiResult<Status> {
    let mut store = s.store.write().await;
    let status = store.update_status(&id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(status))
}

async fn delete_status(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_status(&id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Brands, conditions, suppliers

async fn list_references(State(s): State<AppState>, Path(kind): Path<EntityKind>) -> ApiResult<Vec<ReferenceEntity>> {
    let store = s.store.read().await;
    store.references(kind).map(|r| Json(r.to_vec())).map_err(reject)
}

async fn create_reference(State(s): State<AppState>, Path(kind): Path<EntityKind>, Json(new): Json<NewReference>) -> ApiResult<ReferenceEntity> {
    let mut store = s.store.write().await;
    let entity = store.add_reference(kind, new).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(entity))
}

async fn update_reference(State(s): State<AppState>, Path((kind, id)): Path<(EntityKind, String)>, Json(patch): Json<ReferencePatch>) -> ApiResult<ReferenceEntity> {
    let mut store = s.store.write().await;
    let entity = store.update_reference(kind, &id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(entity))
}

async fn delete_reference(State(s): State<AppState>, Path((kind, id)): Path<(EntityKind, String)>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_reference(kind, &id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Banners

async fn list_banners(State(s): State<AppState>) -> ApiResult<Vec<Banner>> {
    let store = s.store.read().await;
    Ok(Json(store.banners().to_vec()))
}

async fn create_banner(State(s): State<AppState>, Json(draft): Json<BannerDraft>) -> ApiResult<Banner> {
    let mut store = s.store.write().await;
    let banner = store.add_banner(draft).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(banner))
}

async fn update_banner(State(s): State<AppState>, Path(id): Path<String>, Json(patch): Json<BannerPatch>) -> ApiResult<Banner> {
    let mut store = s.store.write().await;
    let banner = store.update_banner(&id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(banner))
}

async fn delete_banner(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_banner(&id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Pages

async fn list_pages(State(s): State<AppState>) -> ApiResult<Vec<Page>> {
    let store = s.store.read().await;
    Ok(Json(store.pages().to_vec()))
}

async fn create_page(State(s): State<AppState>, Json(draft): Json<PageDraft>) -> ApiResult<Page> {
    let mut store = s.store.write().await;
    let page = store.add_page(draft).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(page))
}

async fn update_page(State(s): State<AppState>, Path(id): Path<String>, Json(patch): Json<PagePatch>) -> ApiResult<Page> {
    let mut store = s.store.write().await;
    let page = store.update_page(&id, patch).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(page))
}

async fn delete_page(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    let mut store = s.store.write().await;
    store.delete_page(&id).map_err(reject)?;
    commit(&s, store).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Store configuration

async fn get_config(State(s): State<AppState>) -> ApiResult<StoreConfig> {
    let store = s.store.read().await;
    Ok(Json(store.config().clone()))
}

async fn replace_config(State(s): State<AppState>, Json(config): Json<StoreConfig>) -> ApiResult<StoreConfig> {
    let mut store = s.store.write().await;
    store.replace_config(config).map_err(reject)?;
    let config = store.config().clone();
    commit(&s, store).await?;
    Ok(Json(config))
}

// Bulk CSV

async fn import_csv(State(s): State<AppState>, body: String) -> ApiResult<ImportSummary> {
    let mut store = s.store.write().await;
    let summary = store.import_csv(&body).map_err(reject)?;
    commit(&s, store).await?;
    Ok(Json(summary))
}

async fn export_csv(State(s): State<AppState>) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = s.store.read().await;
    let text = store.export_csv().map_err(reject)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8"), (header::CONTENT_DISPOSITION, "attachment; filename=\"products.csv\"")], text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_catalog;
    use crate::domain::value_objects::ExchangeRate;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(CatalogStore::new(seed_catalog(), Some(ExchangeRate::fallback())), None))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request.header(header::CONTENT_TYPE, "application/json").body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        (status, to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec())
    }

    fn json(bytes: &[u8]) -> serde_json::Value { serde_json::from_slice(bytes).unwrap() }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "healthy");
    }

    #[tokio::test]
    async fn test_storefront_listing_hides_inactive() {
        let (status, body) = send(app(), Method::GET, "/api/v1/storefront/products?perPage=5", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["total"], 9);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["categoryName"], "iPhone Swap");
    }

    #[tokio::test]
    async fn test_product_crud_status_codes() {
        let app = app();
        let (status, body) = send(app.clone(), Method::POST, "/api/v1/products", Some(serde_json::json!({"name": "Galaxy A15", "category": "cat1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["id"], "20");

        let (status, _) = send(app.clone(), Method::POST, "/api/v1/products", Some(serde_json::json!({"name": "X", "colour": "red"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(app.clone(), Method::GET, "/api/v1/products/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app.clone(), Method::DELETE, "/api/v1/products/20", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_financial_edit_recomputes() {
        let (status, body) = send(app(), Method::PUT, "/api/v1/products/10/financials", Some(serde_json::json!({"field": "markup", "value": 50.0}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["price"], 1968.75);
    }

    #[tokio::test]
    async fn test_category_cycle_is_bad_request() {
        let app = app();
        let (_, body) = send(app.clone(), Method::POST, "/api/v1/categories", Some(serde_json::json!({"name": "Capas", "parentId": "cat1"}))).await;
        let child = json(&body)["id"].as_str().unwrap().to_string();
        let (status, _) = send(app, Method::PUT, "/api/v1/categories/cat1", Some(serde_json::json!({"parentId": child}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_references_by_kind() {
        let app = app();
        let (status, body) = send(app.clone(), Method::POST, "/api/v1/references/supplier", Some(serde_json::json!({"name": "Atacado Sul"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json(&body)["id"].as_str().unwrap().starts_with("sup_"));
        let (status, _) = send(app, Method::GET, "/api/v1/references/page", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_page_lookup() {
        let app = app();
        let (status, body) = send(app.clone(), Method::GET, "/api/v1/storefront/pages/sobre-nos", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["title"], "Sobre Nós");
        let (status, _) = send(app, Method::GET, "/api/v1/storefront/pages/contato", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mutations_rewrite_snapshot() {
        let dir = std::env::temp_dir().join(format!("catalog-http-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.json");
        let app = router(AppState::new(CatalogStore::new(seed_catalog(), None), Some(path.clone())));
        let (status, _) = send(app, Method::POST, "/api/v1/references/brand", Some(serde_json::json!({"name": "Motorola"}))).await;
        assert_eq!(status, StatusCode::OK);
        let saved = store::load_snapshot(&path).await.unwrap().unwrap();
        assert!(saved.brands.iter().any(|b| b.name == "Motorola"));
        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let app = app();
        let csv = "id,name,price,brand\n,Moto G84,1499.9,Motorola\n";
        let request = Request::builder().method(Method::POST).uri("/api/v1/import").header(header::CONTENT_TYPE, "text/csv").body(Body::from(csv)).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = json(&to_bytes(response.into_body(), usize::MAX).await.unwrap());
        assert_eq!(summary["appended"], 1);
        assert_eq!(summary["createdReferences"], 1);

        let (status, body) = send(app.clone(), Method::GET, "/api/v1/export", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("id,name,details,category,price"));
        assert!(text.contains("20,Moto G84,,,1499.9,,,Inativo,,Motorola,"));

        let (status, _) = send(app, Method::POST, "/api/v1/import", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
