mod common;

use magazzino_api::{
    auth::AuthService,
    config::AppConfig,
    errors::ServiceError,
    services::{
        categories::CategoryData, products::ProductData, suppliers::SupplierData,
        CategoryService, ProductService, SupplierService,
    },
};

fn test_config() -> AppConfig {
    let raw = r#"{
        "database_url": "sqlite::memory:",
        "session_secret": "0123456789abcdef0123456789abcdef"
    }"#;
    serde_json::from_str(raw).expect("valid test config")
}

#[tokio::test]
async fn product_search_is_case_insensitive_and_filters_by_category() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let categories = CategoryService::new(db.clone());

    let cat = categories
        .create(CategoryData {
            name: "Bevande".to_string(),
            description: None,
        })
        .await
        .unwrap();

    products
        .create(ProductData {
            sku: "ACQ-1".to_string(),
            name: "Acqua frizzante".to_string(),
            category_id: Some(cat.id),
            unit: "litri".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();
    products
        .create(ProductData {
            sku: "PAN-1".to_string(),
            name: "Pane".to_string(),
            unit: "kg".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let hits = products.search(Some("ACQUA"), None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sku, "ACQ-1");

    // SKU matches too.
    let hits = products.search(Some("pan-"), None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Pane");

    let hits = products.search(None, Some("Bevande")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sku, "ACQ-1");

    let hits = products.search(Some("zzz"), None).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn supplier_search_covers_name_email_and_phone() {
    let db = common::test_db().await;
    let suppliers = SupplierService::new(db.clone());

    suppliers
        .create(SupplierData {
            name: "Fratelli Rossi".to_string(),
            email: Some("ordini@rossi.it".to_string()),
            phone: Some("0551234567".to_string()),
            ..SupplierData::default()
        })
        .await
        .unwrap();
    suppliers
        .create(SupplierData {
            name: "Bianchi".to_string(),
            ..SupplierData::default()
        })
        .await
        .unwrap();

    assert_eq!(suppliers.list(Some("ROSSI")).await.unwrap().len(), 1);
    assert_eq!(suppliers.list(Some("ordini@")).await.unwrap().len(), 1);
    assert_eq!(suppliers.list(Some("055")).await.unwrap().len(), 1);
    assert_eq!(suppliers.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn admin_bootstrap_and_login_round_trip() {
    let db = common::test_db().await;
    let auth = AuthService::new(db.clone(), &test_config());

    auth.ensure_admin("Admin@Example.com", "segretissimo")
        .await
        .unwrap();
    // Idempotent on the second call.
    auth.ensure_admin("admin@example.com", "altra-password")
        .await
        .unwrap();

    // Email is matched case-insensitively; the first password wins.
    let user = auth
        .login("ADMIN@example.com", "segretissimo")
        .await
        .unwrap();
    assert_eq!(user.email, "admin@example.com");

    let err = auth
        .login("admin@example.com", "sbagliata")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthError(_)));
    let err = auth.login("nessuno@example.com", "x").await.unwrap_err();
    assert!(matches!(err, ServiceError::AuthError(_)));

    let token = auth.issue_session(user.id).unwrap();
    assert_eq!(auth.verify_session(&token), Some(user.id));
}
