mod common;

use axum::extract::{Path, State};
use axum::Form;
use chrono::NaiveDate;
use magazzino_api::{
    auth::AuthenticatedUser,
    config::AppConfig,
    handlers::lots::LotForm,
    services::{lots::LotData, products::ProductData, LotService, ProductService, ReportService},
    AppState,
};
use rust_decimal_macros::dec;

fn test_config() -> AppConfig {
    let raw = r#"{
        "database_url": "sqlite::memory:",
        "session_secret": "0123456789abcdef0123456789abcdef"
    }"#;
    serde_json::from_str(raw).expect("valid test config")
}

fn product(sku: &str, name: &str, min_stock: i32) -> ProductData {
    ProductData {
        sku: sku.to_string(),
        name: name.to_string(),
        unit: "pezzi".to_string(),
        vat: 10,
        cost: dec!(1.00),
        price: dec!(2.50),
        min_stock,
        ..ProductData::default()
    }
}

#[tokio::test]
async fn lot_add_and_remove_keep_stock_in_sync() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());

    let p = products.create(product("SKU-1", "Olio", 0)).await.unwrap();
    assert_eq!(p.stock_qty, 0);

    let lot_a = lots
        .add_lot(
            p.id,
            LotData {
                lot_code: "A".to_string(),
                expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1),
                qty: 10,
                notes: None,
            },
        )
        .await
        .unwrap();
    lots.add_lot(
        p.id,
        LotData {
            lot_code: "B".to_string(),
            expiry_date: None,
            qty: 5,
            notes: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(products.get(p.id).await.unwrap().stock_qty, 15);

    lots.remove_lot(p.id, lot_a.id).await.unwrap();
    assert_eq!(products.get(p.id).await.unwrap().stock_qty, 5);
}

#[tokio::test]
async fn stock_never_goes_negative_on_lot_removal() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());

    let p = products.create(product("SKU-2", "Vino", 0)).await.unwrap();
    let lot = lots
        .add_lot(
            p.id,
            LotData {
                lot_code: "L1".to_string(),
                expiry_date: None,
                qty: 8,
                notes: None,
            },
        )
        .await
        .unwrap();

    // Manual stock correction below the lot quantity.
    let mut data = product("SKU-2", "Vino", 0);
    data.stock_qty = 3;
    products.update(p.id, data).await.unwrap();

    lots.remove_lot(p.id, lot.id).await.unwrap();
    assert_eq!(products.get(p.id).await.unwrap().stock_qty, 0);
}

#[tokio::test]
async fn lot_requires_code_and_existing_product() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());

    let p = products.create(product("SKU-3", "Pasta", 0)).await.unwrap();

    let err = lots
        .add_lot(
            p.id,
            LotData {
                lot_code: "   ".to_string(),
                expiry_date: None,
                qty: 1,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        magazzino_api::errors::ServiceError::ValidationError(_)
    ));

    let err = lots
        .add_lot(
            9999,
            LotData {
                lot_code: "X".to_string(),
                expiry_date: None,
                qty: 1,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        magazzino_api::errors::ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn lot_form_with_empty_qty_creates_zero_quantity_lot() {
    let db = common::test_db().await;
    let state = AppState::new(db.clone(), test_config());
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());

    let p = products.create(product("SKU-5", "Miele", 0)).await.unwrap();

    // Expiry-only lot, quantity left blank.
    magazzino_api::handlers::lots::add(
        AuthenticatedUser { user_id: 1 },
        State(state.clone()),
        Path(p.id),
        Form(LotForm {
            lot_code: "SOLO-SCADENZA".to_string(),
            expiry_date: "2027-06-30".to_string(),
            qty: String::new(),
            notes: String::new(),
        }),
    )
    .await
    .unwrap();

    let registered = lots.lots_for_product(p.id).await.unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].qty, 0);
    assert_eq!(
        registered[0].expiry_date,
        NaiveDate::from_ymd_opt(2027, 6, 30)
    );
    assert_eq!(products.get(p.id).await.unwrap().stock_qty, 0);

    // Non-empty input that does not parse still creates nothing.
    magazzino_api::handlers::lots::add(
        AuthenticatedUser { user_id: 1 },
        State(state),
        Path(p.id),
        Form(LotForm {
            lot_code: "ROTTO".to_string(),
            expiry_date: String::new(),
            qty: "abc".to_string(),
            notes: String::new(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(lots.lots_for_product(p.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn low_stock_counter_follows_lot_movements() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());
    let reports = ReportService::new(db.clone());

    let p = products.create(product("SKU-4", "Caffè", 5)).await.unwrap();

    lots.add_lot(
        p.id,
        LotData {
            lot_code: "L1".to_string(),
            expiry_date: None,
            qty: 3,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(reports.dashboard().await.unwrap().low_stock, 1);

    lots.add_lot(
        p.id,
        LotData {
            lot_code: "L2".to_string(),
            expiry_date: None,
            qty: 10,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(reports.dashboard().await.unwrap().low_stock, 0);
}
