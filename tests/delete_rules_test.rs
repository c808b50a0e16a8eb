mod common;

use magazzino_api::{
    errors::ServiceError,
    services::{
        categories::CategoryData, lots::LotData, price_lists::PriceListData,
        products::ProductData, suppliers::SupplierData, CategoryService, LotService,
        PriceListService, ProductService, SupplierService,
    },
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn supplier_delete_blocked_while_products_reference_it() {
    let db = common::test_db().await;
    let suppliers = SupplierService::new(db.clone());
    let products = ProductService::new(db.clone());

    let acme = suppliers
        .create(SupplierData {
            name: "Acme".to_string(),
            ..SupplierData::default()
        })
        .await
        .unwrap();

    let widget = products
        .create(ProductData {
            sku: "W-1".to_string(),
            name: "Widget".to_string(),
            supplier_id: Some(acme.id),
            unit: "pezzi".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let err = suppliers.delete(acme.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    products.delete(widget.id).await.unwrap();
    suppliers.delete(acme.id).await.unwrap();
}

#[tokio::test]
async fn category_delete_blocked_while_products_reference_it() {
    let db = common::test_db().await;
    let categories = CategoryService::new(db.clone());
    let products = ProductService::new(db.clone());

    let food = categories
        .create(CategoryData {
            name: "Alimentari".to_string(),
            description: None,
        })
        .await
        .unwrap();

    products
        .create(ProductData {
            sku: "F-1".to_string(),
            name: "Farina".to_string(),
            category_id: Some(food.id),
            unit: "kg".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let err = categories.delete(food.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn product_delete_cascades_to_lots_and_price_list_items() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());
    let price_lists = PriceListService::new(db.clone());

    let p = products
        .create(ProductData {
            sku: "C-1".to_string(),
            name: "Conserva".to_string(),
            unit: "pezzi".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    lots.add_lot(
        p.id,
        LotData {
            lot_code: "L1".to_string(),
            expiry_date: None,
            qty: 4,
            notes: None,
        },
    )
    .await
    .unwrap();

    let list = price_lists
        .create(PriceListData {
            name: "Listino Test".to_string(),
            channel: "B2B".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    price_lists
        .upsert_item(list.id, p.id, Some(dec!(9.90)))
        .await
        .unwrap();

    products.delete(p.id).await.unwrap();

    assert!(matches!(
        products.get(p.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(lots.lots_for_product(p.id).await.unwrap().is_empty());
    assert!(price_lists
        .items_for_list(list.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn price_list_delete_cascades_to_items() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let price_lists = PriceListService::new(db.clone());

    let p = products
        .create(ProductData {
            sku: "P-1".to_string(),
            name: "Pelati".to_string(),
            unit: "pezzi".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let list = price_lists
        .create(PriceListData {
            name: "Horeca".to_string(),
            channel: "Ho.Re.Ca.".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    price_lists
        .upsert_item(list.id, p.id, Some(dec!(3.20)))
        .await
        .unwrap();

    price_lists.delete(list.id).await.unwrap();

    assert!(matches!(
        price_lists.get(list.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    // The product itself is untouched.
    assert_eq!(products.get(p.id).await.unwrap().sku, "P-1");
}

#[tokio::test]
async fn duplicate_names_and_skus_are_rejected() {
    let db = common::test_db().await;
    let suppliers = SupplierService::new(db.clone());
    let products = ProductService::new(db.clone());

    suppliers
        .create(SupplierData {
            name: "Acme".to_string(),
            ..SupplierData::default()
        })
        .await
        .unwrap();
    let err = suppliers
        .create(SupplierData {
            name: "  Acme  ".to_string(),
            ..SupplierData::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    products
        .create(ProductData {
            sku: "DUP-1".to_string(),
            name: "Uno".to_string(),
            unit: "pezzi".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();
    let err = products
        .create(ProductData {
            sku: "DUP-1".to_string(),
            name: "Due".to_string(),
            unit: "pezzi".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
