mod common;

use magazzino_api::{
    reports::csv::products_csv,
    services::{
        categories::CategoryData, products::ProductData, suppliers::SupplierData,
        CategoryService, ProductService, SupplierService,
    },
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn export_then_import_recreates_products() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let categories = CategoryService::new(db.clone());
    let suppliers = SupplierService::new(db.clone());

    let cat = categories
        .create(CategoryData {
            name: "Bevande".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let sup = suppliers
        .create(SupplierData {
            name: "Rossi".to_string(),
            ..SupplierData::default()
        })
        .await
        .unwrap();

    products
        .create(ProductData {
            sku: "VINO-1".to_string(),
            name: "Vino rosso".to_string(),
            category_id: Some(cat.id),
            supplier_id: Some(sup.id),
            unit: "bottiglia".to_string(),
            vat: 22,
            cost: dec!(4.10),
            price: dec!(8.90),
            stock_qty: 12,
            min_stock: 2,
            notes: Some("annata 2023".to_string()),
        })
        .await
        .unwrap();

    let rows = products.export_rows().await.unwrap();
    let csv_bytes = products_csv(&rows).unwrap();

    // Import into a second, empty database.
    let db2 = common::test_db().await;
    let products2 = ProductService::new(db2.clone());
    let count = products2.import_csv(&csv_bytes).await.unwrap();
    assert_eq!(count, 1);

    let imported = products2.get_by_sku("VINO-1").await.unwrap().unwrap();
    assert_eq!(imported.name, "Vino rosso");
    assert_eq!(imported.unit, "bottiglia");
    assert_eq!(imported.vat, 22);
    assert_eq!(imported.cost, dec!(4.10));
    assert_eq!(imported.price, dec!(8.90));
    assert_eq!(imported.stock_qty, 12);
    assert_eq!(imported.min_stock, 2);
    assert_eq!(imported.notes.as_deref(), Some("annata 2023"));

    // Category and supplier were created by name on the fly.
    let cats = CategoryService::new(db2.clone()).names().await.unwrap();
    assert_eq!(cats, vec!["Bevande".to_string()]);
    let sups = SupplierService::new(db2.clone()).names().await.unwrap();
    assert_eq!(sups, vec!["Rossi".to_string()]);
}

#[tokio::test]
async fn import_skips_rows_without_sku_and_coerces_bad_numbers() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());

    let csv = "\u{feff}sku,name,category,supplier,unit,vat,cost,price,stock_qty,min_stock,notes\n\
               ,Senza SKU,,,,,,,,,\n\
               OK-1,Con SKU,,,,n/a,abc,\"1,50\",x,,\n";
    let count = products.import_csv(csv.as_bytes()).await.unwrap();
    assert_eq!(count, 1);

    let imported = products.get_by_sku("OK-1").await.unwrap().unwrap();
    assert_eq!(imported.vat, 0);
    assert_eq!(imported.cost, dec!(0));
    assert_eq!(imported.price, dec!(1.50));
    assert_eq!(imported.stock_qty, 0);
    assert_eq!(imported.unit, "pezzi");
    assert!(products.get_by_sku("").await.unwrap().is_none());
}

#[tokio::test]
async fn import_with_empty_association_columns_keeps_existing_links() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let categories = CategoryService::new(db.clone());

    let cat = categories
        .create(CategoryData {
            name: "Dispensa".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let existing = products
        .create(ProductData {
            sku: "RISO-1".to_string(),
            name: "Riso".to_string(),
            category_id: Some(cat.id),
            unit: "kg".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let csv = "sku,name,category,supplier,unit,vat,cost,price,stock_qty,min_stock,notes\n\
               RISO-1,Riso Carnaroli,,,kg,4,2.00,4.50,6,1,\n";
    products.import_csv(csv.as_bytes()).await.unwrap();

    let updated = products.get(existing.id).await.unwrap();
    assert_eq!(updated.name, "Riso Carnaroli");
    assert_eq!(updated.category_id, Some(cat.id));
    assert_eq!(updated.supplier_id, None);
}

#[tokio::test]
async fn malformed_csv_imports_nothing() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());

    // Second record has more fields than the header.
    let csv = "sku,name,category,supplier,unit,vat,cost,price,stock_qty,min_stock,notes\n\
               A-1,Primo,,,,,,,,,\n\
               B-2,Secondo,,,,,,,,,,EXTRA\n";
    let result = products.import_csv(csv.as_bytes()).await;
    assert!(result.is_err());
    assert!(products.get_by_sku("A-1").await.unwrap().is_none());
}
