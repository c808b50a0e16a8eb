mod common;

use chrono::{Duration, Local};
use magazzino_api::{
    reports::{csv::expiring_csv, pdf::price_list_pdf},
    services::{
        lots::LotData, price_lists::PriceListData, products::ProductData, LotService,
        PriceListService, ProductService, ReportService,
    },
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn expiring_report_filters_and_orders_by_date() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let lots = LotService::new(db.clone());
    let reports = ReportService::new(db.clone());

    let p = products
        .create(ProductData {
            sku: "LATTE-1".to_string(),
            name: "Latte".to_string(),
            unit: "litri".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let today = Local::now().date_naive();
    // Inside the 30-day window, in reverse order of expiry.
    lots.add_lot(
        p.id,
        LotData {
            lot_code: "TARDI".to_string(),
            expiry_date: Some(today + Duration::days(20)),
            qty: 5,
            notes: None,
        },
    )
    .await
    .unwrap();
    lots.add_lot(
        p.id,
        LotData {
            lot_code: "PRESTO".to_string(),
            expiry_date: Some(today + Duration::days(3)),
            qty: 2,
            notes: None,
        },
    )
    .await
    .unwrap();
    // Outside the window.
    lots.add_lot(
        p.id,
        LotData {
            lot_code: "LONTANO".to_string(),
            expiry_date: Some(today + Duration::days(90)),
            qty: 1,
            notes: None,
        },
    )
    .await
    .unwrap();
    // No expiry date: never in the report.
    lots.add_lot(
        p.id,
        LotData {
            lot_code: "SENZA".to_string(),
            expiry_date: None,
            qty: 1,
            notes: None,
        },
    )
    .await
    .unwrap();

    let rows = reports.expiring_lots(30, None, None).await.unwrap();
    let codes: Vec<&str> = rows.iter().map(|r| r.lot_code.as_str()).collect();
    assert_eq!(codes, vec!["PRESTO", "TARDI"]);

    // The dashboard counter matches the report rows.
    let summary = reports.dashboard().await.unwrap();
    assert_eq!(summary.expiring, 2);

    // The CSV export renders the same rows in the same order.
    let csv = expiring_csv(&rows).unwrap();
    let text = String::from_utf8(csv).unwrap();
    let presto = text.find("PRESTO").unwrap();
    let tardi = text.find("TARDI").unwrap();
    assert!(presto < tardi);
    assert!(!text.contains("LONTANO"));
    assert!(!text.contains("SENZA"));

    // Category filter with no matching products yields nothing.
    let filtered = reports
        .expiring_lots(30, Some("Surgelati"), None)
        .await
        .unwrap();
    assert!(filtered.is_empty());
}

#[tokio::test]
async fn price_list_exports_share_rows_with_the_detail_view() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let price_lists = PriceListService::new(db.clone());

    let a = products
        .create(ProductData {
            sku: "B-1".to_string(),
            name: "Zucchero".to_string(),
            unit: "kg".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();
    let b = products
        .create(ProductData {
            sku: "A-1".to_string(),
            name: "acqua".to_string(),
            unit: "litri".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();

    let list = price_lists
        .create(PriceListData {
            name: "Listino B2B".to_string(),
            channel: "B2B".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    price_lists
        .upsert_item(list.id, a.id, Some(dec!(1.10)))
        .await
        .unwrap();
    price_lists
        .upsert_item(list.id, b.id, Some(dec!(0.50)))
        .await
        .unwrap();

    let (list, rows) = price_lists.export_rows(list.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    // CSV rows follow insertion order.
    assert_eq!(rows[0].sku, "B-1");
    assert_eq!(rows[1].sku, "A-1");

    let pdf = price_list_pdf(&list, &rows).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn upsert_item_updates_and_clears() {
    let db = common::test_db().await;
    let products = ProductService::new(db.clone());
    let price_lists = PriceListService::new(db.clone());

    let p = products
        .create(ProductData {
            sku: "S-1".to_string(),
            name: "Sale".to_string(),
            unit: "kg".to_string(),
            ..ProductData::default()
        })
        .await
        .unwrap();
    let list = price_lists
        .create(PriceListData {
            name: "Listino".to_string(),
            channel: "Generale".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        })
        .await
        .unwrap();

    price_lists
        .upsert_item(list.id, p.id, Some(dec!(1.00)))
        .await
        .unwrap();
    price_lists
        .upsert_item(list.id, p.id, Some(dec!(1.25)))
        .await
        .unwrap();

    let items = price_lists.items_for_list(list.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, dec!(1.25));

    price_lists.upsert_item(list.id, p.id, None).await.unwrap();
    assert!(price_lists
        .items_for_list(list.id)
        .await
        .unwrap()
        .is_empty());

    // Clearing an absent item is a no-op.
    price_lists.upsert_item(list.id, p.id, None).await.unwrap();
}

#[tokio::test]
async fn ensure_default_creates_base_list_once() {
    let db = common::test_db().await;
    let price_lists = PriceListService::new(db.clone());

    price_lists.ensure_default().await.unwrap();
    price_lists.ensure_default().await.unwrap();

    let lists = price_lists.list(None).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Listino Base");
    assert_eq!(lists[0].channel, "Generale");
    assert_eq!(lists[0].currency, "EUR");
}
