//! End-to-end workflows across repositories. Most run against an in-memory
//! database; the concurrency checks use a pooled file-backed store.

use atelier_core::{
    BillStatus, CoreError, ErrorKind, Markup, Money, PartnerProfile, PartnerType, PaymentMode,
    PriceField, Product, StockStatus, Vendor,
};
use atelier_db::{
    Database, DbConfig, DbError, NewPartner, NewProduct, NewPurchaseBill, NewPurchaseItem,
};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn vendor(db: &Database) -> Vendor {
    db.catalog()
        .create_vendor("Comptoir Lyonnais", None, None)
        .await
        .unwrap()
}

async fn product(db: &Database, name: &str, cost: i64) -> Product {
    db.products()
        .create(NewProduct {
            name: name.to_string(),
            cost_price: Money::from_cents(cost),
            ..Default::default()
        })
        .await
        .unwrap()
}

fn item(product: &Product, quantity: i64, cost: i64) -> NewPurchaseItem {
    NewPurchaseItem {
        product_id: product.id.clone(),
        quantity,
        cost_price: Money::from_cents(cost),
    }
}

fn bill(vendor: &Vendor, number: &str, items: Vec<NewPurchaseItem>) -> NewPurchaseBill {
    NewPurchaseBill {
        vendor_id: vendor.id.clone(),
        bill_number: number.to_string(),
        items,
        ..Default::default()
    }
}

// =============================================================================
// Stock reconciliation
// =============================================================================

#[tokio::test]
async fn reconcile_follows_live_bills() {
    let db = setup().await;
    let vendor = vendor(&db).await;
    let tote = product(&db, "Tote", 10_000).await;
    let scarf = product(&db, "Scarf", 4_000).await;
    let unused = product(&db, "Belt", 6_000).await;

    let first = db
        .purchases()
        .create_bill(bill(&vendor, "INV-1", vec![item(&tote, 3, 10_000), item(&scarf, 5, 4_000)]))
        .await
        .unwrap();
    db.purchases()
        .create_bill(NewPurchaseBill {
            shipping_charges: Money::from_cents(2_400),
            ..bill(&vendor, "INV-2", vec![item(&tote, 2, 12_000)])
        })
        .await
        .unwrap();

    let summary = db.products().reconcile_stock().await.unwrap();
    assert_eq!(summary.contributing_bill_count, 2);
    assert_eq!(summary.updated_product_count, 2);

    let tote_now = db.products().get(&tote.id).await.unwrap();
    assert_eq!(tote_now.stock_quantity, 5);
    assert_eq!(tote_now.status, StockStatus::InStock);
    // Latest bill wins: 12_000 plus 2_400 shipping over 2 units
    assert_eq!(tote_now.cost_price_cents, 13_200);

    let belt_now = db.products().get(&unused.id).await.unwrap();
    assert_eq!(belt_now.stock_quantity, 0);
    assert_eq!(belt_now.status, StockStatus::OutOfStock);
    assert_eq!(belt_now.cost_price_cents, 6_000);

    // Running it again changes nothing
    let again = db.products().reconcile_stock().await.unwrap();
    assert_eq!(again, summary);
    assert_eq!(db.products().get(&tote.id).await.unwrap().stock_quantity, 5);

    // Cancelling a bill removes its contribution on the next run
    let cancelled = db.purchases().cancel_bill(&first.bill.id).await.unwrap();
    assert_eq!(cancelled.status, BillStatus::Cancelled);

    let summary = db.products().reconcile_stock().await.unwrap();
    assert_eq!(summary.contributing_bill_count, 1);
    assert_eq!(summary.updated_product_count, 1);

    assert_eq!(db.products().get(&tote.id).await.unwrap().stock_quantity, 2);
    let scarf_now = db.products().get(&scarf.id).await.unwrap();
    assert_eq!(scarf_now.stock_quantity, 0);
    assert_eq!(scarf_now.status, StockStatus::OutOfStock);
    assert_eq!(scarf_now.cost_price_cents, 4_000);
}

#[tokio::test]
async fn reconcile_on_empty_store() {
    let db = setup().await;
    let summary = db.products().reconcile_stock().await.unwrap();
    assert_eq!(summary.contributing_bill_count, 0);
    assert_eq!(summary.updated_product_count, 0);
}

// =============================================================================
// Pricing
// =============================================================================

#[tokio::test]
async fn bulk_price_is_all_or_nothing() {
    let db = setup().await;
    let a = product(&db, "Tote", 10_000).await;
    let b = product(&db, "Scarf", 500).await;

    let summary = db
        .products()
        .bulk_apply_price(Markup::parse("percentage", "12.5").unwrap(), PriceField::Retail)
        .await
        .unwrap();
    assert_eq!(summary.updated_count, 2);
    assert_eq!(db.products().get(&a.id).await.unwrap().retail_price_cents, 11_250);

    // 500 - 1000 < 0 on the scarf: nothing is written
    let err = db
        .products()
        .bulk_apply_price(Markup::parse("fixed", "-10").unwrap(), PriceField::Retail)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(db.products().get(&a.id).await.unwrap().retail_price_cents, 11_250);
    assert_eq!(db.products().get(&b.id).await.unwrap().retail_price_cents, 562);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn concurrent_full_payments_settle_once() {
    let db = setup().await;
    let vendor = vendor(&db).await;
    let tote = product(&db, "Tote", 10_000).await;

    let detail = db
        .purchases()
        .create_bill(bill(&vendor, "INV-9", vec![item(&tote, 1, 10_000)]))
        .await
        .unwrap();
    let bill_id = detail.bill.id.clone();

    let left = db.purchases();
    let right = db.purchases();
    let (a, b) = tokio::join!(
        left.record_payment(&bill_id, Money::from_cents(10_000), PaymentMode::Cash, None),
        right.record_payment(&bill_id, Money::from_cents(10_000), PaymentMode::Upi, None),
    );

    let outcomes = [a, b];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    let failure = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(failure.kind(), ErrorKind::InvalidInput);
    assert!(matches!(
        failure,
        DbError::Domain(CoreError::PaymentExceedsBalance { .. })
    ));

    let settled = db.purchases().get_bill(&bill_id).await.unwrap();
    assert_eq!(settled.bill.status, BillStatus::Paid);
    assert_eq!(settled.bill.balance_amount_cents, 0);
    assert_eq!(settled.payments.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_store_full_payments_settle_once_per_bill() {
    const BILLS: usize = 20;
    const PAYERS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("atelier.db")).max_connections(5))
        .await
        .unwrap();
    let vendor = vendor(&db).await;
    let tote = product(&db, "Tote", 10_000).await;

    let mut bill_ids = Vec::with_capacity(BILLS);
    for n in 0..BILLS {
        let detail = db
            .purchases()
            .create_bill(bill(&vendor, &format!("INV-P{}", n), vec![item(&tote, 1, 10_000)]))
            .await
            .unwrap();
        bill_ids.push(detail.bill.id);
    }

    let mut handles = Vec::with_capacity(BILLS * PAYERS);
    for bill_id in &bill_ids {
        for _ in 0..PAYERS {
            let db = db.clone();
            let bill_id = bill_id.clone();
            handles.push(tokio::spawn(async move {
                db.purchases()
                    .record_payment(&bill_id, Money::from_cents(10_000), PaymentMode::BankTransfer, None)
                    .await
            }));
        }
    }

    let mut settled = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => settled += 1,
            Err(DbError::Domain(CoreError::PaymentExceedsBalance { balance })) => {
                assert_eq!(balance, Money::zero());
                refused += 1;
            }
            Err(other) => panic!("payment failed outside the ledger rules: {}", other),
        }
    }
    assert_eq!(settled, BILLS);
    assert_eq!(refused, BILLS * (PAYERS - 1));

    for bill_id in &bill_ids {
        let detail = db.purchases().get_bill(bill_id).await.unwrap();
        assert_eq!(detail.bill.status, BillStatus::Paid);
        assert_eq!(detail.bill.paid_amount_cents, 10_000);
        assert_eq!(detail.payments.len(), 1);
    }

    db.close().await;
}

#[tokio::test]
async fn payments_against_cancelled_bill_are_refused() {
    let db = setup().await;
    let vendor = vendor(&db).await;
    let tote = product(&db, "Tote", 10_000).await;

    let detail = db
        .purchases()
        .create_bill(bill(&vendor, "INV-3", vec![item(&tote, 1, 10_000)]))
        .await
        .unwrap();
    db.purchases().cancel_bill(&detail.bill.id).await.unwrap();

    let err = db
        .purchases()
        .record_payment(&detail.bill.id, Money::from_cents(100), PaymentMode::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::BillCancelled(_))));

    let err = db.purchases().cancel_bill(&detail.bill.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// =============================================================================
// Partner onboarding and storefront
// =============================================================================

#[tokio::test]
async fn reseller_onboarding_to_storefront() {
    let db = setup().await;
    let tote = product(&db, "Tote", 10_000).await;
    db.products()
        .apply_price(&tote.id, Markup::parse("fixed", "50").unwrap(), PriceField::Reseller)
        .await
        .unwrap();

    let partners = db.partners();
    let username = partners
        .suggest_username(PartnerType::Reseller, "Claire@maison.example")
        .await
        .unwrap();
    assert_eq!(username, "claire");

    let account = partners
        .register(NewPartner {
            profile: PartnerProfile::Reseller {
                store_name: "Maison Claire".to_string(),
            },
            username,
            email: "claire@maison.example".to_string(),
            phone: None,
            password: "s3cret-pass".to_string(),
        })
        .await
        .unwrap();

    let err = partners
        .authenticate(PartnerType::Reseller, "claire", "s3cret-pass")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PendingApproval);

    let err = db.reseller_store().storefront(&account.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    partners.approve(PartnerType::Reseller, &account.id).await.unwrap();
    let identity = partners
        .authenticate(PartnerType::Reseller, "claire", "s3cret-pass")
        .await
        .unwrap();
    assert_eq!(identity.display_name, "Maison Claire");

    db.reseller_store()
        .import_product(&account.id, &tote.id, None)
        .await
        .unwrap();
    let front = db.reseller_store().storefront(&account.id).await.unwrap();
    assert_eq!(front.len(), 1);
    assert_eq!(front[0].price_cents, 15_000);

    let pending = partners.list_pending(None).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn rejected_partner_cannot_log_in() {
    let db = setup().await;
    let partners = db.partners();
    let account = partners
        .register(NewPartner {
            profile: PartnerProfile::Retailer {
                shop_name: "Boutique Sud".to_string(),
                city: Some("Marseille".to_string()),
            },
            username: "boutique_sud".to_string(),
            email: "hello@boutique.example".to_string(),
            phone: None,
            password: "marseille13".to_string(),
        })
        .await
        .unwrap();

    partners.reject(PartnerType::Retailer, &account.id).await.unwrap();

    let err = partners
        .authenticate(PartnerType::Retailer, "boutique_sud", "marseille13")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
}
