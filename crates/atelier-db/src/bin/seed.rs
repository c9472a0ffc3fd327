//! # Seed Data Generator
//!
//! Populates a development database with a small luxury catalog, a few
//! purchase bills and one approved reseller storefront.
//!
//! ## Usage
//! ```bash
//! # Seed ./atelier_dev.db
//! cargo run -p atelier-db --bin seed
//!
//! # Specify database path
//! cargo run -p atelier-db --bin seed -- --db ./data/atelier.db
//! ```
//!
//! ## Generated Data
//! - Brands, categories and EU sizes
//! - Two vendors
//! - One product per (brand, model) with a cost price
//! - Purchase bills with shipping/box expenses, one partially paid
//! - Stock reconciled from the bills
//! - Wholesale/reseller/retail prices from percentage markups
//! - Reseller `maison_demo` (password `demo-password`) with an imported store

use std::env;

use atelier_core::{Markup, Money, PartnerProfile, PartnerType, PaymentMode, PriceField};
use atelier_db::{Database, DbConfig, NewPartner, NewProduct, NewPurchaseBill, NewPurchaseItem};

/// (brand, category, [(model, cost in cents)])
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Maison Vell",
        "Handbags",
        &[("Tote Classique", 42_000), ("Mini Pochette", 18_500), ("Sac Seau", 36_000)],
    ),
    (
        "Orsini",
        "Shoes",
        &[("Derby Lisse", 21_000), ("Mocassin Velours", 24_500)],
    ),
    (
        "Atelier Rhône",
        "Scarves",
        &[("Carré Soie 90", 9_800), ("Étole Cachemire", 15_200)],
    ),
];

const SIZES: &[&str] = &["EU 38", "EU 39", "EU 40", "EU 41", "EU 42"];

/// (price field, percentage markup)
const MARKUPS: &[(PriceField, &str)] = &[
    (PriceField::Wholesale, "25"),
    (PriceField::Reseller, "40"),
    (PriceField::Retail, "80"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./atelier_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Atelier Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./atelier_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Atelier Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Reference data
    let catalog = db.catalog();
    for (position, label) in SIZES.iter().enumerate() {
        catalog.create_size(label, position as i64).await?;
    }
    let accessories = catalog.create_category("Accessories", None).await?;

    let vendor_a = catalog
        .create_vendor("Comptoir Lyonnais", Some("orders@comptoir.example"), Some("+33478000000"))
        .await?;
    let vendor_b = catalog.create_vendor("Fratelli Import", None, None).await?;
    println!("✓ Sizes, categories and vendors created");

    // Products
    let mut products = Vec::new();
    for (brand_name, category_name, models) in CATALOG {
        let brand = catalog.create_brand(brand_name).await?;
        let category = catalog
            .create_category(category_name, Some(&accessories.id))
            .await?;

        for (model, cost) in models.iter() {
            let product = db
                .products()
                .create(NewProduct {
                    name: format!("{} {}", brand_name, model),
                    brand_id: Some(brand.id.clone()),
                    category_id: Some(category.id.clone()),
                    size_id: None,
                    cost_price: Money::from_cents(*cost),
                })
                .await?;
            products.push((product, *cost));
        }
    }
    println!("✓ Generated {} products", products.len());

    // Purchase bills: even products from vendor A, odd from vendor B
    let mut bill_ids = Vec::new();
    for (vendor, parity) in [(&vendor_a, 0), (&vendor_b, 1)] {
        let items: Vec<NewPurchaseItem> = products
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx % 2 == parity)
            .map(|(idx, (product, cost))| NewPurchaseItem {
                product_id: product.id.clone(),
                quantity: 2 + (idx as i64 % 4),
                cost_price: Money::from_cents(*cost),
            })
            .collect();

        let detail = db
            .purchases()
            .create_bill(NewPurchaseBill {
                vendor_id: vendor.id.clone(),
                bill_number: format!("{}-0001", vendor.slug.to_uppercase()),
                items,
                shipping_charges: Money::from_cents(4_500),
                miscellaneous: Money::from_cents(1_200),
                original_box: Money::from_cents(3_000),
                notes: Some("Seed data".to_string()),
            })
            .await?;

        println!(
            "  Bill {} total {}",
            detail.bill.bill_number,
            detail.bill.charges().total_with_expenses().format_with("€")
        );
        bill_ids.push(detail.bill.id);
    }

    if let Some(first) = bill_ids.first() {
        let record = db
            .purchases()
            .record_payment(first, Money::from_cents(50_000), PaymentMode::BankTransfer, None)
            .await?;
        println!(
            "  Partial payment recorded, balance {}",
            record.bill.balance().format_with("€")
        );
    }

    let summary = db.products().reconcile_stock().await?;
    println!(
        "✓ Stock reconciled: {} products from {} bills",
        summary.updated_product_count, summary.contributing_bill_count
    );

    for (field, percent) in MARKUPS {
        let markup = Markup::parse("percentage", percent)?;
        let result = db.products().bulk_apply_price(markup, *field).await?;
        println!("  {} prices set on {} products", field.as_str(), result.updated_count);
    }

    // Demo reseller
    let partners = db.partners();
    let reseller = partners
        .register(NewPartner {
            profile: PartnerProfile::Reseller {
                store_name: "Maison Demo".to_string(),
            },
            username: "maison_demo".to_string(),
            email: "demo@maison.example".to_string(),
            phone: None,
            password: "demo-password".to_string(),
        })
        .await?;
    partners.approve(PartnerType::Reseller, &reseller.id).await?;

    for (product, _) in products.iter().take(4) {
        db.reseller_store()
            .import_product(&reseller.id, &product.id, None)
            .await?;
    }
    let storefront = db.reseller_store().storefront(&reseller.id).await?;
    println!("✓ Reseller storefront with {} products", storefront.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
