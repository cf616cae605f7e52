//! # Seed Data Generator
//!
//! Populates a tenant with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the "demo" tenant in ./innkeep_dev.db
//! cargo run -p innkeep-db --bin seed
//!
//! # Another tenant, more rooms per category
//! cargo run -p innkeep-db --bin seed -- --tenant grand-hotel --rooms 8
//!
//! # Specify database path
//! cargo run -p innkeep-db --bin seed -- --db ./data/innkeep.db
//! ```
//!
//! ## Generated Data
//! - A profile in Karnataka
//! - Room categories with tariffs and GST, and rooms numbered per floor
//! - Inventory categories and items with an opening purchase each
//! - A small menu and four dining tables

use std::env;

use anyhow::Context;
use chrono::Utc;
use innkeep_core::{
    DiningTableInput, InventoryCategoryInput, InventoryItemInput, MenuItemInput, Money,
    NewStockMovement, ProfileUpdate, RoomCategoryInput, RoomInput, StockDirection, TaxRate,
};
use innkeep_db::{Database, DbConfig};

/// Room categories: name, tariff in rupees, GST in basis points.
const ROOM_CATEGORIES: &[(&str, i64, u32)] = &[
    ("Standard", 900, 0),
    ("Deluxe", 1800, 1200),
    ("Suite", 4500, 1800),
];

/// Inventory categories and their items: name, unit, opening stock, unit price.
const INVENTORY: &[(&str, &[(&str, &str, i64, i64)])] = &[
    (
        "Housekeeping",
        &[
            ("Bath Towel", "pcs", 120, 250),
            ("Bed Sheet", "pcs", 80, 600),
            ("Soap Bar", "pcs", 500, 15),
            ("Shampoo Sachet", "pcs", 600, 3),
            ("Toilet Roll", "pcs", 300, 20),
        ],
    ),
    (
        "Kitchen",
        &[
            ("Basmati Rice", "kg", 50, 110),
            ("Toor Dal", "kg", 25, 140),
            ("Sunflower Oil", "ltr", 30, 160),
            ("Milk", "ltr", 40, 54),
            ("Coffee Powder", "kg", 5, 700),
        ],
    ),
    (
        "Minibar",
        &[
            ("Mineral Water", "btl", 200, 20),
            ("Soft Drink", "can", 96, 35),
            ("Salted Peanuts", "pkt", 60, 25),
        ],
    ),
];

/// Menu: name, category, price in rupees, GST in basis points.
const MENU: &[(&str, &str, i64, u32)] = &[
    ("Masala Dosa", "South Indian", 90, 500),
    ("Idli Vada", "South Indian", 70, 500),
    ("Veg Biryani", "Mains", 220, 500),
    ("Paneer Butter Masala", "Mains", 260, 500),
    ("Butter Naan", "Breads", 45, 500),
    ("Filter Coffee", "Beverages", 40, 500),
    ("Fresh Lime Soda", "Beverages", 60, 500),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut tenant = String::from("demo");
    let mut rooms_per_category: usize = 4;
    let mut db_path = String::from("./innkeep_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant = args[i + 1].clone();
                    i += 1;
                }
            }
            "--rooms" | "-r" => {
                if i + 1 < args.len() {
                    rooms_per_category = args[i + 1].parse().unwrap_or(4);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Innkeep Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tenant <NAME>  Tenant to seed (default: demo)");
                println!("  -r, --rooms <N>      Rooms per category (default: 4)");
                println!("  -d, --db <PATH>      Database file path (default: ./innkeep_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Innkeep Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", tenant);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.rooms().list(&tenant).await?.len();
    if existing > 0 {
        println!("⚠ Tenant already has {} rooms", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    db.profiles()
        .upsert(
            &format!("seed-{tenant}"),
            &tenant,
            ProfileUpdate {
                hotel_name: "Innkeep Demo Residency".into(),
                state: "Karnataka".into(),
                gstin: None,
                address: Some("MG Road, Bengaluru".into()),
            },
        )
        .await
        .context("creating profile")?;
    println!("✓ Profile created");

    let mut rooms = 0;
    for (floor, (name, tariff, gst_bps)) in ROOM_CATEGORIES.iter().enumerate() {
        let category = db
            .rooms()
            .create_category(
                &tenant,
                RoomCategoryInput {
                    name: name.to_string(),
                    tariff: Money::from_rupees(*tariff),
                    gst_rate: TaxRate::from_bps(*gst_bps),
                },
            )
            .await
            .with_context(|| format!("creating room category {name}"))?;

        for n in 1..=rooms_per_category {
            let floor_no = floor + 1;
            db.rooms()
                .create(
                    &tenant,
                    RoomInput {
                        number: format!("{}{:02}", floor_no, n),
                        floor: Some(floor_no.to_string()),
                        category_id: category.id.clone(),
                        clean: None,
                        version: None,
                    },
                )
                .await?;
            rooms += 1;
        }
    }
    println!("✓ {} rooms in {} categories", rooms, ROOM_CATEGORIES.len());

    let today = Utc::now().date_naive();
    let mut items = 0;
    for (category_name, category_items) in INVENTORY {
        let category = db
            .inventory()
            .create_category(
                &tenant,
                InventoryCategoryInput {
                    name: category_name.to_string(),
                },
            )
            .await?;

        for (name, unit, opening, price) in category_items.iter() {
            let item = db
                .inventory()
                .create_item(
                    &tenant,
                    InventoryItemInput {
                        category_id: category.id.clone(),
                        name: name.to_string(),
                        quantity_unit: unit.to_string(),
                        tax_rate: TaxRate::zero(),
                    },
                )
                .await?;

            db.inventory()
                .record_movement(
                    &tenant,
                    NewStockMovement {
                        item_id: item.id,
                        direction: StockDirection::Purchase,
                        quantity: *opening,
                        unit_price: Money::from_rupees(*price),
                        invoice_no: Some("OPENING".into()),
                        party: None,
                        occurred_on: today,
                    },
                )
                .await?;
            items += 1;
        }
    }
    println!("✓ {} inventory items with opening stock", items);

    for (name, category, price, gst_bps) in MENU {
        db.restaurant()
            .create_menu_item(
                &tenant,
                MenuItemInput {
                    name: name.to_string(),
                    category: Some(category.to_string()),
                    price: Money::from_rupees(*price),
                    gst_rate: TaxRate::from_bps(*gst_bps),
                    is_active: None,
                },
            )
            .await?;
    }

    for n in 1..=4 {
        db.restaurant()
            .create_table(
                &tenant,
                DiningTableInput {
                    number: format!("T{n}"),
                    capacity: if n % 2 == 0 { 2 } else { 4 },
                    status: None,
                },
            )
            .await?;
    }
    println!("✓ {} menu items, 4 tables", MENU.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    db.close().await;
    Ok(())
}
