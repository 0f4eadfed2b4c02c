//! # Seed Data Generator
//!
//! Populates an empty database with a demo store for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/saori.db (default)
//! cargo run -p saori-db --bin seed
//!
//! # Specify database path
//! cargo run -p saori-db --bin seed -- --db ./data/demo.db
//! ```
//!
//! ## Generated Data
//! - Branch "Saori Demo Store CDMX"
//! - `admin@saori.local` / `admin123` (ADMIN), `ventas@saori.local` /
//!   `demo123` (VENDEDOR)
//! - Four product categories and ten products with stock
//! - Customers, a lead in negotiation, expense categories, an expense and
//!   staff positions
//!
//! Refuses to run against a database that already has users.

use std::env;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use saori_core::inputs::{FirstUserRequest, NewCustomer, NewExpense, NewLead, NewProduct, NewUser};
use saori_core::{Actor, Role};
use saori_db::{Database, DbConfig, DbError};
use uuid::Uuid;

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("cat-compu", "Computadoras", "#3b82f6"),
    ("cat-gamer", "Gaming", "#8b5cf6"),
    ("cat-acc", "Accesorios", "#10b981"),
    ("cat-serv", "Servicios", "#f59e0b"),
];

/// (code, name, category, price cents, cost cents, stock)
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("LAP-001", "Laptop Lenovo IdeaPad 5", "cat-compu", 1_499_900, 1_150_000, 8),
    ("LAP-002", "MacBook Air M2", "cat-compu", 2_299_900, 1_900_000, 4),
    ("DES-001", "PC de Escritorio Ryzen 5", "cat-compu", 1_349_900, 1_000_000, 5),
    ("GAM-001", "Tarjeta Gráfica RTX 4060", "cat-gamer", 729_900, 580_000, 6),
    ("GAM-002", "Silla Gamer Ergonómica", "cat-gamer", 449_900, 300_000, 10),
    ("GAM-003", "Teclado Mecánico RGB", "cat-gamer", 129_900, 75_000, 25),
    ("ACC-001", "Mouse Inalámbrico Logitech", "cat-acc", 49_900, 28_000, 40),
    ("ACC-002", "Monitor 27\" 2K", "cat-acc", 549_900, 410_000, 7),
    ("ACC-003", "Hub USB-C 7 en 1", "cat-acc", 79_900, 42_000, 30),
    ("SRV-001", "Instalación de Sistema Operativo", "cat-serv", 59_900, 0, 0),
];

const EXPENSE_CATEGORIES: &[(&str, &str)] = &[("exp-renta", "Renta"), ("exp-serv", "Servicios")];

const POSITIONS: &[(&str, &str)] = &[
    ("pos-gerente", "Gerente de Tienda"),
    ("pos-vendedor", "Vendedor"),
    ("pos-tecnico", "Técnico"),
];

type SeedResult<T> = Result<T, DbError>;

fn hash_password(password: &str) -> SeedResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| DbError::Internal(format!("Failed to build salt: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./data/saori.db".to_string();

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
                println!("Saori Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database path (default: ./data/saori.db)");
                println!("  -h, --help           Show this help");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("❌ Cannot create {}: {e}", parent.display());
                std::process::exit(1);
            }
        }
    }

    println!("🌱 Saori Seed Data Generator");
    println!("   Database: {}", db_path);
    println!();

    if let Err(e) = run(&db_path).await {
        eprintln!("❌ Seeding failed: {e}");
        std::process::exit(1);
    }
}

async fn run(db_path: &str) -> SeedResult<()> {
    let db = Database::new(DbConfig::new(db_path)).await?;

    if !db.setup().requires_setup().await? {
        println!("ℹ️  Database already has users; nothing to seed.");
        return Ok(());
    }

    // Branch + admin
    let admin = db
        .setup()
        .bootstrap(
            &FirstUserRequest {
                name: Some("Administrador".to_string()),
                email: Some("admin@saori.local".to_string()),
                password: None,
                branch_name: Some("Saori Demo Store CDMX".to_string()),
            },
            &hash_password("admin123")?,
        )
        .await?;
    let actor = Actor {
        user_id: admin.id.clone(),
        name: admin.name.clone(),
        email: admin.email.clone(),
        role: Role::Admin,
        branch_id: admin.branch_id.clone(),
    };
    let branch_id = actor.branch()?.to_string();
    println!("✅ Branch and admin created");

    db.users()
        .create(
            &actor,
            &NewUser {
                name: Some("Vendedor Demo".to_string()),
                email: Some("ventas@saori.local".to_string()),
                password: None,
                role: Some(Role::Vendedor.as_str().to_string()),
                branch_id: None,
            },
            &hash_password("demo123")?,
        )
        .await?;
    println!("✅ Seller account created");

    for (id, name, color) in CATEGORIES {
        sqlx::query("INSERT INTO categories (id, name, color) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(color)
            .execute(db.pool())
            .await?;
    }

    for (code, name, category, price, cost, stock) in PRODUCTS {
        let product = db
            .products()
            .create(
                &actor,
                NewProduct {
                    code: Some(code.to_string()),
                    name: Some(name.to_string()),
                    price_cents: Some(*price),
                    cost_cents: Some(*cost),
                    category_id: Some(category.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        if *stock > 0 {
            db.products().add_stock(&product.id, &branch_id, *stock).await?;
        }
    }
    println!("✅ {} products created", PRODUCTS.len());

    for (name, email, rfc) in [
        ("Juan Pérez", "juan.perez@example.com", None),
        ("Tecnología Empresarial SA de CV", "compras@tecemp.mx", Some("TEM010101AB1")),
    ] {
        db.customers()
            .create(
                &actor,
                NewCustomer {
                    name: Some(name.to_string()),
                    email: Some(email.to_string()),
                    rfc: rfc.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;
    }
    println!("✅ Customers created");

    db.leads()
        .create(
            &actor,
            NewLead {
                name: Some("Corporativo Santa Fe".to_string()),
                company: Some("Corporativo Santa Fe".to_string()),
                source: Some("Referido".to_string()),
                status: Some("NEGOTIATION".to_string()),
                estimated_value_cents: Some(15_000_000),
                ..Default::default()
            },
        )
        .await?;
    println!("✅ Lead created");

    for (id, name) in EXPENSE_CATEGORIES {
        sqlx::query("INSERT INTO expense_categories (id, name) VALUES (?1, ?2)")
            .bind(id)
            .bind(name)
            .execute(db.pool())
            .await?;
    }
    db.expenses()
        .create(
            &actor,
            NewExpense {
                amount_cents: Some(1_500_000),
                description: Some("Renta del local".to_string()),
                category_id: Some("exp-renta".to_string()),
                date: None,
            },
        )
        .await?;
    println!("✅ Expenses created");

    for (id, name) in POSITIONS {
        sqlx::query("INSERT INTO positions (id, name, active) VALUES (?1, ?2, 1)")
            .bind(id)
            .bind(name)
            .execute(db.pool())
            .await?;
    }
    println!("✅ Positions created");

    db.close().await;

    println!();
    println!("🎉 Seeding complete!");
    println!("   admin@saori.local / admin123");
    println!("   ventas@saori.local / demo123");
    Ok(())
}
