//! Seed the catalog with markets and products from a YAML file.
//!
//! ```yaml
//! markets:
//!   - name: Corner Bakery
//!     location: 12 Mill Lane
//!     products:
//!       - name: Sourdough
//!         category: bakery
//!         price: 1200
//!         available: true
//! ```
//!
//! Everything is inserted in one transaction: an invalid entry leaves the
//! database untouched.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;

use bazaar_api::models::market::CreateMarketRequest;
use bazaar_api::models::product::CreateProductRequest;
use bazaar_core::MarketId;

use super::connect;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub markets: Vec<SeedMarket>,
}

/// A market and the products it sells.
#[derive(Debug, Deserialize)]
pub struct SeedMarket {
    #[serde(flatten)]
    pub market: CreateMarketRequest,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub available: bool,
}

impl SeedProduct {
    fn into_request(self, market_id: MarketId) -> CreateProductRequest {
        CreateProductRequest {
            market_id,
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            discount: self.discount,
            available: self.available,
        }
    }
}

/// Parse and validate a seed file without touching the database.
///
/// # Errors
///
/// Returns an error naming the first invalid market or product.
pub fn parse(content: &str) -> Result<SeedFile, Box<dyn std::error::Error>> {
    let seed: SeedFile = serde_yaml::from_str(content)?;

    for (i, entry) in seed.markets.iter().enumerate() {
        entry
            .market
            .validate()
            .map_err(|e| format!("markets[{i}]: {e}"))?;

        for (j, product) in entry.products.iter().enumerate() {
            // The real market id is only known after insert.
            product
                .clone()
                .into_request(MarketId::new(0))
                .validate()
                .map_err(|e| format!("markets[{i}].products[{j}]: {e}"))?;
        }
    }

    Ok(seed)
}

/// Seed markets and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry is
/// invalid, or a database operation fails.
pub async fn markets(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    tracing::info!(path = %file_path.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(file_path).await?;
    let seed = parse(&content)?;
    tracing::info!(markets = seed.markets.len(), "Seed file validated");

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut product_count = 0usize;
    for entry in seed.markets {
        let market_id = insert_market(&mut tx, &entry.market).await?;

        for product in entry.products {
            let req = product.into_request(market_id);
            insert_product(&mut tx, &req).await?;
            product_count += 1;
        }
        tracing::info!(market_id = %market_id, name = %entry.market.name, "Seeded market");
    }

    tx.commit().await?;

    tracing::info!(products = product_count, "Seeding complete");
    Ok(())
}

async fn insert_market(
    conn: &mut PgConnection,
    market: &CreateMarketRequest,
) -> Result<MarketId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO bazaar.markets (name, description, location)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(market.name.trim())
    .bind(&market.description)
    .bind(&market.location)
    .fetch_one(conn)
    .await
}

async fn insert_product(
    conn: &mut PgConnection,
    product: &CreateProductRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO bazaar.products
            (market_id, name, description, category, price, discount, available)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(product.market_id)
    .bind(product.name.trim())
    .bind(&product.description)
    .bind(product.category.trim())
    .bind(product.price)
    .bind(product.discount)
    .bind(product.available)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
markets:
  - name: Corner Bakery
    location: 12 Mill Lane
    products:
      - name: Sourdough
        category: bakery
        price: 1200
        available: true
      - name: Rye
        category: bakery
        price: 900
  - name: Fish Hall
";

    #[test]
    fn test_parse_sample() {
        let seed = parse(SAMPLE).unwrap();
        assert_eq!(seed.markets.len(), 2);
        assert_eq!(seed.markets[0].market.name, "Corner Bakery");
        assert_eq!(seed.markets[0].market.description, "");
        assert_eq!(seed.markets[0].products.len(), 2);
        assert!(seed.markets[0].products[0].available);
        assert!(!seed.markets[0].products[1].available);
        assert!(seed.markets[1].products.is_empty());
    }

    #[test]
    fn test_rejects_blank_market_name() {
        let err = parse("markets:\n  - name: '  '\n").unwrap_err();
        assert!(err.to_string().starts_with("markets[0]:"));
    }

    #[test]
    fn test_rejects_negative_price() {
        let yaml = "markets:\n  - name: A\n    products:\n      - {name: B, category: c, price: -1}\n";
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("products[0]"));
    }

    #[test]
    fn test_product_request_carries_market() {
        let seed = parse(SAMPLE).unwrap();
        let product = seed.markets.into_iter().next().unwrap().products.remove(0);
        let req = product.into_request(MarketId::new(4));
        assert_eq!(req.market_id, MarketId::new(4));
        assert!(req.validate().is_ok());
    }
}
