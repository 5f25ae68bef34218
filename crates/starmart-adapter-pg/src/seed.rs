//! Schema bootstrap and sample-data generation.
//!
//! The seeder creates the star-schema tables from the registry's DDL
//! and fills them with plausible random data: a customer and product
//! dimension, a full-year date spine, and a sales fact table whose
//! amounts satisfy quantity * unit_price - discount + tax.

use crate::{StoreError, WarehouseAdapter};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::QueryBuilder;
use starmart_core::config::SeedConfig;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Carla", "Diego", "Elena", "Felix", "Greta", "Hugo", "Ines", "Jonas", "Kira",
    "Liam", "Mona", "Nadia", "Oscar", "Priya", "Quentin", "Rosa", "Sofia", "Tobias",
];

const LAST_NAMES: &[&str] = &[
    "Alvarez", "Becker", "Chen", "Dubois", "Eriksen", "Fischer", "Garcia", "Hansen", "Ito",
    "Johansson", "Kowalski", "Larsen", "Moreau", "Novak", "Okafor", "Petrov", "Quinn", "Rossi",
    "Silva", "Tanaka",
];

const CITIES: &[(&str, &str, &str)] = &[
    ("New York", "NY", "USA"),
    ("Los Angeles", "CA", "USA"),
    ("Chicago", "IL", "USA"),
    ("Houston", "TX", "USA"),
    ("Toronto", "ON", "Canada"),
    ("Vancouver", "BC", "Canada"),
    ("London", "England", "UK"),
    ("Manchester", "England", "UK"),
    ("Berlin", "Berlin", "Germany"),
    ("Munich", "Bavaria", "Germany"),
];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Electronics", &["Phones", "Laptops", "Audio", "Wearables"]),
    ("Clothing", &["Shirts", "Pants", "Shoes", "Jackets"]),
    ("Home", &["Kitchen", "Furniture", "Decor", "Garden"]),
    ("Sports", &["Fitness", "Outdoor", "Team Sports", "Cycling"]),
    ("Books", &["Fiction", "Non-fiction", "Technical", "Comics"]),
];

const BRANDS: &[&str] = &[
    "Acme", "Borealis", "Cascade", "Deltaforge", "Everline", "Fjord", "Granite", "Horizon",
    "Ironwood", "Juniper",
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Classic", "Premium", "Compact", "Deluxe", "Essential", "Pro", "Ultra", "Eco", "Smart",
    "Sturdy",
];

impl WarehouseAdapter {
    /// Create the star-schema tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in self.registry().list_tables() {
            sqlx::query(&table.ddl()).execute(self.pool()).await?;
        }
        Ok(())
    }

    /// Wipe and regenerate all sample data.
    pub async fn seed(&self, config: &SeedConfig) -> Result<SeedReport, StoreError> {
        self.ensure_schema().await?;

        sqlx::query("TRUNCATE fact_sales, dim_customer, dim_product, dim_date")
            .execute(self.pool())
            .await?;

        // StdRng rather than the thread-local rng: the seed future is
        // held across await points and must stay Send.
        let mut rng = StdRng::from_os_rng();

        let customers = self.seed_customers(&mut rng, config.customers).await?;
        let product_prices = self.seed_products(&mut rng, config.products).await?;
        let date_ids = self.seed_dates(config.year).await?;
        let sales = self
            .seed_sales(&mut rng, config.sales, customers, &product_prices, &date_ids)
            .await?;

        tracing::info!(
            customers,
            products = product_prices.len(),
            dates = date_ids.len(),
            sales,
            "sample data seeded"
        );

        Ok(SeedReport {
            customers,
            products: product_prices.len() as u32,
            dates: date_ids.len() as u32,
            sales,
        })
    }

    async fn seed_customers(&self, rng: &mut impl Rng, count: u32) -> Result<u32, StoreError> {
        if count == 0 {
            return Ok(0);
        }
        let now = chrono::Utc::now();
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO dim_customer \
             (customer_id, customer_name, email, phone, city, state, country, created_at) ",
        );
        let rows: Vec<_> = (1..=count as i32)
            .map(|id| {
                let first = pick(rng, FIRST_NAMES);
                let last = pick(rng, LAST_NAMES);
                let (city, state, country) = *pick(rng, CITIES);
                let name = format!("{first} {last}");
                let email = format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), id);
                let phone = format!("+1-555-{:04}", rng.random_range(0..10_000));
                (id, name, email, phone, city, state, country)
            })
            .collect();
        builder.push_values(rows, |mut b, (id, name, email, phone, city, state, country)| {
            b.push_bind(id)
                .push_bind(name)
                .push_bind(email)
                .push_bind(phone)
                .push_bind(city)
                .push_bind(state)
                .push_bind(country)
                .push_bind(now);
        });
        builder.build().execute(self.pool()).await?;
        Ok(count)
    }

    /// Returns (product_id, unit_price) pairs for use by the fact seeder.
    async fn seed_products(
        &self,
        rng: &mut impl Rng,
        count: u32,
    ) -> Result<Vec<(i32, f64)>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let now = chrono::Utc::now();
        let mut prices = Vec::with_capacity(count as usize);
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO dim_product \
             (product_id, product_name, category, subcategory, brand, unit_price, created_at) ",
        );
        let rows: Vec<_> = (1..=count as i32)
            .map(|id| {
                let (category, subcategories) = *pick(rng, CATEGORIES);
                let subcategory = *pick(rng, subcategories);
                let brand = *pick(rng, BRANDS);
                let adjective = *pick(rng, PRODUCT_ADJECTIVES);
                let name = format!("{brand} {adjective} {subcategory} {id}");
                let unit_price = (rng.random_range(500..50_000) as f64) / 100.0;
                prices.push((id, unit_price));
                (id, name, category, subcategory, brand, unit_price)
            })
            .collect();
        builder.push_values(
            rows,
            |mut b, (id, name, category, subcategory, brand, unit_price)| {
                b.push_bind(id)
                    .push_bind(name)
                    .push_bind(category)
                    .push_bind(subcategory)
                    .push_bind(brand)
                    .push_bind(unit_price)
                    .push_bind(now);
            },
        );
        builder.build().execute(self.pool()).await?;
        Ok(prices)
    }

    /// Build the date spine for one calendar year. Returns the date_ids.
    async fn seed_dates(&self, year: i32) -> Result<Vec<i32>, StoreError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
            StoreError::InvalidPayload(format!("invalid seed year {year}"))
        })?;

        let mut date_ids = Vec::with_capacity(366);
        let mut rows = Vec::with_capacity(366);
        let mut date = start;
        while date.year() == year {
            let date_id = date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32;
            let weekday = date.weekday();
            let is_weekend = matches!(weekday, Weekday::Sat | Weekday::Sun) as i32;
            rows.push((
                date_id,
                date,
                date.year(),
                (date.month0() / 3 + 1) as i32,
                date.month() as i32,
                date.format("%B").to_string(),
                date.iso_week().week() as i32,
                date.day() as i32,
                date.format("%A").to_string(),
                is_weekend,
            ));
            date_ids.push(date_id);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO dim_date \
             (date_id, date, year, quarter, month, month_name, week, day, day_name, is_weekend) ",
        );
        builder.push_values(
            rows,
            |mut b, (date_id, date, year, quarter, month, month_name, week, day, day_name, is_weekend)| {
                b.push_bind(date_id)
                    .push_bind(date)
                    .push_bind(year)
                    .push_bind(quarter)
                    .push_bind(month)
                    .push_bind(month_name)
                    .push_bind(week)
                    .push_bind(day)
                    .push_bind(day_name)
                    .push_bind(is_weekend);
            },
        );
        builder.build().execute(self.pool()).await?;
        Ok(date_ids)
    }

    async fn seed_sales(
        &self,
        rng: &mut impl Rng,
        count: u32,
        customer_count: u32,
        product_prices: &[(i32, f64)],
        date_ids: &[i32],
    ) -> Result<u32, StoreError> {
        if count == 0 || customer_count == 0 || product_prices.is_empty() || date_ids.is_empty() {
            return Ok(0);
        }
        let now = chrono::Utc::now();
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO fact_sales \
             (sale_id, customer_id, product_id, date_id, quantity, unit_price, total_amount, \
              discount_amount, tax_amount, created_at) ",
        );
        let rows: Vec<_> = (1..=count as i32)
            .map(|id| {
                let customer_id = rng.random_range(1..=customer_count as i32);
                let (product_id, unit_price) = *pick(rng, product_prices);
                let date_id = *pick(rng, date_ids);
                let quantity = rng.random_range(1..=5_i32);
                let subtotal = quantity as f64 * unit_price;
                let discount = round2(subtotal * rng.random_range(0.0..0.15));
                let tax = round2((subtotal - discount) * 0.08);
                let total = round2(subtotal - discount + tax);
                (
                    id, customer_id, product_id, date_id, quantity, unit_price, total, discount,
                    tax,
                )
            })
            .collect();
        builder.push_values(
            rows,
            |mut b,
             (id, customer_id, product_id, date_id, quantity, unit_price, total, discount, tax)| {
                b.push_bind(id)
                    .push_bind(customer_id)
                    .push_bind(product_id)
                    .push_bind(date_id)
                    .push_bind(quantity)
                    .push_bind(unit_price)
                    .push_bind(total)
                    .push_bind(discount)
                    .push_bind(tax)
                    .push_bind(now);
            },
        );
        builder.build().execute(self.pool()).await?;
        Ok(count)
    }
}

/// What the seeder produced, reported back to the caller.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SeedReport {
    pub customers: u32,
    pub products: u32,
    pub dates: u32,
    pub sales: u32,
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use starmart_core::schema::SchemaRegistry;
    use std::sync::Arc;

    // Compile-time check: the seed future must be spawnable from a
    // multi-threaded runtime, e.g. as an axum handler.
    #[tokio::test]
    async fn seed_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/starmart_test")
            .expect("lazy pool");
        let adapter = WarehouseAdapter::from_pool(pool, Arc::new(SchemaRegistry::star_schema()));
        let config = SeedConfig::default();
        let fut = adapter.seed(&config);
        assert_send(&fut);
    }

    #[test]
    fn round2_truncates_to_cents() {
        assert_eq!(round2(10.006), 10.01);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(99.999), 100.0);
    }

    #[test]
    fn date_spine_math_matches_calendar() {
        // The id encoding and quarter arithmetic used by seed_dates.
        let date = NaiveDate::from_ymd_opt(2023, 7, 9).unwrap();
        let date_id = date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32;
        assert_eq!(date_id, 20230709);
        assert_eq!((date.month0() / 3 + 1) as i32, 3);
        assert!(matches!(date.weekday(), Weekday::Sun));
    }
}
