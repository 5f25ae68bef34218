//! Fixed aggregation queries over the star schema.
//!
//! These are hand-written parameterized aggregates; they do not pass
//! through the guard because their text never contains user input.

use crate::{StoreError, WarehouseAdapter};
use serde::Serialize;
use sqlx::Row;

/// Sales totals for one product category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: f64,
    pub total_quantity: i64,
    pub average_order_value: f64,
}

/// Sales totals for one month of a year.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: i32,
    pub month_name: String,
    pub total_sales: f64,
    pub total_orders: i64,
    pub total_quantity: i64,
}

/// One customer's aggregate sales.
#[derive(Debug, Clone, Serialize)]
pub struct TopCustomer {
    pub customer_id: i32,
    pub customer_name: String,
    pub total_sales: f64,
    pub total_orders: i64,
}

/// One product's aggregate sales.
#[derive(Debug, Clone, Serialize)]
pub struct TopProduct {
    pub product_id: i32,
    pub product_name: String,
    pub category: String,
    pub total_sales: f64,
    pub total_quantity: i64,
}

/// Weekend or weekday aggregate performance.
#[derive(Debug, Clone, Serialize)]
pub struct DayPeriodSales {
    pub period: String,
    pub total_sales: f64,
    pub total_orders: i64,
    pub average_order_value: f64,
}

/// Overall warehouse summary.
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub total_orders: i64,
    pub total_quantity: i64,
    pub average_order_value: f64,
    pub total_customers: i64,
    pub total_products: i64,
    pub best_selling_category: Option<CategorySales>,
}

impl WarehouseAdapter {
    /// Sales performance per product category, descending by total.
    pub async fn sales_by_category(&self) -> Result<Vec<CategorySales>, StoreError> {
        let rows = sqlx::query(
            "SELECT p.category, \
                    SUM(f.total_amount) AS total_sales, \
                    SUM(f.quantity)::bigint AS total_quantity, \
                    AVG(f.total_amount) AS average_order_value \
             FROM fact_sales f \
             JOIN dim_product p ON f.product_id = p.product_id \
             GROUP BY p.category \
             ORDER BY total_sales DESC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CategorySales {
                    category: row
                        .try_get::<Option<String>, _>("category")?
                        .unwrap_or_else(|| "uncategorized".to_string()),
                    total_sales: row.try_get("total_sales")?,
                    total_quantity: row.try_get("total_quantity")?,
                    average_order_value: row.try_get("average_order_value")?,
                })
            })
            .collect()
    }

    /// Monthly sales performance for one calendar year.
    pub async fn sales_by_month(&self, year: i32) -> Result<Vec<MonthlySales>, StoreError> {
        let rows = sqlx::query(
            "SELECT d.year, d.month, d.month_name, \
                    SUM(f.total_amount) AS total_sales, \
                    COUNT(f.sale_id) AS total_orders, \
                    SUM(f.quantity)::bigint AS total_quantity \
             FROM fact_sales f \
             JOIN dim_date d ON f.date_id = d.date_id \
             WHERE d.year = $1 \
             GROUP BY d.year, d.month, d.month_name \
             ORDER BY d.month",
        )
        .bind(year)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MonthlySales {
                    year: row.try_get("year")?,
                    month: row.try_get("month")?,
                    month_name: row.try_get("month_name")?,
                    total_sales: row.try_get("total_sales")?,
                    total_orders: row.try_get("total_orders")?,
                    total_quantity: row.try_get("total_quantity")?,
                })
            })
            .collect()
    }

    /// Top customers by total sales.
    pub async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomer>, StoreError> {
        let rows = sqlx::query(
            "SELECT c.customer_id, c.customer_name, \
                    SUM(f.total_amount) AS total_sales, \
                    COUNT(f.sale_id) AS total_orders \
             FROM fact_sales f \
             JOIN dim_customer c ON f.customer_id = c.customer_id \
             GROUP BY c.customer_id, c.customer_name \
             ORDER BY total_sales DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TopCustomer {
                    customer_id: row.try_get("customer_id")?,
                    customer_name: row.try_get("customer_name")?,
                    total_sales: row.try_get("total_sales")?,
                    total_orders: row.try_get("total_orders")?,
                })
            })
            .collect()
    }

    /// Top products by total sales.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, StoreError> {
        let rows = sqlx::query(
            "SELECT p.product_id, p.product_name, p.category, \
                    SUM(f.total_amount) AS total_sales, \
                    SUM(f.quantity)::bigint AS total_quantity \
             FROM fact_sales f \
             JOIN dim_product p ON f.product_id = p.product_id \
             GROUP BY p.product_id, p.product_name, p.category \
             ORDER BY total_sales DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TopProduct {
                    product_id: row.try_get("product_id")?,
                    product_name: row.try_get("product_name")?,
                    category: row
                        .try_get::<Option<String>, _>("category")?
                        .unwrap_or_else(|| "uncategorized".to_string()),
                    total_sales: row.try_get("total_sales")?,
                    total_quantity: row.try_get("total_quantity")?,
                })
            })
            .collect()
    }

    /// Weekend vs. weekday sales comparison.
    pub async fn weekend_vs_weekday(&self) -> Result<Vec<DayPeriodSales>, StoreError> {
        let rows = sqlx::query(
            "SELECT d.is_weekend, \
                    SUM(f.total_amount) AS total_sales, \
                    COUNT(f.sale_id) AS total_orders, \
                    AVG(f.total_amount) AS average_order_value \
             FROM fact_sales f \
             JOIN dim_date d ON f.date_id = d.date_id \
             GROUP BY d.is_weekend \
             ORDER BY d.is_weekend",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let is_weekend: i32 = row.try_get("is_weekend")?;
                Ok(DayPeriodSales {
                    period: if is_weekend == 1 { "Weekend" } else { "Weekday" }.to_string(),
                    total_sales: row.try_get("total_sales")?,
                    total_orders: row.try_get("total_orders")?,
                    average_order_value: row.try_get("average_order_value")?,
                })
            })
            .collect()
    }

    /// Overall totals, averages, entity counts, and the best category.
    pub async fn sales_summary(&self) -> Result<SalesSummary, StoreError> {
        let totals = sqlx::query(
            "SELECT COALESCE(SUM(f.total_amount), 0) AS total_sales, \
                    COUNT(f.sale_id) AS total_orders, \
                    COALESCE(SUM(f.quantity), 0)::bigint AS total_quantity, \
                    COALESCE(AVG(f.total_amount), 0) AS average_order_value \
             FROM fact_sales f",
        )
        .fetch_one(self.pool())
        .await?;

        let counts = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM dim_customer) AS total_customers, \
                    (SELECT COUNT(*) FROM dim_product) AS total_products",
        )
        .fetch_one(self.pool())
        .await?;

        let best_selling_category = self.sales_by_category().await?.into_iter().next();

        Ok(SalesSummary {
            total_sales: totals.try_get("total_sales")?,
            total_orders: totals.try_get("total_orders")?,
            total_quantity: totals.try_get("total_quantity")?,
            average_order_value: totals.try_get("average_order_value")?,
            total_customers: counts.try_get("total_customers")?,
            total_products: counts.try_get("total_products")?,
            best_selling_category,
        })
    }
}
