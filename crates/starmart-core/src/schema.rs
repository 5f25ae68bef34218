//! Schema registry for the star-schema warehouse.
//!
//! The registry is the single source of truth for which tables and
//! columns are reachable through the validated query path. It is built
//! once at startup from the known warehouse layout and never refreshed
//! without a process restart; any table not listed here is simply not
//! reachable through the guarded surface.

use serde::{Deserialize, Serialize};

/// Declared column type, used for documentation/introspection and for
/// choosing bind types in the adapter. Value-level type checking is the
/// database's job, not the registry's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    BigInt,
    Float,
    Text,
    Date,
    Timestamp,
    Boolean,
}

impl ColumnType {
    /// The Postgres type name used in generated DDL.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Float => "double precision",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamptz",
            ColumnType::Boolean => "boolean",
        }
    }
}

/// A single column in a registered table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnDef {
    fn new(name: &str, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable,
            primary_key: false,
        }
    }

    fn pk(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: false,
            primary_key: true,
        }
    }
}

/// A registered table: name plus its ordered column list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key column. Every warehouse table has exactly one.
    pub fn primary_key(&self) -> &ColumnDef {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .unwrap_or(&self.columns[0])
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Generate `CREATE TABLE IF NOT EXISTS` DDL for this table.
    pub fn ddl(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut part = format!("{} {}", c.name, c.column_type.sql_type());
                if c.primary_key {
                    part.push_str(" PRIMARY KEY");
                } else if !c.nullable {
                    part.push_str(" NOT NULL");
                }
                part
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            cols.join(", ")
        )
    }
}

/// Immutable registry of the tables reachable through the guarded path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistry {
    tables: Vec<TableDef>,
}

impl SchemaRegistry {
    /// Build the registry for the demonstration star schema:
    /// three dimensions plus one fact table.
    pub fn star_schema() -> Self {
        Self {
            tables: vec![
                dim_customer(),
                dim_product(),
                dim_date(),
                fact_sales(),
            ],
        }
    }

    /// All registered tables, in declaration order.
    pub fn list_tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Look up a table by name (case-insensitive, as SQL identifiers are).
    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Whether a table name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get_table(name).is_some()
    }

    /// Registered table names.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

fn dim_customer() -> TableDef {
    TableDef {
        name: "dim_customer".to_string(),
        columns: vec![
            ColumnDef::pk("customer_id", ColumnType::Integer),
            ColumnDef::new("customer_name", ColumnType::Text, false),
            ColumnDef::new("email", ColumnType::Text, false),
            ColumnDef::new("phone", ColumnType::Text, true),
            ColumnDef::new("city", ColumnType::Text, true),
            ColumnDef::new("state", ColumnType::Text, true),
            ColumnDef::new("country", ColumnType::Text, true),
            ColumnDef::new("created_at", ColumnType::Timestamp, true),
        ],
    }
}

fn dim_product() -> TableDef {
    TableDef {
        name: "dim_product".to_string(),
        columns: vec![
            ColumnDef::pk("product_id", ColumnType::Integer),
            ColumnDef::new("product_name", ColumnType::Text, false),
            ColumnDef::new("category", ColumnType::Text, true),
            ColumnDef::new("subcategory", ColumnType::Text, true),
            ColumnDef::new("brand", ColumnType::Text, true),
            ColumnDef::new("unit_price", ColumnType::Float, false),
            ColumnDef::new("created_at", ColumnType::Timestamp, true),
        ],
    }
}

fn dim_date() -> TableDef {
    TableDef {
        name: "dim_date".to_string(),
        columns: vec![
            ColumnDef::pk("date_id", ColumnType::Integer),
            ColumnDef::new("date", ColumnType::Date, false),
            ColumnDef::new("year", ColumnType::Integer, false),
            ColumnDef::new("quarter", ColumnType::Integer, false),
            ColumnDef::new("month", ColumnType::Integer, false),
            ColumnDef::new("month_name", ColumnType::Text, false),
            ColumnDef::new("week", ColumnType::Integer, false),
            ColumnDef::new("day", ColumnType::Integer, false),
            ColumnDef::new("day_name", ColumnType::Text, false),
            ColumnDef::new("is_weekend", ColumnType::Integer, true),
        ],
    }
}

fn fact_sales() -> TableDef {
    TableDef {
        name: "fact_sales".to_string(),
        columns: vec![
            ColumnDef::pk("sale_id", ColumnType::Integer),
            ColumnDef::new("customer_id", ColumnType::Integer, false),
            ColumnDef::new("product_id", ColumnType::Integer, false),
            ColumnDef::new("date_id", ColumnType::Integer, false),
            ColumnDef::new("quantity", ColumnType::Integer, false),
            ColumnDef::new("unit_price", ColumnType::Float, false),
            ColumnDef::new("total_amount", ColumnType::Float, false),
            ColumnDef::new("discount_amount", ColumnType::Float, true),
            ColumnDef::new("tax_amount", ColumnType::Float, true),
            ColumnDef::new("created_at", ColumnType::Timestamp, true),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_all_four_tables() {
        let registry = SchemaRegistry::star_schema();
        assert_eq!(
            registry.table_names(),
            vec!["dim_customer", "dim_product", "dim_date", "fact_sales"]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = SchemaRegistry::star_schema();
        assert!(registry.contains("DIM_CUSTOMER"));
        assert!(registry.contains("Fact_Sales"));
        assert!(!registry.contains("secret_table"));
    }

    #[test]
    fn fact_table_references_all_dimensions() {
        let registry = SchemaRegistry::star_schema();
        let fact = registry.get_table("fact_sales").unwrap();
        for key in ["customer_id", "product_id", "date_id"] {
            assert!(fact.column(key).is_some(), "missing {key}");
        }
        assert_eq!(fact.primary_key().name, "sale_id");
    }

    #[test]
    fn ddl_marks_primary_key_and_not_null() {
        let registry = SchemaRegistry::star_schema();
        let ddl = registry.get_table("dim_product").unwrap().ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS dim_product"));
        assert!(ddl.contains("product_id integer PRIMARY KEY"));
        assert!(ddl.contains("unit_price double precision NOT NULL"));
        assert!(ddl.contains("brand text,"));
    }
}
