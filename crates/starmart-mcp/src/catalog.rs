//! Tool catalog generation.
//!
//! Tools are generated from the schema registry plus a static list of
//! analytics and analysis operations, mirroring the HTTP surface. Any
//! operation tagged administrative (currently only sample-data seeding)
//! never becomes a tool.

use crate::protocol::{ToolAnnotations, ToolDefinition};
use serde_json::{Value, json};
use starmart_core::schema::{ColumnType, SchemaRegistry, TableDef};

/// What a tool invocation maps onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListEntities { table: String },
    GetEntity { table: String },
    CreateEntity { table: String },
    UpdateEntity { table: String },
    DeleteEntity { table: String },
    SalesByCategory,
    SalesByMonth,
    TopCustomers,
    TopProducts,
    WeekendVsWeekday,
    SalesSummary,
    RunSql,
    ListTables,
    UniqueValues,
    CountByField,
    SummarizeNumericField,
    FilterRows,
    /// Administrative; present in the catalog for the HTTP layer but
    /// never exposed as a tool.
    Seed,
}

/// One catalog entry: a tool definition plus its dispatch target.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub definition: ToolDefinition,
    pub operation: Operation,
    pub admin: bool,
}

/// The full operation catalog for a registry snapshot.
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    /// Generate the catalog: CRUD per registry table (the date spine is
    /// read-only), the fixed aggregations, introspection, ad-hoc SQL,
    /// and the row-set analysis helpers.
    pub fn generate(registry: &SchemaRegistry) -> Self {
        let mut entries = Vec::new();

        for table in registry.list_tables() {
            entries.extend(entity_tools(table));
        }
        entries.extend(analytics_tools());
        entries.extend(sql_tools(registry));
        entries.extend(analysis_tools());
        entries.push(CatalogEntry {
            definition: tool(
                "seed_sample_data",
                "Wipe and regenerate the warehouse sample data",
                json!({"type": "object", "properties": {}}),
                false,
            ),
            operation: Operation::Seed,
            admin: true,
        });

        Self { entries }
    }

    /// Tool definitions for `tools/list`; administrative operations are
    /// excluded.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .filter(|e| !e.admin)
            .map(|e| e.definition.clone())
            .collect()
    }

    /// Resolve a callable (non-administrative) tool by name.
    pub fn resolve(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| !e.admin && e.definition.name == name)
    }
}

/// Strip the dimensional prefix and singularize: `dim_customer` ->
/// `customer`, `fact_sales` -> `sale`.
fn entity_name(table: &str) -> String {
    let base = table
        .strip_prefix("dim_")
        .or_else(|| table.strip_prefix("fact_"))
        .unwrap_or(table);
    base.strip_suffix('s').unwrap_or(base).to_string()
}

fn plural(entity: &str) -> String {
    format!("{entity}s")
}

/// The date spine is generated data; it is exposed read-only.
fn is_read_only(table: &TableDef) -> bool {
    table.name == "dim_date"
}

fn entity_tools(table: &TableDef) -> Vec<CatalogEntry> {
    let entity = entity_name(&table.name);
    let id_field = &table.primary_key().name;
    let mut entries = vec![
        CatalogEntry {
            definition: tool(
                &format!("list_{}", plural(&entity)),
                &format!("List rows from {} with pagination", table.name),
                json!({
                    "type": "object",
                    "properties": {
                        "skip": {"type": "integer", "minimum": 0},
                        "limit": {"type": "integer", "minimum": 1},
                    }
                }),
                true,
            ),
            operation: Operation::ListEntities {
                table: table.name.clone(),
            },
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                &format!("get_{entity}"),
                &format!("Fetch one row from {} by {id_field}", table.name),
                json!({
                    "type": "object",
                    "properties": {"id": {"type": "integer"}},
                    "required": ["id"],
                }),
                true,
            ),
            operation: Operation::GetEntity {
                table: table.name.clone(),
            },
            admin: false,
        },
    ];

    if is_read_only(table) {
        return entries;
    }

    let writable = writable_properties(table);
    entries.push(CatalogEntry {
        definition: tool(
            &format!("create_{entity}"),
            &format!("Insert a row into {}; the id is assigned", table.name),
            json!({"type": "object", "properties": writable.clone()}),
            false,
        ),
        operation: Operation::CreateEntity {
            table: table.name.clone(),
        },
        admin: false,
    });
    entries.push(CatalogEntry {
        definition: tool(
            &format!("update_{entity}"),
            &format!("Partially update one row of {} by {id_field}", table.name),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "patch": {"type": "object", "properties": writable},
                },
                "required": ["id", "patch"],
            }),
            false,
        ),
        operation: Operation::UpdateEntity {
            table: table.name.clone(),
        },
        admin: false,
    });
    entries.push(CatalogEntry {
        definition: tool(
            &format!("delete_{entity}"),
            &format!("Delete one row of {} by {id_field}", table.name),
            json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"],
            }),
            false,
        ),
        operation: Operation::DeleteEntity {
            table: table.name.clone(),
        },
        admin: false,
    });
    entries
}

fn writable_properties(table: &TableDef) -> Value {
    let mut properties = serde_json::Map::new();
    for column in &table.columns {
        if column.primary_key {
            continue;
        }
        properties.insert(
            column.name.clone(),
            json!({"type": json_schema_type(column.column_type)}),
        );
    }
    Value::Object(properties)
}

fn json_schema_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer | ColumnType::BigInt => "integer",
        ColumnType::Float => "number",
        ColumnType::Boolean => "boolean",
        ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => "string",
    }
}

fn analytics_tools() -> Vec<CatalogEntry> {
    let no_args = json!({"type": "object", "properties": {}});
    let limit_arg = json!({
        "type": "object",
        "properties": {"limit": {"type": "integer", "minimum": 1}},
    });
    vec![
        CatalogEntry {
            definition: tool(
                "sales_by_category",
                "Sales performance per product category",
                no_args.clone(),
                true,
            ),
            operation: Operation::SalesByCategory,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "sales_by_month",
                "Monthly sales performance for a year",
                json!({
                    "type": "object",
                    "properties": {"year": {"type": "integer"}},
                }),
                true,
            ),
            operation: Operation::SalesByMonth,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "top_customers",
                "Top customers by total sales",
                limit_arg.clone(),
                true,
            ),
            operation: Operation::TopCustomers,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "top_products",
                "Top products by total sales",
                limit_arg,
                true,
            ),
            operation: Operation::TopProducts,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "weekend_vs_weekday_sales",
                "Compare weekend and weekday sales performance",
                no_args.clone(),
                true,
            ),
            operation: Operation::WeekendVsWeekday,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "sales_summary",
                "Overall sales summary statistics",
                no_args,
                true,
            ),
            operation: Operation::SalesSummary,
            admin: false,
        },
    ]
}

fn sql_tools(registry: &SchemaRegistry) -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            definition: tool(
                "query_warehouse",
                &format!(
                    "Run a read-only SELECT against the warehouse. Accessible tables: {}. \
                     At most 1000 rows are returned.",
                    registry.table_names().join(", ")
                ),
                json!({
                    "type": "object",
                    "properties": {
                        "sql": {"type": "string"},
                        "limit": {"type": "integer", "minimum": 1, "maximum": 1000},
                    },
                    "required": ["sql"],
                }),
                true,
            ),
            operation: Operation::RunSql,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "list_warehouse_tables",
                "Describe the accessible tables and their columns",
                json!({"type": "object", "properties": {}}),
                true,
            ),
            operation: Operation::ListTables,
            admin: false,
        },
    ]
}

fn analysis_tools() -> Vec<CatalogEntry> {
    let rows_and_field = json!({
        "type": "object",
        "properties": {
            "rows": {"type": "array", "items": {"type": "object"}},
            "field": {"type": "string"},
        },
        "required": ["rows", "field"],
    });
    vec![
        CatalogEntry {
            definition: tool(
                "unique_values",
                "Distinct non-null values of a field across fetched rows",
                rows_and_field.clone(),
                true,
            ),
            operation: Operation::UniqueValues,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "count_by_field",
                "Occurrence counts of a field's values, most common first",
                json!({
                    "type": "object",
                    "properties": {
                        "rows": {"type": "array", "items": {"type": "object"}},
                        "field": {"type": "string"},
                        "limit": {"type": "integer", "minimum": 1},
                    },
                    "required": ["rows", "field"],
                }),
                true,
            ),
            operation: Operation::CountByField,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "summarize_numeric_field",
                "Min/max/mean/median/sum/std-dev of a numeric field",
                rows_and_field,
                true,
            ),
            operation: Operation::SummarizeNumericField,
            admin: false,
        },
        CatalogEntry {
            definition: tool(
                "filter_rows",
                "Keep only rows whose fields equal every filter value",
                json!({
                    "type": "object",
                    "properties": {
                        "rows": {"type": "array", "items": {"type": "object"}},
                        "filters": {"type": "object"},
                    },
                    "required": ["rows", "filters"],
                }),
                true,
            ),
            operation: Operation::FilterRows,
            admin: false,
        },
    ]
}

fn tool(name: &str, description: &str, input_schema: Value, read_only: bool) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
        annotations: Some(ToolAnnotations {
            read_only: Some(read_only),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolCatalog {
        ToolCatalog::generate(&SchemaRegistry::star_schema())
    }

    #[test]
    fn entity_names_strip_prefixes_and_plural() {
        assert_eq!(entity_name("dim_customer"), "customer");
        assert_eq!(entity_name("dim_date"), "date");
        assert_eq!(entity_name("fact_sales"), "sale");
    }

    #[test]
    fn administrative_operations_are_not_listed() {
        let tools = catalog().tools();
        assert!(tools.iter().all(|t| t.name != "seed_sample_data"));
        assert!(catalog().resolve("seed_sample_data").is_none());
    }

    #[test]
    fn date_spine_has_no_mutating_tools() {
        let c = catalog();
        assert!(c.resolve("list_dates").is_some());
        assert!(c.resolve("get_date").is_some());
        assert!(c.resolve("create_date").is_none());
        assert!(c.resolve("update_date").is_none());
        assert!(c.resolve("delete_date").is_none());
    }

    #[test]
    fn customers_get_full_crud_tools() {
        let c = catalog();
        for name in [
            "list_customers",
            "get_customer",
            "create_customer",
            "update_customer",
            "delete_customer",
        ] {
            assert!(c.resolve(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn mutating_tools_are_not_marked_read_only() {
        let c = catalog();
        let create = c.resolve("create_product").unwrap();
        assert_eq!(
            create.definition.annotations.as_ref().unwrap().read_only,
            Some(false)
        );
        let query = c.resolve("query_warehouse").unwrap();
        assert_eq!(
            query.definition.annotations.as_ref().unwrap().read_only,
            Some(true)
        );
    }

    #[test]
    fn create_schema_excludes_the_primary_key() {
        let c = catalog();
        let create = c.resolve("create_customer").unwrap();
        let properties = &create.definition.input_schema["properties"];
        assert!(properties.get("customer_id").is_none());
        assert!(properties.get("customer_name").is_some());
    }
}
