//! SQL dialects for statement text generation.
//!
//! Statement text is rendered with sea-query so identifier quoting follows the
//! target database. Placeholders are inserted as custom expressions and the
//! query is rendered with `build`, which leaves them untouched. Values are
//! never rendered into the text.
//!
//! - [`PostgresDialect`]: `"schema"."table"`, `$1, $2, ...`
//! - [`MySqlDialect`]: `` `schema`.`table` ``, `?`
//! - [`FormatDialect`]: PostgreSQL quoting with `%s` (psycopg-style drivers)
//!
//! sea-query parenthesizes a custom expression on the right of a comparison,
//! so WHERE placeholders read `"id" = ($1)` while SET and VALUES placeholders
//! stay bare.

use sea_query::{
    Alias, Expr, IntoIden, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryBuilder,
    QueryStatementWriter, SimpleExpr, TableRef,
};

fn sea_table_ref(schema: &str, table: &str) -> TableRef {
    if schema.is_empty() {
        TableRef::Table(Alias::new(table).into_iden())
    } else {
        TableRef::SchemaTable(Alias::new(schema).into_iden(), Alias::new(table).into_iden())
    }
}

/// One condition of an UPDATE or DELETE WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = placeholder`, consumes one parameter
    Eq(String),
    /// `column IS NULL`, no parameter
    IsNull(String),
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq(column) | Predicate::IsNull(column) => column,
        }
    }

    /// Whether this predicate takes a placeholder
    pub fn is_bound(&self) -> bool {
        matches!(self, Predicate::Eq(_))
    }
}

/// SQL dialect for vendor-specific statement text.
///
/// Column lists are taken verbatim and in order; placeholders are numbered
/// left to right starting at 1 across SET and WHERE clauses. `IS NULL`
/// predicates take no number.
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Get the placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// `INSERT INTO schema.table (columns...) VALUES (placeholders...)`
    fn insert_sql(&self, schema: &str, table: &str, columns: &[String]) -> Result<String, String>;

    /// `UPDATE schema.table SET col = p, ... WHERE key = p AND ...`
    fn update_sql(
        &self,
        schema: &str,
        table: &str,
        set_columns: &[String],
        predicates: &[Predicate],
    ) -> String;

    /// `DELETE FROM schema.table WHERE key = p AND ...`
    fn delete_sql(&self, schema: &str, table: &str, predicates: &[Predicate]) -> String;
}

// ---------------------------------------------------------------------------
// Rendering shared by the sea-query backed dialects
// ---------------------------------------------------------------------------

fn render_insert<B: QueryBuilder>(
    builder: B,
    placeholder: impl Fn(usize) -> String,
    schema: &str,
    table: &str,
    columns: &[String],
) -> Result<String, String> {
    let col_idens: Vec<_> = columns
        .iter()
        .map(|c| Alias::new(c.as_str()).into_iden())
        .collect();
    let values: Vec<SimpleExpr> = (1..=columns.len())
        .map(|i| Expr::cust(placeholder(i)))
        .collect();

    let mut stmt = Query::insert();
    stmt.into_table(sea_table_ref(schema, table))
        .columns(col_idens)
        .values(values)
        .map_err(|e| e.to_string())?;

    Ok(stmt.build(builder).0)
}

/// WHERE conditions, numbering bound predicates from `first_index`.
fn predicate_exprs(
    placeholder: &impl Fn(usize) -> String,
    first_index: usize,
    predicates: &[Predicate],
) -> Vec<SimpleExpr> {
    let mut index = first_index;
    predicates
        .iter()
        .map(|predicate| {
            let col = Expr::col(Alias::new(predicate.column()));
            match predicate {
                Predicate::Eq(_) => {
                    let expr = col.eq(Expr::cust(placeholder(index)));
                    index += 1;
                    expr
                }
                Predicate::IsNull(_) => col.is_null(),
            }
        })
        .collect()
}

fn render_update<B: QueryBuilder>(
    builder: B,
    placeholder: impl Fn(usize) -> String,
    schema: &str,
    table: &str,
    set_columns: &[String],
    predicates: &[Predicate],
) -> String {
    let mut stmt = Query::update();
    stmt.table(sea_table_ref(schema, table));

    for (i, col) in set_columns.iter().enumerate() {
        stmt.value(Alias::new(col.as_str()), Expr::cust(placeholder(i + 1)));
    }
    for expr in predicate_exprs(&placeholder, set_columns.len() + 1, predicates) {
        stmt.and_where(expr);
    }

    stmt.build(builder).0
}

fn render_delete<B: QueryBuilder>(
    builder: B,
    placeholder: impl Fn(usize) -> String,
    schema: &str,
    table: &str,
    predicates: &[Predicate],
) -> String {
    let mut stmt = Query::delete();
    stmt.from_table(sea_table_ref(schema, table));
    for expr in predicate_exprs(&placeholder, 1, predicates) {
        stmt.and_where(expr);
    }

    stmt.build(builder).0
}

// ===========================================================================
// PostgreSQL
// ===========================================================================

/// PostgreSQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn insert_sql(&self, schema: &str, table: &str, columns: &[String]) -> Result<String, String> {
        render_insert(PostgresQueryBuilder, |i| self.placeholder(i), schema, table, columns)
    }

    fn update_sql(
        &self,
        schema: &str,
        table: &str,
        set_columns: &[String],
        predicates: &[Predicate],
    ) -> String {
        render_update(
            PostgresQueryBuilder,
            |i| self.placeholder(i),
            schema,
            table,
            set_columns,
            predicates,
        )
    }

    fn delete_sql(&self, schema: &str, table: &str, predicates: &[Predicate]) -> String {
        render_delete(PostgresQueryBuilder, |i| self.placeholder(i), schema, table, predicates)
    }
}

// ===========================================================================
// MySQL
// ===========================================================================

/// MySQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_sql(&self, schema: &str, table: &str, columns: &[String]) -> Result<String, String> {
        render_insert(MysqlQueryBuilder, |i| self.placeholder(i), schema, table, columns)
    }

    fn update_sql(
        &self,
        schema: &str,
        table: &str,
        set_columns: &[String],
        predicates: &[Predicate],
    ) -> String {
        render_update(
            MysqlQueryBuilder,
            |i| self.placeholder(i),
            schema,
            table,
            set_columns,
            predicates,
        )
    }

    fn delete_sql(&self, schema: &str, table: &str, predicates: &[Predicate]) -> String {
        render_delete(MysqlQueryBuilder, |i| self.placeholder(i), schema, table, predicates)
    }
}

// ===========================================================================
// PostgreSQL quoting with format-style placeholders
// ===========================================================================

/// PostgreSQL identifiers with `%s` placeholders, for drivers that bind
/// parameters with Python-style format markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDialect;

impl SqlDialect for FormatDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL (format placeholders)"
    }

    fn placeholder(&self, _index: usize) -> String {
        "%s".to_string()
    }

    fn insert_sql(&self, schema: &str, table: &str, columns: &[String]) -> Result<String, String> {
        render_insert(PostgresQueryBuilder, |i| self.placeholder(i), schema, table, columns)
    }

    fn update_sql(
        &self,
        schema: &str,
        table: &str,
        set_columns: &[String],
        predicates: &[Predicate],
    ) -> String {
        render_update(
            PostgresQueryBuilder,
            |i| self.placeholder(i),
            schema,
            table,
            set_columns,
            predicates,
        )
    }

    fn delete_sql(&self, schema: &str, table: &str, predicates: &[Predicate]) -> String {
        render_delete(PostgresQueryBuilder, |i| self.placeholder(i), schema, table, predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn eq(names: &[&str]) -> Vec<Predicate> {
        names.iter().map(|s| Predicate::Eq(s.to_string())).collect()
    }

    #[test]
    fn test_postgres_placeholders() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(12), "$12");
    }

    #[test]
    fn test_postgres_insert_sql() {
        let sql = PostgresDialect
            .insert_sql("public", "users", &cols(&["id", "name"]))
            .unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "public"."users" ("id", "name") VALUES ($1, $2)"#
        );
    }

    #[test]
    fn test_postgres_delete_sql() {
        let sql = PostgresDialect.delete_sql("public", "users", &eq(&["id"]));
        assert_eq!(sql, r#"DELETE FROM "public"."users" WHERE "id" = ($1)"#);
    }

    #[test]
    fn test_postgres_update_sql_numbers_across_clauses() {
        let sql = PostgresDialect.update_sql(
            "public",
            "users",
            &cols(&["name", "age"]),
            &eq(&["tenant", "id"]),
        );
        assert_eq!(
            sql,
            r#"UPDATE "public"."users" SET "name" = $1, "age" = $2 WHERE "tenant" = ($3) AND "id" = ($4)"#
        );
    }

    #[test]
    fn test_is_null_predicates_take_no_placeholder() {
        let predicates = vec![
            Predicate::Eq("id".to_string()),
            Predicate::IsNull("note".to_string()),
            Predicate::Eq("rev".to_string()),
        ];

        let sql = PostgresDialect.delete_sql("public", "notes", &predicates);
        assert_eq!(
            sql,
            r#"DELETE FROM "public"."notes" WHERE "id" = ($1) AND "note" IS NULL AND "rev" = ($2)"#
        );

        let sql = PostgresDialect.update_sql("public", "notes", &cols(&["body"]), &predicates);
        assert_eq!(
            sql,
            r#"UPDATE "public"."notes" SET "body" = $1 WHERE "id" = ($2) AND "note" IS NULL AND "rev" = ($3)"#
        );
    }

    #[test]
    fn test_mysql_quoting_and_placeholders() {
        let sql = MySqlDialect.delete_sql("shop", "orders", &eq(&["order_id", "line"]));
        assert!(sql.starts_with("DELETE FROM `shop`.`orders` WHERE"));
        assert_eq!(sql.matches('?').count(), 2);
        assert!(!sql.contains('$'));
    }

    #[test]
    fn test_format_placeholders() {
        let sql = FormatDialect.update_sql("public", "users", &cols(&["name"]), &eq(&["id"]));
        assert_eq!(
            sql,
            r#"UPDATE "public"."users" SET "name" = %s WHERE "id" = (%s)"#
        );
    }

    #[test]
    fn test_schema_may_be_empty() {
        let sql = PostgresDialect.delete_sql("", "users", &eq(&["id"]));
        assert_eq!(sql, r#"DELETE FROM "users" WHERE "id" = ($1)"#);
    }
}
