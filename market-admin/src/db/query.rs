//! Query builder for list endpoints with sparse filters
//!
//! Conditions are SQL fragments with numbered Postgres placeholders; values
//! are collected separately and bound in order, so no caller input ever
//! becomes SQL text. Column names and sort clauses come from fixed tables in
//! the accessors.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use shared::pagination::Page;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Int(i32),
    Bool(bool),
    Timestamp(NaiveDateTime),
    IntList(Vec<i32>),
}

/// Dynamic WHERE builder
#[derive(Debug, Default)]
pub struct QueryBuilder {
    conditions: Vec<String>,
    bindings: Vec<QueryValue>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_placeholder(&self) -> String {
        format!("${}", self.bindings.len() + 1)
    }

    /// Add a condition that needs no bindings (join predicates, interval bounds)
    pub fn add_condition(&mut self, condition: &str) -> &mut Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// Hide soft-deleted rows of `alias`.
    pub fn live(&mut self, alias: &str) -> &mut Self {
        self.conditions.push(live(alias));
        self
    }

    fn push(&mut self, column: &str, op: &str, value: QueryValue) -> &mut Self {
        let condition = format!("{column} {op} {}", self.next_placeholder());
        self.conditions.push(condition);
        self.bindings.push(value);
        self
    }

    pub fn eq_i64(&mut self, column: &str, value: i64) -> &mut Self {
        self.push(column, "=", QueryValue::Integer(value))
    }

    pub fn eq_i32(&mut self, column: &str, value: i32) -> &mut Self {
        self.push(column, "=", QueryValue::Int(value))
    }

    pub fn eq_bool(&mut self, column: &str, value: bool) -> &mut Self {
        self.push(column, "=", QueryValue::Bool(value))
    }

    pub fn eq_text(&mut self, column: &str, value: &str) -> &mut Self {
        self.push(column, "=", QueryValue::Text(value.to_string()))
    }

    /// Substring match (`ILIKE '%value%'`); `%` and `_` in the input are escaped.
    pub fn contains(&mut self, column: &str, value: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(value));
        self.push(column, "ILIKE", QueryValue::Text(pattern))
    }

    /// Prefix match (`LIKE 'value%'`)
    pub fn starts_with(&mut self, column: &str, value: &str) -> &mut Self {
        let pattern = format!("{}%", escape_like(value));
        self.push(column, "LIKE", QueryValue::Text(pattern))
    }

    /// `column = ANY($n)`; an empty list contributes no predicate.
    pub fn any_i32(&mut self, column: &str, values: Vec<i32>) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        let condition = format!("{column} = ANY({})", self.next_placeholder());
        self.conditions.push(condition);
        self.bindings.push(QueryValue::IntList(values));
        self
    }

    /// Inclusive calendar-day range: `column >= from 00:00` and `column < to + 1 day`.
    pub fn date_range(
        &mut self,
        column: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> &mut Self {
        if let Some(from) = from {
            self.push(column, ">=", QueryValue::Timestamp(from.and_time(Default::default())));
        }
        if let Some(to) = to {
            let end = (to + Duration::days(1)).and_time(Default::default());
            self.push(column, "<", QueryValue::Timestamp(end));
        }
        self
    }

    /// Build WHERE clause (empty if no conditions)
    pub fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// `LIMIT $n OFFSET $n+1`, numbered after the filter bindings.
    /// Bind the values with [`QueryBuilder::apply_page`].
    pub fn page_clause(&self) -> String {
        let n = self.bindings.len() + 1;
        format!(" LIMIT ${} OFFSET ${}", n, n + 1)
    }

    #[cfg(test)]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Apply bindings to a SQLx query_as
    pub fn apply_bindings<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for binding in &self.bindings {
            query = match binding.clone() {
                QueryValue::Text(s) => query.bind(s),
                QueryValue::Integer(i) => query.bind(i),
                QueryValue::Int(i) => query.bind(i),
                QueryValue::Bool(b) => query.bind(b),
                QueryValue::Timestamp(t) => query.bind(t),
                QueryValue::IntList(v) => query.bind(v),
            };
        }
        query
    }

    /// Apply bindings to a SQLx query_scalar
    pub fn apply_bindings_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for binding in &self.bindings {
            query = match binding.clone() {
                QueryValue::Text(s) => query.bind(s),
                QueryValue::Integer(i) => query.bind(i),
                QueryValue::Int(i) => query.bind(i),
                QueryValue::Bool(b) => query.bind(b),
                QueryValue::Timestamp(t) => query.bind(t),
                QueryValue::IntList(v) => query.bind(v),
            };
        }
        query
    }

    /// Bind the values for [`QueryBuilder::page_clause`].
    pub fn apply_page<'q, O>(
        query: QueryAs<'q, Postgres, O, PgArguments>,
        page: Page,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        query.bind(page.limit()).bind(page.offset())
    }
}

/// Soft-delete predicate; every read of a soft-deletable table goes through
/// here. An empty alias yields the bare column.
pub fn live(alias: &str) -> String {
    if alias.is_empty() {
        "is_deleted = FALSE".to_string()
    } else {
        format!("{alias}.is_deleted = FALSE")
    }
}

/// `JOIN LATERAL` on the current live `product_info` row of `product_ref`,
/// aliased `pi`.
pub fn latest_product_info(product_ref: &str, columns: &str) -> String {
    format!(
        r#"
        JOIN LATERAL (
            SELECT {columns} FROM product_info
            WHERE product_id = {product_ref} AND {live}
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        ) AS pi ON TRUE"#,
        live = live(""),
    )
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Look up a caller-supplied key in a fixed table of allowed values.
pub fn lookup<'a, T: Copy>(table: &'a [(&'a str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_where_clause() {
        let builder = QueryBuilder::new();
        assert_eq!(builder.build_where_clause(), "");
        assert_eq!(builder.page_clause(), " LIMIT $1 OFFSET $2");
    }

    #[test]
    fn test_placeholders_are_numbered_in_order() {
        let mut builder = QueryBuilder::new();
        builder
            .add_condition("oi.end_date = TIMESTAMP '9999-12-31 23:59:59'")
            .eq_i32("oi.order_status_id", 3)
            .contains("o.orderer_name", "kim")
            .eq_i64("oi.refund_reason_id", 2);
        assert_eq!(
            builder.build_where_clause(),
            " WHERE oi.end_date = TIMESTAMP '9999-12-31 23:59:59' \
             AND oi.order_status_id = $1 AND o.orderer_name ILIKE $2 AND oi.refund_reason_id = $3"
        );
        assert_eq!(builder.binding_count(), 3);
        assert_eq!(builder.page_clause(), " LIMIT $4 OFFSET $5");
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let mut builder = QueryBuilder::new();
        builder.contains("p.name", "50%_off");
        assert_eq!(
            builder.bindings[0],
            QueryValue::Text("%50\\%\\_off%".to_string())
        );
    }

    #[test]
    fn test_date_range_is_inclusive_of_last_day() {
        let mut builder = QueryBuilder::new();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        builder.date_range("o.payment_date", Some(from), Some(to));
        assert_eq!(
            builder.build_where_clause(),
            " WHERE o.payment_date >= $1 AND o.payment_date < $2"
        );
        assert_eq!(
            builder.bindings[1],
            QueryValue::Timestamp(
                NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_absent_filters_add_nothing() {
        let mut builder = QueryBuilder::new();
        builder
            .date_range("o.payment_date", None, None)
            .any_i32("s.seller_attribute_id", vec![]);
        assert_eq!(builder.build_where_clause(), "");
        assert_eq!(builder.binding_count(), 0);
    }

    #[test]
    fn test_any_binds_a_single_array() {
        let mut builder = QueryBuilder::new();
        builder.any_i32("s.seller_attribute_id", vec![1, 2, 5]);
        assert_eq!(
            builder.build_where_clause(),
            " WHERE s.seller_attribute_id = ANY($1)"
        );
        assert_eq!(builder.binding_count(), 1);
    }

    #[test]
    fn test_live_predicate() {
        assert_eq!(live("q"), "q.is_deleted = FALSE");
        assert_eq!(live(""), "is_deleted = FALSE");

        let mut builder = QueryBuilder::new();
        builder.live("c").eq_i64("c.id", 4);
        assert_eq!(
            builder.build_where_clause(),
            " WHERE c.is_deleted = FALSE AND c.id = $1"
        );
    }

    #[test]
    fn test_latest_product_info_skips_deleted_rows() {
        let sql = latest_product_info("q.product_id", "seller_id");
        assert!(sql.contains("SELECT seller_id FROM product_info"));
        assert!(sql.contains("WHERE product_id = q.product_id AND is_deleted = FALSE"));
        assert!(sql.trim_end().ends_with("AS pi ON TRUE"));
    }

    #[test]
    fn test_lookup() {
        const TABLE: &[(&str, &str)] = &[("NEW", "o.payment_date DESC"), ("OLD", "o.payment_date ASC")];
        assert_eq!(lookup(TABLE, "OLD"), Some("o.payment_date ASC"));
        assert_eq!(lookup(TABLE, "old"), None);
    }
}
