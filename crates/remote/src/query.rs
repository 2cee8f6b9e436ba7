//! Row queries against the remote data store
//!
//! A small builder covering what the pages need: column selection, one
//! level of embedded relations, equality filters, ordering and a limit.
//! [`Query::to_params`] renders it as PostgREST query parameters; the
//! in-memory store evaluates the same structure directly.

use serde_json::Value;

/// A related table pulled into each row (`user_profiles(id,name)`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub table: String,
    pub columns: String,
    /// Column on the queried table holding the foreign key
    pub local: String,
    /// Column on the embedded table it refers to
    pub foreign: String,
}

impl Embed {
    pub fn new(table: &str, columns: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.to_string(),
            local: format!("{}_id", table.trim_end_matches('s')),
            foreign: "id".to_string(),
        }
    }

    /// Join on `local = foreign` instead of the `<table>_id = id` default
    pub fn on(mut self, local: &str, foreign: &str) -> Self {
        self.local = local.to_string();
        self.foreign = foreign.to_string();
        self
    }

    fn render(&self) -> String {
        format!("{}({})", self.table, self.columns)
    }
}

/// Selection of rows from one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: String,
    embeds: Vec<Embed>,
    filters: Vec<(String, String)>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl Query {
    /// All columns of `table`
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the selected columns (comma separated)
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Keep rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, bool)> {
        self.order.as_ref().map(|(c, asc)| (c.as_str(), *asc))
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// The `select=` expression including embeds
    pub fn select_expr(&self) -> String {
        std::iter::once(self.columns.clone())
            .chain(self.embeds.iter().map(Embed::render))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_expr())];
        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{value}")));
        }
        if let Some((column, ascending)) = &self.order {
            let dir = if *ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{column}.{dir}")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// True when `row` passes every equality filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column).is_some_and(|v| value_eq(v, expected)))
    }
}

/// Compare a JSON value against a filter literal
pub(crate) fn value_eq(value: &Value, literal: &str) -> bool {
    match value {
        Value::String(s) => s == literal,
        Value::Bool(b) => b.to_string() == literal,
        Value::Number(n) => n.to_string() == literal,
        Value::Null => literal == "null",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_with_embed() {
        let query = Query::table("project_contributors")
            .select("user_id, role")
            .embed(Embed::new("user_profiles", "id,name,pfp_link").on("user_id", "id"))
            .eq("project_id", "p1")
            .order("role", true);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "user_id,role,user_profiles(id,name,pfp_link)".to_string()),
                ("project_id".to_string(), "eq.p1".to_string()),
                ("order".to_string(), "role.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_embed_key() {
        let embed = Embed::new("projects", "*");
        assert_eq!(embed.local, "project_id");
        assert_eq!(embed.foreign, "id");
    }

    #[test]
    fn test_matches_filters() {
        let query = Query::table("projects").eq("user_id", "u1").eq("archived", false);
        assert!(query.matches(&json!({ "user_id": "u1", "archived": false })));
        assert!(!query.matches(&json!({ "user_id": "u2", "archived": false })));
        assert!(!query.matches(&json!({ "user_id": "u1" })));
    }
}
