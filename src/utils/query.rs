use chrono::NaiveDate;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::QueryAs;

/// SQL bindable value for dynamic filters.
#[derive(Debug, Clone)]
pub enum BindValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// Builds a WHERE clause from optional filters, keeping conditions and their
/// bindings in lockstep so values are always bound, never interpolated.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    conditions: Vec<String>,
    bindings: Vec<BindValue>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(&mut self, column: &str, value: BindValue) -> &mut Self {
        self.conditions.push(format!("{column} = ?"));
        self.bindings.push(value);
        self
    }

    pub fn on_or_after(&mut self, column: &str, date: NaiveDate) -> &mut Self {
        self.conditions.push(format!("{column} >= ?"));
        self.bindings.push(BindValue::Date(date));
        self
    }

    pub fn on_or_before(&mut self, column: &str, date: NaiveDate) -> &mut Self {
        self.conditions.push(format!("{column} <= ?"));
        self.bindings.push(BindValue::Date(date));
        self
    }

    /// Substring match over several columns with OR semantics.
    pub fn search_like(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let condition = columns
            .iter()
            .map(|column| format!("{column} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({condition})"));

        let pattern = format!("%{term}%");
        for _ in columns {
            self.bindings.push(BindValue::Str(pattern.clone()));
        }
        self
    }

    /// ` WHERE …` or an empty string when no filters were added.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn apply_as<'q, O>(
        &self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for binding in &self.bindings {
            query = match binding {
                BindValue::U64(v) => query.bind(*v),
                BindValue::Str(s) => query.bind(s.clone()),
                BindValue::Date(d) => query.bind(*d),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_has_no_where_clause() {
        assert_eq!(FilterBuilder::new().where_clause(), "");
    }

    #[test]
    fn single_condition() {
        let mut filter = FilterBuilder::new();
        filter.equals("e.department", BindValue::Str("Sales".to_string()));
        assert_eq!(filter.where_clause(), " WHERE e.department = ?");
    }

    #[test]
    fn conditions_are_joined_with_and() {
        let mut filter = FilterBuilder::new();
        filter
            .equals("a.employee_id", BindValue::U64(1))
            .equals("a.status", BindValue::Str("Present".to_string()));
        assert_eq!(
            filter.where_clause(),
            " WHERE a.employee_id = ? AND a.status = ?"
        );
    }

    #[test]
    fn search_spans_columns_with_or() {
        let mut filter = FilterBuilder::new();
        filter.search_like(&["e.full_name", "e.employee_id", "e.email"], "doe");
        assert_eq!(
            filter.where_clause(),
            " WHERE (e.full_name LIKE ? OR e.employee_id LIKE ? OR e.email LIKE ?)"
        );
    }

    #[test]
    fn date_range_bounds_are_inclusive_operators() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let mut filter = FilterBuilder::new();
        filter
            .on_or_after("a.`date`", from)
            .on_or_before("a.`date`", to);
        assert_eq!(
            filter.where_clause(),
            " WHERE a.`date` >= ? AND a.`date` <= ?"
        );
    }
}
