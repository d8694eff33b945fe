use chrono::NaiveDate;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column/value pairs must already be validated; callers skip the UPDATE
/// entirely when no fields were supplied.
pub fn build_update(
    table: &str,
    sets: Vec<(&str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> SqlUpdate {
    let set_clause = sets
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = sets.into_iter().map(|(_, value)| value).collect();
    values.push(SqlValue::U64(id_value));

    SqlUpdate { sql, values }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_set_clause_in_field_order() {
        let update = build_update(
            "employees",
            vec![
                ("full_name", SqlValue::String("Jane Doe".to_string())),
                ("department", SqlValue::String("Sales".to_string())),
            ],
            "id",
            7,
        );
        assert_eq!(
            update.sql,
            "UPDATE employees SET full_name = ?, department = ? WHERE id = ?"
        );
        assert_eq!(update.values.len(), 3);
        assert!(matches!(update.values.last(), Some(SqlValue::U64(7))));
    }

    #[test]
    fn quoted_column_names_pass_through() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let update = build_update("attendance", vec![("`date`", SqlValue::Date(date))], "id", 1);
        assert_eq!(update.sql, "UPDATE attendance SET `date` = ? WHERE id = ?");
    }
}
