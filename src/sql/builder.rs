//! Builds parameterized INSERT, UPDATE, DELETE for a table and a list of columns.

use crate::port::TABLE_PREFIX_PLACEHOLDER;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) {
        self.params.push(v);
    }
}

/// INSERT of `fields` (column, value) in the given order. No fields: `DEFAULT VALUES`.
pub fn insert(table: &str, fields: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    if fields.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES", table);
        return q;
    }
    let mut cols = Vec::with_capacity(fields.len());
    for (col, val) in fields {
        cols.push(col.as_str());
        q.push_param(val.clone());
    }
    let placeholders = vec!["?"; fields.len()];
    q.sql = format!(
        "INSERT INTO {}({}) VALUES({})",
        table,
        cols.join(","),
        placeholders.join(",")
    );
    q
}

/// UPDATE by id: one `col = ?` per field, id bound last. Caller ensures `fields` is non-empty.
pub fn update(table: &str, fields: &[(String, Value)], id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(fields.len());
    for (col, val) in fields {
        q.push_param(val.clone());
        sets.push(format!("{} = ?", col));
    }
    q.push_param(id.clone());
    q.sql = format!("UPDATE {} SET {} WHERE id = ?", table, sets.join(", "));
    q
}

/// DELETE by id.
pub fn delete(table: &str, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id.clone());
    q.sql = format!("DELETE FROM {} WHERE id = ?", table);
    q
}

/// Rewrite portable SQL for PostgreSQL: `*PREFIX*` becomes `prefix` and each `?`
/// outside quoted literals/identifiers becomes `$1`, `$2`, ...
pub fn prepare_query(sql: &str, prefix: &str) -> String {
    let sql = sql.replace(TABLE_PREFIX_PLACEHOLDER, prefix);
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut n = 0u32;
    for c in sql.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(c),
            },
        }
    }
    out
}

/// For an INSERT without its own RETURNING clause: the target table and the
/// statement with `RETURNING id` appended. Anything else: `None`.
pub fn returning_id(sql: &str) -> Option<(String, String)> {
    let trimmed = sql.trim();
    let head = trimmed.get(..11)?;
    if !head.eq_ignore_ascii_case("INSERT INTO") {
        return None;
    }
    if trimmed.to_ascii_uppercase().contains(" RETURNING ") {
        return None;
    }
    let table: String = trimmed[11..]
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(')
        .collect();
    if table.is_empty() {
        return None;
    }
    let statement = format!("{} RETURNING id", trimmed.trim_end_matches(';'));
    Some((table, statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(c, v)| (c.to_string(), v.clone())).collect()
    }

    #[test]
    fn insert_lists_columns_in_order() {
        let q = insert(
            "*PREFIX*table",
            &fields(&[("pre_name", json!("john")), ("email", json!("my@email"))]),
        );
        assert_eq!(q.sql, "INSERT INTO *PREFIX*table(pre_name,email) VALUES(?,?)");
        assert_eq!(q.params, vec![json!("john"), json!("my@email")]);
    }

    #[test]
    fn insert_without_fields_uses_defaults() {
        let q = insert("*PREFIX*table", &[]);
        assert_eq!(q.sql, "INSERT INTO *PREFIX*table DEFAULT VALUES");
        assert!(q.params.is_empty());
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(
            "*PREFIX*table",
            &fields(&[("pre_name", json!("john")), ("email", json!("my@email"))]),
            &json!(1),
        );
        assert_eq!(q.sql, "UPDATE *PREFIX*table SET pre_name = ?, email = ? WHERE id = ?");
        assert_eq!(q.params, vec![json!("john"), json!("my@email"), json!(1)]);
    }

    #[test]
    fn delete_by_id() {
        let q = delete("*PREFIX*table", &json!(2));
        assert_eq!(q.sql, "DELETE FROM *PREFIX*table WHERE id = ?");
        assert_eq!(q.params, vec![json!(2)]);
    }

    #[test]
    fn prepare_query_numbers_placeholders_and_applies_prefix() {
        assert_eq!(
            prepare_query("UPDATE *PREFIX*notes SET title = ? WHERE id = ?", "oc_"),
            "UPDATE oc_notes SET title = $1 WHERE id = $2"
        );
    }

    #[test]
    fn returning_id_appends_to_plain_inserts() {
        assert_eq!(
            returning_id("INSERT INTO oc_notes(title) VALUES($1)"),
            Some((
                "oc_notes".to_string(),
                "INSERT INTO oc_notes(title) VALUES($1) RETURNING id".to_string()
            ))
        );
        assert_eq!(
            returning_id("insert into oc_notes DEFAULT VALUES;"),
            Some((
                "oc_notes".to_string(),
                "insert into oc_notes DEFAULT VALUES RETURNING id".to_string()
            ))
        );
    }

    #[test]
    fn returning_id_leaves_other_statements_alone() {
        assert_eq!(returning_id("SELECT * FROM oc_notes"), None);
        assert_eq!(returning_id("UPDATE oc_notes SET title = $1 WHERE id = $2"), None);
        assert_eq!(returning_id("INSERT INTO oc_notes(title) VALUES($1) RETURNING title"), None);
        assert_eq!(returning_id("INSERT"), None);
    }

    #[test]
    fn prepare_query_skips_quoted_question_marks() {
        assert_eq!(
            prepare_query("SELECT * FROM t WHERE a = '?' AND \"b?\" = ?", ""),
            "SELECT * FROM t WHERE a = '?' AND \"b?\" = $1"
        );
    }
}
