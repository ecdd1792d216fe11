//! Query vocabulary of the REST-like remote store: ordering, paging, filters.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort order, rendered as `<column>.<asc|desc>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{}.{}", self.column, dir)
    }
}

/// Options of a `select` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectQuery {
    /// The newest `limit` rows by `column`.
    pub fn newest_first(column: impl Into<String>, limit: usize) -> Self {
        Self {
            order: Some(Order::desc(column)),
            limit: Some(limit),
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Query-string pairs, `select=*` first. Zero limits and offsets are
    /// omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }
}

/// Row filter; only equality is needed by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// The `(column, "eq.<value>")` query-string pair.
    pub fn to_pair(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_pairs_in_order() {
        let q = SelectQuery::newest_first("created_at", 20);
        assert_eq!(
            q.to_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn zero_offset_is_omitted() {
        let q = SelectQuery::newest_first("created_at", 20).with_offset(0);
        assert_eq!(q.to_pairs().len(), 3);
        let q = q.with_offset(40);
        assert_eq!(q.to_pairs()[3], ("offset".to_string(), "40".to_string()));
    }

    #[test]
    fn filter_renders_as_equality() {
        let f = Filter::eq("id", 7);
        assert_eq!(f.to_string(), "id=eq.7");
        assert_eq!(f.to_pair(), ("id".to_string(), "eq.7".to_string()));
        assert_eq!(Order::asc("created_at").to_string(), "created_at.asc");
    }
}
