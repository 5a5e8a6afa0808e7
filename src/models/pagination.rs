use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl PaginationQuery {
    pub fn validate(&mut self) {
        if self.page < 1 {
            self.page = 1;
        }
        if self.per_page < 1 || self.per_page > 100 {
            self.per_page = 20;
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(current_page: i64, per_page: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            (total_items + per_page - 1) / per_page
        };

        Self {
            current_page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut q = PaginationQuery {
            page: -3,
            per_page: 500,
        };
        q.validate();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 20);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let meta = PaginationMeta::new(1, 20, 41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 1);
    }
}
