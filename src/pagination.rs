use serde::{Deserialize, Serialize};

/// `?page=&page_size=` as sent by clients.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A resolved page: 1-based number and a clamped size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl PageParams {
    pub fn resolve(self, default_size: u32, max_size: u32) -> Page {
        Page {
            number: self.page.unwrap_or(1).max(1),
            size: self.page_size.unwrap_or(default_size).clamp(1, max_size),
        }
    }
}

impl Page {
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(page: Page, count: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page: page.number,
            page_size: page.size,
            results,
        }
    }
}
