/// Page arithmetic for the feed
///
/// Lenient lookup: a missing or non-numeric page number gives the first page,
/// a number out of range (including one too large for `i64`) gives the last
/// one, and an empty listing still has a single (empty) page.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Never less than one
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a raw `page` query value to a page number in range
    pub fn resolve(&self, raw: Option<&str>) -> i64 {
        let Some(value) = raw.map(str::trim) else {
            return 1;
        };
        match value.parse::<i64>() {
            Ok(number) if number >= 1 && number <= self.num_pages() => number,
            Ok(_) => self.num_pages(),
            Err(_) if is_integer(value) => self.num_pages(),
            Err(_) => 1,
        }
    }

    /// Row offset of the first item on `number`
    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page_info(&self, number: i64) -> PageInfo {
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;
        PageInfo {
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then_some(number - 1),
        }
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Navigation details for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
}

/// A page of items plus its navigation, rendered as `page_obj`
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    #[serde(flatten)]
    pub info: PageInfo,
    pub object_list: Vec<T>,
}
