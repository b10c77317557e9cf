/// Highest page number a listing accepts.
pub const MAX_PAGE: u64 = 1_000_000;

/// A validated LIMIT/OFFSET window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
    pub offset: u64,
}

impl Page {
    /// `page` is 1-based and defaults to 1; `per_page` is clamped to
    /// `1..=max_per_page`. Pages past [`MAX_PAGE`] are rejected.
    pub fn from_query(
        page: Option<u64>,
        per_page: Option<u64>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Result<Self, &'static str> {
        let per_page = per_page
            .unwrap_or(u64::from(default_per_page))
            .clamp(1, u64::from(max_per_page.max(1)));
        let page = page.unwrap_or(1).max(1);
        if page > MAX_PAGE {
            return Err("page is out of range");
        }

        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or("page is out of range")?;

        Ok(Self {
            page: u32::try_from(page).map_err(|_| "page is out of range")?,
            per_page: u32::try_from(per_page).map_err(|_| "per_page is out of range")?,
            offset,
        })
    }
}
