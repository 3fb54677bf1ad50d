use crate::models::NewsStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Fake,
    NonFake,
    Neutral,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Fake,
        StatusFilter::NonFake,
        StatusFilter::Neutral,
    ];

    pub fn matches(self, status: NewsStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Fake => status == NewsStatus::Fake,
            StatusFilter::NonFake => status == NewsStatus::NonFake,
            StatusFilter::Neutral => status == NewsStatus::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Fake => "Fake",
            StatusFilter::NonFake => "Not fake",
            StatusFilter::Neutral => "Neutral",
        }
    }
}

/// Pure filter/pagination/search state, no I/O.
///
/// Page count depends on the currently filtered list, which this type does not
/// hold; callers pass the list length (or a precomputed total) where needed and
/// combine this state with the news store at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    filter: StatusFilter,
    page: usize,
    page_size: usize,
    search: String,
    loading: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            filter: StatusFilter::All,
            page: 1,
            page_size: 6,
            search: String::new(),
            loading: false,
        }
    }
}

impl UiState {
    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.page = 1;
    }

    /// Clamps to `[1, total_pages]`; `total_pages` comes from the caller,
    /// computed against the currently filtered list.
    pub fn set_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 1;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_string();
        self.page = 1;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn start_index(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    pub fn end_index(&self) -> usize {
        self.page * self.page_size
    }

    pub fn total_pages(&self, list_len: usize) -> usize {
        (list_len.div_ceil(self.page_size)).max(1)
    }
}
