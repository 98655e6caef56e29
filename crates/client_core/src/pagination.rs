use shared::protocol::WidgetEvent;

/// Emitted whenever the paginator moves to another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTurn {
    pub current_page: u32,
}

impl PageTurn {
    /// Zero-based page index the query service expects as `recordOffset`.
    pub fn record_offset(self) -> u32 {
        self.current_page.saturating_sub(1)
    }

    pub fn into_event(self) -> WidgetEvent {
        WidgetEvent::PageTurn {
            current_page: self.current_page,
        }
    }
}

/// Page counter and button enablement for one record list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    total_record_count: u64,
    record_limit: u32,
    current_page: u32,
}

impl Paginator {
    pub fn new(total_record_count: u64, record_limit: u32) -> Self {
        Self {
            total_record_count,
            record_limit,
            current_page: 1,
        }
    }

    pub fn from_offset(total_record_count: u64, record_limit: u32, record_offset: u32) -> Self {
        let mut paginator = Self::new(total_record_count, record_limit);
        paginator.set_record_offset(record_offset);
        paginator
    }

    pub fn set_totals(&mut self, total_record_count: u64, record_limit: u32) {
        self.total_record_count = total_record_count;
        self.record_limit = record_limit;
    }

    pub fn set_current_page(&mut self, current_page: u32) {
        self.current_page = current_page;
    }

    pub fn set_record_offset(&mut self, record_offset: u32) {
        self.current_page = record_offset.saturating_add(1);
    }

    pub fn total_record_count(&self) -> u64 {
        self.total_record_count
    }

    pub fn record_limit(&self) -> u32 {
        self.record_limit
    }

    pub fn total_pages(&self) -> u32 {
        if self.total_record_count == 0 || self.record_limit == 0 {
            return 0;
        }
        let pages = self.total_record_count.div_ceil(u64::from(self.record_limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Reports 0 while there is nothing to page through, even though the
    /// internal counter sits on page 1.
    pub fn current_page(&self) -> u32 {
        if self.total_pages() == 0 {
            0
        } else {
            self.current_page
        }
    }

    pub fn can_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn can_next(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    pub fn first(&mut self) -> Option<PageTurn> {
        if !self.can_previous() {
            return None;
        }
        self.current_page = 1;
        Some(self.turn())
    }

    pub fn previous(&mut self) -> Option<PageTurn> {
        if !self.can_previous() {
            return None;
        }
        self.current_page -= 1;
        Some(self.turn())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<PageTurn> {
        if !self.can_next() {
            return None;
        }
        self.current_page += 1;
        Some(self.turn())
    }

    pub fn last(&mut self) -> Option<PageTurn> {
        if !self.can_next() {
            return None;
        }
        self.current_page = self.total_pages();
        Some(self.turn())
    }

    fn turn(&self) -> PageTurn {
        PageTurn {
            current_page: self.current_page(),
        }
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
