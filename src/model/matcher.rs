// File: ./src/model/matcher.rs
// Equality filters and page slicing over an ordered event collection.
//
// Both filters are optional and AND-combined. Pagination is 1-based; a page
// outside the matching range (including page 0 or a page size of 0) is an
// empty slice, never an error.

use crate::model::event::{Event, EventStatus, PrimaryType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub primary_type: Option<PrimaryType>,
}

impl EventFilter {
    pub fn by_status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            primary_type: None,
        }
    }

    pub fn by_type(primary_type: PrimaryType) -> Self {
        Self {
            status: None,
            primary_type: Some(primary_type),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(status) = self.status
            && event.status != status
        {
            return false;
        }
        if let Some(t) = self.primary_type
            && event.primary_type != Some(t)
        {
            return false;
        }
        true
    }
}

/// One page of matching events plus the number of matches before slicing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    pub items: Vec<Event>,
    pub total: usize,
}

impl EventPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Filters `events` in order and returns the requested page.
pub fn paginate<'a, I>(events: I, filter: &EventFilter, page: usize, page_size: usize) -> EventPage
where
    I: IntoIterator<Item = &'a Event>,
{
    let matching: Vec<&Event> = events.into_iter().filter(|e| filter.matches(e)).collect();
    let total = matching.len();

    if page == 0 || page_size == 0 {
        return EventPage {
            items: vec![],
            total,
        };
    }

    let start = (page - 1).saturating_mul(page_size);
    let items = matching
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    EventPage { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: usize, status: EventStatus, primary_type: Option<PrimaryType>) -> Event {
        Event {
            id: id.to_string(),
            primary_type,
            sub_type: String::new(),
            title: format!("Event {}", id),
            content: String::new(),
            dialog_content: String::new(),
            time: String::new(),
            create_time: String::new(),
            update_time: String::new(),
            status,
            tag_color: String::new(),
            source_dialog_id: String::new(),
        }
    }

    fn numbered(n: usize) -> Vec<Event> {
        (1..=n).map(|i| event(i, EventStatus::Pending, None)).collect()
    }

    #[test]
    fn third_page_of_twenty_five() {
        let events = numbered(25);
        let page = paginate(&events, &EventFilter::default(), 3, 10);
        assert_eq!(page.total, 25);
        let ids: Vec<&str> = page.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["21", "22", "23", "24", "25"]);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let events = numbered(5);
        let filter = EventFilter::default();
        assert!(paginate(&events, &filter, 2, 10).is_empty());
        assert_eq!(paginate(&events, &filter, 2, 10).total, 5);
        assert!(paginate(&events, &filter, 0, 10).is_empty());
        assert!(paginate(&events, &filter, 1, 0).is_empty());
        assert!(paginate(&events, &filter, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn status_filter_keeps_relative_order() {
        let events = vec![
            event(1, EventStatus::Confirmed, None),
            event(2, EventStatus::Pending, None),
            event(3, EventStatus::Confirmed, None),
            event(4, EventStatus::Rejected, None),
            event(5, EventStatus::Confirmed, None),
        ];
        let page = paginate(&events, &EventFilter::by_status(EventStatus::Confirmed), 1, 10);
        let ids: Vec<&str> = page.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "5"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn filters_are_and_combined() {
        let events = vec![
            event(1, EventStatus::Confirmed, Some(PrimaryType::Emotional)),
            event(2, EventStatus::Pending, Some(PrimaryType::Emotional)),
            event(3, EventStatus::Confirmed, Some(PrimaryType::Cognitive)),
            event(4, EventStatus::Confirmed, None),
        ];
        let filter = EventFilter {
            status: Some(EventStatus::Confirmed),
            primary_type: Some(PrimaryType::Emotional),
        };
        let page = paginate(&events, &filter, 1, 10);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "1");

        let by_type = paginate(&events, &EventFilter::by_type(PrimaryType::Emotional), 1, 10);
        assert_eq!(by_type.total, 2);
    }
}
