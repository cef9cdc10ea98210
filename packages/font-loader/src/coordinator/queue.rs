use std::collections::VecDeque;

use crate::types::{LoadPriority, LoadPurpose};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadQueueItem {
    pub family: String,
    pub priority: LoadPriority,
    pub purpose: LoadPurpose,
}

/// What [`LoadQueue::push`] did with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePush {
    Added,
    /// The family was already queued and its item now asks for more
    Upgraded,
    /// The family was already queued with at least this purpose and priority
    Unchanged,
}

/// Pending loads ordered by priority, FIFO within a priority
#[derive(Debug, Default)]
pub struct LoadQueue {
    items: VecDeque<LoadQueueItem>,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert before the first item of strictly lower priority
    ///
    /// A family that is already queued keeps a single item. That item takes the
    /// higher priority and moves up to text editing, but is never downgraded.
    pub fn push(&mut self, item: LoadQueueItem) -> QueuePush {
        let Some(index) = self.items.iter().position(|queued| queued.family == item.family) else {
            self.insert_by_priority(item);
            return QueuePush::Added;
        };

        let existing = &mut self.items[index];
        let upgrade_purpose = existing.purpose != LoadPurpose::TextEditing
            && item.purpose == LoadPurpose::TextEditing;
        let raise_priority = item.priority.rank() < existing.priority.rank();

        if upgrade_purpose {
            existing.purpose = item.purpose;
        }
        if raise_priority {
            existing.priority = item.priority;
            if let Some(raised) = self.items.remove(index) {
                self.insert_by_priority(raised);
            }
        }

        if upgrade_purpose || raise_priority {
            QueuePush::Upgraded
        } else {
            QueuePush::Unchanged
        }
    }

    fn insert_by_priority(&mut self, item: LoadQueueItem) {
        let rank = item.priority.rank();
        let position = self
            .items
            .iter()
            .position(|queued| queued.priority.rank() > rank)
            .unwrap_or(self.items.len());
        self.items.insert(position, item);
    }

    pub fn pop(&mut self) -> Option<LoadQueueItem> {
        self.items.pop_front()
    }

    pub fn remove(&mut self, family: &str) -> Option<LoadQueueItem> {
        let position = self.items.iter().position(|item| item.family == family)?;
        self.items.remove(position)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.items.iter().any(|item| item.family == family)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn families(&self) -> Vec<String> {
        self.items.iter().map(|item| item.family.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(family: &str, priority: LoadPriority) -> LoadQueueItem {
        LoadQueueItem {
            family: family.to_string(),
            priority,
            purpose: LoadPurpose::TextEditing,
        }
    }

    #[test]
    fn orders_by_priority_then_arrival() {
        let mut queue = LoadQueue::new();
        queue.push(item("low", LoadPriority::Low));
        queue.push(item("normal-1", LoadPriority::Normal));
        queue.push(item("critical", LoadPriority::Critical));
        queue.push(item("normal-2", LoadPriority::Normal));
        queue.push(item("high", LoadPriority::High));

        assert_eq!(
            queue.families(),
            vec!["critical", "high", "normal-1", "normal-2", "low"]
        );
    }

    fn preview(family: &str, priority: LoadPriority) -> LoadQueueItem {
        LoadQueueItem {
            purpose: LoadPurpose::Preview,
            ..item(family, priority)
        }
    }

    #[test]
    fn duplicate_takes_the_higher_priority() {
        let mut queue = LoadQueue::new();
        assert_eq!(queue.push(item("Roboto", LoadPriority::Low)), QueuePush::Added);
        queue.push(item("Lato", LoadPriority::Normal));
        assert_eq!(
            queue.push(item("Roboto", LoadPriority::Critical)),
            QueuePush::Upgraded
        );

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.families(), vec!["Roboto", "Lato"]);
        assert_eq!(queue.pop().map(|i| i.priority), Some(LoadPriority::Critical));
    }

    #[test]
    fn duplicate_upgrades_purpose_but_never_downgrades() {
        let mut queue = LoadQueue::new();
        queue.push(preview("Roboto", LoadPriority::Normal));
        queue.push(item("Lato", LoadPriority::Normal));

        assert_eq!(
            queue.push(item("Roboto", LoadPriority::Low)),
            QueuePush::Upgraded
        );
        // Position and priority kept
        assert_eq!(queue.families(), vec!["Roboto", "Lato"]);

        assert_eq!(
            queue.push(preview("Roboto", LoadPriority::Low)),
            QueuePush::Unchanged
        );
        let roboto = queue.pop().unwrap();
        assert_eq!(roboto.purpose, LoadPurpose::TextEditing);
        assert_eq!(roboto.priority, LoadPriority::Normal);
    }

    #[test]
    fn remove_drops_only_named_family() {
        let mut queue = LoadQueue::new();
        queue.push(item("A", LoadPriority::Normal));
        queue.push(item("B", LoadPriority::Normal));
        assert_eq!(queue.remove("A").map(|i| i.family), Some("A".to_string()));
        assert_eq!(queue.families(), vec!["B"]);
        assert!(queue.remove("A").is_none());
    }
}
