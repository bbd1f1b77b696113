use crate::contact::Contact;
use crate::diff::{self, ListDiff};

/// Display text for one contact row.
///
/// Rows are the unit the list diff reuses: an unchanged contact keeps its row
/// and `rows_built` only counts rows built for new or changed contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub name: String,
    pub phone: String,
    pub kind: String,
}

impl ContactRow {
    fn build(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            kind: contact.kind.clone(),
        }
    }

    #[cfg(test)]
    pub fn label(&self) -> String {
        format!("{} / {} / {}", self.name, self.phone, self.kind)
    }
}

/// Emitted when a row is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialRequest {
    pub phone: String,
}

/// The rendered contact list.
///
/// Knows nothing about where contacts come from; it renders whatever list is
/// submitted and reports which phone number was activated.
#[derive(Debug, Default)]
pub struct ContactListView {
    contacts: Vec<Contact>,
    rows: Vec<ContactRow>,
    selected: Option<usize>,
    rows_built: usize,
}

impl ContactListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed list, rebuilding only rows that are new or changed.
    pub fn submit(&mut self, list: Vec<Contact>) -> ListDiff {
        let diff = diff::diff(&self.contacts, &list);

        let mut previous: Vec<Option<ContactRow>> =
            std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        let mut rows = Vec::with_capacity(list.len());
        for (new_index, contact) in list.iter().enumerate() {
            let reused = diff
                .source_of(new_index)
                .filter(|&old_index| self.contacts[old_index] == *contact)
                .and_then(|old_index| previous[old_index].take());
            let row = match reused {
                Some(row) => row,
                None => {
                    self.rows_built += 1;
                    ContactRow::build(contact)
                }
            };
            rows.push(row);
        }

        self.selected = match self.selected {
            _ if list.is_empty() => None,
            None => Some(0),
            Some(old_selected) => Some(
                diff.sources
                    .iter()
                    .position(|source| *source == Some(old_selected))
                    .unwrap_or_else(|| old_selected.min(list.len() - 1)),
            ),
        };

        self.contacts = list;
        self.rows = rows;
        diff
    }

    #[cfg(test)]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn rows(&self) -> &[ContactRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of rows built since creation.
    pub fn rows_built(&self) -> usize {
        self.rows_built
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[cfg(test)]
    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected.and_then(|index| self.contacts.get(index))
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected.unwrap_or(0) as isize;
        let last = self.rows.len() as isize - 1;
        self.selected = Some((current + delta).clamp(0, last) as usize);
    }

    pub fn select_first(&mut self) {
        self.selected = if self.rows.is_empty() { None } else { Some(0) };
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.len().checked_sub(1);
    }

    /// Activate the row at `index`.
    pub fn tap(&mut self, index: usize) -> Option<DialRequest> {
        let contact = self.contacts.get(index)?;
        self.selected = Some(index);
        Some(DialRequest {
            phone: contact.phone.clone(),
        })
    }

    pub fn tap_selected(&mut self) -> Option<DialRequest> {
        self.tap(self.selected?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str, phone: &str) -> Contact {
        Contact::new(name, phone, "mobile")
    }

    #[test]
    fn test_first_submit_builds_every_row() {
        let mut view = ContactListView::new();
        let diff = view.submit(vec![c("Alice", "555-1111")]);
        assert_eq!(diff.inserted(), 1);
        assert_eq!(view.rows()[0].label(), "Alice / 555-1111 / mobile");
        assert_eq!(view.rows_built(), 1);
        assert_eq!(view.selected(), Some(0));
    }

    #[test]
    fn test_unchanged_rows_are_reused() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "1"), c("Bob", "2"), c("Carol", "3")]);
        assert_eq!(view.rows_built(), 3);

        let diff = view.submit(vec![c("Alice", "1"), c("Carol", "3")]);
        assert_eq!(diff.removed(), 1);
        assert_eq!(view.rows_built(), 3);

        view.submit(vec![c("Alice", "1"), c("Bob", "2"), c("Carol", "3")]);
        assert_eq!(view.rows_built(), 4);
    }

    #[test]
    fn test_update_rebuilds_only_that_row() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "1"), c("Bob", "2")]);
        let diff = view.submit(vec![c("Alice", "1"), Contact::new("Robert", "2", "work")]);
        assert_eq!(diff.updated(), 1);
        assert_eq!(diff.inserted(), 0);
        assert_eq!(diff.removed(), 0);
        assert_eq!(view.rows_built(), 3);
        assert_eq!(view.rows()[1].label(), "Robert / 2 / work");
    }

    #[test]
    fn test_selection_follows_identity() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "1"), c("Bob", "2"), c("Carol", "3")]);
        view.move_selection(2);
        assert_eq!(view.selected_contact().unwrap().name, "Carol");

        view.submit(vec![c("Alina", "4"), c("Carol", "3")]);
        assert_eq!(view.selected(), Some(1));
        assert_eq!(view.selected_contact().unwrap().name, "Carol");
    }

    #[test]
    fn test_selection_clamped_when_selected_row_vanishes() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "1"), c("Bob", "2"), c("Carol", "3")]);
        view.select_last();
        view.submit(vec![c("Alice", "1")]);
        assert_eq!(view.selected(), Some(0));

        view.submit(Vec::new());
        assert_eq!(view.selected(), None);
        assert!(view.tap_selected().is_none());
    }

    #[test]
    fn test_move_selection_clamps() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "1"), c("Bob", "2")]);
        view.move_selection(-5);
        assert_eq!(view.selected(), Some(0));
        view.move_selection(5);
        assert_eq!(view.selected(), Some(1));
        view.select_first();
        assert_eq!(view.selected(), Some(0));
    }

    #[test]
    fn test_tap_emits_phone() {
        let mut view = ContactListView::new();
        view.submit(vec![c("Alice", "555-1111"), c("Bob", "555-2222")]);
        assert_eq!(
            view.tap(1),
            Some(DialRequest {
                phone: "555-2222".to_string()
            })
        );
        assert_eq!(view.selected(), Some(1));
        assert!(view.tap(7).is_none());
    }
}
