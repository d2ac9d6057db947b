//! Todos feature state

use crate::model::{QueryKey, SortField, Todo};
use tabletodo_airtable::SortDirection;

/// Everything the todo views render from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodosState {
    /// Todos in server sort order, placeholders appended
    pub todo_list: Vec<Todo>,
    /// Current error, empty when there is none
    pub error_message: String,
    /// Pending value of the "add" input
    pub working_todo_title: String,
    /// A list fetch is in flight
    pub is_loading: bool,
    /// A create, update or completion is in flight
    pub is_saving: bool,
    /// Number of list requests in flight
    pub loads_in_flight: u32,
    /// Number of create, update and completion requests in flight
    pub saves_in_flight: u32,
    /// Sort field of the list view
    pub sort_field: SortField,
    /// Sort direction of the list view
    pub sort_direction: SortDirection,
    /// Search text of the list view
    pub query_string: String,
    /// View `todo_list` was last loaded for
    pub shown_key: Option<QueryKey>,
}

impl TodosState {
    /// Cache key of the current view
    #[must_use]
    pub fn query_key(&self) -> QueryKey {
        QueryKey {
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            query_string: self.query_string.clone(),
        }
    }

    /// Todo with the given id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Todo> {
        self.todo_list.iter().find(|todo| todo.id == id)
    }

    /// Replace the todo whose id matches `todo.id`; false if none does
    pub(crate) fn replace(&mut self, todo: Todo) -> bool {
        match self.todo_list.iter_mut().find(|existing| existing.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                true
            },
            None => false,
        }
    }

    /// Fold a list fetched while local changes were pending into the list
    ///
    /// Fetched todos keep the server order, but a local copy of the same id
    /// wins. Local todos the fetch does not know about follow in their
    /// current order, except that only unconfirmed placeholders survive when
    /// the list was loaded for another view.
    pub(crate) fn merge_fetched(&mut self, fetched: Vec<Todo>) {
        let mut local = std::mem::take(&mut self.todo_list);
        let current = self.query_key();
        if self.shown_key.as_ref().is_some_and(|shown| *shown != current) {
            local.retain(|todo| todo.is_still_saving);
        }

        let mut merged: Vec<Todo> = fetched
            .into_iter()
            .map(|todo| {
                match local.iter().position(|existing| existing.id == todo.id) {
                    Some(index) => local.remove(index),
                    None => todo,
                }
            })
            .collect();
        merged.append(&mut local);

        self.todo_list = merged;
        self.shown_key = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_view() {
        let state = TodosState::default();
        assert_eq!(state.sort_field, SortField::CreatedTime);
        assert_eq!(state.sort_direction, SortDirection::Desc);
        assert!(state.query_string.is_empty());
        assert!(!state.is_loading && !state.is_saving);
        assert_eq!((state.loads_in_flight, state.saves_in_flight), (0, 0));
        assert!(state.error_message.is_empty());
    }

    #[test]
    fn query_key_tracks_view_fields() {
        let mut state = TodosState::default();
        let before = state.query_key();

        state.working_todo_title = "typing".to_string();
        assert_eq!(state.query_key(), before);

        state.query_string = "cat".to_string();
        assert_ne!(state.query_key(), before);
    }

    #[test]
    fn replace_ignores_unknown_ids() {
        let mut state = TodosState::default();
        assert!(!state.replace(Todo::placeholder("x", "c-1", "t")));
        assert!(state.todo_list.is_empty());
    }

    fn todo(id: &str, title: &str) -> Todo {
        Todo {
            id: id.to_string(),
            client_id: None,
            title: title.to_string(),
            is_completed: false,
            created_time: "2025-01-01T00:00:00.000Z".to_string(),
            is_still_saving: false,
        }
    }

    #[test]
    fn merge_keeps_pending_local_changes() {
        let mut state = TodosState {
            todo_list: vec![
                todo("rec1", "edited locally"),
                Todo::placeholder("saving", "c-1", "t"),
            ],
            shown_key: Some(QueryKey::default()),
            ..TodosState::default()
        };

        state.merge_fetched(vec![todo("rec0", "from server"), todo("rec1", "stale title")]);

        let titles: Vec<_> = state.todo_list.iter().map(|todo| todo.title.as_str()).collect();
        assert_eq!(titles, ["from server", "edited locally", "saving"]);
        assert!(state.todo_list[2].is_still_saving);
        assert_eq!(state.shown_key, Some(state.query_key()));
    }

    #[test]
    fn merge_after_view_change_keeps_only_placeholders() {
        let mut state = TodosState {
            todo_list: vec![todo("rec1", "dog"), Todo::placeholder("cat toy", "c-1", "t")],
            shown_key: Some(QueryKey::default()),
            query_string: "cat".to_string(),
            ..TodosState::default()
        };

        state.merge_fetched(vec![todo("rec2", "cat food")]);

        let ids: Vec<_> = state.todo_list.iter().map(|todo| todo.id.as_str()).collect();
        assert_eq!(ids, ["rec2", "c-1"]);
    }

    #[test]
    fn merge_into_empty_list_takes_fetch() {
        let mut state = TodosState::default();
        state.merge_fetched(vec![todo("rec1", "a"), todo("rec2", "b")]);
        assert_eq!(state.todo_list, vec![todo("rec1", "a"), todo("rec2", "b")]);
    }
}
