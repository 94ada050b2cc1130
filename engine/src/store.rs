//! Store - the in-memory state container.
//!
//! The Store holds every todo list and todo item plus the version clock.
//! Each mutation bumps the clock strictly forward; reconciliation may swap
//! the whole state for a newer remote snapshot.

use crate::{
    clock::next_version,
    error::Result,
    reconcile::{self, ReconcileOutcome, Verdict},
    Error, ItemId, ListId, SnapshotMetadata, StoreSnapshot, SyncPayload, Timestamp, TodoItem,
    TodoList,
};
use chrono::{DateTime, Utc};

/// Name of the list every fresh store starts with.
pub const DEFAULT_LIST_NAME: &str = "My Todo List";

/// The main store holding all state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Lists in display order
    todo_lists: Vec<TodoList>,
    /// Items in insertion order
    todo_items: Vec<TodoItem>,
    /// Version clock
    last_update: Timestamp,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create the first-launch store: one empty default list at version 0.
    pub fn new() -> Self {
        Self {
            todo_lists: vec![TodoList::new(DEFAULT_LIST_NAME)],
            todo_items: Vec::new(),
            last_update: 0,
        }
    }

    /// Create a store with no lists at version 0.
    pub fn empty() -> Self {
        Self::from_snapshot(StoreSnapshot::empty())
    }

    /// Create a store holding exactly the given snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            todo_lists: snapshot.todo_lists,
            todo_items: snapshot.todo_items,
            last_update: snapshot.last_update,
        }
    }

    /// Current version clock.
    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    /// All lists.
    pub fn todo_lists(&self) -> &[TodoList] {
        &self.todo_lists
    }

    /// All items, including those whose list no longer exists.
    pub fn todo_items(&self) -> &[TodoItem] {
        &self.todo_items
    }

    /// Get a list by ID.
    pub fn list(&self, id: &str) -> Option<&TodoList> {
        self.todo_lists.iter().find(|l| l.id == id)
    }

    /// Get an item by ID.
    pub fn item(&self, id: &str) -> Option<&TodoItem> {
        self.todo_items.iter().find(|i| i.id == id)
    }

    /// Id of the first list, the one selected by default.
    pub fn first_list_id(&self) -> Option<&ListId> {
        self.todo_lists.first().map(|l| &l.id)
    }

    /// Items shown when `list_id` is selected, in store order.
    pub fn items_in_list<'a>(&'a self, list_id: &'a str) -> impl Iterator<Item = &'a TodoItem> {
        self.todo_items.iter().filter(move |i| i.is_in_list(list_id))
    }

    /// Append a new unfinished item to `list_id`. The list is not checked.
    pub fn add_item(
        &mut self,
        list_id: impl Into<ListId>,
        description: impl Into<String>,
        now: Timestamp,
    ) -> ItemId {
        let item = TodoItem::new(list_id, description);
        let id = item.id.clone();
        self.todo_items.push(item);
        self.touch(now);
        id
    }

    /// Flip the done flag of an item.
    pub fn toggle_done(&mut self, item_id: &str, now: Timestamp) -> Result<()> {
        let item = self.item_mut(item_id)?;
        item.done = !item.done;
        self.touch(now);
        Ok(())
    }

    /// Replace an item's description.
    pub fn edit_description(
        &mut self,
        item_id: &str,
        description: impl Into<String>,
        now: Timestamp,
    ) -> Result<()> {
        let item = self.item_mut(item_id)?;
        item.description = description.into();
        self.touch(now);
        Ok(())
    }

    /// Remove an item, keeping the order of the remaining ones.
    pub fn remove_item(&mut self, item_id: &str, now: Timestamp) -> Result<()> {
        let index = self
            .todo_items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;
        self.todo_items.remove(index);
        self.touch(now);
        Ok(())
    }

    /// Move an item to another list. The target list is not checked.
    pub fn move_item(
        &mut self,
        item_id: &str,
        list_id: impl Into<ListId>,
        now: Timestamp,
    ) -> Result<()> {
        let item = self.item_mut(item_id)?;
        item.list_id = list_id.into();
        self.touch(now);
        Ok(())
    }

    /// Set or clear an item's deadline.
    pub fn set_deadline(
        &mut self,
        item_id: &str,
        deadline: Option<DateTime<Utc>>,
        now: Timestamp,
    ) -> Result<()> {
        let item = self.item_mut(item_id)?;
        item.deadline = deadline;
        self.touch(now);
        Ok(())
    }

    /// Append a new list.
    pub fn create_list(&mut self, name: impl Into<String>, now: Timestamp) -> ListId {
        let list = TodoList::new(name);
        let id = list.id.clone();
        self.todo_lists.push(list);
        self.touch(now);
        id
    }

    /// Reconcile with a payload fetched from the sync server.
    ///
    /// Either replaces the whole store with a strictly newer snapshot or
    /// leaves it untouched; see [`crate::reconcile`].
    pub fn reconcile(&mut self, payload: &SyncPayload) -> ReconcileOutcome {
        match reconcile::evaluate(self.last_update, payload) {
            Verdict::Keep(outcome) => outcome,
            Verdict::Replace(snapshot) => {
                let previous = self.last_update;
                let current = SnapshotMetadata::from(&snapshot);
                self.import_state(snapshot);
                ReconcileOutcome::Replaced { previous, current }
            }
        }
    }

    /// Export the current store state as a snapshot.
    pub fn export_state(&self) -> StoreSnapshot {
        StoreSnapshot {
            todo_lists: self.todo_lists.clone(),
            todo_items: self.todo_items.clone(),
            last_update: self.last_update,
        }
    }

    /// Replace the current state with the snapshot's state.
    pub fn import_state(&mut self, snapshot: StoreSnapshot) {
        self.todo_lists = snapshot.todo_lists;
        self.todo_items = snapshot.todo_items;
        self.last_update = snapshot.last_update;
    }

    /// Serialize the current state.
    pub fn to_json(&self) -> Result<String> {
        self.export_state().to_json()
    }

    /// Get snapshot metadata without full export.
    pub fn snapshot_metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata {
            last_update: self.last_update,
            list_count: self.todo_lists.len(),
            item_count: self.todo_items.len(),
            done_count: self.todo_items.iter().filter(|i| i.done).count(),
        }
    }

    fn item_mut(&mut self, item_id: &str) -> Result<&mut TodoItem> {
        self.todo_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))
    }

    fn touch(&mut self, now: Timestamp) {
        self.last_update = next_version(self.last_update, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_store() -> Store {
        Store::new()
    }

    fn default_list(store: &Store) -> ListId {
        store.first_list_id().unwrap().clone()
    }

    #[test]
    fn create_store() {
        let store = test_store();
        assert_eq!(store.last_update(), 0);
        assert_eq!(store.todo_lists().len(), 1);
        assert_eq!(store.todo_lists()[0].name, DEFAULT_LIST_NAME);
        assert!(store.todo_items().is_empty());
    }

    #[test]
    fn add_items() {
        let mut store = test_store();
        let list = default_list(&store);

        store.add_item(list.clone(), "test", 1000);
        assert_eq!(store.todo_items()[0].description, "test");
        store.add_item(list, "test2", 2000);
        assert_eq!(store.todo_items()[1].description, "test2");
        assert_eq!(store.last_update(), 2000);
    }

    #[test]
    fn add_item_buy_milk() {
        let mut store = test_store();
        let list = default_list(&store);
        let before = store.last_update();

        let id = store.add_item(list.clone(), "buy milk", 1000);

        assert_eq!(store.todo_items().len(), 1);
        let item = store.item(&id).unwrap();
        assert!(!item.done);
        assert_eq!(item.description, "buy milk");
        assert_eq!(item.list_id, list);
        assert!(store.last_update() > before);
    }

    #[test]
    fn toggle_done() {
        let mut store = test_store();
        let list = default_list(&store);
        let id = store.add_item(list, "test", 1000);

        store.toggle_done(&id, 2000).unwrap();
        assert!(store.item(&id).unwrap().done);
        store.toggle_done(&id, 3000).unwrap();
        assert!(!store.item(&id).unwrap().done);
    }

    #[test]
    fn edit_description() {
        let mut store = test_store();
        let list = default_list(&store);
        let id = store.add_item(list, "test", 1000);

        store.edit_description(&id, "changed description", 2000).unwrap();
        assert_eq!(store.item(&id).unwrap().description, "changed description");
    }

    #[test]
    fn remove_item_keeps_order() {
        let mut store = test_store();
        let list = default_list(&store);
        let a = store.add_item(list.clone(), "a", 1000);
        let b = store.add_item(list.clone(), "b", 1001);
        let c = store.add_item(list, "c", 1002);

        store.remove_item(&b, 2000).unwrap();
        let ids: Vec<_> = store.todo_items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn remove_item_twice_is_not_found() {
        let mut store = test_store();
        let list = default_list(&store);
        let a = store.add_item(list.clone(), "a", 1000);
        store.add_item(list, "b", 1001);

        store.remove_item(&a, 2000).unwrap();
        let after_first = store.clone();

        let result = store.remove_item(&a, 3000);
        assert_eq!(result, Err(Error::ItemNotFound(a)));
        assert_eq!(store, after_first);
        assert_eq!(store.todo_items().len(), 1);
    }

    #[test]
    fn create_list() {
        let mut store = test_store();
        let id = store.create_list("new List", 1000);
        assert_eq!(store.todo_lists()[1].name, "new List");
        assert_eq!(store.list(&id).unwrap().name, "new List");
        assert_eq!(store.last_update(), 1000);
    }

    #[test]
    fn move_item_between_lists() {
        let mut store = test_store();
        let original = default_list(&store);
        let todo = store.add_item(original.clone(), "test", 1000);
        store.add_item(original.clone(), "test2", 1001);
        let other = store.create_list("new List", 1002);

        assert_eq!(store.item(&todo).unwrap().list_id, original);
        store.move_item(&todo, other.clone(), 2000).unwrap();
        assert_eq!(store.item(&todo).unwrap().list_id, other);
        assert_eq!(store.items_in_list(&original).count(), 1);
        assert_eq!(store.items_in_list(&other).count(), 1);
    }

    #[test]
    fn move_item_to_unknown_list_hides_it() {
        let mut store = test_store();
        let list = default_list(&store);
        let todo = store.add_item(list.clone(), "test", 1000);

        store.move_item(&todo, "nonexistent-list", 2000).unwrap();

        assert_eq!(store.item(&todo).unwrap().list_id, "nonexistent-list");
        for l in store.todo_lists() {
            assert_eq!(store.items_in_list(&l.id).count(), 0);
        }
    }

    #[test]
    fn set_and_clear_deadline() {
        let mut store = test_store();
        let list = default_list(&store);
        let todo = store.add_item(list, "test", 1000);
        let deadline = Utc.with_ymd_and_hms(2030, 1, 1, 9, 30, 0).unwrap();

        store.set_deadline(&todo, Some(deadline), 2000).unwrap();
        assert_eq!(store.item(&todo).unwrap().deadline, Some(deadline));

        store.set_deadline(&todo, None, 3000).unwrap();
        assert_eq!(store.item(&todo).unwrap().deadline, None);
    }

    #[test]
    fn unknown_item_leaves_store_unchanged() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list, "test", 1000);
        let before = store.clone();

        assert!(store.toggle_done("missing", 2000).unwrap_err().is_not_found());
        assert!(store.edit_description("missing", "x", 2000).is_err());
        assert!(store.remove_item("missing", 2000).is_err());
        assert!(store.move_item("missing", "l", 2000).is_err());
        assert!(store.set_deadline("missing", None, 2000).is_err());

        assert_eq!(store, before);
    }

    #[test]
    fn clock_standing_still_still_advances() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list.clone(), "a", 5000);
        store.add_item(list.clone(), "b", 5000);
        store.add_item(list, "c", 4000);
        assert_eq!(store.last_update(), 5002);
    }

    #[test]
    fn reconcile_replaces_with_newer() {
        let mut store = test_store();
        let payload = SyncPayload::newer(
            r#"{"todoLists":[{"id":"123","name":"Synced"}],
                "todoItems":[{"id":"321","description":"sync todo list","done":true}],
                "lastUpdate":654321}"#,
        );

        let outcome = store.reconcile(&payload);

        assert!(outcome.is_replaced());
        let expected = StoreSnapshot {
            todo_lists: vec![TodoList::with_id("123", "Synced")],
            todo_items: vec![TodoItem {
                id: "321".into(),
                description: "sync todo list".into(),
                list_id: String::new(),
                done: true,
                deadline: None,
            }],
            last_update: 654321,
        };
        assert_eq!(store.export_state(), expected);
    }

    #[test]
    fn reconcile_not_newer_is_noop() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list, "keep me", 1000);
        let before = store.to_json().unwrap();

        let outcome = store.reconcile(&SyncPayload::none());

        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(store.to_json().unwrap(), before);
    }

    #[test]
    fn reconcile_corrupt_is_noop() {
        let mut store = test_store();
        let before = store.clone();

        for data in [
            r#"{"todoItems":[],"lastUpdate":99}"#,
            r#"{"todoLists":[],"lastUpdate":99}"#,
            r#"{"todoLists":[],"todoItems":[]}"#,
            "{{{",
        ] {
            let outcome = store.reconcile(&SyncPayload::newer(data));
            assert!(matches!(outcome, ReconcileOutcome::Discarded { .. }));
            assert_eq!(store, before);
        }
    }

    #[test]
    fn reconcile_stale_snapshot_is_noop() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list, "local edit", 2000);
        let before = store.clone();

        let outcome = store.reconcile(&SyncPayload::newer(
            r#"{"todoLists":[],"todoItems":[],"lastUpdate":1500}"#,
        ));

        assert_eq!(
            outcome,
            ReconcileOutcome::Stale {
                remote: 1500,
                local: 2000
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn reconcile_discards_unsynced_local_edits() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list, "will be lost", 1000);

        store.reconcile(&SyncPayload::newer(
            r#"{"todoLists":[],"todoItems":[],"lastUpdate":5000}"#,
        ));

        assert!(store.todo_items().is_empty());
        assert!(store.todo_lists().is_empty());
        assert_eq!(store.last_update(), 5000);
    }

    #[test]
    fn export_import_roundtrip() {
        let mut store = test_store();
        let list = default_list(&store);
        store.add_item(list, "a", 1000);

        let json = store.to_json().unwrap();
        let restored = Store::from_snapshot(StoreSnapshot::from_json(&json).unwrap());
        assert_eq!(restored, store);
    }

    #[test]
    fn snapshot_metadata() {
        let mut store = test_store();
        let list = default_list(&store);
        let id = store.add_item(list.clone(), "a", 1000);
        store.add_item(list, "b", 1001);
        store.toggle_done(&id, 1002).unwrap();

        let meta = store.snapshot_metadata();
        assert_eq!(meta.last_update, 1002);
        assert_eq!(meta.list_count, 1);
        assert_eq!(meta.item_count, 2);
        assert_eq!(meta.done_count, 1);
        assert_eq!(meta, SnapshotMetadata::from(&store.export_state()));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Mutation {
            Add(String),
            Toggle(usize),
            Edit(usize, String),
            Remove(usize),
            Move(usize, bool),
            Deadline(usize, bool),
            CreateList(String),
        }

        fn arb_mutation() -> impl Strategy<Value = Mutation> {
            prop_oneof![
                "[a-z]{0,8}".prop_map(Mutation::Add),
                (0usize..8).prop_map(Mutation::Toggle),
                (0usize..8, "[a-z]{0,8}").prop_map(|(i, s)| Mutation::Edit(i, s)),
                (0usize..8).prop_map(Mutation::Remove),
                (0usize..8, any::<bool>()).prop_map(|(i, b)| Mutation::Move(i, b)),
                (0usize..8, any::<bool>()).prop_map(|(i, b)| Mutation::Deadline(i, b)),
                "[a-z]{0,8}".prop_map(Mutation::CreateList),
            ]
        }

        /// Resolve an index to an existing item id, or a miss when out of range.
        fn target(store: &Store, index: usize) -> String {
            store
                .todo_items()
                .get(index)
                .map(|i| i.id.clone())
                .unwrap_or_else(|| format!("missing-{}", index))
        }

        fn apply(store: &mut Store, mutation: &Mutation, now: Timestamp) -> Result<()> {
            let list = store.first_list_id().cloned().unwrap_or_default();
            let id = match mutation {
                Mutation::Toggle(i)
                | Mutation::Edit(i, _)
                | Mutation::Remove(i)
                | Mutation::Move(i, _)
                | Mutation::Deadline(i, _) => target(store, *i),
                Mutation::Add(_) | Mutation::CreateList(_) => String::new(),
            };
            match mutation {
                Mutation::Add(d) => {
                    store.add_item(list, d.clone(), now);
                    Ok(())
                }
                Mutation::Toggle(_) => store.toggle_done(&id, now),
                Mutation::Edit(_, d) => store.edit_description(&id, d.clone(), now),
                Mutation::Remove(_) => store.remove_item(&id, now),
                Mutation::Move(_, dangling) => {
                    let to = if *dangling { "nowhere".to_string() } else { list };
                    store.move_item(&id, to, now)
                }
                Mutation::Deadline(_, set) => {
                    let deadline = set.then(|| Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
                    store.set_deadline(&id, deadline, now)
                }
                Mutation::CreateList(n) => {
                    store.create_list(n.clone(), now);
                    Ok(())
                }
            }
        }

        proptest! {
            #[test]
            fn prop_successful_mutations_strictly_advance_clock(
                steps in prop::collection::vec((arb_mutation(), 0u64..10_000), 1..40),
            ) {
                let mut store = Store::new();
                for (mutation, now) in &steps {
                    let before = store.last_update();
                    if apply(&mut store, mutation, *now).is_ok() {
                        prop_assert!(store.last_update() > before);
                    }
                }
            }

            #[test]
            fn prop_failed_mutations_change_nothing(
                steps in prop::collection::vec((arb_mutation(), 0u64..10_000), 1..40),
            ) {
                let mut store = Store::new();
                for (mutation, now) in &steps {
                    let before = store.clone();
                    if let Err(e) = apply(&mut store, mutation, *now) {
                        prop_assert!(e.is_not_found());
                        prop_assert_eq!(&store, &before);
                    }
                }
            }

            #[test]
            fn prop_newer_snapshot_always_wins(
                local_now in 1u64..1_000_000,
                remote_version in 1u64..2_000_000,
            ) {
                let mut store = Store::new();
                let list = store.first_list_id().unwrap().clone();
                store.add_item(list, "local", local_now);
                let before = store.clone();

                let remote = StoreSnapshot {
                    todo_lists: vec![TodoList::with_id("r", "Remote")],
                    todo_items: vec![],
                    last_update: remote_version,
                };
                let outcome = store.reconcile(&SyncPayload::newer(remote.to_json().unwrap()));

                if remote_version > before.last_update() {
                    prop_assert!(outcome.is_replaced());
                    prop_assert_eq!(store.export_state(), remote);
                } else {
                    prop_assert_eq!(&store, &before);
                }
            }
        }
    }
}
