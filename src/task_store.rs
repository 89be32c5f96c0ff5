use std::fmt;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use tracing::debug;

use crate::task::{Task, TaskFields, TaskId, TaskPatch, TaskStatus};

const DEMO_TASKS: &str = include_str!("demo_tasks.json");

/// Source of "now" for task timestamps.
pub trait Clock: fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The ordered, in-memory task collection.
///
/// Every operation is synchronous and all-or-nothing. Operations addressed to
/// an id that is not in the store leave it untouched and report `false`.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    editing: Option<TaskId>,
    clock: Box<dyn Clock>,
}

impl TaskStore {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            tasks: Vec::new(),
            editing: None,
            clock: Box::new(clock),
        }
    }

    /// A store pre-filled with the sample tasks shown on first launch.
    pub fn with_demo_tasks(clock: impl Clock + 'static) -> Result<Self, serde_json::Error> {
        let mut store = Self::new(clock);
        store.tasks = serde_json::from_str(DEMO_TASKS)?;
        debug!(count = store.tasks.len(), "seeded demo tasks");
        Ok(store)
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn by_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |task| task.status == status)
    }

    pub fn completed_count(&self) -> usize {
        self.by_status(TaskStatus::Done).count()
    }

    /// Appends a new task and returns its id. `createdAt == updatedAt`.
    pub fn create(&mut self, fields: TaskFields) -> TaskId {
        let id = self.fresh_id();
        let stamp = self.stamp_after(None);
        debug!(%id, title = %fields.title, "created task");
        self.tasks.push(Task::new(id.clone(), fields, stamp));
        id
    }

    /// Merges `patch` onto the task in place and refreshes `updatedAt`.
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> bool {
        let Some(index) = self.position(id) else {
            debug!(%id, "update skipped, no such task");
            return false;
        };
        let stamp = self.stamp_after(Some(self.tasks[index].updated_at));
        let task = &mut self.tasks[index];
        task.merge(patch);
        task.updated_at = stamp;
        debug!(%id, status = %task.status, "updated task");
        true
    }

    /// Unconditional removal; confirmation happens in the dashboard.
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let Some(index) = self.position(id) else {
            debug!(%id, "delete skipped, no such task");
            return false;
        };
        self.tasks.remove(index);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        debug!(%id, remaining = self.tasks.len(), "deleted task");
        true
    }

    /// Sets the status to done. Already-done and unknown tasks are left as is.
    pub fn mark_complete(&mut self, id: &TaskId) -> bool {
        match self.get(id) {
            Some(task) if task.status == TaskStatus::Done => {
                debug!(%id, "task already done");
                false
            }
            _ => self.update(id, TaskPatch::status(TaskStatus::Done)),
        }
    }

    /// Marks `id` as the task under edit. Unknown ids leave the reference unset.
    pub fn begin_edit(&mut self, id: &TaskId) -> Option<&Task> {
        let index = self.position(id)?;
        self.editing = Some(id.clone());
        self.tasks.get(index)
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref().and_then(|id| self.get(id))
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    // Stamps are kept at millisecond precision, the resolution they are
    // serialized with, and always move past `previous`.
    fn stamp_after(&self, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = self.clock.now().trunc_subsecs(3);
        match previous {
            Some(previous) if now <= previous => previous + TimeDelta::milliseconds(1),
            _ => now,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_clock::ManualClock;
    use super::*;
    use crate::task::{DueDate, TaskPriority};
    use proptest::prelude::*;

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee: "X".to_string(),
            due_date: "2026-03-01".parse().unwrap(),
        }
    }

    fn store() -> (TaskStore, ManualClock) {
        let clock = ManualClock::new();
        (TaskStore::new(clock.clone()), clock)
    }

    #[test]
    fn create_appends_one_task_with_equal_stamps() {
        let (mut store, _) = store();
        let id = store.create(fields("A"));

        assert_eq!(store.len(), 1);
        let task = &store.list()[0];
        assert_eq!(task.id, id);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.due_date.to_string(), "2026-03-01T00:00:00.000Z");
    }

    #[test]
    fn creates_within_one_clock_tick_get_distinct_ids() {
        let (mut store, _) = store();
        let a = store.create(fields("A"));
        let b = store.create(fields("B"));
        assert_ne!(a, b);
        assert_eq!(store.list()[0].title, "A");
        assert_eq!(store.list()[1].title, "B");
    }

    #[test]
    fn update_preserves_identity_and_position() {
        let (mut store, clock) = store();
        let first = store.create(fields("A"));
        let second = store.create(fields("B"));
        let before = store.get(&second).unwrap().clone();

        clock.advance_ms(1_500);
        let patch = TaskPatch {
            title: Some("B2".into()),
            priority: Some(TaskPriority::Urgent),
            ..TaskPatch::default()
        };
        assert!(store.update(&second, patch));

        let after = store.get(&second).unwrap();
        assert_eq!(after.title, "B2");
        assert_eq!(after.priority, TaskPriority::Urgent);
        assert_eq!(after.description, before.description);
        assert_eq!(after.assignee, before.assignee);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(store.list()[0].id, first);
        assert_eq!(store.list()[1].id, second);
    }

    #[test]
    fn update_advances_stamp_even_when_clock_is_frozen() {
        let (mut store, _) = store();
        let id = store.create(fields("A"));
        let created = store.get(&id).unwrap().updated_at;

        assert!(store.update(&id, TaskPatch::default()));
        let first = store.get(&id).unwrap().updated_at;
        assert!(first > created);

        assert!(store.update(&id, TaskPatch::default()));
        assert!(store.get(&id).unwrap().updated_at > first);
    }

    #[test]
    fn operations_on_unknown_ids_are_no_ops() {
        let (mut store, clock) = store();
        store.create(fields("A"));
        let snapshot = store.list().to_vec();
        let missing = TaskId::new("task-missing");

        clock.advance_ms(10);
        assert!(!store.update(&missing, TaskPatch::status(TaskStatus::Testing)));
        assert!(!store.delete(&missing));
        assert!(!store.mark_complete(&missing));
        assert_eq!(store.list(), snapshot.as_slice());
    }

    #[test]
    fn mark_complete_sets_done_and_advances_stamp() {
        let (mut store, clock) = store();
        let id = store.create(fields("A"));
        let before = store.get(&id).unwrap().updated_at;

        clock.advance_ms(1);
        assert!(store.mark_complete(&id));
        let task = store.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.updated_at > before);
        assert_eq!(store.completed_count(), 1);
    }

    #[test]
    fn mark_complete_twice_leaves_task_unchanged() {
        let (mut store, clock) = store();
        let id = store.create(fields("A"));
        store.mark_complete(&id);
        let done = store.get(&id).unwrap().clone();

        clock.advance_ms(1_000);
        assert!(!store.mark_complete(&id));
        assert_eq!(store.get(&id), Some(&done));
    }

    #[test]
    fn delete_removes_only_the_target() {
        let (mut store, _) = store();
        let first = store.create(fields("A"));
        let second = store.create(fields("B"));
        let kept = store.get(&second).unwrap().clone();

        assert!(store.delete(&first));
        assert_eq!(store.list(), &[kept]);
    }

    #[test]
    fn edit_reference_tracks_existing_tasks_only() {
        let (mut store, _) = store();
        let id = store.create(fields("A"));

        assert!(store.begin_edit(&TaskId::new("nope")).is_none());
        assert!(store.editing().is_none());

        assert_eq!(store.begin_edit(&id).map(|t| t.title.as_str()), Some("A"));
        assert_eq!(store.editing().map(|t| &t.id), Some(&id));

        store.delete(&id);
        assert!(store.editing().is_none());
    }

    #[test]
    fn demo_tasks_load_in_order() {
        let store = TaskStore::with_demo_tasks(ManualClock::new()).unwrap();
        let ids: Vec<_> = store.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["task-1", "task-2", "task-3", "task-4"]);
        assert_eq!(store.completed_count(), 0);
        assert_eq!(store.by_status(TaskStatus::InProgress).count(), 2);
        assert_eq!(
            store.list()[3].due_date,
            "2026-01-18".parse::<DueDate>().unwrap()
        );
    }

    fn arb_fields() -> impl Strategy<Value = TaskFields> {
        (
            "[A-Za-z ]{1,12}",
            "[a-z ]{0,20}",
            prop::sample::select(TaskStatus::ALL.to_vec()),
            prop::sample::select(TaskPriority::ALL.to_vec()),
            "[A-Za-z]{1,8}",
            (2020i32..2030, 1u32..=12, 1u32..=28),
        )
            .prop_map(|(title, description, status, priority, assignee, (y, m, d))| {
                TaskFields {
                    title,
                    description,
                    status,
                    priority,
                    assignee,
                    due_date: DueDate::new(chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()),
                }
            })
    }

    proptest! {
        #[test]
        fn create_always_yields_a_fresh_id(batch in prop::collection::vec(arb_fields(), 1..20)) {
            let (mut store, _) = store();
            for (n, fields) in batch.into_iter().enumerate() {
                let existing: Vec<TaskId> = store.list().iter().map(|t| t.id.clone()).collect();
                let id = store.create(fields.clone());
                prop_assert!(!existing.contains(&id));
                prop_assert_eq!(store.len(), n + 1);
                let task = store.list().last().unwrap();
                prop_assert_eq!(task.created_at, task.updated_at);
                prop_assert_eq!(task.fields(), fields);
            }
        }

        #[test]
        fn full_update_changes_only_editable_fields(
            seed in prop::collection::vec(arb_fields(), 2..6),
            pick in any::<prop::sample::Index>(),
            replacement in arb_fields(),
        ) {
            let (mut store, _) = store();
            for fields in seed {
                store.create(fields);
            }
            let before = store.list().to_vec();
            let target = pick.get(&before).id.clone();

            prop_assert!(store.update(&target, replacement.clone().into()));

            prop_assert_eq!(store.len(), before.len());
            for (old, new) in before.iter().zip(store.list()) {
                prop_assert_eq!(&old.id, &new.id);
                if old.id == target {
                    prop_assert_eq!(new.fields(), replacement.clone());
                    prop_assert_eq!(new.created_at, old.created_at);
                    prop_assert!(new.updated_at > old.updated_at);
                } else {
                    prop_assert_eq!(old, new);
                }
            }
        }

        #[test]
        fn mark_complete_converges_to_done(fields in arb_fields(), repeats in 1usize..4) {
            let (mut store, _) = store();
            let id = store.create(fields);
            for _ in 0..repeats {
                store.mark_complete(&id);
            }
            prop_assert_eq!(store.get(&id).map(|t| t.status), Some(TaskStatus::Done));
        }
    }
}
