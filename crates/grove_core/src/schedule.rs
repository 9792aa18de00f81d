//! Named periodic and one-shot tasks over a millisecond timeline.
//!
//! Every task is registered under a [`Task`] key, so a key is scheduled at
//! most once. Tasks fire earliest-due first; tasks due at the same instant
//! fire in registration order. Periodic tasks are re-armed before they are
//! handed out, which lets the handler cancel or hold its own task.
//!
//! Suspension comes in two flavours. [`Scheduler::hold`] parks a single task
//! (the flood check during its cooldown) until [`Scheduler::release`].
//! [`Scheduler::pause`] parks every active task and [`Scheduler::resume`]
//! restores exactly that set. Both keep the time that was left, so a task
//! never gains or loses phase across a suspension.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::clock::Millis;

/// Keys of everything the session runs on a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Co2Growth,
    SkySync,
    TemperatureDrift,
    DayIncrement,
    ProductionRefresh,
    FloodCheck,
    FloodCooldown,
    ReclaimCheck,
    ReclaimCooldown,
    /// Ripening timer of the production unit on the given tile.
    TreeReady(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    Every(Millis),
    Once(Millis),
}

impl Cadence {
    pub fn period(self) -> Millis {
        match self {
            Cadence::Every(period) | Cadence::Once(period) => period,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Active { due: Millis },
    /// Suspended on its own; survives pause/resume untouched.
    Held { remaining: Millis },
    /// Suspended by a scheduler-wide pause.
    Paused { remaining: Millis },
}

#[derive(Clone, Debug)]
struct Entry {
    cadence: Cadence,
    state: TaskState,
    seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    now: Millis,
    next_seq: u64,
    paused: bool,
    entries: BTreeMap<Task, Entry>,
}

impl Scheduler {
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Register `task` to fire every `period` milliseconds, replacing any
    /// previous registration under the same key.
    pub fn schedule_interval(&mut self, task: Task, period: Millis) {
        self.insert(task, Cadence::Every(period.max(1)));
    }

    /// Register `task` to fire once after `delay` milliseconds.
    pub fn schedule_once(&mut self, task: Task, delay: Millis) {
        self.insert(task, Cadence::Once(delay));
    }

    /// Restart a registered task with its full period from now.
    pub fn reschedule_once(&mut self, task: Task) -> bool {
        match self.entries.get(&task).map(|entry| entry.cadence) {
            Some(cadence) => {
                self.insert(task, cadence);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, task: Task) -> bool {
        self.entries.remove(&task).is_some()
    }

    /// Suspend a single task, keeping the time it had left.
    pub fn hold(&mut self, task: Task) -> bool {
        let now = self.now;
        match self.entries.get_mut(&task) {
            Some(entry) => {
                entry.state = match entry.state {
                    TaskState::Active { due } => TaskState::Held {
                        remaining: due.saturating_sub(now),
                    },
                    TaskState::Paused { remaining } | TaskState::Held { remaining } => {
                        TaskState::Held { remaining }
                    }
                };
                true
            }
            None => false,
        }
    }

    /// Undo [`Scheduler::hold`]. A task released while the scheduler is
    /// paused joins the paused set and comes back on resume.
    pub fn release(&mut self, task: Task) -> bool {
        let now = self.now;
        let paused = self.paused;
        match self.entries.get_mut(&task) {
            Some(entry) => {
                if let TaskState::Held { remaining } = entry.state {
                    entry.state = if paused {
                        TaskState::Paused { remaining }
                    } else {
                        TaskState::Active {
                            due: now.saturating_add(remaining),
                        }
                    };
                }
                true
            }
            None => false,
        }
    }

    /// Suspend every active task.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        let now = self.now;
        for entry in self.entries.values_mut() {
            if let TaskState::Active { due } = entry.state {
                entry.state = TaskState::Paused {
                    remaining: due.saturating_sub(now),
                };
            }
        }
        self.paused = true;
    }

    /// Reactivate exactly the tasks suspended by [`Scheduler::pause`].
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        let now = self.now;
        for entry in self.entries.values_mut() {
            if let TaskState::Paused { remaining } = entry.state {
                entry.state = TaskState::Active {
                    due: now.saturating_add(remaining),
                };
            }
        }
        self.paused = false;
    }

    /// Drop every task and leave the scheduler running.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.paused = false;
    }

    pub fn contains(&self, task: Task) -> bool {
        self.entries.contains_key(&task)
    }

    pub fn state(&self, task: Task) -> Option<TaskState> {
        self.entries.get(&task).map(|entry| entry.state)
    }

    pub fn cadence(&self, task: Task) -> Option<Cadence> {
        self.entries.get(&task).map(|entry| entry.cadence)
    }

    /// Instant at which `task` fires next, if it is active.
    pub fn due(&self, task: Task) -> Option<Millis> {
        match self.state(task)? {
            TaskState::Active { due } => Some(due),
            _ => None,
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the next task due at or before `until`, moving the scheduler's
    /// clock to its due instant.
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, Task)> {
        let (task, due) = self
            .entries
            .iter()
            .filter_map(|(task, entry)| match entry.state {
                TaskState::Active { due } if due <= until => Some((*task, due, entry.seq)),
                _ => None,
            })
            .min_by_key(|&(_, due, seq)| (due, seq))
            .map(|(task, due, _)| (task, due))?;

        self.now = self.now.max(due);
        let cadence = self.entries.get(&task).map(|entry| entry.cadence)?;
        match cadence {
            Cadence::Every(period) => {
                if let Some(entry) = self.entries.get_mut(&task) {
                    entry.state = TaskState::Active {
                        due: due.saturating_add(period),
                    };
                }
            }
            Cadence::Once(_) => {
                self.entries.remove(&task);
            }
        }
        Some((due, task))
    }

    /// Move the clock to `until` once every due task has been taken.
    pub fn settle(&mut self, until: Millis) {
        self.now = self.now.max(until);
    }

    fn insert(&mut self, task: Task, cadence: Cadence) {
        let remaining = cadence.period();
        let state = if self.paused {
            TaskState::Paused { remaining }
        } else {
            TaskState::Active {
                due: self.now.saturating_add(remaining),
            }
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            task,
            Entry {
                cadence,
                state,
                seq,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, until: Millis) -> Vec<(Millis, Task)> {
        let mut fired = Vec::new();
        while let Some(entry) = scheduler.pop_due(until) {
            fired.push(entry);
        }
        scheduler.settle(until);
        fired
    }

    #[test]
    fn periodic_tasks_fire_in_due_then_registration_order() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::DayIncrement, 2_000);
        scheduler.schedule_interval(Task::ProductionRefresh, 1_000);
        scheduler.schedule_interval(Task::TemperatureDrift, 2_000);

        let fired = drain(&mut scheduler, 4_000);
        assert_eq!(
            fired,
            vec![
                (1_000, Task::ProductionRefresh),
                (2_000, Task::DayIncrement),
                (2_000, Task::ProductionRefresh),
                (2_000, Task::TemperatureDrift),
                (3_000, Task::ProductionRefresh),
                (4_000, Task::DayIncrement),
                (4_000, Task::ProductionRefresh),
                (4_000, Task::TemperatureDrift),
            ]
        );
        assert_eq!(scheduler.now(), 4_000);
    }

    #[test]
    fn one_shot_fires_once_and_can_be_restarted() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_once(Task::TreeReady(19), 5_000);
        assert_eq!(drain(&mut scheduler, 4_999), vec![]);
        assert_eq!(drain(&mut scheduler, 5_000), vec![(5_000, Task::TreeReady(19))]);
        assert!(!scheduler.contains(Task::TreeReady(19)));
        assert!(!scheduler.reschedule_once(Task::TreeReady(19)));

        scheduler.schedule_once(Task::TreeReady(19), 5_000);
        drain(&mut scheduler, 7_000);
        assert!(scheduler.reschedule_once(Task::TreeReady(19)));
        assert_eq!(scheduler.due(Task::TreeReady(19)), Some(12_000));
    }

    #[test]
    fn cancel_prevents_future_firings() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::FloodCheck, 2_000);
        drain(&mut scheduler, 2_000);
        assert!(scheduler.cancel(Task::FloodCheck));
        assert!(drain(&mut scheduler, 10_000).is_empty());
        assert!(!scheduler.cancel(Task::FloodCheck));
    }

    #[test]
    fn periodic_task_is_rearmed_before_it_is_handed_out() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::FloodCheck, 2_000);
        let (at, task) = scheduler.pop_due(2_000).unwrap();
        assert_eq!((at, task), (2_000, Task::FloodCheck));
        assert_eq!(scheduler.due(Task::FloodCheck), Some(4_000));
        assert!(scheduler.hold(Task::FloodCheck));
        assert_eq!(
            scheduler.state(Task::FloodCheck),
            Some(TaskState::Held { remaining: 2_000 })
        );
    }

    #[test]
    fn pause_and_resume_shift_due_times_by_the_paused_span() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::DayIncrement, 2_000);
        scheduler.schedule_once(Task::TreeReady(3), 5_000);
        drain(&mut scheduler, 3_000);

        scheduler.pause();
        assert!(drain(&mut scheduler, 20_000).is_empty());
        scheduler.resume();

        assert_eq!(scheduler.due(Task::DayIncrement), Some(21_000));
        assert_eq!(scheduler.due(Task::TreeReady(3)), Some(22_000));
    }

    #[test]
    fn held_tasks_stay_held_across_pause() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::FloodCheck, 2_000);
        scheduler.schedule_once(Task::FloodCooldown, 10_000);
        scheduler.hold(Task::FloodCheck);

        scheduler.pause();
        scheduler.settle(4_000);
        scheduler.resume();
        assert_eq!(
            scheduler.state(Task::FloodCheck),
            Some(TaskState::Held { remaining: 2_000 })
        );
        assert_eq!(scheduler.due(Task::FloodCooldown), Some(14_000));

        scheduler.settle(14_000);
        scheduler.release(Task::FloodCheck);
        assert_eq!(scheduler.due(Task::FloodCheck), Some(16_000));
    }

    #[test]
    fn release_while_paused_waits_for_resume() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::ReclaimCheck, 2_000);
        scheduler.hold(Task::ReclaimCheck);
        scheduler.pause();
        scheduler.release(Task::ReclaimCheck);
        assert_eq!(
            scheduler.state(Task::ReclaimCheck),
            Some(TaskState::Paused { remaining: 2_000 })
        );
        scheduler.settle(1_000);
        scheduler.resume();
        assert_eq!(scheduler.due(Task::ReclaimCheck), Some(3_000));
    }

    #[test]
    fn clear_drops_everything_and_unpauses() {
        let mut scheduler = Scheduler::new(0);
        scheduler.schedule_interval(Task::Co2Growth, 25);
        scheduler.schedule_once(Task::TreeReady(0), 5_000);
        scheduler.pause();
        scheduler.clear();
        assert!(scheduler.is_empty());
        assert!(!scheduler.is_paused());
    }

    #[test]
    fn tasks_scheduled_while_paused_start_paused() {
        let mut scheduler = Scheduler::new(100);
        scheduler.pause();
        scheduler.schedule_once(Task::TreeReady(4), 5_000);
        assert_eq!(
            scheduler.state(Task::TreeReady(4)),
            Some(TaskState::Paused { remaining: 5_000 })
        );
    }
}
