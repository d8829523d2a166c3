//! Task timer state machine.
//!
//! Owns the ordered task list, the draft form values and a single shared
//! countdown. Only one task runs at a time. The countdown itself is advanced
//! from outside by [`crate::scheduler::Ticker`].
//!
//! Editing and running references are stable task ids, resolved to list
//! positions only when read.

use crate::model::{Task, TaskId, TimeUnit, TimerError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_COUNTDOWN_SECS: u64 = 60;

/// Where `start_task` takes the countdown value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountdownPolicy {
    /// Every task counts down from the shared default, whatever its duration.
    #[default]
    ResetToDefault,
    /// A started task counts down from its own stored duration.
    ResumeTaskDuration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub duration: u64,
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, Copy)]
pub struct TimerSettings {
    pub default_secs: u64,
    pub default_unit: TimeUnit,
    pub policy: CountdownPolicy,
}

impl Default for TimerSettings {
    fn default() -> Self {
        TimerSettings {
            default_secs: DEFAULT_COUNTDOWN_SECS,
            default_unit: TimeUnit::Second,
            policy: CountdownPolicy::ResetToDefault,
        }
    }
}

#[derive(Debug)]
pub struct FocusTimer {
    settings: TimerSettings,
    tasks: Vec<Task>,
    draft: Draft,
    editing: Option<TaskId>,
    running: Option<TaskId>,
    remaining_secs: u64,
    run_epoch: u64,
}

impl FocusTimer {
    pub fn new(settings: TimerSettings) -> Self {
        FocusTimer {
            draft: Draft {
                text: String::new(),
                duration: settings.default_secs,
                unit: settings.default_unit,
            },
            settings,
            tasks: Vec::new(),
            editing: None,
            running: None,
            remaining_secs: settings.default_secs,
            run_epoch: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn running_id(&self) -> Option<&TaskId> {
        self.running.as_ref()
    }

    /// Bumped on every successful start, so two runs of the same task with
    /// the same countdown value are still distinguishable.
    pub fn run_epoch(&self) -> u64 {
        self.run_epoch
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing.as_ref().and_then(|id| self.position(id))
    }

    pub fn running_index(&self) -> Option<usize> {
        self.running.as_ref().and_then(|id| self.position(id))
    }

    pub fn running_task(&self) -> Option<&Task> {
        self.running_index().map(|idx| &self.tasks[idx])
    }

    /// True while the countdown is live and still above zero.
    pub fn is_running(&self) -> bool {
        self.running.is_some() && self.remaining_secs > 0
    }

    /// A task reached zero. It stays the running task until the next
    /// transition.
    pub fn is_finished(&self) -> bool {
        self.running.is_some() && self.remaining_secs == 0
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn set_draft_duration(&mut self, duration: u64) {
        self.draft.duration = duration;
    }

    pub fn set_draft_unit(&mut self, unit: TimeUnit) {
        self.draft.unit = unit;
    }

    /// Parses a typed duration into the draft. Non-numeric input leaves the
    /// draft untouched.
    pub fn set_draft_duration_input(&mut self, input: &str) -> Result<(), TimerError> {
        let duration = input
            .trim()
            .parse::<u64>()
            .map_err(|_| TimerError::InvalidDuration(input.to_string()))?;
        self.draft.duration = duration;
        Ok(())
    }

    pub fn add_task(&mut self) -> Result<TaskId, TimerError> {
        let text = self.draft.text.trim();
        if text.is_empty() {
            return Err(TimerError::EmptyText);
        }
        let id = self.fresh_id();
        let task = Task::new(id.clone(), text.to_string(), self.draft.duration, self.draft.unit);
        info!(id = %id, seconds = task.duration, unit = %task.unit, "task added");
        self.tasks.push(task);
        self.reset_draft();
        self.editing = None;
        self.stop_countdown();
        Ok(id)
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<(), TimerError> {
        let task = self
            .tasks
            .get(index)
            .ok_or(TimerError::IndexOutOfRange(index))?;
        self.draft = Draft {
            text: task.text.clone(),
            duration: task.duration,
            unit: task.unit,
        };
        debug!(id = %task.id, index, "editing task");
        self.editing = Some(task.id.clone());
        self.stop_countdown();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.reset_draft();
    }

    pub fn update_task(&mut self) -> Result<(), TimerError> {
        let text = self.draft.text.trim();
        if text.is_empty() {
            return Err(TimerError::EmptyText);
        }
        let index = match self.editing_index() {
            Some(idx) => idx,
            None => return Err(TimerError::NotEditing),
        };
        let id = self.tasks[index].id.clone();
        let task = Task::new(id.clone(), text.to_string(), self.draft.duration, self.draft.unit);
        info!(id = %id, index, seconds = task.duration, "task updated");
        self.tasks[index] = task;
        self.reset_draft();
        self.editing = None;
        self.stop_countdown();
        Ok(())
    }

    pub fn delete_task(&mut self, index: usize) -> Result<Task, TimerError> {
        if index >= self.tasks.len() {
            return Err(TimerError::IndexOutOfRange(index));
        }
        let removed = self.tasks.remove(index);
        info!(id = %removed.id, index, "task deleted");
        if self.editing.as_ref() == Some(&removed.id) {
            self.editing = None;
            self.reset_draft();
        }
        if self.running.as_ref() == Some(&removed.id) {
            self.stop_countdown();
        }
        Ok(removed)
    }

    pub fn start_task(&mut self) -> Result<TaskId, TimerError> {
        if self.running.is_some() {
            return Err(TimerError::AlreadyRunning);
        }
        let index = match (self.editing_index(), self.tasks.len()) {
            (_, 0) => return Err(TimerError::NothingToStart),
            (Some(idx), _) => idx,
            (None, len) => len - 1,
        };
        let target = &self.tasks[index];
        let countdown = match self.settings.policy {
            CountdownPolicy::ResetToDefault => self.remaining_secs,
            CountdownPolicy::ResumeTaskDuration => target.duration,
        };
        if countdown == 0 {
            return Err(TimerError::CountdownExhausted);
        }
        info!(id = %target.id, index, remaining = countdown, "task started");
        self.running = Some(target.id.clone());
        self.remaining_secs = countdown;
        self.run_epoch += 1;
        Ok(target.id.clone())
    }

    /// Advances the countdown by one second. Returns false when there was
    /// nothing to advance.
    pub fn tick(&mut self) -> bool {
        if self.running.is_none() || self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            if let Some(id) = &self.running {
                info!(id = %id, "countdown finished");
            }
        }
        true
    }

    fn stop_countdown(&mut self) {
        self.running = None;
        self.remaining_secs = self.settings.default_secs;
    }

    fn reset_draft(&mut self) {
        self.draft = Draft {
            text: String::new(),
            duration: self.settings.default_secs,
            unit: self.settings.default_unit,
        };
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        FocusTimer::new(TimerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn add(timer: &mut FocusTimer, text: &str, duration: u64, unit: TimeUnit) -> TaskId {
        timer.set_draft_text(text);
        timer.set_draft_duration(duration);
        timer.set_draft_unit(unit);
        timer.add_task().expect("task added")
    }

    fn texts(timer: &FocusTimer) -> Vec<&str> {
        timer.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_add_normalizes_to_seconds() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 2, TimeUnit::Hour);
        add(&mut timer, "b", 2, TimeUnit::Minute);
        add(&mut timer, "c", 2, TimeUnit::Second);
        let stored: Vec<(u64, TimeUnit)> =
            timer.tasks().iter().map(|t| (t.duration, t.unit)).collect();
        assert_eq!(
            stored,
            vec![
                (7200, TimeUnit::Hour),
                (120, TimeUnit::Minute),
                (2, TimeUnit::Second)
            ]
        );
    }

    #[test]
    fn test_add_trims_and_resets_draft() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "  Write report  ", 5, TimeUnit::Minute);
        assert_eq!(timer.tasks()[0].text, "Write report");
        assert_eq!(
            timer.draft(),
            &Draft {
                text: String::new(),
                duration: DEFAULT_COUNTDOWN_SECS,
                unit: TimeUnit::Second,
            }
        );
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut timer = FocusTimer::default();
        for text in ["", "   "] {
            timer.set_draft_text(text);
            assert_eq!(timer.add_task(), Err(TimerError::EmptyText));
        }
        assert!(timer.tasks().is_empty());
    }

    #[test]
    fn test_begin_edit_prefills_draft() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "first", 1, TimeUnit::Second);
        add(&mut timer, "second", 3, TimeUnit::Minute);
        timer.begin_edit(1).unwrap();
        let task = &timer.tasks()[1];
        assert_eq!(
            timer.draft(),
            &Draft {
                text: task.text.clone(),
                duration: task.duration,
                unit: task.unit,
            }
        );
        assert_eq!(timer.editing_index(), Some(1));
    }

    #[test]
    fn test_begin_edit_out_of_range() {
        let mut timer = FocusTimer::default();
        assert_eq!(timer.begin_edit(0), Err(TimerError::IndexOutOfRange(0)));
        assert_eq!(timer.editing_index(), None);
    }

    #[test]
    fn test_begin_edit_stops_running_task() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Minute);
        timer.start_task().unwrap();
        timer.tick();
        timer.begin_edit(0).unwrap();
        assert_eq!(timer.running_index(), None);
        assert_eq!(timer.remaining_secs(), DEFAULT_COUNTDOWN_SECS);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Second);
        let b = add(&mut timer, "b", 1, TimeUnit::Second);
        add(&mut timer, "c", 1, TimeUnit::Second);
        timer.begin_edit(1).unwrap();
        timer.set_draft_text("b2");
        timer.set_draft_duration(4);
        timer.set_draft_unit(TimeUnit::Minute);
        timer.update_task().unwrap();

        assert_eq!(texts(&timer), vec!["a", "b2", "c"]);
        assert_eq!(timer.tasks()[1].id, b);
        assert_eq!(timer.tasks()[1].duration, 240);
        assert_eq!(timer.editing_index(), None);
        assert_eq!(timer.draft().text, "");
    }

    #[test]
    fn test_update_requires_edit_and_text() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Second);
        timer.set_draft_text("x");
        assert_eq!(timer.update_task(), Err(TimerError::NotEditing));

        timer.begin_edit(0).unwrap();
        timer.set_draft_text("  ");
        assert_eq!(timer.update_task(), Err(TimerError::EmptyText));
        assert_eq!(texts(&timer), vec!["a"]);
        assert_eq!(timer.editing_index(), Some(0));
    }

    #[test]
    fn test_delete_shifts_indices() {
        let mut timer = FocusTimer::default();
        for text in ["a", "b", "c", "d"] {
            add(&mut timer, text, 1, TimeUnit::Second);
        }
        let removed = timer.delete_task(1).unwrap();
        assert_eq!(removed.text, "b");
        assert_eq!(texts(&timer), vec!["a", "c", "d"]);
        assert_eq!(timer.delete_task(3), Err(TimerError::IndexOutOfRange(3)));
    }

    #[test]
    fn test_delete_keeps_references_to_surviving_tasks() {
        let mut timer = FocusTimer::default();
        for text in ["a", "b", "c"] {
            add(&mut timer, text, 1, TimeUnit::Second);
        }
        timer.begin_edit(2).unwrap();
        timer.delete_task(0).unwrap();
        assert_eq!(timer.editing_index(), Some(1));
        assert_eq!(timer.draft().text, "c");
    }

    #[test]
    fn test_delete_clears_dangling_references() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Second);
        add(&mut timer, "b", 1, TimeUnit::Second);
        timer.start_task().unwrap();
        timer.tick();
        timer.delete_task(1).unwrap();
        assert_eq!(timer.running_index(), None);
        assert_eq!(timer.remaining_secs(), DEFAULT_COUNTDOWN_SECS);

        timer.begin_edit(0).unwrap();
        timer.delete_task(0).unwrap();
        assert_eq!(timer.editing_index(), None);
        assert_eq!(timer.draft().text, "");
    }

    #[test]
    fn test_start_uses_last_task_or_edited_task() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Second);
        add(&mut timer, "b", 1, TimeUnit::Second);
        timer.start_task().unwrap();
        assert_eq!(timer.running_index(), Some(1));

        timer.begin_edit(0).unwrap();
        timer.start_task().unwrap();
        assert_eq!(timer.running_index(), Some(0));
    }

    #[test]
    fn test_start_guards() {
        let mut timer = FocusTimer::default();
        assert_eq!(timer.start_task(), Err(TimerError::NothingToStart));

        add(&mut timer, "a", 1, TimeUnit::Second);
        add(&mut timer, "b", 1, TimeUnit::Second);
        timer.start_task().unwrap();
        assert_eq!(timer.start_task(), Err(TimerError::AlreadyRunning));
        assert_eq!(timer.running_index(), Some(1));
    }

    #[test]
    fn test_zero_default_cannot_start() {
        let mut timer = FocusTimer::new(TimerSettings {
            default_secs: 0,
            ..TimerSettings::default()
        });
        add(&mut timer, "a", 1, TimeUnit::Second);
        assert_eq!(timer.start_task(), Err(TimerError::CountdownExhausted));
        assert_eq!(timer.running_index(), None);
    }

    #[test]
    fn test_tick_counts_down_to_zero_and_stops() {
        let mut timer = FocusTimer::new(TimerSettings {
            default_secs: 3,
            ..TimerSettings::default()
        });
        assert!(!timer.tick());
        add(&mut timer, "a", 1, TimeUnit::Second);
        timer.start_task().unwrap();
        let mut seen = Vec::new();
        while timer.tick() {
            seen.push(timer.remaining_secs());
        }
        assert_eq!(seen, vec![2, 1, 0]);
        assert!(timer.is_finished());
        assert!(!timer.is_running());
        assert_eq!(timer.running_index(), Some(0));
        assert_eq!(timer.start_task(), Err(TimerError::AlreadyRunning));
    }

    #[test]
    fn test_resume_policy_uses_task_duration() {
        let mut timer = FocusTimer::new(TimerSettings {
            policy: CountdownPolicy::ResumeTaskDuration,
            ..TimerSettings::default()
        });
        add(&mut timer, "long", 2, TimeUnit::Minute);
        add(&mut timer, "empty", 0, TimeUnit::Second);
        assert_eq!(timer.start_task(), Err(TimerError::CountdownExhausted));

        timer.begin_edit(0).unwrap();
        timer.start_task().unwrap();
        assert_eq!(timer.remaining_secs(), 120);
    }

    #[test]
    fn test_adding_clears_running_and_editing() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "a", 1, TimeUnit::Second);
        timer.start_task().unwrap();
        timer.tick();
        add(&mut timer, "b", 1, TimeUnit::Second);
        assert_eq!(timer.running_index(), None);
        assert_eq!(timer.editing_index(), None);
        assert_eq!(timer.remaining_secs(), DEFAULT_COUNTDOWN_SECS);
    }

    #[test]
    fn test_draft_duration_input() {
        let mut timer = FocusTimer::default();
        timer.set_draft_duration_input(" 25 ").unwrap();
        assert_eq!(timer.draft().duration, 25);
        assert_eq!(
            timer.set_draft_duration_input("abc"),
            Err(TimerError::InvalidDuration("abc".into()))
        );
        assert_eq!(timer.draft().duration, 25);
    }

    #[test]
    fn test_write_report_scenario() {
        let mut timer = FocusTimer::default();
        add(&mut timer, "Write report", 2, TimeUnit::Minute);
        assert_eq!(timer.tasks()[0].duration, 120);

        timer.start_task().unwrap();
        assert_eq!(timer.running_index(), Some(0));
        assert_eq!(timer.remaining_secs(), 60);

        for _ in 0..5 {
            assert!(timer.tick());
        }
        assert_eq!(timer.remaining_secs(), 55);
    }
}
