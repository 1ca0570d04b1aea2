/// Periodic work registered for the lifetime of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerTask {
    Countdown,
    Spawn,
    Cleanup,
    Magnet,
    Bomb,
    Poison,
}

impl TimerTask {
    pub const ALL: [TimerTask; 6] = [
        TimerTask::Countdown,
        TimerTask::Spawn,
        TimerTask::Cleanup,
        TimerTask::Magnet,
        TimerTask::Bomb,
        TimerTask::Poison,
    ];

    pub fn period_ms(self) -> u64 {
        match self {
            Self::Countdown => 1_000,
            Self::Spawn => 2_000,
            Self::Cleanup => 10_000,
            Self::Magnet => 500,
            Self::Bomb => 100,
            Self::Poison => 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    task: TimerTask,
    next_due: u64,
}

/// Fixed-rate timers driven by an external clock.
///
/// Nothing fires on its own: the owner calls [`Scheduler::pop_due`] with the
/// current time and runs each returned task at its due instant. A late caller
/// gets every missed firing in order.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is registered, then arm every task from `now`.
    pub fn start_all(&mut self, now: u64) {
        self.cancel_all();
        self.timers = TimerTask::ALL
            .iter()
            .map(|&task| Timer {
                task,
                next_due: now + task.period_ms(),
            })
            .collect();
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn armed_tasks(&self) -> impl Iterator<Item = TimerTask> + '_ {
        self.timers.iter().map(|t| t.task)
    }

    /// Earliest instant at which something is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.next_due).min()
    }

    /// Take the earliest task due at or before `now` and re-arm it one period later.
    ///
    /// Ties go to the task declared first in [`TimerTask`].
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerTask, u64)> {
        let timer = self
            .timers
            .iter_mut()
            .filter(|t| t.next_due <= now)
            .min_by_key(|t| (t.next_due, t.task))?;
        let due = timer.next_due;
        timer.next_due += timer.task.period_ms();
        Some((timer.task, due))
    }
}
