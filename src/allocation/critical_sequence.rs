//! Critical sequence manager (C7, §4.5).

use crate::domain::value_objects::Duration;
use crate::domain::{Job, JobPriority, Task};

pub struct CriticalSequenceManager;

/// A contiguous run of critical-path tasks within a job.
#[derive(Debug, Clone)]
pub struct CriticalRun {
    pub start_seq: u32,
    pub end_seq: u32,
}

impl CriticalSequenceManager {
    /// Consecutive runs of `is_critical_path == true` tasks, length >= 2.
    pub fn identify_critical_sequences(job: &Job) -> Vec<CriticalRun> {
        let mut tasks: Vec<&Task> = job.tasks().collect();
        tasks.sort_by_key(|t| t.sequence_in_job);

        let mut runs = Vec::new();
        let mut run_start: Option<u32> = None;
        let mut prev_seq: Option<u32> = None;

        for task in &tasks {
            if task.is_critical_path {
                if run_start.is_none() {
                    run_start = Some(task.sequence_in_job);
                }
                prev_seq = Some(task.sequence_in_job);
            } else if let (Some(start), Some(end)) = (run_start, prev_seq) {
                if end > start {
                    runs.push(CriticalRun { start_seq: start, end_seq: end });
                }
                run_start = None;
                prev_seq = None;
            }
        }
        if let (Some(start), Some(end)) = (run_start, prev_seq) {
            if end > start {
                runs.push(CriticalRun { start_seq: start, end_seq: end });
            }
        }
        runs
    }

    /// Sum, over tasks in `[start_seq, end_seq]`, of the minimum
    /// `total_duration` across each task's routing options.
    pub fn calculate_sequence_duration(job: &Job, start_seq: u32, end_seq: u32) -> Duration {
        job.tasks()
            .filter(|t| t.sequence_in_job >= start_seq && t.sequence_in_job <= end_seq)
            .filter_map(|t| t.machine_options.iter().map(|o| o.total_duration()).min())
            .fold(Duration::ZERO, |acc, d| acc + d)
    }

    /// Sorts jobs by `(-#critical_tasks, -priority_rank, due_date)`: more
    /// critical tasks first, higher priority first, earlier due date
    /// first among ties.
    pub fn prioritize_job_sequence(jobs: &mut [&Job]) {
        jobs.sort_by(|a, b| {
            let crit_a = a.tasks().filter(|t| t.is_critical_path).count();
            let crit_b = b.tasks().filter(|t| t.is_critical_path).count();
            crit_b
                .cmp(&crit_a)
                .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
                .then_with(|| a.due_date.cmp(&b.due_date))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::MachineOption;

    fn job_with_critical(flags: &[bool]) -> Job {
        let mut job = Job::new(
            "J1".to_string(),
            "C".to_string(),
            "P".to_string(),
            1,
            JobPriority::Normal,
            chrono::Utc::now() + chrono::Duration::days(5),
            chrono::Utc::now(),
        )
        .unwrap();
        for (i, &flag) in flags.iter().enumerate() {
            let mut task = Task::new(
                job.id,
                (i + 1) as u32,
                vec![MachineOption {
                    machine_id: crate::domain::MachineId::new(),
                    setup_duration: crate::domain::value_objects::Duration::ZERO,
                    processing_duration: crate::domain::value_objects::Duration::from_minutes(10).unwrap(),
                    requires_operator_full_duration: false,
                }],
            )
            .unwrap();
            task.is_critical_path = flag;
            job.add_task(task).unwrap();
        }
        job
    }

    #[test]
    fn identifies_runs_of_length_two_or_more() {
        let job = job_with_critical(&[true, true, false, true, true, true]);
        let runs = CriticalSequenceManager::identify_critical_sequences(&job);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].start_seq, runs[0].end_seq), (1, 2));
        assert_eq!((runs[1].start_seq, runs[1].end_seq), (4, 6));
    }

    #[test]
    fn single_critical_task_is_not_a_run() {
        let job = job_with_critical(&[true, false, false]);
        let runs = CriticalSequenceManager::identify_critical_sequences(&job);
        assert!(runs.is_empty());
    }

    #[test]
    fn prioritize_orders_by_critical_count_then_priority_then_due_date() {
        let now = chrono::Utc::now();
        let urgent = Job::new("J2".to_string(), "C".to_string(), "P".to_string(), 1, JobPriority::Critical, now + chrono::Duration::days(1), now).unwrap();
        let normal = Job::new("J3".to_string(), "C".to_string(), "P".to_string(), 1, JobPriority::Normal, now + chrono::Duration::days(1), now).unwrap();
        let mut jobs: Vec<&Job> = vec![&normal, &urgent];
        CriticalSequenceManager::prioritize_job_sequence(&mut jobs);
        assert_eq!(jobs[0].job_number, "J2");
    }
}
