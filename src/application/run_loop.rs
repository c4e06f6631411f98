// ============================================================
// Layer 2 — Run Loop
// ============================================================
// Drives one invocation from start to finish:
//
//   InitOnly : generate ─▶ write
//   NonStop  : generate ─▶ write ─▶ (update ─▶ write) × n
//   Resume   : read     ─────────▶ (update ─▶ write) × n
//
// The loop owns the grid handle for the whole run. Checkpoints
// are written one at a time, in increasing iteration order, and
// never while an update is in flight, because `update` mutates
// the grid in place.
//
// Any error ends the run immediately. A half-finished increment
// is never retried; the way back is to resume from the last
// checkpoint that was written.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::domain::error::DriverError;
use crate::domain::invocation::{Dimension, Invocation, Mode, Schedule};
use crate::domain::traits::GridKernel;
use crate::infra::checkpoint::FilenameTemplate;
use crate::infra::metrics::Reducer;
use crate::infra::timed_io::TimedIo;

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Every checkpoint written, in order
    pub checkpoints: Vec<PathBuf>,

    /// Time steps advanced by this run
    pub steps: u64,

    /// Local time spent writing checkpoints
    pub io_time: Duration,
}

// ─── RunLoop ──────────────────────────────────────────────────────────────────
pub struct RunLoop<'a, K: GridKernel> {
    kernel: &'a K,
    io:     TimedIo<'a, K>,
    root:   bool,
    report: bool,
}

impl<'a, K: GridKernel> RunLoop<'a, K> {
    pub fn new(kernel: &'a K, reducer: &'a dyn Reducer, report: bool) -> Self {
        Self {
            kernel,
            io: TimedIo::new(kernel, reducer, report),
            root: reducer.is_root(),
            report,
        }
    }

    /// Run `invocation` to completion.
    ///
    /// `Help` does nothing here; the CLI layer prints the usage.
    pub fn execute(&self, invocation: &Invocation) -> Result<RunSummary, DriverError> {
        let mut summary = RunSummary::default();

        match invocation {
            Invocation::Help => {}

            Invocation::InitOnly { dimension, output, workers } => {
                let grid = self.generate(*dimension, *workers)?;
                self.checkpoint(&grid, output, &mut summary)?;
            }

            Invocation::NonStop { dimension, output, schedule, workers } => {
                let template = FilenameTemplate::derive(&output.to_string_lossy(), schedule.total_steps());
                let mut grid = self.generate(*dimension, *workers)?;
                self.checkpoint(&grid, output, &mut summary)?;

                // a fresh tessellation is always iteration zero
                self.simulate(&mut grid, &template, 0, schedule, *workers, &mut summary)?;
            }

            Invocation::Resume { input, output, schedule, workers } => {
                let template = FilenameTemplate::derive(&output.to_string_lossy(), schedule.total_steps());
                let start    = template.start_iteration();
                let mut grid = self.io.read(input)?;

                if self.root {
                    tracing::info!(
                        "Resuming from {} at iteration {}, {} checkpoint(s) to go",
                        input.display(),
                        start,
                        schedule.chunks_from(start).count(),
                    );
                    if start >= schedule.total_steps() {
                        tracing::warn!(
                            "Iteration {} already reaches the requested {} steps; nothing to do",
                            start,
                            schedule.total_steps(),
                        );
                    }
                }

                self.simulate(&mut grid, &template, start, schedule, *workers, &mut summary)?;
            }
        }

        if self.root && invocation.mode() != Mode::Help {
            tracing::info!(
                "Run complete: {} checkpoint(s), {} step(s), {:.3} sec writing",
                summary.checkpoints.len(),
                summary.steps,
                summary.io_time.as_secs_f64(),
            );
        }
        Ok(summary)
    }

    /// The steady-state loop: advance one increment, write one file.
    fn simulate(
        &self,
        grid:     &mut K::Grid,
        template: &FilenameTemplate,
        start:    u64,
        schedule: &Schedule,
        workers:  usize,
        summary:  &mut RunSummary,
    ) -> Result<(), DriverError> {
        if self.root {
            tracing::debug!(
                "Checkpoints {}<{} digits>{} every {} step(s) up to {}",
                template.base(),
                template.digit_width(),
                template.suffix(),
                schedule.increment(),
                schedule.total_steps(),
            );
        }

        for (steps, path) in template.checkpoints(schedule, start) {
            self.kernel.update(grid, steps, workers)?;
            summary.steps += steps;
            self.checkpoint(grid, &path, summary)?;
        }
        Ok(())
    }

    fn generate(&self, dimension: Dimension, workers: usize) -> Result<K::Grid, DriverError> {
        let timer = Instant::now();
        let grid  = self.kernel.generate(dimension, workers)?;
        if self.root && self.report {
            tracing::info!(
                "Finished tessellation of {}-D grid in {:.3} sec.",
                dimension,
                timer.elapsed().as_secs_f64(),
            );
        }
        Ok(grid)
    }

    fn checkpoint(&self, grid: &K::Grid, path: &Path, summary: &mut RunSummary) -> Result<(), DriverError> {
        let sample = self.io.write(grid, path)?;
        summary.io_time += sample.elapsed;
        summary.checkpoints.push(path.to_path_buf());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::metrics::SingleWorker;
    use anyhow::{bail, Result};
    use std::cell::RefCell;
    use std::fs;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Generate(Dimension, usize),
        Update(u64, usize),
        Output(PathBuf),
        Load(PathBuf, Dimension),
    }

    /// In-memory kernel: the grid is the number of steps taken
    #[derive(Default)]
    struct RecordingKernel {
        calls:       RefCell<Vec<Call>>,
        fail_update: Option<usize>,
    }

    impl RecordingKernel {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn updates(&self) -> Vec<u64> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Update(steps, _) => Some(steps),
                    _ => None,
                })
                .collect()
        }

        fn outputs(&self) -> Vec<PathBuf> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Output(p) => Some(p),
                    _ => None,
                })
                .collect()
        }
    }

    impl GridKernel for RecordingKernel {
        type Grid = u64;

        fn generate(&self, dimension: Dimension, workers: usize) -> Result<u64> {
            self.calls.borrow_mut().push(Call::Generate(dimension, workers));
            Ok(0)
        }

        fn update(&self, grid: &mut u64, steps: u64, workers: usize) -> Result<()> {
            if Some(self.updates().len()) == self.fail_update {
                bail!("kernel diverged");
            }
            self.calls.borrow_mut().push(Call::Update(steps, workers));
            *grid += steps;
            Ok(())
        }

        fn output(&self, _: &u64, path: &Path) -> Result<Option<u64>> {
            self.calls.borrow_mut().push(Call::Output(path.to_path_buf()));
            Ok(Some(128))
        }

        fn load(&self, path: &Path, dimension: Dimension) -> Result<u64> {
            self.calls.borrow_mut().push(Call::Load(path.to_path_buf(), dimension));
            Ok(0)
        }
    }

    fn schedule(total: u64, inc: u64) -> Schedule {
        Schedule::new(total, inc).unwrap()
    }

    fn paths(names: &[String]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_init_only_writes_once_without_updates() {
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        let summary = run
            .execute(&Invocation::InitOnly {
                dimension: Dimension::Two,
                output:    PathBuf::from("voronoi.dat"),
                workers:   1,
            })
            .unwrap();

        assert_eq!(
            kernel.calls(),
            vec![
                Call::Generate(Dimension::Two, 1),
                Call::Output(PathBuf::from("voronoi.dat")),
            ]
        );
        assert_eq!(summary.checkpoints, vec![PathBuf::from("voronoi.dat")]);
        assert_eq!(summary.steps, 0);
    }

    #[test]
    fn test_nonstop_checkpoints_every_increment() {
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        run.execute(&Invocation::NonStop {
            dimension: Dimension::Three,
            output:    PathBuf::from("polycrystal.0000.dat"),
            schedule:  schedule(1000, 100),
            workers:   2,
        })
        .unwrap();

        let mut expected = vec![PathBuf::from("polycrystal.0000.dat")];
        expected.extend(paths(
            &(1..=10).map(|k| format!("polycrystal.{:04}.dat", k * 100)).collect::<Vec<_>>(),
        ));
        assert_eq!(kernel.outputs(), expected);
        assert_eq!(kernel.updates(), vec![100; 10]);
        assert_eq!(kernel.calls()[0], Call::Generate(Dimension::Three, 2));
        assert!(kernel
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::Update(_, w) if *w != 2)));
    }

    #[test]
    fn test_nonstop_updates_and_writes_alternate() {
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        run.execute(&Invocation::NonStop {
            dimension: Dimension::Two,
            output:    PathBuf::from("g.dat"),
            schedule:  schedule(30, 10),
            workers:   1,
        })
        .unwrap();

        let kinds: Vec<&str> = kernel
            .calls()
            .iter()
            .map(|c| match c {
                Call::Generate(..) => "generate",
                Call::Update(..)   => "update",
                Call::Output(..)   => "output",
                Call::Load(..)     => "load",
            })
            .collect();
        assert_eq!(
            kinds,
            ["generate", "output", "update", "output", "update", "output", "update", "output"]
        );
    }

    #[test]
    fn test_nonstop_shortens_final_increment() {
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        let summary = run
            .execute(&Invocation::NonStop {
                dimension: Dimension::Two,
                output:    PathBuf::from("g.dat"),
                schedule:  schedule(250, 100),
                workers:   1,
            })
            .unwrap();

        assert_eq!(kernel.updates(), vec![100, 100, 50]);
        assert_eq!(summary.steps, 250);
        assert_eq!(
            summary.checkpoints.last(),
            Some(&PathBuf::from("g.250.dat"))
        );
    }

    #[test]
    fn test_nonstop_numbers_from_zero_whatever_the_output_name() {
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        run.execute(&Invocation::NonStop {
            dimension: Dimension::Two,
            output:    PathBuf::from("grain.0500.dat"),
            schedule:  schedule(1000, 500),
            workers:   1,
        })
        .unwrap();

        assert_eq!(
            kernel.outputs(),
            ["grain.0500.dat", "grain.0500.dat", "grain.1000.dat"].map(PathBuf::from).to_vec()
        );
        assert_eq!(kernel.updates(), vec![500, 500]);
    }

    #[test]
    fn test_resume_from_initial_checkpoint() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("polycrystal.0000.dat");
        fs::write(&input, "grid:potts\n2\n").unwrap();

        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);
        run.execute(&Invocation::Resume {
            input:    input.clone(),
            output:   input.clone(),
            schedule: schedule(1000, 100),
            workers:  1,
        })
        .unwrap();

        assert_eq!(kernel.calls()[0], Call::Load(input, Dimension::Two));
        assert_eq!(kernel.updates(), vec![100; 10]);

        let expected: Vec<PathBuf> = (1..=10)
            .map(|k| dir.path().join(format!("polycrystal.{:04}.dat", k * 100)))
            .collect();
        assert_eq!(kernel.outputs(), expected);
    }

    #[test]
    fn test_resume_continues_numbering_from_checkpoint() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("polycrystal.1000.dat");
        fs::write(&input, "grid:potts\n3\n").unwrap();

        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);
        let summary = run
            .execute(&Invocation::Resume {
                input:    input.clone(),
                output:   input,
                schedule: schedule(2000, 100),
                workers:  1,
            })
            .unwrap();

        let outputs = kernel.outputs();
        assert_eq!(outputs.len(), 10);
        assert_eq!(outputs[0], dir.path().join("polycrystal.1100.dat"));
        assert_eq!(outputs[9], dir.path().join("polycrystal.2000.dat"));
        assert_eq!(summary.steps, 1000);
    }

    #[test]
    fn test_resume_numbers_from_output_not_input() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("voronoi.0500.dat");
        fs::write(&input, "grid:potts\n2\n").unwrap();
        let output = dir.path().join("polycrystal.dat");

        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);
        run.execute(&Invocation::Resume {
            input,
            output,
            schedule: schedule(1000, 1000),
            workers:  1,
        })
        .unwrap();

        assert_eq!(kernel.outputs(), vec![dir.path().join("polycrystal.1000.dat")]);
    }

    #[test]
    fn test_resume_past_target_does_nothing() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("g.0900.dat");
        fs::write(&input, "grid:potts\n2\n").unwrap();

        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);
        let summary = run
            .execute(&Invocation::Resume {
                input:    input.clone(),
                output:   input,
                schedule: schedule(500, 100),
                workers:  1,
            })
            .unwrap();

        assert!(kernel.updates().is_empty());
        assert!(summary.checkpoints.is_empty());
    }

    #[test]
    fn test_missing_input_fails_before_any_kernel_call() {
        let dir    = tempfile::tempdir().unwrap();
        let input  = dir.path().join("absent.dat");
        let kernel = RecordingKernel::default();
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        let err = run
            .execute(&Invocation::Resume {
                input:    input.clone(),
                output:   input,
                schedule: schedule(10, 5),
                workers:  1,
            })
            .unwrap_err();
        assert!(matches!(err, DriverError::Input(_)));
        assert!(kernel.calls().is_empty());
    }

    #[test]
    fn test_kernel_failure_stops_the_run() {
        let kernel = RecordingKernel { fail_update: Some(2), ..Default::default() };
        let run    = RunLoop::new(&kernel, &SingleWorker, false);

        let err = run
            .execute(&Invocation::NonStop {
                dimension: Dimension::Two,
                output:    PathBuf::from("g.dat"),
                schedule:  schedule(100, 10),
                workers:   1,
            })
            .unwrap_err();

        assert!(matches!(err, DriverError::Kernel(_)));
        // initial file plus the two increments that completed
        assert_eq!(kernel.outputs().len(), 3);
        assert_eq!(kernel.updates().len(), 2);
    }

    #[test]
    fn test_help_touches_nothing() {
        let kernel  = RecordingKernel::default();
        let run     = RunLoop::new(&kernel, &SingleWorker, true);
        let summary = run.execute(&Invocation::Help).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(kernel.calls().is_empty());
    }
}
