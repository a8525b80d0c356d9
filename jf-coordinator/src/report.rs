use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use common::JobResult;
use workload::Workload;

use crate::result_table::ResultTable;
use crate::scheduler::BatchTimings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per job, then one line per phase timing.
    Text,
    /// A single JSON document.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// What a finished batch prints.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub workload: &'a str,
    pub policy: &'a str,
    pub workers: usize,
    pub generate_ms: f64,
    pub dispatch_ms: f64,
    pub elapsed_ms: f64,
    pub results: Vec<JobResult>,
}

impl<'a> Report<'a> {
    pub fn new(
        table: &ResultTable,
        workload: &'a Workload,
        policy: &'a str,
        workers: usize,
        timings: BatchTimings,
    ) -> Self {
        Self {
            workload: workload.name,
            policy,
            workers,
            generate_ms: timings.generate.as_secs_f64() * 1000.0,
            dispatch_ms: timings.dispatch.as_secs_f64() * 1000.0,
            elapsed_ms: timings.total.as_secs_f64() * 1000.0,
            results: table.results(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn render_text(&self) -> String {
        let label = capitalize(self.workload);
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&format!("{} of job {}: {}\n", label, result.job_id, result.value));
        }
        out.push_str(&format!(
            "Time to generate the jobs: {:.3} ms\n",
            self.generate_ms
        ));
        out.push_str(&format!(
            "Time to dispatch and collect ({} policy, {} workers): {:.3} ms\n",
            self.policy, self.workers, self.dispatch_ms
        ));
        out.push_str(&format!("Total time: {:.3} ms\n", self.elapsed_ms));
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn timings() -> BatchTimings {
        BatchTimings {
            generate: Duration::from_millis(2),
            dispatch: Duration::from_millis(5),
            total: Duration::from_millis(8),
        }
    }

    fn sample() -> ResultTable {
        let mut table = ResultTable::new(2);
        table.record(JobResult::new(1, 7)).unwrap();
        table.record(JobResult::new(0, 3)).unwrap();
        table
    }

    #[test]
    fn text_lists_jobs_in_order() {
        let workload = workload::try_named("max").unwrap();
        let report = Report::new(&sample(), &workload, "dynamic", 2, timings());
        let text = report.render(OutputFormat::Text).unwrap();

        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Max of job 0: 3");
        assert_eq!(lines[1], "Max of job 1: 7");
        assert_eq!(lines[2], "Time to generate the jobs: 2.000 ms");
        assert_eq!(
            lines[3],
            "Time to dispatch and collect (dynamic policy, 2 workers): 5.000 ms"
        );
        assert_eq!(lines[4], "Total time: 8.000 ms");
    }

    #[test]
    fn json_carries_every_result() {
        let workload = workload::try_named("sum").unwrap();
        let report = Report::new(&sample(), &workload, "round-robin", 3, timings());
        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["workload"], "sum");
        assert_eq!(json["results"][1]["job_id"], 1);
        assert_eq!(json["results"][1]["value"], 7);
        assert!((json["generate_ms"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert!((json["elapsed_ms"].as_f64().unwrap() - 8.0).abs() < 1e-9);
    }
}
