use std::io::IsTerminal;

use ansi_term::Style;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::{
    storage::entities::{Project, Work},
    tracker::{
        report::Report,
        session::{Dropped, Logged, Started},
    },
};

/// How `report` prints durations and whether the total is shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportStyle {
    pub seconds: bool,
    pub total: bool,
}

/// Turns tracker results into the text shown to the user. Times are shown in the local offset
/// captured at startup.
pub struct Output {
    offset: FixedOffset,
    color: bool,
}

impl Output {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            color: std::io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    fn plain(offset: FixedOffset) -> Self {
        Self {
            offset,
            color: false,
        }
    }

    fn name(&self, name: &str) -> String {
        if self.color {
            Style::new().bold().paint(name).to_string()
        } else {
            name.to_string()
        }
    }

    fn local_time(&self, time: DateTime<Utc>) -> String {
        time.with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    pub fn started(&self, started: &Started) -> Vec<String> {
        let mut lines = vec![];
        if let Some(stopped) = &started.stopped {
            lines.push(self.stopped(stopped));
        }
        if started.created_project {
            lines.push(self.created_project(&started.started.project));
        }
        lines.push(format!(
            "Starting work on {}{}.",
            self.name(&started.started.project.name),
            comment(&started.started.comment)
        ));
        lines
    }

    pub fn stopped(&self, work: &Work) -> String {
        format!(
            "Stopping work on {}{} after {}.",
            self.name(&work.project.name),
            comment(&work.comment),
            format_duration(work.duration().unwrap_or_default())
        )
    }

    pub fn canceled(&self, work: &Work) -> String {
        format!(
            "Canceling current work on {}{}.",
            self.name(&work.project.name),
            comment(&work.comment)
        )
    }

    pub fn logged(&self, logged: &Logged) -> Vec<String> {
        let mut lines = vec![];
        if logged.created_project {
            lines.push(self.created_project(&logged.work.project));
        }
        lines.push(format!(
            "Logged {} work to {}{}.",
            format_duration(logged.work.duration().unwrap_or_default()),
            self.name(&logged.work.project.name),
            comment(&logged.work.comment)
        ));
        lines
    }

    pub fn dropped(&self, dropped: &Dropped) -> String {
        format!("Dropping project {}.", self.name(&dropped.project.name))
    }

    fn created_project(&self, project: &Project) -> String {
        format!("Creating project {}.", self.name(&project.name))
    }

    pub fn status(
        &self,
        current: Option<&Work>,
        last: Option<&Work>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut lines = vec![];
        match current {
            Some(work) => lines.push(format!(
                "You have been working on {}{} since {} ({}).",
                self.name(&work.project.name),
                comment(&work.comment),
                self.local_time(work.start),
                format_duration(work.elapsed(now))
            )),
            None => lines.push("You are not currently working on anything.".to_string()),
        }
        if let Some(work) = last {
            lines.push(format!(
                "You last worked on {}{} for {}.",
                self.name(&work.project.name),
                comment(&work.comment),
                format_duration(work.duration().unwrap_or_default())
            ));
        }
        lines
    }

    pub fn projects(&self, projects: &[Project]) -> Vec<String> {
        projects.iter().map(|p| p.name.clone()).collect()
    }

    pub fn report(&self, report: &Report, style: ReportStyle) -> Vec<String> {
        let render = |duration: TimeDelta| {
            if style.seconds {
                crate::utils::time::whole_seconds(duration).to_string()
            } else {
                format_duration(duration)
            }
        };

        let mut lines = report
            .lines
            .iter()
            .map(|line| {
                format!(
                    "{} {}",
                    self.name(&format!("{:<20}", line.project.name)),
                    render(line.duration)
                )
            })
            .collect::<Vec<_>>();

        if style.total {
            lines.push(String::new());
            lines.push(format!("{:<20} {}", "Total", render(report.total)));
        }
        lines
    }
}

fn comment(comment: &str) -> String {
    if comment.is_empty() {
        String::new()
    } else {
        format!(" ({comment})")
    }
}

/// Formats a duration as `HH:MM:SS`. Hours are not wrapped into days.
pub fn format_duration(v: TimeDelta) -> String {
    let seconds = v.num_seconds();
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Offset, TimeDelta, TimeZone, Utc};

    use crate::{
        storage::entities::{Project, ProjectId, Work, WorkId},
        tracker::report::{Report, ReportLine},
    };

    use super::{format_duration, Output, ReportStyle};

    fn project(id: i64, name: &str) -> Project {
        Project {
            id: ProjectId::new(id),
            name: name.into(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(5400)), "01:30:00");
        assert_eq!(format_duration(TimeDelta::milliseconds(61_999)), "00:01:01");
        assert_eq!(format_duration(TimeDelta::hours(30)), "30:00:00");
        assert_eq!(format_duration(TimeDelta::zero()), "00:00:00");
    }

    #[test]
    fn test_report_lines() {
        let report = Report {
            since: None,
            lines: vec![
                ReportLine {
                    project: project(1, "alpha"),
                    duration: TimeDelta::seconds(5400),
                },
                ReportLine {
                    project: project(2, "beta"),
                    duration: TimeDelta::milliseconds(600_500),
                },
            ],
            total: TimeDelta::milliseconds(6_000_500),
        };
        let output = Output::plain(Utc.fix());

        assert_eq!(
            output.report(&report, ReportStyle::default()),
            [
                "alpha                01:30:00",
                "beta                 00:10:00"
            ]
        );
        assert_eq!(
            output.report(
                &report,
                ReportStyle {
                    seconds: true,
                    total: true
                }
            ),
            [
                "alpha                5400",
                "beta                 600",
                "",
                "Total                6000"
            ]
        );
    }

    #[test]
    fn test_status_lines() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 3, 14, 14, 0, 0).unwrap();
        let current = Work {
            id: WorkId::new(2),
            project: project(1, "alpha"),
            comment: "review".into(),
            start,
            stop: None,
        };
        let last = Work {
            id: WorkId::new(1),
            project: project(2, "beta"),
            comment: String::new(),
            start: start - TimeDelta::hours(2),
            stop: Some(start - TimeDelta::hours(1)),
        };
        let output = Output::plain(offset);

        assert_eq!(
            output.status(Some(&current), Some(&last), start + TimeDelta::minutes(45)),
            [
                "You have been working on alpha (review) since 2024-03-14 09:00:00 (00:45:00).",
                "You last worked on beta for 01:00:00."
            ]
        );
        assert_eq!(
            output.status(None, None, start),
            ["You are not currently working on anything."]
        );
    }
}
