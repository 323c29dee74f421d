use anyhow::Result;
use clap::Parser;

use crate::{
    storage::store::Store,
    tracker::{
        report::{ReportAggregator, ReportRequest},
        window::Window,
    },
    utils::clock::Clock,
};

use super::output::{Output, ReportStyle};

#[derive(Debug, Clone, Copy, clap::Args)]
#[group(multiple = false)]
pub struct WindowArgs {
    #[arg(short = 'T', long, visible_alias = "day", help = "Only work started today")]
    today: bool,
    #[arg(short = 'W', long, help = "Only work started since Monday")]
    week: bool,
    #[arg(short = 'M', long, help = "Only work started this month")]
    month: bool,
    #[arg(long, value_name = "N", help = "Only work started in the last N days")]
    days: Option<u32>,
    #[arg(long, value_name = "N", help = "Only work started in the last N weeks")]
    weeks: Option<u32>,
}

impl WindowArgs {
    pub fn window(&self) -> Option<Window> {
        if self.today {
            Some(Window::Today)
        } else if self.week {
            Some(Window::Week)
        } else if self.month {
            Some(Window::Month)
        } else if let Some(days) = self.days {
            Some(Window::Days(days))
        } else {
            self.weeks.map(Window::Weeks)
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[command(flatten)]
    window: WindowArgs,
    #[arg(short, long, help = "Display durations in seconds")]
    seconds: bool,
    #[arg(long, help = "Add the total time worked")]
    total: bool,
    #[arg(short, long, help = "Show projects without any time worked")]
    all: bool,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
    #[arg(help = "Projects to report on. Every project when left out")]
    projects: Vec<String>,
}

impl ReportCommand {
    fn request(&self) -> ReportRequest {
        ReportRequest {
            projects: self.projects.clone(),
            window: self.window.window(),
            include_empty: self.all,
        }
    }
}

pub fn process_report_command(
    command: ReportCommand,
    store: &impl Store,
    clock: &dyn Clock,
    output: &Output,
) -> Result<()> {
    let report = ReportAggregator::new(store, clock).report(&command.request())?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let style = ReportStyle {
        seconds: command.seconds,
        total: command.total,
    };
    for line in output.report(&report, style) {
        println!("{line}");
    }
    Ok(())
}
