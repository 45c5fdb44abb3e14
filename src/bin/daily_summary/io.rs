use abposterior_utils::arm::Arm;
use abposterior_utils::summary::{DailySummary, WeeklySummary};
use anyhow::Result;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;
use strum::IntoEnumIterator;

fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v * 100.0)).unwrap_or_default()
}

fn decimal(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_default()
}

pub struct DailySummaryWriter {
    file: File,
    writer: Writer<File>,
}

impl DailySummaryWriter {
    pub fn new(file_path: &Path) -> Result<Self> {
        let file = File::create(file_path)?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_header(&mut self) -> Result<()> {
        let mut header = vec!["day".to_string()];
        for arm in Arm::iter() {
            for column in ["mean_pct", "users", "conversions", "avg_exposures"] {
                header.push(format!("{}_{}", arm.to_code(), column));
            }
        }
        header.push("prob_ad_better".to_string());
        self.writer.write_record(&header)?;
        Ok(())
    }

    pub fn write_day(&mut self, day: &DailySummary) -> Result<()> {
        let mut row = vec![day.day.to_string().to_string()];
        for arm in Arm::iter() {
            let summary = day.arm(arm);
            row.push(percent(day.mean(arm)));
            row.push(summary.statistics.trials.to_string());
            row.push(summary.statistics.successes.to_string());
            row.push(decimal(summary.average_exposures));
        }
        row.push(decimal(day.prob_ad_better));
        self.writer.write_record(&row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn write_summary(&mut self, summary: &WeeklySummary) -> Result<()> {
        for day in &summary.days {
            self.write_day(day)?;
        }
        self.flush()
    }
}
