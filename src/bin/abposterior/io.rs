use abposterior_utils::analysis::{AnalysisOutcome, AnalysisResult};
use abposterior_utils::arm::Arm;
use abposterior_utils::estimator::DensityPoint;
use abposterior_utils::stats::ArmSummary;
use abposterior_utils::posterior::PosteriorParameters;
use abposterior_utils::interval::CredibleInterval;
use anyhow::Result;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use strum::IntoEnumIterator;

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

pub struct DensityCurveWriter {
    file: File,
    writer: Writer<File>,
}

impl DensityCurveWriter {
    pub fn new(file_path: &Path) -> Result<Self> {
        let file = File::create(file_path)?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(["x", "density_ad", "density_psa"])?;
        Ok(())
    }

    pub fn write_point(&mut self, point: &DensityPoint) -> Result<()> {
        self.writer.write_record(&[
            format!("{:.6}", point.x),
            format!("{:.6}", point.density_ad),
            format!("{:.6}", point.density_psa),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn write_points_iter<'a, I>(&mut self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a DensityPoint>,
    {
        for point in points {
            self.write_point(point)?;
        }
        self.flush()?;
        Ok(())
    }
}

pub struct ArmSummaryWriter {
    file: File,
    writer: Writer<File>,
}

impl ArmSummaryWriter {
    pub fn new(file_path: &Path) -> Result<Self> {
        let file = File::create(file_path)?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record([
            "arm",
            "trials",
            "successes",
            "conversion_rate",
            "average_exposures",
            "alpha",
            "beta",
            "posterior_mean",
            "ci_lower",
            "ci_upper",
        ])?;
        Ok(())
    }

    /// Posterior columns stay empty for arms that were not analysed.
    pub fn write_arm(
        &mut self,
        summary: &ArmSummary,
        posterior: Option<&PosteriorParameters>,
        interval: Option<&CredibleInterval>,
    ) -> Result<()> {
        self.writer.write_record(&[
            summary.arm.to_code().to_string(),
            summary.statistics.trials.to_string(),
            summary.statistics.successes.to_string(),
            format_optional(summary.conversion_rate),
            format_optional(summary.average_exposures),
            format_optional(posterior.map(|p| p.alpha)),
            format_optional(posterior.map(|p| p.beta)),
            format_optional(posterior.map(|p| p.mean())),
            format_optional(interval.map(|i| i.lower)),
            format_optional(interval.map(|i| i.upper)),
        ])?;
        Ok(())
    }

    pub fn write_outcome(&mut self, outcome: &AnalysisOutcome) -> Result<()> {
        match outcome {
            AnalysisOutcome::Complete(result) => {
                for arm in Arm::iter() {
                    let analysis = result.arm(arm);
                    self.write_arm(
                        &analysis.summary,
                        Some(&analysis.posterior),
                        Some(&analysis.interval),
                    )?;
                }
            }
            AnalysisOutcome::NoData { ad, psa, .. } => {
                self.write_arm(ad, None, None)?;
                self.write_arm(psa, None, None)?;
            }
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

pub fn write_density_curve(result: &AnalysisResult, path: &Path) -> Result<()> {
    let mut writer = DensityCurveWriter::new(path)?;
    writer.write_header()?;
    writer.write_points_iter(result.curve.points.iter())
}

pub fn write_analysis_json(outcome: &AnalysisOutcome, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), outcome)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abposterior_utils::analysis::compute_analysis;
    use abposterior_utils::config::EngineConfig;
    use abposterior_utils::estimator::EstimationMode;
    use abposterior_utils::filter::{Selector, TrialSet};
    use abposterior_utils::record::TrialRecord;
    use abposterior_utils::weekday::Weekday;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::tempdir;

    fn outcome(psa_trials: usize) -> AnalysisOutcome {
        let mut records: Vec<TrialRecord> = (0..40)
            .map(|i| TrialRecord::new(Arm::Ad, Weekday::Friday, 9, i < 8, 2))
            .collect();
        records.extend((0..psa_trials).map(|i| TrialRecord::new(Arm::Psa, Weekday::Friday, 9, i < 2, 4)));
        compute_analysis(
            &TrialSet::new(records),
            &Selector::day(Weekday::Friday),
            EstimationMode::Analytic,
            &EngineConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap()
    }

    #[test]
    fn test_summary_writer_complete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.tsv");
        let mut writer = ArmSummaryWriter::new(&path).unwrap();
        writer.write_header().unwrap();
        writer.write_outcome(&outcome(20)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("arm\ttrials\tsuccesses"));
        let ad: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(ad[0], "ad");
        assert_eq!(ad[1], "40");
        assert_eq!(ad[2], "8");
        assert_eq!(ad[3], "0.200000");
        assert_eq!(ad[4], "2.000000");
        assert_eq!(ad[5], "9.000000");
        assert_eq!(ad[6], "33.000000");
    }

    #[test]
    fn test_summary_writer_no_data_leaves_posterior_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.tsv");
        let mut writer = ArmSummaryWriter::new(&path).unwrap();
        writer.write_header().unwrap();
        writer.write_outcome(&outcome(0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let psa: Vec<&str> = content.lines().nth(2).unwrap().split('\t').collect();
        assert_eq!(psa[0], "psa");
        assert_eq!(psa[1], "0");
        assert!(psa[3..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_density_curve_and_json() {
        let dir = tempdir().unwrap();
        let outcome = outcome(20);
        let result = outcome.result().unwrap();

        let curve_path = dir.path().join("density_curve.tsv");
        write_density_curve(result, &curve_path).unwrap();
        let content = fs::read_to_string(&curve_path).unwrap();
        assert_eq!(content.lines().count(), result.curve.len() + 1);
        assert_eq!(content.lines().next().unwrap(), "x\tdensity_ad\tdensity_psa");

        let json_path = dir.path().join("analysis.json");
        write_analysis_json(&outcome, &json_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        let complete = &value["Complete"];
        assert_eq!(complete["ad"]["summary"]["conversion_rate"].as_f64(), Some(0.2));
        assert_eq!(complete["psa"]["summary"]["conversion_rate"].as_f64(), Some(0.1));
        assert_eq!(complete["psa"]["summary"]["average_exposures"].as_f64(), Some(4.0));
    }
}
