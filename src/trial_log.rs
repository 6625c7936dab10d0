// trial_log.rs - 试验结果记录模块
//
// 以CSV格式追加每局指标，多次试验写入同一个文件，用于事后比较不同规划概率

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::monte_carlo::TrialMetrics;

// ================ CSV日志记录 ================

const CSV_HEADER: &str = "episode,return_ratio,observed_returns,optimal_returns,truncated,\
    episode_length,planned_decisions,trial_number,planning_factor";

/// 一行试验记录
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub trial_number: usize,
    pub planning_factor: f64,
    pub metrics: TrialMetrics,
}

/// 一次试验的全部记录
#[derive(Debug, Clone, Default)]
pub struct TrialLog {
    pub records: Vec<TrialRecord>,
}

impl TrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一次试验的指标
    pub fn extend_trial(&mut self, trial_number: usize, planning_factor: f64, metrics: &[TrialMetrics]) {
        self.records.extend(metrics.iter().map(|m| TrialRecord {
            trial_number,
            planning_factor,
            metrics: m.clone(),
        }));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 文件为空时写入表头
    pub fn write_header<P: AsRef<Path>>(csv_path: P) -> Result<()> {
        let csv_path = csv_path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(csv_path)?;

        // 检查文件是否为空（新文件需要写入表头）
        let metadata = std::fs::metadata(csv_path)?;
        if metadata.len() == 0 {
            writeln!(file, "{}", CSV_HEADER)?;
        }

        Ok(())
    }

    pub fn append_to_csv<P: AsRef<Path>>(&self, csv_path: P) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(csv_path.as_ref())?;

        for record in &self.records {
            let m = &record.metrics;
            // 没有回报比时留空
            let ratio = m.return_ratio.map(|r| format!("{:.6}", r)).unwrap_or_default();
            writeln!(
                file,
                "{},{},{:.6},{:.6},{},{},{},{},{:.2}",
                m.episode,
                ratio,
                m.observed_return,
                m.optimal_return,
                m.truncated,
                m.episode_length,
                m.planned_decisions,
                record.trial_number,
                record.planning_factor
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(episode: usize, ratio: Option<f64>) -> TrialMetrics {
        TrialMetrics {
            episode,
            observed_return: ratio.unwrap_or(0.0),
            optimal_return: 1.0,
            return_ratio: ratio,
            episode_length: 3,
            truncated: ratio.is_none(),
            planned_decisions: 1,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trials.csv");

        let mut log = TrialLog::new();
        log.extend_trial(0, 0.5, &[metrics(0, Some(1.0)), metrics(1, None)]);
        assert_eq!(log.len(), 2);

        TrialLog::write_header(&path).unwrap();
        log.append_to_csv(&path).unwrap();
        TrialLog::write_header(&path).unwrap();
        log.append_to_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "0,1.000000,1.000000,1.000000,false,3,1,0,0.50");
        assert_eq!(lines[2], "1,,0.000000,1.000000,true,3,1,0,0.50");
        assert_eq!(lines.iter().filter(|l| l.starts_with("episode")).count(), 1);
    }
}
