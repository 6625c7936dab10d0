// src/main.rs
//
// 试验驱动: 对每个规划概率重复若干次独立试验，结果追加到同一个 CSV 文件。
// 每次试验有自己的环境、策略存储和随机种子，在独立线程上运行。

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::thread;

use blocks_mc::{
    mean_return_ratio, tail_mean_return_ratio, BlockFeatures, BlockMove, BlocksState, BlocksWorld,
    Control, LearnOptions, MonteCarlo, SgdConfig, SgdControl, TabularConfig, TabularControl,
    TrialLog, TrialMetrics, DEFAULT_BLOCKS,
};

/// 控制策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ControlKind {
    /// 表格平均
    Tabular,
    /// 线性特征 + SGD
    Sgd,
}

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "blocks-mc", about = "积木世界上带前瞻规划的蒙特卡洛控制试验")]
struct Cli {
    /// 方块数
    #[arg(long, default_value_t = DEFAULT_BLOCKS)]
    blocks: usize,

    /// 每次试验的 episode 数
    #[arg(long)]
    episodes: Option<usize>,

    /// 每个规划概率的试验次数
    #[arg(long, default_value_t = 4)]
    trials: usize,

    /// 规划视界
    #[arg(long)]
    horizon: Option<usize>,

    /// 要比较的规划概率
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.5, 0.6, 0.7])]
    planning_factors: Vec<f64>,

    #[arg(long, value_enum, default_value_t = ControlKind::Tabular)]
    control: ControlKind,

    /// 基础随机种子，编号为 i 的试验使用 seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// 输出 CSV 路径
    #[arg(long, default_value = "trials.csv")]
    output: String,

    /// JSON 选项文件 (命令行参数优先)
    #[arg(long)]
    options: Option<String>,
}

/// 构造基础选项: 默认值 / 选项文件，再应用命令行覆盖
fn build_options(cli: &Cli) -> Result<LearnOptions> {
    let mut options = match &cli.options {
        Some(path) => LearnOptions::from_json_file(path)?,
        None => LearnOptions {
            max_episode_length: cli.blocks * 2,
            ..LearnOptions::default()
        },
    };
    if let Some(episodes) = cli.episodes {
        options.number_episodes = episodes;
    }
    if let Some(horizon) = cli.horizon {
        options.planning_horizon = horizon;
    }
    if options.progress_interval.is_none() {
        options.progress_interval = Some((options.number_episodes / 10).max(1));
    }
    Ok(options)
}

fn run_with<C>(control: C, env: BlocksWorld, seed: u64, options: &LearnOptions) -> Result<Vec<TrialMetrics>>
where
    C: Control<BlocksState, BlockMove>,
{
    let mut mc = MonteCarlo::new(env, control, seed);
    mc.learn_policy(options)?;
    Ok(mc.metrics().to_vec())
}

/// 试验编排: 规划概率列表整体重复 `trials` 次，按顺序全局编号
///
/// 返回 (试验编号, 规划概率)。
fn trial_schedule(planning_factors: &[f64], trials: usize) -> Vec<(usize, f64)> {
    (0..trials)
        .flat_map(|_| planning_factors.iter().copied())
        .enumerate()
        .collect()
}

/// 运行一次完整试验
fn run_trial(cli: &Cli, options: &LearnOptions, seed: u64) -> Result<Vec<TrialMetrics>> {
    let env = BlocksWorld::new(cli.blocks)?;
    match cli.control {
        ControlKind::Tabular => run_with(TabularControl::new(TabularConfig::default())?, env, seed, options),
        ControlKind::Sgd => run_with(
            SgdControl::new(BlockFeatures, SgdConfig::default())?,
            env,
            seed,
            options,
        ),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let base = build_options(&cli)?;
    base.validate()?;

    log::info!(
        "{} 个方块, {} 局/试验, {} 次试验/规划概率, 规划概率 {:?}, 控制 {:?}",
        cli.blocks,
        base.number_episodes,
        cli.trials,
        cli.planning_factors,
        cli.control
    );

    TrialLog::write_header(&cli.output)
        .with_context(|| format!("无法写入 {}", cli.output))?;

    let schedule = trial_schedule(&cli.planning_factors, cli.trials);
    for (_, planning_factor) in &schedule {
        LearnOptions {
            planning_factor: *planning_factor,
            ..base.clone()
        }
        .validate()?;
    }

    // 各试验互不共享可变状态
    let results: Vec<Result<Vec<TrialMetrics>>> = thread::scope(|scope| {
        let handles: Vec<_> = schedule
            .iter()
            .map(|&(trial_number, planning_factor)| {
                let cli = &cli;
                let options = LearnOptions {
                    planning_factor,
                    ..base.clone()
                };
                scope.spawn(move || run_trial(cli, &options, cli.seed + trial_number as u64))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("试验线程崩溃")),
            })
            .collect()
    });

    let mut trial_log = TrialLog::new();
    for (&(trial_number, planning_factor), result) in schedule.iter().zip(results) {
        let metrics = result
            .with_context(|| format!("试验 {} 失败 (规划概率 {})", trial_number, planning_factor))?;
        log::info!(
            "试验 {} (规划概率 {:.2}): 平均回报比 {:.4}, 最后 10% {:.4}",
            trial_number,
            planning_factor,
            mean_return_ratio(&metrics).unwrap_or(0.0),
            tail_mean_return_ratio(&metrics, 0.1).unwrap_or(0.0)
        );
        trial_log.extend_trial(trial_number, planning_factor, &metrics);
    }
    trial_log.append_to_csv(&cli.output)?;

    log::info!("结果已写入 {}", cli.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_numbers_are_global() {
        let schedule = trial_schedule(&[0.5, 0.6, 0.7], 2);
        assert_eq!(
            schedule,
            vec![(0, 0.5), (1, 0.6), (2, 0.7), (3, 0.5), (4, 0.6), (5, 0.7)]
        );
        assert!(trial_schedule(&[0.5], 0).is_empty());
    }
}
