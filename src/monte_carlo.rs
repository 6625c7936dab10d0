// monte_carlo.rs - 蒙特卡洛控制器模块
//
// 一个控制器实例拥有一次试验的全部学习状态: 环境、策略存储、随机源和指标。
// 每次试验新建一个实例，试验之间没有共享的可变状态。

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{LearnOptions, TruncationPolicy};
use crate::control::Control;
use crate::episode::{Episode, EpisodeGenerator};
use crate::error::McError;
use crate::game_env::Environment;
use crate::planning::Planner;

/// 最优回报小于该值时不计算回报比
const MIN_OPTIMAL_RETURN: f64 = 1e-12;

// ================ 单局指标 ================

/// 单局指标，按 episode 顺序追加，追加后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialMetrics {
    /// 从 0 开始的 episode 序号 (跨多次 learn_policy 调用连续编号)
    pub episode: usize,
    /// 观测到的折扣回报
    pub observed_return: f64,
    /// 起始局面的最优折扣回报
    pub optimal_return: f64,
    /// observed / optimal；被截断且策略为 Exclude，或最优回报为 0 时为 None
    pub return_ratio: Option<f64>,
    pub episode_length: usize,
    pub truncated: bool,
    /// 本局中使用规划结果的决策数
    pub planned_decisions: usize,
}

/// 所有有效回报比的均值
pub fn mean_return_ratio(metrics: &[TrialMetrics]) -> Option<f64> {
    let ratios: Vec<f64> = metrics.iter().filter_map(|m| m.return_ratio).collect();
    if ratios.is_empty() {
        None
    } else {
        Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
    }
}

/// 最后 `fraction` 比例 episode 的平均回报比 (至少取一局)
pub fn tail_mean_return_ratio(metrics: &[TrialMetrics], fraction: f64) -> Option<f64> {
    if metrics.is_empty() {
        return None;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let count = ((metrics.len() as f64 * fraction).ceil() as usize).clamp(1, metrics.len());
    mean_return_ratio(&metrics[metrics.len() - count..])
}

// ================ 控制器 ================

/// 蒙特卡洛控制器
pub struct MonteCarlo<E: Environment, C> {
    env: E,
    control: C,
    rng: ChaCha8Rng,
    metrics: Vec<TrialMetrics>,
    last_episode: Option<Episode<E::State, E::Action>>,
}

impl<E, C> MonteCarlo<E, C>
where
    E: Environment,
    C: Control<E::State, E::Action>,
{
    pub fn new(env: E, control: C, seed: u64) -> Self {
        Self {
            env,
            control,
            rng: ChaCha8Rng::seed_from_u64(seed),
            metrics: Vec::new(),
            last_episode: None,
        }
    }

    /// 运行 `number_episodes` 局学习，返回本次调用产生的指标
    ///
    /// 出错时立即返回，已完成的指标仍可通过 `metrics()` 读取。
    /// 再次调用会在已更新的策略存储上继续学习。
    pub fn learn_policy(&mut self, options: &LearnOptions) -> Result<&[TrialMetrics], McError> {
        options.validate()?;

        let planner = if options.planning_factor > 0.0 {
            Some(Planner::new(options.planning_config())?)
        } else {
            None
        };
        let generator = match &planner {
            Some(planner) => EpisodeGenerator::new(options.max_episode_length).with_planner(
                planner,
                options.planning_factor,
                options.plan_on_empty_policy,
            ),
            None => EpisodeGenerator::new(options.max_episode_length),
        };

        let first = self.metrics.len();
        log::debug!(
            "开始学习: {} 局, γ={}, 规划概率={}, 视界={}",
            options.number_episodes,
            options.discount_rate,
            options.planning_factor,
            options.planning_horizon
        );

        for _ in 0..options.number_episodes {
            self.env.reset(&mut self.rng);
            let episode = generator.run(&mut self.env, &self.control, &mut self.rng)?;

            let record = self.measure(&episode, options);
            log::trace!(
                "episode {}: 回报 {:.4} / 最优 {:.4}, {} 步",
                record.episode,
                record.observed_return,
                record.optimal_return,
                record.episode_length
            );
            self.metrics.push(record);

            let update = self.control.update(&episode, options.discount_rate);
            self.last_episode = Some(episode);
            update?;

            if let Some(interval) = options.progress_interval {
                let done = self.metrics.len() - first;
                if done % interval == 0 {
                    let recent = &self.metrics[self.metrics.len() - interval.min(done)..];
                    log::info!(
                        "[{}/{}] 最近 {} 局平均回报比: {}",
                        done,
                        options.number_episodes,
                        recent.len(),
                        mean_return_ratio(recent)
                            .map(|r| format!("{:.4}", r))
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Ok(&self.metrics[first..])
    }

    fn measure(&self, episode: &Episode<E::State, E::Action>, options: &LearnOptions) -> TrialMetrics {
        let observed_return = episode.discounted_return(options.discount_rate);
        let optimal_return = self
            .env
            .optimal_return(episode.start_state(), options.discount_rate);
        let truncated = episode.is_truncated();

        let return_ratio = if truncated {
            match options.truncation {
                TruncationPolicy::ZeroRatio => Some(0.0),
                TruncationPolicy::Exclude => None,
            }
        } else if optimal_return.abs() < MIN_OPTIMAL_RETURN {
            None
        } else {
            Some(observed_return / optimal_return)
        };

        TrialMetrics {
            episode: self.metrics.len(),
            observed_return,
            optimal_return,
            return_ratio,
            episode_length: episode.len(),
            truncated,
            planned_decisions: episode.planned_decisions(),
        }
    }

    /// 目前为止的全部指标
    pub fn metrics(&self) -> &[TrialMetrics] {
        &self.metrics
    }

    /// 最近一局的完整轨迹
    pub fn last_episode(&self) -> Option<&Episode<E::State, E::Action>> {
        self.last_episode.as_ref()
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn into_control(self) -> C {
        self.control
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{SgdConfig, SgdControl, StepSize, TabularConfig, TabularControl};
    use crate::error::EmptyEpisodeError;
    use crate::game_env::corridor::{Corridor, Direction};
    use crate::game_env::{BlockFeatures, BlockMove, BlocksState, BlocksWorld};
    use approx::assert_relative_eq;

    fn blocks(size: usize, seed: u64) -> MonteCarlo<BlocksWorld, TabularControl<BlocksState, BlockMove>> {
        MonteCarlo::new(
            BlocksWorld::new(size).unwrap(),
            TabularControl::new(TabularConfig::default()).unwrap(),
            seed,
        )
    }

    #[test]
    fn test_zero_episodes() {
        let mut mc = blocks(3, 1);
        let options = LearnOptions {
            number_episodes: 0,
            ..LearnOptions::default()
        };
        assert!(mc.learn_policy(&options).unwrap().is_empty());
        assert!(mc.metrics().is_empty());
        assert!(mc.control().table().is_empty());
    }

    #[test]
    fn test_invalid_discount_rejected_before_learning() {
        let mut mc = blocks(3, 2);
        let options = LearnOptions {
            discount_rate: 0.0,
            number_episodes: 5,
            ..LearnOptions::default()
        };
        let err = mc.learn_policy(&options).unwrap_err();
        assert!(matches!(err, McError::Configuration(ref e) if e.field == "discount_rate"));
        assert!(mc.metrics().is_empty());
    }

    #[test]
    fn test_observed_return_matches_episode() {
        let mut mc = blocks(4, 3);
        let options = LearnOptions {
            discount_rate: 0.9,
            number_episodes: 20,
            max_episode_length: 8,
            ..LearnOptions::default()
        };
        mc.learn_policy(&options).unwrap();
        let last = mc.metrics().last().unwrap();
        let episode = mc.last_episode().unwrap();
        assert_relative_eq!(last.observed_return, episode.discounted_return(0.9));
        assert_eq!(last.episode_length, episode.len());
        assert_eq!(last.truncated, episode.is_truncated());
        assert_relative_eq!(
            last.optimal_return,
            mc.env().optimal_return(episode.start_state(), 0.9)
        );
    }

    #[test]
    fn test_truncation_zero_ratio() {
        let mut mc = MonteCarlo::new(
            Corridor::new(50),
            TabularControl::<usize, Direction>::new(TabularConfig::default()).unwrap(),
            4,
        );
        let options = LearnOptions {
            number_episodes: 3,
            max_episode_length: 4,
            truncation: TruncationPolicy::ZeroRatio,
            ..LearnOptions::default()
        };
        let metrics = mc.learn_policy(&options).unwrap();
        assert_eq!(metrics.len(), 3);
        for m in metrics {
            assert!(m.truncated);
            assert_eq!(m.episode_length, 4);
            assert_eq!(m.return_ratio, Some(0.0));
            assert_relative_eq!(m.optimal_return, 1.0);
        }
        assert_eq!(mean_return_ratio(mc.metrics()), Some(0.0));
    }

    #[test]
    fn test_truncation_exclude() {
        let mut mc = MonteCarlo::new(
            Corridor::new(50),
            TabularControl::<usize, Direction>::new(TabularConfig::default()).unwrap(),
            5,
        );
        let options = LearnOptions {
            number_episodes: 3,
            max_episode_length: 4,
            truncation: TruncationPolicy::Exclude,
            ..LearnOptions::default()
        };
        let metrics = mc.learn_policy(&options).unwrap();
        assert!(metrics.iter().all(|m| m.truncated && m.return_ratio.is_none()));
        assert_eq!(mean_return_ratio(mc.metrics()), None);
        // 截断的 episode 仍然用于更新
        assert!(mc.control().state_visits(&0) > 0);
    }

    #[test]
    fn test_empty_episode_keeps_partial_metrics() {
        let mut mc = MonteCarlo::new(
            Corridor::new(3).starting_at(3),
            TabularControl::<usize, Direction>::new(TabularConfig::default()).unwrap(),
            6,
        );
        let options = LearnOptions {
            number_episodes: 10,
            ..LearnOptions::default()
        };
        let err = mc.learn_policy(&options).unwrap_err();
        assert_eq!(err, McError::EmptyEpisode(EmptyEpisodeError));
        assert_eq!(mc.metrics().len(), 1);
        assert_eq!(mc.metrics()[0].return_ratio, None);
    }

    #[test]
    fn test_second_call_continues() {
        let mut mc = blocks(3, 7);
        let options = LearnOptions {
            number_episodes: 5,
            max_episode_length: 6,
            ..LearnOptions::default()
        };
        mc.learn_policy(&options).unwrap();
        let visits: usize = mc.control().table().num_pairs();
        let second = mc.learn_policy(&options).unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].episode, 5);
        assert_eq!(mc.metrics().len(), 10);
        assert!(mc.control().table().num_pairs() >= visits);
    }

    #[test]
    fn test_same_seed_same_metrics() {
        let options = LearnOptions {
            number_episodes: 50,
            max_episode_length: 8,
            planning_factor: 0.5,
            planning_horizon: 3,
            ..LearnOptions::default()
        };
        let mut a = blocks(4, 42);
        let mut b = blocks(4, 42);
        assert_eq!(
            a.learn_policy(&options).unwrap().to_vec(),
            b.learn_policy(&options).unwrap().to_vec()
        );
    }

    /// 3 个方块、不规划、10000 局后最后 10% 的平均回报比
    fn converged_tail(seed: u64, discount_rate: f64, max_episode_length: usize) -> (f64, usize) {
        let mut mc = blocks(3, seed);
        let options = LearnOptions {
            discount_rate,
            number_episodes: 10_000,
            planning_factor: 0.0,
            max_episode_length,
            ..LearnOptions::default()
        };
        let metrics = mc.learn_policy(&options).unwrap();
        assert_eq!(metrics.len(), 10_000);
        let tail = &metrics[9_000..];
        let truncated = tail.iter().filter(|m| m.truncated).count();
        (tail_mean_return_ratio(metrics, 0.1).unwrap(), truncated)
    }

    #[test]
    fn test_converges_without_planning() {
        for seed in [1, 2, 3, 2024, 99] {
            let (tail, truncated) = converged_tail(seed, 1.0, 6);
            assert!(tail >= 0.95, "种子 {}: 尾部平均回报比 {}", seed, tail);
            assert!(truncated < 50, "种子 {}: 最后 1000 局有 {} 局被截断", seed, truncated);
        }
    }

    #[test]
    fn test_converges_to_shortest_paths() {
        // γ < 1 时只有最短路径的回报比为 1
        for seed in [1, 2, 3, 2024, 99] {
            let (tail, _) = converged_tail(seed, 0.9, 6);
            assert!(tail >= 0.95, "种子 {}: 尾部平均回报比 {}", seed, tail);
        }
        for seed in [1, 7] {
            let (tail, _) = converged_tail(seed, 0.9, 20);
            assert!(tail >= 0.95, "种子 {} (最长 20 步): 尾部平均回报比 {}", seed, tail);
        }
    }

    #[test]
    fn test_planning_run_records_planned_decisions() {
        let mut mc = blocks(4, 8);
        let options = LearnOptions {
            discount_rate: 0.95,
            number_episodes: 30,
            planning_factor: 0.7,
            plan_on_empty_policy: true,
            planning_horizon: 4,
            planning_rollouts: 2,
            max_episode_length: 8,
            ..LearnOptions::default()
        };
        let metrics = mc.learn_policy(&options).unwrap();
        assert_eq!(metrics.len(), 30);
        assert!(metrics.iter().map(|m| m.planned_decisions).sum::<usize>() > 0);
        assert!(metrics
            .iter()
            .filter_map(|m| m.return_ratio)
            .all(|r| (0.0..=1.0 + 1e-9).contains(&r)));
    }

    #[test]
    fn test_gradient_control_run() {
        let control = SgdControl::new(
            BlockFeatures,
            SgdConfig {
                step_size: StepSize::Constant { alpha: 0.1 },
                ..SgdConfig::default()
            },
        )
        .unwrap();
        let mut mc = MonteCarlo::new(BlocksWorld::new(4).unwrap(), control, 9);
        let options = LearnOptions {
            discount_rate: 0.9,
            number_episodes: 200,
            max_episode_length: 8,
            ..LearnOptions::default()
        };
        mc.learn_policy(&options).unwrap();
        assert_eq!(mc.metrics().len(), 200);
        assert_eq!(mc.control().episodes_seen(), 200);
        assert!(mc.control().weights().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_tail_mean() {
        let m = |episode: usize, ratio: Option<f64>| TrialMetrics {
            episode,
            observed_return: 0.0,
            optimal_return: 1.0,
            return_ratio: ratio,
            episode_length: 1,
            truncated: false,
            planned_decisions: 0,
        };
        let metrics: Vec<_> = (0..10)
            .map(|i| m(i, if i < 8 { Some(0.0) } else { Some(1.0) }))
            .collect();
        assert_relative_eq!(mean_return_ratio(&metrics).unwrap(), 0.2);
        assert_relative_eq!(tail_mean_return_ratio(&metrics, 0.2).unwrap(), 1.0);
        assert_eq!(tail_mean_return_ratio(&[], 0.1), None);
        let with_gap = vec![m(0, None), m(1, Some(0.5))];
        assert_relative_eq!(mean_return_ratio(&with_gap).unwrap(), 0.5);
    }
}
