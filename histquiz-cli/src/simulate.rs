//! Automated play-throughs for balancing and regression checks.
use clap::ValueEnum;
use colored::Colorize;
use histquiz_game::{
    EngineConfig, Outcome, QuizData, QuizError, QuizSession, SeededShuffler, SessionStatus,
    is_correct_choice,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Guard against scenarios whose correct paths loop forever.
const MAX_STEPS: usize = 1_000;

/// What a policy can see of one presented choice.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub correct: bool,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    fn name(&self) -> &'static str;

    /// Position of the chosen candidate. `candidates` is never empty.
    fn pick(&mut self, node_id: &str, candidates: &[Candidate<'_>]) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Always picks a correct choice when one is offered
    Oracle,
    /// Picks uniformly at random
    Random,
}

impl Strategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Oracle => "Oracle",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Oracle => Box::new(OraclePolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }

    /// An oracle run that does not clear the scenario is a failure.
    const fn expects_clear(self) -> bool {
        matches!(self, Self::Oracle)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct OraclePolicy;

impl PlayerPolicy for OraclePolicy {
    fn name(&self) -> &'static str {
        "Oracle"
    }

    fn pick(&mut self, _node_id: &str, candidates: &[Candidate<'_>]) -> usize {
        candidates
            .iter()
            .position(|candidate| candidate.correct)
            .unwrap_or(0)
    }
}

struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick(&mut self, _node_id: &str, candidates: &[Candidate<'_>]) -> usize {
        self.rng.gen_range(0..candidates.len())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub cleared: usize,
    pub game_over: usize,
    pub longest_path: usize,
    pub average_path: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

impl SimulationResult {
    #[must_use]
    pub fn clear_rate(&self) -> f64 {
        if self.iterations_run == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.cleared as f64 / self.iterations_run as f64;
        rate * 100.0
    }
}

/// One finished play-through.
#[derive(Debug, Clone)]
struct RunSummary {
    status: SessionStatus,
    path: Vec<String>,
}

pub struct Simulator {
    data: QuizData,
    config: EngineConfig,
    verbose: bool,
}

impl Simulator {
    #[must_use]
    pub const fn new(data: QuizData, config: EngineConfig, verbose: bool) -> Self {
        Self {
            data,
            config,
            verbose,
        }
    }

    pub fn run(&self, strategy: Strategy, seeds: &[u64], iterations: usize) -> Vec<SimulationResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Simulating {} policy (seed {seed}, {iterations} iterations)",
                        strategy.label().bright_white()
                    );
                }
                self.run_seed(strategy, seed, iterations)
            })
            .collect()
    }

    fn run_seed(&self, strategy: Strategy, seed: u64, iterations: usize) -> SimulationResult {
        let mut cleared = 0;
        let mut game_over = 0;
        let mut path_lengths = Vec::with_capacity(iterations);
        let mut failures = Vec::new();
        let mut performance_data = Vec::with_capacity(iterations);

        for i in 0..iterations {
            let started = Instant::now();
            let failures_before = failures.len();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let run = self.play_once(strategy, iteration_seed);
            performance_data.push(started.elapsed());

            match run {
                Ok(summary) => {
                    path_lengths.push(summary.path.len());
                    match summary.status {
                        SessionStatus::GameClear => cleared += 1,
                        SessionStatus::GameOver => {
                            game_over += 1;
                            if strategy.expects_clear() {
                                failures.push(format!(
                                    "Iteration {} (seed {iteration_seed}): game over along {}",
                                    i + 1,
                                    summary.path.join(" -> ")
                                ));
                            }
                        }
                        status => failures.push(format!(
                            "Iteration {} (seed {iteration_seed}): stopped while {status} along {}",
                            i + 1,
                            summary.path.join(" -> ")
                        )),
                    }
                }
                Err(err) => {
                    log::warn!("iteration {} with seed {iteration_seed} failed: {err}", i + 1);
                    failures.push(format!("Iteration {} (seed {iteration_seed}): {err}", i + 1));
                }
            }
            if self.verbose
                && failures.len() > failures_before
                && let Some(failure) = failures.last()
            {
                println!("  ❌ {}", failure.red());
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(u32::MAX)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_path = if path_lengths.is_empty() {
            0.0
        } else {
            path_lengths.iter().sum::<usize>() as f64 / path_lengths.len() as f64
        };

        SimulationResult {
            strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            cleared,
            game_over,
            longest_path: path_lengths.iter().copied().max().unwrap_or(0),
            average_path,
            failures,
            average_duration,
            performance_data,
        }
    }

    /// Play one session to a terminal state, skipping the advance delay.
    fn play_once(&self, strategy: Strategy, seed: u64) -> Result<RunSummary, QuizError> {
        let mut session =
            QuizSession::from_data(&self.data, self.config.clone(), SeededShuffler::new(seed))?;
        let mut policy = strategy.create_policy(seed);
        session.start()?;

        let mut path = Vec::new();
        while !session.is_terminal() {
            if path.len() >= MAX_STEPS {
                log::warn!("{} policy exceeded {MAX_STEPS} steps", policy.name());
                break;
            }
            let view = session.present_node()?;
            path.push(view.node_id.clone());
            if view.choices.is_empty() {
                log::warn!("node '{}' has no choices", view.node_id);
                break;
            }

            let mut candidates = Vec::with_capacity(view.choices.len());
            for presented in &view.choices {
                let choice = session.engine().choice(presented.choice_ref)?;
                candidates.push(Candidate {
                    text: &presented.text,
                    correct: is_correct_choice(
                        session.engine().predicate(),
                        &choice.semantic_node_id,
                    ),
                });
            }
            let position = policy
                .pick(&view.node_id, &candidates)
                .min(candidates.len() - 1);
            log::debug!(
                "{} picked '{}' at '{}'",
                policy.name(),
                candidates[position].text,
                view.node_id
            );

            let resolution = session.resolve_choice(view.choices[position].choice_ref)?;
            if let Outcome::CorrectContinue { next_node_id } = &resolution.outcome {
                log::debug!("{} advanced to '{next_node_id}'", policy.name());
            }
        }

        Ok(RunSummary {
            status: session.status(),
            path,
        })
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
            .collect())
    }
}
