// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use rayon::prelude::*;
use serde::Serialize;
use std::{fs::File, io::BufWriter, time::Instant};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use yard_model::prelude::*;
use yard_solver::prelude::*;

const EVALUATION_SAMPLES: usize = 200;
const EVALUATION_SEED: u64 = 7;
const ADP_ITERATIONS: usize = 100;
/// Exact methods only run when a scenario has at most this many realizations.
const EXACT_REALIZATIONS: u128 = 5_000;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

#[derive(Debug, Clone, Copy, Serialize)]
enum Layout {
    SingleStackBlocks { blocks: usize, max_height: usize },
    Bays { bays: usize, max_height: usize },
}

impl Layout {
    fn terminal(self) -> Terminal {
        match self {
            Layout::SingleStackBlocks { blocks, max_height } => {
                Terminal::empty_single_stack_blocks(blocks, max_height)
            }
            Layout::Bays { bays, max_height } => Terminal::empty_bays(bays, max_height),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
enum PolicyKind {
    Myopic,
    Mm,
    MmAdopted,
    AdpTable,
    AdpBasis,
    Pbfs,
}

#[derive(Debug, Clone, Serialize)]
struct ScenarioInfo {
    idx: usize,
    seed: u64,
    layout: Layout,
    num_containers: usize,
    period_slots: usize,
    batches: usize,
    max_realizations: String,
}

#[derive(Debug, Clone, Serialize)]
struct PolicyResult {
    policy: PolicyKind,
    mean: Option<f64>,
    std_dev: Option<f64>,
    /// Exact expected relocations, where the policy can compute them.
    expected: Option<f64>,
    error: Option<String>,
    elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
struct ScenarioResult {
    scenario: ScenarioInfo,
    policies: Vec<PolicyResult>,
}

#[derive(Debug, Clone, Serialize)]
struct BenchmarkReport {
    description: String,
    evaluation_samples: usize,
    scenarios: Vec<ScenarioResult>,
}

struct Scenario {
    events: Events,
    initial: Terminal,
    exact: bool,
}

impl Scenario {
    fn evaluation_source(&self) -> EvaluatableEvents {
        EvaluatableEvents::from_events(self.events.clone(), EVALUATION_SAMPLES, EVALUATION_SEED)
    }
}

/// Plays the policy on the shared evaluation episodes.
fn evaluate<P: Policy>(policy: &mut P, scenario: &Scenario) -> Result<(f64, f64), SolveError> {
    let mut source = scenario.evaluation_source();
    evaluate_policy(policy, &scenario.initial, &mut source, EVALUATION_SAMPLES)
}

fn adp_config(seed: u64) -> AdpConfig {
    AdpConfig {
        iterations: ADP_ITERATIONS,
        seed,
        evaluation: EvaluationConfig {
            every: ADP_ITERATIONS / 4,
            samples: 50,
        },
        ..AdpConfig::default()
    }
}

fn run_adp<V: ValueFunction>(
    vfa: V,
    scenario: &Scenario,
    seed: u64,
) -> Result<(f64, f64, Option<f64>), SolveError> {
    let source = SampledEvents::new(scenario.events.clone(), seed);
    let mut engine = AdpEngine::new(
        adp_config(seed),
        vfa,
        source,
        scenario.initial.clone(),
        Designations::new(),
    );
    engine.train()?;
    let (mean, std_dev) = evaluate(&mut engine, scenario)?;
    Ok((mean, std_dev, None))
}

fn run_policy(kind: PolicyKind, scenario: &Scenario, seed: u64) -> PolicyResult {
    let t0 = Instant::now();
    let result = match kind {
        PolicyKind::Myopic => {
            let mut policy = MyopicPolicy::new(PlacementScope::unrestricted(), seed);
            evaluate(&mut policy, scenario).map(|(m, s)| (m, s, None))
        }
        PolicyKind::Mm | PolicyKind::MmAdopted => {
            let variant = match kind {
                PolicyKind::Mm => MmVariant::Standard,
                _ => MmVariant::Adopted,
            };
            let mut policy = MmPolicy::mm(variant, scenario.events.clone(), Designations::new());
            evaluate(&mut policy, scenario).and_then(|(m, s)| {
                let expected = if scenario.exact {
                    Some(policy.expected_relocations(&scenario.initial)?.to_f64())
                } else {
                    None
                };
                Ok((m, s, expected))
            })
        }
        PolicyKind::AdpTable => {
            run_adp(StateTable::new(StepSize::harmonic(25.0, 0.05)), scenario, seed)
        }
        PolicyKind::AdpBasis => {
            let vfa = BasisFunctions::new(
                FeatureSet::vfa1(),
                BasisConfig::default(),
                scenario.events.clone(),
                Designations::new(),
            );
            run_adp(vfa, scenario, seed)
        }
        PolicyKind::Pbfs => Pbfs::new(scenario.events.clone(), &scenario.initial).and_then(
            |mut pbfs| {
                let expected = pbfs.expected_relocations().to_f64();
                let (mean, std_dev) = evaluate(&mut pbfs, scenario)?;
                Ok((mean, std_dev, Some(expected)))
            },
        ),
    };
    let elapsed_ms = t0.elapsed().as_millis();

    match result {
        Ok((mean, std_dev, expected)) => {
            info!(?kind, mean, std_dev, elapsed_ms, "policy finished");
            PolicyResult {
                policy: kind,
                mean: Some(mean),
                std_dev: Some(std_dev),
                expected,
                error: None,
                elapsed_ms,
            }
        }
        Err(e) => {
            warn!(?kind, error = %e, "policy failed");
            PolicyResult {
                policy: kind,
                mean: None,
                std_dev: None,
                expected: None,
                error: Some(e.to_string()),
                elapsed_ms,
            }
        }
    }
}

fn main() {
    enable_tracing();

    // (layout, containers, slots); smallest first so the exact methods get a turn.
    let setups = [
        (
            Layout::SingleStackBlocks {
                blocks: 4,
                max_height: 3,
            },
            5usize,
            3usize,
        ),
        (
            Layout::SingleStackBlocks {
                blocks: 7,
                max_height: 4,
            },
            14,
            4,
        ),
        (
            Layout::Bays {
                bays: 3,
                max_height: 4,
            },
            30,
            5,
        ),
    ];

    let mut results = Vec::with_capacity(setups.len());
    for (idx, (layout, num_containers, period_slots)) in setups.into_iter().enumerate() {
        let seed = 42 + idx as u64;
        let config = EventGenConfigBuilder::new()
            .num_containers(num_containers)
            .period_slots(period_slots)
            .expected_dwell(period_slots as f64 / 2.0)
            .seed(seed)
            .build()
            .expect("valid generator config");
        let events = EventGenerator::new(config).generate();
        let max_realizations = events.max_realizations();
        let scenario = Scenario {
            exact: max_realizations <= EXACT_REALIZATIONS,
            initial: layout.terminal(),
            events,
        };
        info!(idx, seed, max_realizations, exact = scenario.exact, "scenario generated");

        let mut kinds = vec![
            PolicyKind::Myopic,
            PolicyKind::Mm,
            PolicyKind::MmAdopted,
            PolicyKind::AdpTable,
            PolicyKind::AdpBasis,
        ];
        if scenario.exact {
            kinds.push(PolicyKind::Pbfs);
        }

        let policies: Vec<PolicyResult> = kinds
            .par_iter()
            .map(|&kind| run_policy(kind, &scenario, seed))
            .collect();

        results.push(ScenarioResult {
            scenario: ScenarioInfo {
                idx,
                seed,
                layout,
                num_containers,
                period_slots,
                batches: scenario.events.len(),
                max_realizations: max_realizations.to_string(),
            },
            policies,
        });
    }

    let report = BenchmarkReport {
        description: "Relocations per policy on generated scenarios, evaluated on shared episodes."
            .into(),
        evaluation_samples: EVALUATION_SAMPLES,
        scenarios: results,
    };

    let file = File::create("yard_results.json").expect("create yard_results.json");
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report).expect("write json report");

    println!();
    println!("Wrote: yard_results.json");
}
