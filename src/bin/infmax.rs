//! infmax CLI: run influence-maximization campaigns over edge-list graphs.
//!
//! Every mode reads an ASCII edge list (`<src> <tgt> <prob>` per line) and
//! prints one whitespace-separated row per round: round index, chosen seeds
//! (comma-joined), observed spread, elapsed seconds, and — when posterior
//! updates are live — the number of updated arcs and the mean posterior
//! mean.

use std::fs::File;
use std::io::BufReader;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};

use infmax::{
    beta_graph, parse_edge_list, point_graph, CachePolicy, CelfEvaluator, EdgeRecord,
    EpsilonGreedyConfig, EpsilonGreedyStrategy, Evaluator, EvaluatorKind, ExpGradientConfig,
    ExponentiatedGradientStrategy, OriginalGraphStrategy, PathSampler, RandomEvaluator,
    RoundReport, SampleKind, SampleManager, SeedSet, SpreadSampler, Strategy, ZScoresConfig,
    ZScoresStrategy,
};

#[derive(Parser)]
#[command(name = "infmax")]
#[command(version)]
#[command(about = "Online influence maximization under uncertain edge probabilities")]
struct Cli {
    /// RNG seed shared by all stochastic components.
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Point-probability graph, single evaluator across the budget.
    Real {
        graph: String,
        /// Evaluator index: 0=CELF 1=Random 2=DiscountDegree 3=TIM 4=HighestDegree.
        exploit: u32,
        budget: u32,
        k: usize,
        /// Keep live-edge samples across rounds (1) or rebuild per round (0).
        inc: Option<u32>,
        samples: Option<u64>,
    },
    /// Beta graph, single evaluator, posterior updates on or off.
    Prior {
        graph: String,
        alpha: f64,
        beta: f64,
        exploit: u32,
        budget: u32,
        k: usize,
        /// 1 updates posteriors (default), 0 freezes them.
        update: Option<u32>,
        samples: Option<u64>,
    },
    /// Pure exploration sanity run (epsilon = 1).
    Explore {
        graph: String,
        alpha: f64,
        beta: f64,
        explore: u32,
        budget: u32,
        k: usize,
        /// Edge reading for exploration: 0=mean 1=lower 2=upper 3=draw.
        int_explore: Option<u32>,
        /// Sample-cache refresh period in rounds (0 = every round).
        learn: Option<u32>,
    },
    /// Epsilon-greedy arbitration between exploit and explore evaluators.
    Egreedy {
        graph: String,
        alpha: f64,
        beta: f64,
        exploit: u32,
        explore: u32,
        budget: u32,
        k: usize,
        epsilon: f64,
        update: Option<u32>,
        learn: Option<u32>,
        /// Edge reading for the exploit branch: 0=mean 1=lower 2=upper 3=draw.
        int_exploit: Option<u32>,
        /// Edge reading for the explore branch: 0=mean 1=lower 2=upper 3=draw.
        int_explore: Option<u32>,
        inc: Option<u32>,
        samples: Option<u64>,
    },
    /// Exponentiated-gradient mixture over edge readings.
    Eg {
        graph: String,
        alpha: f64,
        beta: f64,
        exploit: u32,
        budget: u32,
        k: usize,
        update: Option<u32>,
        learn: Option<u32>,
        inc: Option<u32>,
    },
    /// Z-score (UCB-style) arbitration over the evaluator pool.
    Zsc {
        graph: String,
        alpha: f64,
        beta: f64,
        exploit: u32,
        budget: u32,
        k: usize,
        update: Option<u32>,
        learn: Option<u32>,
    },
    /// Measure sampling time per sample per node.
    Benchmark {
        graph: String,
        alpha: f64,
        beta: f64,
        update: Option<u32>,
        samples: Option<u64>,
    },
    /// Compare CELF against the random baseline at fixed k.
    Spread {
        graph: String,
        alpha: f64,
        beta: f64,
        k: usize,
        samples: Option<u64>,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn load_edges(path: &str) -> Vec<EdgeRecord> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => fail(format_args!("cannot open `{path}`: {e}")),
    };
    match parse_edge_list(BufReader::new(file)) {
        Ok(edges) => edges,
        Err(e) => fail(e),
    }
}

fn evaluator_for(index: u32, max_index: u32, seed: u64) -> Box<dyn Evaluator> {
    match EvaluatorKind::from_index(index, max_index) {
        Some(kind) => kind.build(seed),
        None => fail(format_args!(
            "evaluator index {index} out of range 0..={max_index}"
        )),
    }
}

fn reading_for(index: u32) -> SampleKind {
    match index {
        0 => SampleKind::Mean,
        1 => SampleKind::Lower,
        2 => SampleKind::Upper,
        3 => SampleKind::Draw,
        other => fail(format_args!("edge reading {other} out of range 0..=3")),
    }
}

fn flag(value: Option<u32>, default: bool) -> bool {
    value.map(|v| v == 1).unwrap_or(default)
}

fn validate_run(budget: u32, k: usize) {
    if budget == 0 {
        fail("budget must be positive");
    }
    if k == 0 {
        fail("k must be positive");
    }
}

fn cache_policy(inc: Option<u32>, learn: Option<u32>) -> CachePolicy {
    CachePolicy {
        incremental: flag(inc, false),
        refresh_every: learn.unwrap_or(0),
    }
}

fn print_rounds(reports: &[RoundReport], k: usize) {
    for r in reports {
        if r.seeds.len() < k {
            eprintln!(
                "warning: round {} found only {} of {k} seeds; graph exhausted",
                r.round,
                r.seeds.len()
            );
        }
        let seeds = r
            .seeds
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        match r.posterior {
            Some(p) => println!(
                "{}\t{}\t{:.4}\t{:.4}\t{}\t{:.6}",
                r.round, seeds, r.spread, r.elapsed_s, p.updated_arcs, p.mean
            ),
            None => println!(
                "{}\t{}\t{:.4}\t{:.4}",
                r.round, seeds, r.spread, r.elapsed_s
            ),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let seed = cli.seed;
    match cli.command {
        Command::Real {
            graph,
            exploit,
            budget,
            k,
            inc,
            samples,
        } => {
            validate_run(budget, k);
            let edges = load_edges(&graph);
            let real = point_graph(&edges);
            let evaluator = evaluator_for(exploit, 4, seed);
            let mut strategy = OriginalGraphStrategy::new(
                real,
                EvaluatorKind::from_index(exploit, 4).map(|e| e.name()).unwrap_or("?"),
                evaluator,
                samples.unwrap_or(100),
                false,
                cache_policy(inc, None),
                seed,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Prior {
            graph,
            alpha,
            beta,
            exploit,
            budget,
            k,
            update,
            samples,
        } => {
            validate_run(budget, k);
            let edges = load_edges(&graph);
            let model = beta_graph(&edges, alpha, beta);
            let evaluator = evaluator_for(exploit, 3, seed);
            let mut strategy = OriginalGraphStrategy::new(
                model,
                EvaluatorKind::from_index(exploit, 3).map(|e| e.name()).unwrap_or("?"),
                evaluator,
                samples.unwrap_or(100),
                flag(update, true),
                CachePolicy::default(),
                seed,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Explore {
            graph,
            alpha,
            beta,
            explore,
            budget,
            k,
            int_explore,
            learn,
        } => {
            validate_run(budget, k);
            let edges = load_edges(&graph);
            let kind = reading_for(int_explore.unwrap_or(0));
            let cfg = EpsilonGreedyConfig {
                trials: 1000,
                explore_kind: kind,
                cache: cache_policy(None, learn),
                seed,
                ..EpsilonGreedyConfig::default()
            };
            let mut strategy = EpsilonGreedyStrategy::pure_exploration(
                beta_graph(&edges, alpha, beta),
                point_graph(&edges),
                evaluator_for(explore, 3, seed),
                evaluator_for(explore, 3, seed.wrapping_add(1)),
                cfg,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Egreedy {
            graph,
            alpha,
            beta,
            exploit,
            explore,
            budget,
            k,
            epsilon,
            update,
            learn,
            int_exploit,
            int_explore,
            inc,
            samples,
        } => {
            validate_run(budget, k);
            if !(0.0..=1.0).contains(&epsilon) {
                fail("epsilon must be within [0, 1]");
            }
            let edges = load_edges(&graph);
            let cfg = EpsilonGreedyConfig {
                epsilon,
                trials: samples.unwrap_or(1000),
                update: flag(update, true),
                exploit_kind: reading_for(int_exploit.unwrap_or(0)),
                explore_kind: reading_for(int_explore.unwrap_or(2)),
                cache: cache_policy(inc, learn),
                seed,
            };
            let mut strategy = EpsilonGreedyStrategy::new(
                beta_graph(&edges, alpha, beta),
                point_graph(&edges),
                evaluator_for(explore, 3, seed),
                evaluator_for(exploit, 3, seed.wrapping_add(1)),
                cfg,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Eg {
            graph,
            alpha,
            beta,
            exploit,
            budget,
            k,
            update,
            learn,
            inc,
        } => {
            validate_run(budget, k);
            let edges = load_edges(&graph);
            let cfg = ExpGradientConfig {
                trials: 100,
                update: flag(update, true),
                learning_rate: None,
                cache: cache_policy(inc, learn),
                seed,
            };
            let mut strategy = ExponentiatedGradientStrategy::new(
                beta_graph(&edges, alpha, beta),
                point_graph(&edges),
                evaluator_for(exploit, 3, seed),
                cfg,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Zsc {
            graph,
            alpha,
            beta,
            exploit,
            budget,
            k,
            update,
            learn,
        } => {
            validate_run(budget, k);
            if EvaluatorKind::from_index(exploit, 3).is_none() {
                fail(format_args!("evaluator index {exploit} out of range 0..=3"));
            }
            let edges = load_edges(&graph);
            // The whole pool competes; the chosen index leads the
            // round-robin first pass.
            let order = [
                EvaluatorKind::Celf,
                EvaluatorKind::Random,
                EvaluatorKind::DiscountDegree,
                EvaluatorKind::Tim,
            ];
            let pool = (0..order.len())
                .map(|i| order[(i + exploit as usize) % order.len()])
                .map(|kind| (kind.name().to_string(), kind.build(seed)))
                .collect();
            let cfg = ZScoresConfig {
                trials: 100,
                update: flag(update, true),
                cache: cache_policy(None, learn),
                seed,
                ..ZScoresConfig::default()
            };
            let mut strategy = ZScoresStrategy::new(
                beta_graph(&edges, alpha, beta),
                point_graph(&edges),
                pool,
                cfg,
            );
            print_rounds(&strategy.perform(budget, k), k);
        }
        Command::Benchmark {
            graph,
            alpha,
            beta,
            update: _update,
            samples,
        } => {
            let edges = load_edges(&graph);
            let g = beta_graph(&edges, alpha, beta);
            let report = SpreadSampler::benchmark_single_seeds(&g, samples.unwrap_or(100), seed);
            println!("{} nodes, {} edges", report.node_count, report.edge_count);
            println!("total time {:.4}min", report.total_secs / 60.0);
            println!("time/sample/node {:.6}ms", report.per_sample_per_node_ms);
        }
        Command::Spread {
            graph,
            alpha,
            beta,
            k,
            samples,
        } => {
            if k == 0 {
                fail("k must be positive");
            }
            let edges = load_edges(&graph);
            let g = beta_graph(&edges, alpha, beta);
            let trials = samples.unwrap_or(100).max(1) as usize;
            let sampler = PathSampler::new(SampleKind::Mean, trials);
            let activated = SeedSet::new();

            let mut cache = SampleManager::new(seed);
            let mut celf = CelfEvaluator::new();
            let start = Instant::now();
            let celf_seeds = celf.select(&g, &sampler, &mut cache, &activated, k);
            let celf_min = start.elapsed().as_secs_f64() / 60.0;
            let celf_spread = sampler.spread(&g, &mut cache, &activated, celf_seeds.iter().copied());

            let mut cache = SampleManager::new(seed);
            let mut random = RandomEvaluator::with_seed(seed);
            let start = Instant::now();
            let random_seeds = random.select(&g, &sampler, &mut cache, &activated, k);
            let random_min = start.elapsed().as_secs_f64() / 60.0;
            let random_spread =
                sampler.spread(&g, &mut cache, &activated, random_seeds.iter().copied());

            println!("{k}\t{celf_min:.6}\t{random_min:.6}\t{celf_spread:.4}\t{random_spread:.4}");
        }
    }
}
