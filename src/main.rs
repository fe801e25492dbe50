/*!
 * fenwick-bench
 * Benchmark harness: generates deterministic workloads, runs the selected
 * strategy alongside the sequential reference, validates results, and
 * reports timing
 */

use clap::Parser;
use fenwick_par::{
    BatchExecutor, Generator, Operation, PipelineExecutor, SequentialExecutor, Strategy,
};
use std::process;
use std::time::{Duration, Instant};

/// Query permilles swept by the query-percentage modes
const SWEEP_PERMILLES: [u32; 8] = [0, 1, 5, 10, 50, 100, 500, 1000];

#[derive(Parser)]
#[command(
    name = "fenwick-bench",
    version,
    about = "Parallel Fenwick tree strategy benchmarks"
)]
struct Cli {
    /// Execution strategy or sweep mode
    #[arg(
        short = 't',
        long = "strategy",
        default_value = "sequential",
        value_parser = parse_mode
    )]
    strategy: Mode,

    /// Number of worker threads
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    threads: usize,

    /// Operations per batch
    #[arg(short = 'b', long = "batch-size", default_value_t = 1 << 16)]
    batch_size: usize,

    /// Number of batches
    #[arg(short = 'n', long = "num-batches", default_value_t = 1024)]
    num_batches: usize,

    /// Size of the logical array
    #[arg(short = 's', long = "size", default_value_t = 1 << 20)]
    size: usize,

    /// Query probability per 1000 operations
    #[arg(short = 'q', long = "query-permille", default_value_t = 200)]
    query_permille: u32,

    /// Generator seed
    #[arg(long, default_value_t = 15618)]
    seed: u64,

    /// Print the hottest tree cells after a pipeline run
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Single(Strategy),
    QueryPercentageLazy,
    QueryPercentagePure,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s {
        "query_percentage_lazy" => Ok(Mode::QueryPercentageLazy),
        "query_percentage_pure" => Ok(Mode::QueryPercentagePure),
        other => other
            .parse::<Strategy>()
            .map(Mode::Single)
            .map_err(|err| err.to_string()),
    }
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here with a non-error kind
            let is_error = err.use_stderr();
            let _ = err.print();
            process::exit(if is_error { 1 } else { 0 });
        }
    };

    if cli.size == 0 || cli.threads == 0 || cli.batch_size == 0 || cli.num_batches == 0 {
        eprintln!("size, threads, batch size, and batch count must all be positive");
        process::exit(1);
    }

    let code = match cli.strategy {
        Mode::Single(strategy) => run_single(&cli, strategy),
        Mode::QueryPercentageLazy => run_sweep(&cli, Strategy::Lazy),
        Mode::QueryPercentagePure => run_sweep(&cli, Strategy::PureParallel),
    };
    process::exit(code);
}

fn run_single(cli: &Cli, strategy: Strategy) -> i32 {
    if strategy == Strategy::Sequential {
        return run_sequential(cli);
    }

    if matches!(strategy, Strategy::Pipeline) && cli.stats {
        let mut exec = match PipelineExecutor::new(cli.size, cli.threads) {
            Ok(exec) => exec,
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        };
        let code = run_validated(cli, strategy, &mut exec, cli.query_permille);
        if code == 0 {
            print_hot_cells(&exec);
        }
        return code;
    }

    let mut exec = match strategy.build(cli.size, cli.threads, cli.batch_size) {
        Ok(exec) => exec,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    run_validated(cli, strategy, exec.as_mut(), cli.query_permille)
}

/// Run the plain sequential executor with no reference to compare against
fn run_sequential(cli: &Cli) -> i32 {
    let mut exec = match SequentialExecutor::new(cli.size) {
        Ok(exec) => exec,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut generator = Generator::new(cli.size, cli.query_permille, cli.seed);
    let mut generation = Duration::ZERO;
    let start = Instant::now();

    for _ in 0..cli.num_batches {
        let gen_start = Instant::now();
        let batch = generator.batch(cli.batch_size);
        generation += gen_start.elapsed();

        exec.execute(&batch);
    }

    let total = start.elapsed();
    let computation = total - generation;
    let total_ops = (cli.batch_size * cli.num_batches) as u64;

    println!("Performance:");
    println!("Total operations: {total_ops}");
    println!("Total execution time: {} us", total.as_micros());
    println!("Total data generating time: {} us", generation.as_micros());
    println!("Total computation time: {} us", computation.as_micros());
    println!(
        "Batch computation time: {} us",
        computation.as_micros() / cli.num_batches as u128
    );
    println!(
        "Average time per operation: {:.3} us",
        computation.as_micros() as f64 / total_ops as f64
    );
    0
}

/// Run one strategy against the sequential reference and compare results
fn run_validated(
    cli: &Cli,
    strategy: Strategy,
    exec: &mut dyn BatchExecutor,
    query_permille: u32,
) -> i32 {
    let mut reference = match SequentialExecutor::new(cli.size) {
        Ok(reference) => reference,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut generator = Generator::new(cli.size, query_permille, cli.seed);
    let mut reference_time = Duration::ZERO;
    let mut execution_time = Duration::ZERO;

    for batch_index in 0..cli.num_batches {
        let batch = generator.batch(cli.batch_size);

        let seq_start = Instant::now();
        let expected = reference.execute(&batch);
        reference_time += seq_start.elapsed();

        let exec_start = Instant::now();
        let observed = exec.execute(&batch);
        execution_time += exec_start.elapsed();

        if strategy.exact_queries() && expected != observed {
            eprintln!(
                "output diff at batch {}: expected {} query results, strategy disagreed",
                batch_index,
                expected.len()
            );
            return -1;
        }
    }

    // Settled-state probe: with no updates in flight even the relaxed
    // strategies must agree on the full-range prefix sum.
    let probe = [Operation::Query {
        index: cli.size - 1,
    }];
    let expected_total = reference.execute(&probe)[0].value;
    let observed_total = exec.execute(&probe)[0].value;
    if expected_total != observed_total {
        eprintln!(
            "final state diff: expected total {expected_total}, got {observed_total}"
        );
        return -1;
    }

    let total_ops = (cli.batch_size * cli.num_batches) as u64;
    println!("Performance:");
    println!("Strategy: {strategy}");
    println!("Worker threads: {}", cli.threads);
    println!("Query permille: {query_permille}");
    println!("Total operations: {total_ops}");
    println!("Seq time: {:.6} s", reference_time.as_secs_f64());
    println!("Strategy time: {:.6} s", execution_time.as_secs_f64());
    println!(
        "Speedup: {:.3}x",
        reference_time.as_secs_f64() / execution_time.as_secs_f64()
    );
    println!();
    0
}

/// Sweep the query-percentage axis for one strategy
fn run_sweep(cli: &Cli, strategy: Strategy) -> i32 {
    for permille in SWEEP_PERMILLES {
        let mut exec = match strategy.build(cli.size, cli.threads, cli.batch_size) {
            Ok(exec) => exec,
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        };

        println!("Query percentage: {}%", permille as f64 / 10.0);
        let code = run_validated(cli, strategy, exec.as_mut(), permille);
        if code != 0 {
            return code;
        }
    }
    0
}

fn print_hot_cells(exec: &PipelineExecutor) {
    println!("Hottest tree cells:");
    for (index, value) in exec.hot_cells(20) {
        println!("{index} {value}");
    }
    println!("Average cell value: {:.3}", exec.cell_mean());
}
