//! Potion Optimizer CLI - Run potion searches from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use potion_optimizer::{
    compute::{SearchWorker, WorkerSummary, evolution::WorkerError},
    schema::{AppConfig, BestKnown, SearchProfile},
    store::{JsonStore, PotionStore, StoreError},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [--bootstrap]", args[0]);
        eprintln!();
        eprintln!("Search for the highest Direct Healing potion per configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to search configuration file");
        eprintln!("  --bootstrap  Create zero-score records for labels that have none");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let bootstrap = args[2..].iter().any(|a| a == "--bootstrap");

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: AppConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    if config.searches.is_empty() {
        eprintln!("No searches configured.");
        std::process::exit(1);
    }

    let store = JsonStore::open(&config.store_dir).unwrap_or_else(|e| {
        eprintln!("Error opening store: {}", e);
        std::process::exit(1);
    });

    if bootstrap {
        for profile in &config.searches {
            if let Err(e) = bootstrap_record(&store, &profile.label) {
                eprintln!("Error bootstrapping {}: {}", profile.label, e);
                std::process::exit(1);
            }
        }
    }

    println!("Potion Optimizer");
    println!("================");
    println!("Store: {}", config.store_dir.display());
    for profile in &config.searches {
        let c = &profile.evolution.constraints;
        let p = &profile.evolution.population;
        println!(
            "  {}: max amount {}, max weight {}, max stacks {}, {} potions x {} generations",
            profile.label, c.max_amount, c.max_weight, c.max_stacks, p.size, p.generations
        );
    }
    println!();

    let cancelled = Arc::new(AtomicBool::new(false));
    setup_interrupt_handler(Arc::clone(&cancelled));

    let start = Instant::now();
    let outcomes: Vec<(String, Result<WorkerSummary, WorkerError>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = config
            .searches
            .iter()
            .map(|profile| {
                let store = store.clone();
                let cancelled = Arc::clone(&cancelled);
                scope.spawn(move || run_profile(store, profile.clone(), cancelled))
            })
            .collect();

        handles
            .into_iter()
            .zip(&config.searches)
            .filter_map(|(handle, profile)| match handle.join() {
                Ok(outcome) => Some((profile.label.clone(), outcome)),
                Err(_) => {
                    log::error!("[{}] search thread panicked", profile.label);
                    None
                }
            })
            .collect()
    });

    println!();
    println!("Summary ({:.1}s):", start.elapsed().as_secs_f32());
    let mut failed = false;
    for (label, outcome) in outcomes {
        match outcome {
            Ok(summary) => {
                let best = store
                    .fetch_best_known(&label)
                    .map(|b| format!("{:.6}", b.score))
                    .unwrap_or_else(|_| "n/a".to_string());
                println!(
                    "  {}: {} runs, {} improvements, best {}",
                    label, summary.runs, summary.improvements, best
                );
            }
            Err(e) => {
                failed = true;
                println!("  {}: failed: {}", label, e);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn run_profile(
    store: JsonStore,
    profile: SearchProfile,
    cancelled: Arc<AtomicBool>,
) -> Result<WorkerSummary, WorkerError> {
    let label = profile.label.clone();
    let result = SearchWorker::new(store, profile, cancelled).run();
    if let Err(e) = &result {
        log::error!("[{}] search stopped: {}", label, e);
    }
    result
}

fn bootstrap_record(store: &JsonStore, label: &str) -> Result<(), StoreError> {
    match store.insert_best_known(&BestKnown::empty(label)) {
        Ok(()) => {
            log::info!("[{}] created empty best-known record", label);
            Ok(())
        }
        Err(StoreError::AlreadyExists(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

fn setup_interrupt_handler(cancelled: Arc<AtomicBool>) {
    let interrupt_count = Arc::new(AtomicUsize::new(0));

    let installed = ctrlc::set_handler(move || {
        let count = interrupt_count.fetch_add(1, Ordering::SeqCst);
        cancelled.store(true, Ordering::SeqCst);
        if count == 0 {
            eprintln!("\nInterrupt received, finishing current generation...");
        } else {
            eprintln!("\nForce quit.");
            std::process::exit(1);
        }
    });

    if let Err(e) = installed {
        log::warn!("Ctrl-C handler not installed: {}", e);
    }
}

fn print_example_config() {
    let config = AppConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
