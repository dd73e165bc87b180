extern crate flightsurety_core;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use flightsurety_core::blockchain::events::DEFAULT_EVENT_CAPACITY;
use flightsurety_core::blockchain::{Address, EventBus, FlightId, SharedLedger, SuretyLedger};
use flightsurety_core::config::{FeedMode, SuretyConfig};
use flightsurety_core::consensus::{ChainEntropy, EntropySource, SeededEntropy};
use flightsurety_core::coordinator::{feed_for_mode, OracleCoordinator, OraclePool};
use flightsurety_core::errors::{SuretyError, SuretyResult};
use flightsurety_core::utils::{current_time, format_timestamp, format_units};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Local,
    Devnet,
}

#[derive(Parser)]
#[clap(author, version, about)]
/// Runs a local FlightSurety ledger with a pool of simulated oracles
struct Cli {
    /// TOML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Base preset the file and environment are layered on
    #[clap(long, value_enum, default_value = "local")]
    preset: Preset,

    /// Number of oracle identities the coordinator owns
    #[clap(short, long)]
    oracles: Option<usize>,

    /// Number of flights to register and request statuses for
    #[clap(short, long, default_value = "5")]
    flights: usize,

    /// Resubmission rounds before a request is given up on
    #[clap(short, long)]
    rounds: Option<u32>,

    /// Status feed: random, on-time or late-airline
    #[clap(long)]
    feed: Option<FeedMode>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let base = match cli.preset {
        Preset::Local => SuretyConfig::local(),
        Preset::Devnet => SuretyConfig::devnet(),
    };
    let mut config = match SuretyConfig::load_with_base(&base, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    if let Some(oracles) = cli.oracles {
        config.coordinator.oracle_count = oracles;
    }
    if let Some(rounds) = cli.rounds {
        config.coordinator.max_resubmit_rounds = rounds;
    }
    if let Some(feed) = cli.feed {
        config.coordinator.feed = feed;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .format_timestamp_millis()
        .init();

    info!("Starting FlightSurety ledger...");
    info!("Current time: {}", format_timestamp(current_time()));

    if let Err(e) = run(config, cli.flights).await {
        error!("FlightSurety stopped with error: {}", e);
        std::process::exit(1);
    }
    info!("FlightSurety shutting down...");
}

fn init_entropy(config: &SuretyConfig) -> Box<dyn EntropySource> {
    match config.entropy_seed {
        Some(seed) => {
            info!("Using seeded entropy ({})", seed);
            Box::new(SeededEntropy::new(seed))
        }
        None => Box::new(ChainEntropy::from_os()),
    }
}

fn init_ledger(config: &SuretyConfig, rng: &mut ChaCha20Rng) -> SuretyResult<(SharedLedger, Address)> {
    let owner = match &config.admin.owner {
        Some(owner) => owner.parse::<Address>().map_err(SuretyError::Config)?,
        None => Address::random(rng),
    };
    let genesis = Address::random(rng);
    info!("Ledger owner {}, genesis airline {}", owner, genesis);

    let ledger = SuretyLedger::new(
        &config.protocol,
        owner,
        genesis,
        config.admin.enforce_caller_authorization,
        init_entropy(config),
    );
    Ok((SharedLedger::new(ledger, EventBus::new(DEFAULT_EVENT_CAPACITY)), genesis))
}

async fn run(config: SuretyConfig, flight_count: usize) -> SuretyResult<()> {
    let mut rng = match config.coordinator.feed_seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let (admin, genesis) = init_ledger(&config, &mut rng)?;

    // The server calls in through its own authorized gateway.
    let gateway = Address::random(&mut rng);
    admin.authorize_caller(admin.gateway(), gateway)?;
    let server = admin.as_gateway(gateway);

    server.fund_airline(genesis, config.protocol.fund_threshold)?;

    let now = current_time();
    let mut flights = Vec::with_capacity(flight_count);
    for i in 0..flight_count {
        let id = FlightId::from(format!("ND{:04}", 1309 + i).as_str());
        let timestamp = now + 3600 * (i as u64 + 1);
        server.register_flight(genesis, timestamp, id.clone())?;
        info!("Registered flight {} departing {}", id, format_timestamp(timestamp));
        flights.push((id, timestamp));
    }

    let passenger = Address::random(&mut rng);
    if let Some((first, _)) = flights.first() {
        server.buy_insurance(first, passenger, config.protocol.max_premium)?;
        info!(
            "Passenger {} insured {} for {}",
            passenger.short(),
            first,
            format_units(config.protocol.max_premium)
        );
    }

    let mut pool = OraclePool::generate(config.coordinator.oracle_count, &mut rng);
    pool.register_all(&server, config.protocol.registration_fee)?;
    pool.under_covered(config.protocol.index_range, config.protocol.quorum_count);

    let feed = feed_for_mode(config.coordinator.feed, config.coordinator.feed_seed);
    info!("Status feed: {}", config.coordinator.feed);
    let handle = OracleCoordinator::new(server.clone(), pool, feed, config.coordinator.clone())
        .start(config.protocol.registration_fee)?;

    for (id, timestamp) in &flights {
        let key = server.request_status(genesis, id.clone(), *timestamp)?;
        info!("Requested status for {} at index {}", id, key.index);
    }

    let deadline = Duration::from_millis(
        config.coordinator.resubmit_interval_ms * (u64::from(config.coordinator.max_resubmit_rounds) + 2),
    );
    let mut poll = tokio::time::interval(Duration::from_millis(100));
    let wait = async {
        loop {
            poll.tick().await;
            if server.open_requests().is_empty() {
                break;
            }
        }
    };
    tokio::select! {
        _ = wait => info!("All status requests resolved"),
        _ = tokio::time::sleep(deadline) => warn!("{} requests still open", server.open_requests().len()),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let stats = handle.shutdown().await?;

    for (id, _) in &flights {
        if let Some(flight) = server.flight(id) {
            info!("Flight {}: {}", id, flight.status);
        }
    }

    if server.credit_of(&passenger) > 0 {
        let paid = server.withdraw_credit(passenger)?;
        info!("Passenger {} withdrew {}", passenger.short(), format_units(paid));
    }
    info!("Treasury balance: {}", format_units(server.treasury_balance()));

    match serde_json::to_string_pretty(&stats) {
        Ok(json) => info!("Coordinator stats:\n{}", json),
        Err(e) => warn!("Could not render stats: {}", e),
    }
    Ok(())
}
