//! moto-route - synthesize a motorcycle route and print it as JSON.
//!
//! Usage:
//!   moto-route round-trip --start 45.4642,9.19 --direction NE --style curvy
//!   moto-route point-to-point --start 45.46,9.19 --end 45.70,9.67 --via 45.6,9.4
//!
//! Oracle endpoints and limits come from the environment (VALHALLA_URL,
//! MOTO_RT_MIN_KM, ...). Logs go to stderr, the report to stdout.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use moto_cli::{parse_point, RouteReport};
use moto_core::{Compass, GeoPoint, RouteCandidate, RouteError, RouteStyle, StyleLadder};
use moto_engine::{EngineConfig, RouteEngine};
use moto_oracle::{ElevationClient, ValhallaClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Length-constrained motorcycle routes")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Loop that starts and ends at the same point
    RoundTrip {
        #[command(flatten)]
        common: CommonArgs,

        /// Compass direction of the loop (N, NE, ... or SO/O/NO)
        #[arg(long)]
        direction: Option<Compass>,
    },
    /// Route from a start to a destination
    PointToPoint {
        #[command(flatten)]
        common: CommonArgs,

        /// Destination as lat,lon
        #[arg(long, value_parser = parse_point)]
        end: GeoPoint,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Start as lat,lon
    #[arg(long, value_parser = parse_point)]
    start: GeoPoint,

    /// Manual waypoint as lat,lon (repeatable)
    #[arg(long = "via", value_parser = parse_point)]
    waypoints: Vec<GeoPoint>,

    /// Preferred style: extreme, super-curvy, curvy, curvy-light, rapid
    #[arg(long, default_value = "curvy")]
    style: RouteStyle,

    /// Fetch an elevation profile for the result
    #[arg(long)]
    elevation: bool,

    /// Include every track point in the report
    #[arg(long)]
    track: bool,
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("moto_engine=info".parse()?)
        .add_directive("moto_oracle=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

async fn report(
    engine: &RouteEngine<ValhallaClient, ElevationClient>,
    status: &'static str,
    candidate: &RouteCandidate,
    common: &CommonArgs,
) -> Result<()> {
    let profile = if common.elevation {
        let profile = engine.build_elevation_profile(&candidate.path).await;
        if profile.is_none() {
            tracing::warn!("elevation profile unavailable");
        }
        profile
    } else {
        None
    };
    let report = RouteReport::new(status, candidate, profile.as_ref(), common.track);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = EngineConfig::from_env();
    let engine = RouteEngine::from_config(config).context("failed to build oracle clients")?;

    let (outcome, common) = match &cli.command {
        Command::RoundTrip { common, direction } => {
            let ladder = StyleLadder::starting_at(common.style);
            let outcome = engine
                .synthesize_round_trip(common.start, *direction, &common.waypoints, ladder)
                .await;
            (outcome, common)
        }
        Command::PointToPoint { common, end } => {
            let ladder = StyleLadder::starting_at(common.style);
            let outcome = engine
                .synthesize_point_to_point(common.start, *end, &common.waypoints, ladder)
                .await;
            (outcome, common)
        }
    };

    match outcome {
        Ok(candidate) => report(&engine, "accepted", &candidate, common).await,
        Err(RouteError::CannotMeetConstraints {
            attempts,
            closest: Some(closest),
        }) => {
            report(&engine, "closest_miss", &closest, common).await?;
            bail!("no route within limits after {attempts} attempt(s); closest shown above")
        }
        Err(err @ RouteError::OracleUnavailable { .. }) => {
            Err(err).context("routing service down, try again later")
        }
        Err(err) => Err(err.into()),
    }
}
