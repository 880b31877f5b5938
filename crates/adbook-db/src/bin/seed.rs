//! # Seed Data Generator
//!
//! Populates the database with demo podcast inventory for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p adbook-db --bin seed
//!
//! # Custom episode count per show
//! cargo run -p adbook-db --bin seed -- --episodes 20
//!
//! # Specify database path
//! cargo run -p adbook-db --bin seed -- --db ./data/adbook.db
//! ```
//!
//! ## Generated Data
//! - A handful of shows, each with weekly episodes starting next Monday
//! - Per-episode slots: 1 pre-roll, 2 mid-rolls, 1 post-roll
//! - A few approved schedules ready to convert into orders

use chrono::{Datelike, Duration, Utc};
use std::env;
use uuid::Uuid;

use adbook_core::{PlacementType, Schedule, ScheduleItem, ScheduleStatus, DEFAULT_TENANT_ID};
use adbook_db::{Database, DbConfig};

/// Demo shows: (slug, weekly mid-roll rate in cents).
const SHOWS: &[(&str, i64)] = &[
    ("morning-markets", 45_000),
    ("true-crime-weekly", 80_000),
    ("startup-stories", 30_000),
    ("history-uncovered", 25_000),
    ("tech-brief", 55_000),
];

/// Slot capacities per placement within one episode.
const PLACEMENTS: &[(PlacementType, i64)] = &[
    (PlacementType::PreRoll, 1),
    (PlacementType::MidRoll, 2),
    (PlacementType::PostRoll, 1),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut episodes_per_show: usize = 8;
    let mut db_path = String::from("./adbook_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--episodes" | "-e" => {
                if i + 1 < args.len() {
                    episodes_per_show = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("AdBook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -e, --episodes <N>  Episodes per show (default: 8)");
                println!("  -d, --db <PATH>     Database file path (default: ./adbook_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 AdBook Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Shows:    {}", SHOWS.len());
    println!("Episodes: {} per show", episodes_per_show);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Provision slots for every episode of every show
    println!();
    println!("Provisioning episode slots...");

    // First Monday strictly after today
    let today = Utc::now().date_naive();
    let days_to_monday = match (7 - today.weekday().num_days_from_monday()) % 7 {
        0 => 7,
        d => d,
    };
    let first_air_date = today + Duration::days(days_to_monday as i64);

    let mut slots = 0;
    let mut episode_ids: Vec<(String, String, String)> = Vec::new(); // (show, episode, air_date)

    for (show, _) in SHOWS {
        for week in 0..episodes_per_show {
            let air_date = first_air_date + Duration::weeks(week as i64);
            let episode_id = format!("{}-ep{:03}", show, week + 1);

            for (placement, capacity) in PLACEMENTS {
                db.inventory()
                    .provision_slot(&episode_id, *placement, *capacity)
                    .await?;
                slots += 1;
            }

            episode_ids.push((
                show.to_string(),
                episode_id,
                air_date.format("%Y-%m-%d").to_string(),
            ));
        }
    }

    println!("  Provisioned {} slots across {} episodes", slots, episode_ids.len());

    // Create a few approved schedules ready for conversion
    println!();
    println!("Creating demo schedules...");

    let advertisers = ["adv-acme-coffee", "adv-nimbus-vpn", "adv-quill-audiobooks"];
    let now = Utc::now();

    for (n, advertiser_id) in advertisers.iter().enumerate() {
        let schedule_id = Uuid::new_v4().to_string();

        // Spread each advertiser across a different show, mid-rolls on the
        // first four episodes.
        let (show, rate_cents) = SHOWS[n % SHOWS.len()];
        let picks: Vec<_> = episode_ids
            .iter()
            .filter(|(s, _, _)| s == show)
            .take(4)
            .collect();

        let net_amount_cents = rate_cents * picks.len() as i64;

        db.schedules()
            .insert(&Schedule {
                id: schedule_id.clone(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                status: ScheduleStatus::Approved,
                campaign_id: format!("camp-{}-q4", advertiser_id),
                advertiser_id: advertiser_id.to_string(),
                agency_id: (n % 2 == 0).then(|| "agency-soundwave".to_string()),
                net_amount_cents,
                created_at: now,
                updated_at: now,
            })
            .await?;

        for (position, (show, episode_id, air_date)) in picks.iter().enumerate() {
            db.schedules()
                .insert_item(&ScheduleItem {
                    id: Uuid::new_v4().to_string(),
                    schedule_id: schedule_id.clone(),
                    show_id: Some(show.clone()),
                    episode_id: episode_id.clone(),
                    placement_type: PlacementType::MidRoll,
                    air_date: air_date.clone(),
                    length_seconds: 30,
                    rate_cents,
                    position: position as i64,
                    created_at: now,
                })
                .await?;
        }

        println!(
            "  Schedule {} for {}: {} mid-rolls on {}",
            &schedule_id[..8],
            advertiser_id,
            picks.len(),
            show
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
