use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use velo::geo::{format_distance, format_duration, format_speed, Clock, ManualClock, SystemClock};
use velo::tracking::{LocationFix, ReplayProvider};
use velo::{App, Config};

const DEMO_FIXES: i64 = 24;
const DEMO_STEP_MILLIS: i64 = 5_000;
/// Roughly 55 m of latitude per step, about 40 km/h.
const DEMO_STEP_DEGREES: f64 = 0.0005;

/// A northbound ride along the Lachine canal with one noisy fix.
fn demo_ride(start_millis: i64) -> Vec<LocationFix> {
    (0..DEMO_FIXES)
        .map(|i| {
            let accuracy = if i == DEMO_FIXES / 2 { 45.0 } else { 6.0 };
            LocationFix::new(
                45.4800 + i as f64 * DEMO_STEP_DEGREES,
                -73.5800,
                start_millis + i * DEMO_STEP_MILLIS,
                accuracy,
            )
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    velo_core::init()?;

    let config = Config::load()?;
    let validation = config.validate();
    if !validation.is_valid() {
        anyhow::bail!("Invalid configuration: {}", validation.error_summary());
    }
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    // Replayed fixes carry their own timestamps; the clock follows them so
    // duration and average speed match the recorded ride.
    let start_millis = SystemClock.now_millis();
    let clock = ManualClock::new(start_millis);
    let mut app = App::with_clock(config, Arc::new(clock.clone()))?;

    app.session().subscribe(move |snapshot| {
        if let Some(fix) = snapshot.current_fix {
            clock.set(fix.timestamp_millis);
        }
    });

    let provider = ReplayProvider::new(demo_ride(start_millis)).with_interval(Duration::from_millis(20));

    match app.start_ride(&provider).await {
        Ok(true) => {}
        Ok(false) => {
            println!("Could not start the ride. Check location permission and GPS.");
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Ride failed to start: {}", e);
            println!("{}", e.user_message());
            return Ok(());
        }
    }

    let delivered = app.wait_for_ride().await;
    let ride = app.stop_ride().await;
    tracing::info!("Replayed {} fixes", delivered);

    println!("Velo - ride summary");
    println!("  Distance:      {}", format_distance(ride.total_distance_km, 2));
    println!("  Duration:      {}", format_duration(ride.duration_seconds));
    println!("  Current speed: {} ({})", format_speed(ride.current_speed_kmh), ride.speed_band().label());
    println!("  Average speed: {}", format_speed(ride.average_speed_kmh));
    println!("  Calories:      {} kcal", ride.estimated_calories());

    let weather = app.current_weather().await;
    let advice = app.recommendation().await;
    println!("\nWeather");
    println!(
        "  {} C (feels {} C), {}, wind {} km/h",
        weather.temperature_c, weather.feels_like_c, weather.description, weather.wind_speed_kmh
    );
    println!("  {}", advice.message);
    if !advice.gear.is_empty() {
        println!("  Bring: {}", advice.gear.join(", "));
    }

    let forecast = app.forecast().await;
    if let Some(next) = forecast.get(1) {
        println!(
            "  In 3h: {} C, {}",
            next.temperature_c, next.description
        );
    }

    Ok(())
}
