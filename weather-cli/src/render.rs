//! Human-readable output for lookup results.

use std::fmt::Display;

use weatherstack_core::{CurrentReport, HistoricalDay, MarineDay};

fn value<T: Display>(v: Option<T>, unit: &str) -> String {
    match v {
        Some(v) => format!("{v}{unit}"),
        None => "n/a".to_string(),
    }
}

fn text(v: Option<&str>) -> &str {
    v.unwrap_or("n/a")
}

pub fn current(report: &CurrentReport) {
    let c = &report.current;

    println!("{}", report.location.display_name());
    println!("  {}", c.description());
    println!("  Temperature: {} (feels like {})", value(c.temperature, "°C"), value(c.feelslike, "°C"));
    println!("  Wind:        {} {}", value(c.wind_speed, " km/h"), text(c.wind_dir.as_deref()));
    println!("  Humidity:    {}", value(c.humidity, "%"));
    println!("  Pressure:    {}", value(c.pressure, " mb"));
    println!("  Visibility:  {}", value(c.visibility, " km"));
    println!("  UV index:    {}", value(c.uv_index, ""));
    if let Some(observed) = &c.observation_time {
        println!("  Observed at {observed}");
    }
}

pub fn historical(day: &HistoricalDay) {
    println!("{}", text(day.date.as_deref()));
    println!("  Average: {}", value(day.avgtemp, "°C"));
    println!("  Min: {} | Max: {}", value(day.mintemp, "°C"), value(day.maxtemp, "°C"));
    println!("  UV index: {}", value(day.uv_index, ""));
    if let Some(astro) = &day.astro {
        println!(
            "  Dawn: {} / Dusk: {}",
            text(astro.sunrise.as_deref()),
            text(astro.sunset.as_deref())
        );
    }
}

pub fn marine(day: &MarineDay) {
    println!("Marine forecast for {}", text(day.date.as_deref()));

    match day.first_hour() {
        Some(hour) => {
            println!("  Swell height: {}", value(hour.swell_height, " m"));
            println!(
                "  Swell dir:    {} ({})",
                text(hour.swell_dir_16_point.as_deref()),
                value(hour.swell_dir, "°")
            );
            println!("  Swell period: {}", value(hour.swell_period_secs, "s"));
            println!("  Water temp:   {}", value(hour.water_temp, "°C"));
        }
        None => println!("  No hourly sea conditions reported."),
    }

    if day.tides.is_empty() {
        println!("  No tide data available.");
        return;
    }

    println!("  Tides:");
    for tide in &day.tides {
        println!(
            "    {}: {} ({})",
            text(tide.tide_type.as_deref()),
            text(tide.tide_time.as_deref()),
            value(tide.tide_height_mt, "m")
        );
    }
}
