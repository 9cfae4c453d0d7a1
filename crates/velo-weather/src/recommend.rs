//! Ride recommendations from current conditions.

use crate::types::{ConditionTag, RideRecommendation, WeatherSnapshot};

fn advice(can_ride: bool, message: &str, gear: &[&str]) -> RideRecommendation {
    RideRecommendation {
        can_ride,
        message: message.to_string(),
        gear: gear.iter().map(|item| item.to_string()).collect(),
    }
}

/// Rules are checked in order: storm/snow, rain, fog, cold (<5°C),
/// hot (>30°C), wind (>25 km/h), then the default.
pub fn recommend(weather: &WeatherSnapshot) -> RideRecommendation {
    let temperature = weather.temperature_c;

    match weather.condition {
        ConditionTag::Stormy | ConditionTag::Snowy => {
            return advice(
                false,
                "Not recommended - dangerous weather conditions",
                &["helmet", "lights", "reflective clothing"],
            );
        }
        ConditionTag::Rainy => {
            let warm_enough = temperature > 5;
            let message = if warm_enough {
                "Ride with caution - wet roads"
            } else {
                "Too cold and wet to ride safely"
            };
            return advice(
                warm_enough,
                message,
                &["helmet", "rain jacket", "waterproof pants", "lights", "reflective clothing"],
            );
        }
        ConditionTag::Foggy => {
            return advice(
                true,
                "Ride with extra caution - reduced visibility",
                &["helmet", "lights", "reflective clothing", "bright colors"],
            );
        }
        _ => {}
    }

    if temperature < 5 {
        return advice(
            true,
            "Cold weather - dress warmly",
            &["helmet", "thermal layers", "gloves", "neck warmer", "lights"],
        );
    }

    if temperature > 30 {
        return advice(
            true,
            "Hot weather - stay hydrated",
            &["helmet", "breathable clothing", "sunglasses", "sunscreen"],
        );
    }

    if weather.wind_speed_kmh > 25 {
        return advice(
            true,
            "Strong winds - be careful on exposed roads",
            &["helmet", "aerodynamic clothing"],
        );
    }

    advice(true, "Perfect cycling weather!", &["helmet", "comfortable clothing"])
}

impl WeatherSnapshot {
    pub fn recommendation(&self) -> RideRecommendation {
        recommend(self)
    }
}
