use serde::{Deserialize, Serialize};

/// A place resolved by the provider. Shared read-only by the historical and
/// marine lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub region: Option<String>,
    #[serde(deserialize_with = "de::coordinate")]
    pub lat: f64,
    #[serde(deserialize_with = "de::coordinate")]
    pub lon: f64,
    #[serde(default)]
    pub timezone_id: Option<String>,
    #[serde(default)]
    pub localtime: Option<String>,
}

impl Location {
    /// `"lat,lon"` query accepted by the coordinate-based endpoints.
    pub fn coordinates_query(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub observation_time: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub feelslike: Option<f64>,
    #[serde(default)]
    pub weather_descriptions: Vec<String>,
    #[serde(default)]
    pub weather_icons: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub wind_degree: Option<f64>,
    #[serde(default)]
    pub wind_dir: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub precip: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub cloudcover: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub uv_index: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub visibility: Option<f64>,
}

impl CurrentConditions {
    pub fn description(&self) -> &str {
        self.weather_descriptions.first().map(String::as_str).unwrap_or("Unknown")
    }
}

/// Success payload of the `current` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub location: Location,
    pub current: CurrentConditions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
    #[serde(default)]
    pub moonrise: Option<String>,
    #[serde(default)]
    pub moonset: Option<String>,
    #[serde(default)]
    pub moon_phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalHour {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub weather_descriptions: Vec<String>,
    #[serde(default)]
    pub weather_icons: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub humidity: Option<f64>,
}

/// One day under the `historical` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub astro: Option<Astro>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub mintemp: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub maxtemp: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub avgtemp: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub totalsnow: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub sunhour: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub hourly: Vec<HistoricalHour>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineHour {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub swell_height: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub swell_dir: Option<f64>,
    #[serde(default)]
    pub swell_dir_16_point: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub swell_period_secs: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub water_temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tide {
    #[serde(default)]
    pub tide_type: Option<String>,
    #[serde(default, rename = "tideTime")]
    pub tide_time: Option<String>,
    #[serde(default, rename = "tideHeight_mt", deserialize_with = "de::opt_number")]
    pub tide_height_mt: Option<f64>,
}

/// One day under the marine `forecast` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarineDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub astro: Option<Astro>,
    #[serde(default)]
    pub hourly: Vec<MarineHour>,
    #[serde(default)]
    pub tides: Vec<Tide>,
}

impl MarineDay {
    /// Conditions for the first reported hour of the day.
    pub fn first_hour(&self) -> Option<&MarineHour> {
        self.hourly.first()
    }
}

/// The provider mixes numbers and numeric strings for the same fields.
mod de {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value;

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn coordinate<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().ok_or_else(|| D::Error::custom("coordinate out of range")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid coordinate '{s}'"))),
            other => Err(D::Error::custom(format!("invalid coordinate {other}"))),
        }
    }
}
