//! Forecast aggregation
//!
//! Turns the upstream 5-day / 3-hour point list into what the cache stores:
//! the next 48 hours at 3-hour resolution, and one summary per day for the
//! next five days.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use resqwave_db::{DailyForecast, HourlyForecast};
use resqwave_proxy::{ForecastItem, ForecastResponse};
use serde::{Deserialize, Serialize};

/// Number of 3-hour points covering 48 hours
pub const HOURLY_POINTS: usize = 16;

/// Number of daily summaries kept
pub const DAILY_SUMMARIES: usize = 5;

/// Forecast data returned by the upstream provider for one terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub hourly_forecast: Vec<HourlyForecast>,
    pub weekly_forecast: Vec<DailyForecast>,
}

impl ForecastBundle {
    /// Aggregate an upstream response
    ///
    /// Days are split on the local calendar date of the forecast location, as
    /// reported by the upstream timezone offset (UTC when absent).
    pub fn from_response(response: &ForecastResponse) -> Self {
        let offset = response
            .city
            .as_ref()
            .and_then(|c| i32::try_from(c.timezone).ok())
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        let points: Vec<HourlyForecast> = response.list.iter().filter_map(to_hourly).collect();

        let hourly_forecast = points.iter().take(HOURLY_POINTS).cloned().collect();
        let weekly_forecast = summarize_days(&points, offset);

        Self {
            hourly_forecast,
            weekly_forecast,
        }
    }
}

fn to_hourly(item: &ForecastItem) -> Option<HourlyForecast> {
    let time = DateTime::<Utc>::from_timestamp(item.dt, 0)?;
    let (condition, description, icon) = match item.primary_condition() {
        Some(c) => (c.main.clone(), c.description.clone(), c.icon.clone()),
        None => (String::new(), String::new(), String::new()),
    };

    Some(HourlyForecast {
        time,
        temperature: item.main.temp,
        feels_like: item.main.feels_like,
        humidity: item.main.humidity,
        pressure: item.main.pressure,
        wind_speed: item.wind.speed,
        precipitation_probability: item.pop,
        rain_mm: item.rain_mm(),
        condition,
        description,
        icon,
    })
}

fn summarize_days(points: &[HourlyForecast], offset: FixedOffset) -> Vec<DailyForecast> {
    let mut days: Vec<(NaiveDate, Vec<&HourlyForecast>)> = Vec::new();

    for point in points {
        let date = point.time.with_timezone(&offset).date_naive();
        if let Some((current, group)) = days.last_mut()
            && *current == date
        {
            group.push(point);
            continue;
        }
        days.push((date, vec![point]));
    }

    days.into_iter()
        .take(DAILY_SUMMARIES)
        .map(|(date, group)| summarize_day(date, &group))
        .collect()
}

fn summarize_day(date: NaiveDate, group: &[&HourlyForecast]) -> DailyForecast {
    let temp_min = group.iter().map(|p| p.temperature).fold(f64::INFINITY, f64::min);
    let temp_max = group
        .iter()
        .map(|p| p.temperature)
        .fold(f64::NEG_INFINITY, f64::max);
    let humidity_avg =
        group.iter().map(|p| f64::from(p.humidity)).sum::<f64>() / group.len() as f64;
    let precipitation_probability = group
        .iter()
        .map(|p| p.precipitation_probability)
        .fold(0.0, f64::max);
    let rain_mm = group.iter().map(|p| p.rain_mm).sum::<f64>();
    let wind_speed_max = group.iter().map(|p| p.wind_speed).fold(0.0, f64::max);

    // Most frequent condition wins; ties go to the earliest one seen
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for point in group {
        match counts.iter_mut().find(|(c, _)| *c == point.condition) {
            Some((_, n)) => *n += 1,
            None => counts.push((point.condition.as_str(), 1)),
        }
    }
    let dominant = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, &(c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
        .unwrap_or_default();
    let representative = group
        .iter()
        .find(|p| p.condition == dominant)
        .copied()
        .or_else(|| group.first().copied());

    DailyForecast {
        date,
        temp_min,
        temp_max,
        humidity_avg,
        precipitation_probability,
        rain_mm,
        wind_speed_max,
        condition: dominant.to_string(),
        description: representative
            .map(|p| p.description.clone())
            .unwrap_or_default(),
        icon: representative.map(|p| p.icon.clone()).unwrap_or_default(),
    }
}
