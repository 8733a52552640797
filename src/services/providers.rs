// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider directory search.

use crate::models::{Coordinate, Provider, ProviderResponse};
use crate::services::geo;

/// Default search radius in km.
pub const DEFAULT_RADIUS_KM: f64 = 15.0;
pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Distance,
    Rating,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(SortBy::Distance),
            "rating" => Ok(SortBy::Rating),
            other => Err(format!("sortBy must be 'distance' or 'rating', got '{other}'")),
        }
    }
}

/// Validated provider search parameters.
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    /// Case-insensitive substring match on city
    pub city: Option<String>,
    pub origin: Option<Coordinate>,
    pub radius_km: f64,
    pub is_24x7: Option<bool>,
    pub sort_by: SortBy,
}

/// Filter and order `providers` for `query`.
///
/// Providers are kept when they match the city and 24x7 filters and, when an
/// origin is given, lie within the radius. Sorts are stable, so ties keep
/// retrieval order.
pub fn search(providers: Vec<Provider>, query: &ProviderQuery) -> Vec<ProviderResponse> {
    let city = query.city.as_ref().map(|c| c.to_lowercase());
    let bounds = query
        .origin
        .and_then(|origin| geo::bounding_box(origin, query.radius_km));

    let mut results: Vec<ProviderResponse> = providers
        .into_iter()
        .filter(|p| query.is_24x7.is_none_or(|wanted| p.is_24x7 == wanted))
        .filter(|p| {
            city.as_ref()
                .is_none_or(|c| p.city.to_lowercase().contains(c.as_str()))
        })
        .filter_map(|p| {
            let Some(origin) = query.origin else {
                return Some(ProviderResponse::from_provider(p, None));
            };
            let location = match p.coordinate() {
                Ok(location) => location,
                Err(e) => {
                    tracing::warn!(provider_id = %p.id, error = %e, "Skipping provider with invalid location");
                    return None;
                }
            };
            if !geo::may_be_within(bounds.as_ref(), location) {
                return None;
            }
            geo::distance_within(origin, location, query.radius_km)
                .map(|d| ProviderResponse::from_provider(p, Some(d)))
        })
        .collect();

    match query.sort_by {
        SortBy::Distance if query.origin.is_some() => sort_by_distance(&mut results),
        SortBy::Rating => {
            results.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        }
        SortBy::Distance => {}
    }

    results
}

/// 24x7 providers within `radius_km` of `origin`, nearest first.
pub fn nearest_emergency(
    providers: Vec<Provider>,
    origin: Coordinate,
    radius_km: f64,
) -> Vec<ProviderResponse> {
    search(
        providers,
        &ProviderQuery {
            city: None,
            origin: Some(origin),
            radius_km,
            is_24x7: Some(true),
            sort_by: SortBy::Distance,
        },
    )
}

fn sort_by_distance(results: &mut [ProviderResponse]) {
    results.sort_by(|a, b| {
        a.distance_km
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance_km.unwrap_or(f64::INFINITY))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str, city: &str, lat: f64, lon: f64, rating: f64, is_24x7: bool) -> Provider {
        Provider {
            id: id.to_string(),
            name: format!("Clinic {id}"),
            phone: "+910000000000".to_string(),
            address: "Main Road".to_string(),
            city: city.to_string(),
            state: "Maharashtra".to_string(),
            latitude: lat,
            longitude: lon,
            operating_hours: "24 Hours".to_string(),
            rating,
            is_24x7,
            services: vec!["Emergency Care".to_string()],
        }
    }

    fn fixtures() -> Vec<Provider> {
        vec![
            provider("a", "Mumbai", 19.0596, 72.8295, 4.2, true),
            provider("b", "Mumbai", 19.1136, 72.8697, 4.8, false),
            provider("c", "Navi Mumbai", 19.0330, 73.0297, 4.8, true),
            provider("d", "Pune", 18.5204, 73.8567, 4.9, true),
        ]
    }

    fn origin() -> Coordinate {
        Coordinate::new(19.0760, 72.8777).unwrap()
    }

    #[test]
    fn test_radius_filter_and_distance_sort() {
        let query = ProviderQuery {
            city: None,
            origin: Some(origin()),
            radius_km: 15.0,
            is_24x7: None,
            sort_by: SortBy::Distance,
        };
        let results = search(fixtures(), &query);
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(results.iter().all(|p| p.distance_km.unwrap() <= 15.0));
    }

    #[test]
    fn test_provider_exactly_on_radius_is_kept() {
        let edge = provider("edge", "Mumbai", 19.1136, 72.8697, 4.0, false);
        let d = geo::distance(origin(), edge.coordinate().unwrap());
        let query = |radius_km| ProviderQuery {
            city: None,
            origin: Some(origin()),
            radius_km,
            is_24x7: None,
            sort_by: SortBy::Distance,
        };

        let results = search(vec![edge.clone()], &query(d));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].distance_km, Some(d));

        assert!(search(vec![edge], &query(d - 0.01)).is_empty());
    }

    #[test]
    fn test_city_substring_rating_sort_is_stable() {
        let query = ProviderQuery {
            city: Some("mumbai".to_string()),
            origin: None,
            radius_km: DEFAULT_RADIUS_KM,
            is_24x7: None,
            sort_by: SortBy::Rating,
        };
        let results = search(fixtures(), &query);
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        // b and c tie on rating and keep retrieval order.
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(results.iter().all(|p| p.distance_km.is_none()));
    }

    #[test]
    fn test_nearest_emergency_only_24x7() {
        let results = nearest_emergency(fixtures(), origin(), 50.0);
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!("rating".parse::<SortBy>().unwrap(), SortBy::Rating);
        assert!("name".parse::<SortBy>().is_err());
    }
}
