// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Utc};

/// Short date used in prompts, e.g. `Mar 04, 2026`.
pub fn format_short_date(date: DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Long date used in prompts, e.g. `March 04, 2026`.
pub fn format_long_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Month and year, e.g. `March 2026`.
pub fn format_month_year(date: DateTime<Utc>) -> String {
    date.format("%B %Y").to_string()
}
