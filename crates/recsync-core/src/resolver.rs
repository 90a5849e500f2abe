//! Name resolution between DNS names, zones and registrar record names
//!
//! Both functions are pure: no I/O, no state.

use crate::error::{Error, Result};

/// Find the zone that owns `dns_name`
///
/// The longest zone equal to `dns_name` or a dot-boundary suffix of it wins;
/// ties go to the first zone in `zones`. When nothing matches on a label
/// boundary, a second pass accepts a hyphen boundary so ownership-marker
/// names like `_edns.a-example.com` land in `example.com`.
pub fn resolve_zone<'z>(zones: &'z [String], dns_name: &str) -> Result<&'z str> {
    let by_label = longest_match(zones, |zone| {
        dns_name == zone || has_boundary_suffix(dns_name, zone, '.')
    });

    by_label
        .or_else(|| longest_match(zones, |zone| has_boundary_suffix(dns_name, zone, '-')))
        .ok_or_else(|| Error::zone_not_found(dns_name))
}

/// Derive the zone-relative record name for `dns_name`
///
/// Returns an empty string for the apex. Trailing labels of the relative name
/// that repeat the zone's trailing labels are dropped, which turns
/// `_edns.a-example.com.example.com` into `_edns.a-example` for zone
/// `example.com`. At least one label is always kept.
pub fn record_name(dns_name: &str, zone: &str) -> String {
    if dns_name == zone {
        return String::new();
    }

    let name = dns_name
        .strip_suffix(zone)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(dns_name);

    let name_labels: Vec<&str> = name.split('.').collect();
    let zone_labels: Vec<&str> = zone.split('.').collect();

    let mut stripped = 0;
    while stripped < zone_labels.len() && stripped + 1 < name_labels.len() {
        let ni = name_labels.len() - 1 - stripped;
        let zi = zone_labels.len() - 1 - stripped;
        if name_labels[ni] != zone_labels[zi] {
            break;
        }
        stripped += 1;
    }

    name_labels[..name_labels.len() - stripped].join(".")
}

fn has_boundary_suffix(dns_name: &str, zone: &str, boundary: char) -> bool {
    dns_name
        .strip_suffix(zone)
        .is_some_and(|rest| rest.ends_with(boundary))
}

fn longest_match<'z>(zones: &'z [String], matches: impl Fn(&str) -> bool) -> Option<&'z str> {
    let mut best: Option<&'z str> = None;
    for zone in zones.iter().map(String::as_str) {
        if matches(zone) && best.is_none_or(|b| zone.len() > b.len()) {
            best = Some(zone);
        }
    }
    best
}
