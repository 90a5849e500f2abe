//! Matching desired endpoints against a zone's record snapshot

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::resolver::record_name;
use crate::traits::{RecordId, RemoteRecord};

/// Map every target of `endpoint` to the identifier of its live record
///
/// Identifiers come back in target order. Fails with
/// [`Error::IncompleteMapping`] when any target has no record of the same
/// name, type and content in `records`; a partial set is never returned.
pub fn match_targets(
    zone: &str,
    records: &[RemoteRecord],
    endpoint: &Endpoint,
) -> Result<Vec<RecordId>> {
    let name = record_name(&endpoint.dns_name, zone);

    let ids: Vec<RecordId> = endpoint
        .targets
        .iter()
        .filter_map(|target| {
            records
                .iter()
                .find(|r| {
                    r.record_type == endpoint.record_type && r.name == name && &r.content == target
                })
                .map(|r| r.id.clone())
        })
        .collect();

    if ids.len() != endpoint.targets.len() {
        return Err(Error::IncompleteMapping {
            name: endpoint.dns_name.clone(),
            record_type: endpoint.record_type.clone(),
            expected: endpoint.targets.len(),
            found: ids.len(),
        });
    }
    Ok(ids)
}

/// All records in `records` with the resolved name of `dns_name` and the given type
pub fn find_by_name_and_type<'r>(
    zone: &str,
    records: &'r [RemoteRecord],
    dns_name: &str,
    record_type: &str,
) -> Vec<&'r RemoteRecord> {
    let name = record_name(dns_name, zone);
    records
        .iter()
        .filter(|r| r.record_type == record_type && r.name == name)
        .collect()
}

/// Identifier of the first record whose content equals `content`
pub fn find_exact<'r>(records: &[&'r RemoteRecord], content: &str) -> Option<&'r RecordId> {
    records
        .iter()
        .copied()
        .find(|r| r.content == content)
        .map(|r| &r.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER_TXT: &str =
        "heritage=external-dns,external-dns/owner=default,external-dns/resource=service/default/nginx";

    fn record(id: u64, name: &str, record_type: &str, content: &str) -> RemoteRecord {
        RemoteRecord {
            id: RecordId::from(id),
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
            ttl: 3600,
            priority: 0,
        }
    }

    fn snapshot() -> Vec<RemoteRecord> {
        vec![
            record(10, "foo", "TXT", OWNER_TXT),
            record(11, "foo", "A", "5.5.5.5"),
            record(12, "", "A", "5.5.5.5"),
            record(13, "", "A", "5.5.5.6"),
        ]
    }

    #[test]
    fn matches_single_txt_target() {
        let ids = match_targets(
            "example.com",
            &snapshot(),
            &Endpoint::new("foo.example.com", "TXT", [OWNER_TXT]),
        )
        .unwrap();
        assert_eq!(ids, vec![RecordId::from(10u64)]);
    }

    #[test]
    fn type_distinguishes_same_name() {
        let ids = match_targets(
            "baz.org",
            &snapshot(),
            &Endpoint::new("foo.baz.org", "A", ["5.5.5.5"]),
        )
        .unwrap();
        assert_eq!(ids, vec![RecordId::from(11u64)]);
    }

    #[test]
    fn apex_targets_keep_order() {
        let ids = match_targets(
            "baz.org",
            &snapshot(),
            &Endpoint::new("baz.org", "A", ["5.5.5.6", "5.5.5.5"]),
        )
        .unwrap();
        assert_eq!(ids, vec![RecordId::from(13u64), RecordId::from(12u64)]);
    }

    #[test]
    fn any_unmatched_target_fails() {
        let err = match_targets(
            "baz.org",
            &snapshot(),
            &Endpoint::new("baz.org", "A", ["5.5.5.5", "9.9.9.9"]),
        )
        .unwrap_err();
        match err {
            Error::IncompleteMapping {
                expected, found, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_name_fails() {
        assert!(
            match_targets(
                "baz.org",
                &snapshot(),
                &Endpoint::new("bar.baz.org", "A", ["5.5.5.5"]),
            )
            .is_err()
        );
    }

    #[test]
    fn string_identifiers_are_opaque() {
        let mut records = snapshot();
        records[1].id = RecordId::new("rec-b7f2");
        let ids = match_targets(
            "baz.org",
            &records,
            &Endpoint::new("foo.baz.org", "A", ["5.5.5.5"]),
        )
        .unwrap();
        assert_eq!(ids, vec![RecordId::new("rec-b7f2")]);
    }

    #[test]
    fn find_by_name_and_type_ignores_content() {
        let records = snapshot();
        let found = find_by_name_and_type("baz.org", &records, "baz.org", "A");
        let ids: Vec<&RecordId> = found.iter().map(|r| &r.id).collect();
        assert_eq!(ids, vec![&RecordId::from(12u64), &RecordId::from(13u64)]);

        assert!(find_by_name_and_type("baz.org", &records, "baz.org", "AAAA").is_empty());
    }

    #[test]
    fn find_exact_returns_first_content_match() {
        let records = snapshot();
        let apex = find_by_name_and_type("baz.org", &records, "baz.org", "A");
        assert_eq!(find_exact(&apex, "5.5.5.6"), Some(&RecordId::from(13u64)));
        assert_eq!(find_exact(&apex, "1.1.1.1"), None);
    }
}
