//! Client roster maintenance.
//!
//! The roster is never edited directly: every recorded service appends a
//! fresh client record and the roster is deduplicated by name, the newest
//! record winning.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::studio::ledger::model::{Client, Service, non_blank};

/// Appends a record built from a service event and deduplicates the roster
/// by exact name. The new record's values replace any earlier record for the
/// same name; distinct names keep the order in which they first appeared.
///
/// The result is not persisted; hand it to
/// [`LedgerStore::save_clients`](crate::store::LedgerStore::save_clients).
pub fn upsert(
    clients: &[Client],
    name: &str,
    phone: Option<&str>,
    date: NaiveDate,
    service: Service,
) -> Vec<Client> {
    let incoming = Client {
        name: name.trim().to_string(),
        phone: non_blank(phone.map(str::to_string)),
        last_service_date: Some(date),
        last_service: Some(service),
    };

    dedup_keep_last(clients.iter().cloned().chain(std::iter::once(incoming)))
}

/// Exact-name lookup.
pub fn find<'a>(clients: &'a [Client], name: &str) -> Option<&'a Client> {
    clients.iter().find(|client| client.name == name)
}

fn dedup_keep_last(records: impl IntoIterator<Item = Client>) -> Vec<Client> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut roster: Vec<Client> = Vec::new();

    for record in records {
        match positions.get(&record.name) {
            Some(&position) => roster[position] = record,
            None => {
                positions.insert(record.name.clone(), roster.len());
                roster.push(record);
            }
        }
    }

    roster
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn names(clients: &[Client]) -> Vec<&str> {
        clients.iter().map(|client| client.name.as_str()).collect()
    }

    #[test]
    fn repeat_client_keeps_one_record_with_newest_service() {
        let roster = upsert(&[], "Ana", None, ymd(2024, 5, 3), Service::Makeup);
        let roster = upsert(&roster, "Ana", None, ymd(2024, 6, 1), Service::Eyebrow);

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].last_service, Some(Service::Eyebrow));
        assert_eq!(roster[0].last_service_date, Some(ymd(2024, 6, 1)));
    }

    #[test]
    fn newest_values_win_outright() {
        let roster = upsert(&[], "Ana", Some("1111"), ymd(2024, 5, 3), Service::Makeup);
        let roster = upsert(&roster, "Ana", None, ymd(2024, 5, 4), Service::Makeup);
        assert_eq!(roster[0].phone, None, "a missing phone replaces the old one");
    }

    #[test]
    fn distinct_names_keep_first_appearance_order() {
        let roster = upsert(&[], "Ana", None, ymd(2024, 5, 1), Service::Makeup);
        let roster = upsert(&roster, "Bia", None, ymd(2024, 5, 2), Service::Makeup);
        let roster = upsert(&roster, "Ana", None, ymd(2024, 5, 3), Service::LashExtension);
        let roster = upsert(&roster, "Carla", None, ymd(2024, 5, 4), Service::Other);

        assert_eq!(names(&roster), vec!["Ana", "Bia", "Carla"]);
        assert_eq!(
            find(&roster, "Ana").and_then(|client| client.last_service),
            Some(Service::LashExtension)
        );
    }

    #[test]
    fn names_compare_case_sensitively() {
        let roster = upsert(&[], "Ana", None, ymd(2024, 5, 1), Service::Makeup);
        let roster = upsert(&roster, "ana", None, ymd(2024, 5, 2), Service::Makeup);
        assert_eq!(names(&roster), vec!["Ana", "ana"]);
        assert!(find(&roster, "ANA").is_none());
    }

    #[test]
    fn duplicates_already_in_the_roster_collapse() {
        let stale = Client {
            name: "Ana".into(),
            phone: None,
            last_service_date: None,
            last_service: None,
        };
        let roster = upsert(
            &[stale.clone(), stale],
            "Bia",
            Some("2222"),
            ymd(2024, 5, 2),
            Service::Eyebrow,
        );
        assert_eq!(names(&roster), vec!["Ana", "Bia"]);
        assert_eq!(roster[1].phone.as_deref(), Some("2222"));
    }
}
