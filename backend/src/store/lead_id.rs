use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;

const SUFFIXES: RangeInclusive<u16> = 100..=999;

/// `LD` + the date + `-`, shared by every lead id issued that day.
pub fn lead_id_prefix(date: NaiveDate) -> String {
    format!("LD{}-", date.format("%Y%m%d"))
}

/// A human-facing lead reference: `LD` + date + `-` + three random digits,
/// e.g. `LD20240115-482`.
///
/// The suffix is not meant to be unpredictable. Collisions are caught by the
/// UNIQUE constraint on `lead_id` and the caller draws again.
pub fn lead_id_for<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    format!("{}{}", lead_id_prefix(date), rng.random_range(SUFFIXES))
}

/// Picks one of the ids of `date` that is not in `taken`, or `None` once all
/// 900 suffixes are used.
pub fn free_lead_id<R: Rng + ?Sized>(
    date: NaiveDate,
    taken: &HashSet<String>,
    rng: &mut R,
) -> Option<String> {
    let prefix = lead_id_prefix(date);
    let free: Vec<String> = SUFFIXES
        .map(|suffix| format!("{prefix}{suffix}"))
        .filter(|id| !taken.contains(id))
        .collect();
    free.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn lead_ids_carry_the_date_and_a_three_digit_suffix() {
        let pattern = Regex::new(r"^LD20240105-[1-9]\d{2}$").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let id = lead_id_for(day(), &mut rng);
            assert!(pattern.is_match(&id), "unexpected lead id {id}");
        }
    }

    #[test]
    fn free_id_avoids_taken_suffixes() {
        let mut taken: HashSet<String> = (100..=998).map(|n| format!("LD20240105-{n}")).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            free_lead_id(day(), &taken, &mut rng).as_deref(),
            Some("LD20240105-999")
        );

        taken.insert("LD20240105-999".to_string());
        assert_eq!(free_lead_id(day(), &taken, &mut rng), None);
    }

    #[test]
    fn ids_of_other_days_do_not_count_as_taken() {
        let taken: HashSet<String> = (100..=999).map(|n| format!("LD20240104-{n}")).collect();
        let id = free_lead_id(day(), &taken, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(id.starts_with("LD20240105-"));
    }
}
