use chrono::NaiveDate;
use regex::Regex;
use soultrip_core::{Difficulty, InferredFilters};
use std::sync::LazyLock;

static DIFFICULTY_WORDS: LazyLock<Vec<(Regex, Difficulty)>> = LazyLock::new(|| {
    [
        (r"\b(easy|beginner|gentle|relaxed)\b", Difficulty::Easy),
        (r"\b(moderate|medium|intermediate)\b", Difficulty::Moderate),
        (r"\b(challenging|hard|difficult|tough)\b", Difficulty::Challenging),
        (r"\b(intense|extreme)\b", Difficulty::Intense),
    ]
    .into_iter()
    .map(|(pattern, difficulty)| (Regex::new(pattern).unwrap(), difficulty))
    .collect()
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// Checked in order; the first region named in the query wins.
const REGIONS: &[(&str, &[&str])] = &[
    (
        "asia",
        &[
            "china", "india", "japan", "indonesia", "pakistan", "bangladesh", "vietnam",
            "philippines", "thailand", "myanmar", "south korea", "nepal", "sri lanka", "malaysia",
            "cambodia", "laos", "mongolia", "bhutan", "singapore", "brunei", "timor-leste",
            "maldives",
        ],
    ),
    (
        "southeast asia",
        &[
            "indonesia", "thailand", "vietnam", "philippines", "malaysia", "singapore", "cambodia",
            "laos", "myanmar", "brunei", "timor-leste",
        ],
    ),
    (
        "south asia",
        &["india", "pakistan", "bangladesh", "sri lanka", "nepal", "bhutan", "maldives"],
    ),
    ("east asia", &["china", "japan", "south korea", "mongolia", "taiwan"]),
    (
        "europe",
        &[
            "united kingdom", "ireland", "france", "spain", "portugal", "italy", "germany",
            "netherlands", "belgium", "switzerland", "austria", "greece", "norway", "sweden",
            "finland", "denmark", "poland", "czech republic", "hungary", "croatia", "slovenia",
            "slovakia", "romania", "bulgaria",
        ],
    ),
    (
        "western europe",
        &[
            "france", "spain", "portugal", "italy", "germany", "netherlands", "belgium",
            "switzerland", "austria",
        ],
    ),
    (
        "africa",
        &[
            "morocco", "egypt", "south africa", "kenya", "tanzania", "ethiopia", "ghana",
            "nigeria", "rwanda", "uganda", "namibia", "botswana",
        ],
    ),
    ("north america", &["united states", "canada", "mexico"]),
    (
        "central america",
        &["guatemala", "belize", "honduras", "el salvador", "nicaragua", "costa rica", "panama"],
    ),
    (
        "south america",
        &[
            "brazil", "argentina", "chile", "peru", "colombia", "ecuador", "bolivia", "paraguay",
            "uruguay", "venezuela",
        ],
    ),
    (
        "oceania",
        &["australia", "new zealand", "fiji", "samoa", "papua new guinea", "vanuatu"],
    ),
];

const COUNTRIES: &[&str] = &[
    "nepal", "india", "peru", "spain", "italy", "france", "portugal", "greece", "japan",
    "thailand", "indonesia", "morocco", "united states", "usa", "canada", "mexico", "brazil",
    "argentina", "chile", "australia", "new zealand", "egypt", "turkey",
];

/// Keyword inference used when no model is configured or the model call fails.
pub fn simple_infer(query: &str) -> InferredFilters {
    let q = query.to_lowercase();
    let mut filters = InferredFilters::default();

    filters.difficulty = DIFFICULTY_WORDS
        .iter()
        .find(|(re, _)| re.is_match(&q))
        .map(|(_, difficulty)| *difficulty);

    let mut dates = ISO_DATE.find_iter(&q).map(|m| m.as_str());
    filters.start_date = dates.next().and_then(parse_date);
    filters.end_date = dates.next().and_then(parse_date);

    let mut countries: Option<Vec<String>> = REGIONS
        .iter()
        .find(|(region, _)| q.contains(region))
        .map(|(_, list)| list.iter().map(|c| c.to_string()).collect());

    for country in COUNTRIES {
        if !q.contains(country) {
            continue;
        }
        let name = if *country == "usa" { "united states" } else { country };
        let list = countries.get_or_insert_with(Vec::new);
        if !list.iter().any(|c| c == name) {
            list.push(name.to_string());
        }
    }
    filters.countries = countries;

    filters
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_synonyms() {
        assert_eq!(DIFFICULTY_WORDS.len(), 4);
        assert_eq!(simple_infer("intermediate hikers").difficulty, Some(Difficulty::Moderate));
        assert_eq!(simple_infer("a gentle walk").difficulty, Some(Difficulty::Easy));
        assert_eq!(simple_infer("Something TOUGH").difficulty, Some(Difficulty::Challenging));
        assert_eq!(simple_infer("extreme heights").difficulty, Some(Difficulty::Intense));
        // Word boundaries: "hardware" is not "hard"
        assert_eq!(simple_infer("hardware retreat").difficulty, None);
    }

    #[test]
    fn test_first_two_dates() {
        let filters = simple_infer("from 2026-03-01 to 2026-03-15, maybe 2026-04-01");
        assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(filters.end_date, NaiveDate::from_ymd_opt(2026, 3, 15));

        let single = simple_infer("leaving 2026-07-04");
        assert!(single.end_date.is_none());
    }

    #[test]
    fn test_region_then_named_countries() {
        let filters = simple_infer("Trek in south america, ideally Peru");
        let countries = filters.countries.unwrap();
        assert_eq!(countries.len(), 10);
        assert!(countries.contains(&"peru".to_string()));

        let filters = simple_infer("oceania or turkey");
        let countries = filters.countries.unwrap();
        assert_eq!(countries.last().map(String::as_str), Some("turkey"));
    }

    #[test]
    fn test_usa_maps_to_united_states_once() {
        let filters = simple_infer("road trip across the USA and the United States");
        assert_eq!(filters.countries, Some(vec!["united states".to_string()]));
    }

    #[test]
    fn test_nothing_inferred() {
        assert_eq!(simple_infer("somewhere quiet"), InferredFilters::default());
    }
}
