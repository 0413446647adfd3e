/// Integration tests for the dashboard aggregator.
///
/// Filtering, sorting and statistics are exercised through the public
/// `Dashboard` / `compute_view` API only.
use clausescope::client::dashboard::{
    AnalysisSummary, Dashboard, DashboardView, FilterState, SortKey, compute_view,
};

fn record(id: &str, title: &str, risk: &str, score: u8, date: &str) -> AnalysisSummary {
    AnalysisSummary {
        id: id.to_string(),
        title: title.to_string(),
        summary: format!("Summary of {title}"),
        risk: risk.to_string(),
        risk_score: score,
        date: date.to_string(),
    }
}

fn ids(view: &DashboardView) -> Vec<&str> {
    view.records.iter().map(|r| r.id.as_str()).collect()
}

fn sample() -> Vec<AnalysisSummary> {
    vec![
        record("a", "NDA Agreement", "High", 1, "2025-01-03"),
        record("b", "Lease", "", 8, "2025-01-01"),
        record("c", "Supply Contract", "Low", 9, "2025-01-02"),
        record("d", "Service Terms", "Medium", 5, "2025-01-02"),
        record("e", "Employment", "Unknown", 5, "garbage"),
        record("f", "Licence", "", 2, "2025-01-04"),
    ]
}

#[test]
fn search_is_case_insensitive_substring() {
    let base = vec![
        record("1", "NDA Agreement", "Low", 1, "2025-01-01"),
        record("2", "Lease", "Low", 1, "2025-01-02"),
    ];
    let mut dashboard = Dashboard::new(base);
    let view = dashboard.set_search("nda");
    assert_eq!(ids(&view), vec!["1"]);
}

#[test]
fn filtering_is_independent_of_previous_calls() {
    let mut dashboard = Dashboard::new(sample());
    let direct = dashboard.set_search("lease");

    dashboard.set_search("supply");
    dashboard.set_sort(SortKey::RiskAsc);
    dashboard.set_sort(SortKey::DateDesc);
    let after_detour = dashboard.set_search("lease");

    assert_eq!(direct, after_detour);
    assert_eq!(dashboard.view(), dashboard.view());
}

#[test]
fn risk_sort_is_stable_for_equal_scores() {
    let filter = FilterState {
        search_term: String::new(),
        sort_key: SortKey::RiskDesc,
    };
    let view = compute_view(&sample(), &filter);
    // d and e both score 5 and keep their base order.
    assert_eq!(ids(&view), vec!["c", "b", "d", "e", "f", "a"]);

    let asc = compute_view(
        &sample(),
        &FilterState {
            sort_key: SortKey::RiskAsc,
            ..filter
        },
    );
    assert_eq!(ids(&asc), vec!["a", "f", "d", "e", "b", "c"]);
}

#[test]
fn date_sort_is_stable_and_puts_unparseable_last() {
    let view = compute_view(&sample(), &FilterState::default());
    // c and d share a date and keep their base order.
    assert_eq!(ids(&view), vec!["f", "a", "c", "d", "b", "e"]);
}

#[test]
fn statistics_partition_the_filtered_set() {
    let mut dashboard = Dashboard::new(sample());
    for term in ["", "a", "lease", "zzz", "contract", "2"] {
        let view = dashboard.set_search(term);
        let stats = view.stats;
        assert_eq!(stats.total, view.records.len());
        assert_eq!(stats.high + stats.medium + stats.low, view.records.len());
    }
}

#[test]
fn label_precedence_over_score() {
    let view = compute_view(
        &[
            record("1", "t", "High", 1, ""),
            record("2", "t", "", 8, ""),
            record("3", "t", "Low", 9, ""),
        ],
        &FilterState::default(),
    );
    assert_eq!(view.stats.high, 2);
    assert_eq!(view.stats.medium, 0);
    assert_eq!(view.stats.low, 1);
    assert_eq!(view.risk_distribution.labels, vec!["High", "Medium", "Low"]);
    assert_eq!(view.risk_distribution.values, vec![2, 0, 1]);
}

#[test]
fn activity_series_uses_literal_date_strings() {
    let view = compute_view(&sample(), &FilterState::default());
    assert_eq!(
        view.activity.labels,
        vec!["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-04", "garbage"]
    );
    assert_eq!(view.activity.values, vec![1, 2, 1, 1, 1]);
}

#[test]
fn base_collection_is_never_modified() {
    let mut dashboard = Dashboard::new(sample());
    dashboard.set_search("nda");
    dashboard.set_sort(SortKey::RiskAsc);
    assert_eq!(dashboard.base(), sample().as_slice());
}

#[test]
fn summaries_load_from_listing_json() {
    let json = r#"[
        {"id":"20250115_100000","title":"Liability Cap","summary":"s","risk":"High","riskScore":"6/10","date":"2025-01-15T10:00:00+00:00"},
        {"id":"20250114_090000","title":"Termination","summary":"s","risk":"Unknown","riskScore":"N/A","date":"20250114_090000"}
    ]"#;
    let base: Vec<AnalysisSummary> = serde_json::from_str(json).unwrap();
    assert_eq!(base[0].risk_score, 6);
    assert_eq!(base[1].risk_score, 0);

    let view = compute_view(&base, &FilterState::default());
    assert_eq!(ids(&view), vec!["20250115_100000", "20250114_090000"]);
}
