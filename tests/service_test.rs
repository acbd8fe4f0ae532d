use hakedis::engine::TotalsSource;
use hakedis::{
    CommissionService, Config, Decimal, EngineError, MockSnapshotSource, RecordId,
    ReportFilterInput, SimulationOutcome, SourceError,
};
use std::sync::Arc;

const SNAPSHOT: &str = r#"{
    "counterparties": [
        {
            "id": "X",
            "name": "Bank X",
            "tables": [
                {
                    "id": "X_table",
                    "product": "POS",
                    "cardType": "Credit",
                    "geography": "Domestic",
                    "pricingModel": "revenueShare",
                    "maturityRates": [
                        {"term": "+7 days", "enabled": true, "buyRate": 1.0, "sellRate": 1.5}
                    ],
                    "counterpartySplitPercent": 60,
                    "platformSplitPercent": 40
                }
            ],
            "groups": [
                {
                    "id": "g1",
                    "name": "2025 Agreement",
                    "validFrom": "2025-01-01",
                    "active": true,
                    "memberTableIds": ["X_table", "X_table"]
                }
            ]
        },
        {
            "id": "T",
            "name": "Treasury Bank",
            "tables": [
                {
                    "id": "T_table",
                    "product": "Treasury",
                    "cardType": "-",
                    "geography": "Domestic",
                    "pricingModel": "treasuryIncome",
                    "treasuryDetail": {
                        "referenceAmount": 50000,
                        "platformPercent": 30,
                        "earning": 1000
                    },
                    "counterpartySplitPercent": 0,
                    "platformSplitPercent": 0
                }
            ]
        }
    ],
    "settlements": [
        {
            "id": "r1",
            "counterpartyId": "X",
            "groupId": "g1",
            "groupName": "2025 Agreement",
            "period": "2025-01",
            "volumes": {"X_table-+7 days": {"amount": "100000"}},
            "status": "Draft",
            "createdAt": "2025-02-01T10:00:00Z"
        }
    ]
}"#;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn service_with(source: MockSnapshotSource, config: Config) -> CommissionService {
    CommissionService::new(Arc::new(source), config)
}

fn service() -> CommissionService {
    service_with(MockSnapshotSource::from_json(SNAPSHOT).unwrap(), Config::default())
}

fn unbalanced_source() -> MockSnapshotSource {
    // 60 + 30 does not reach 100.
    let json = SNAPSHOT.replace(
        "\"platformSplitPercent\": 40",
        "\"platformSplitPercent\": 30",
    );
    MockSnapshotSource::from_json(&json).unwrap()
}

#[test]
fn test_settlement_report() {
    let report = service().settlement_report(&ReportFilterInput::default()).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].source, TotalsSource::Recomputed);
    assert_eq!(report.rows[0].totals.gross, d("500"));
    assert_eq!(report.summary.totals.counterparty_share, d("300"));
    assert_eq!(report.summary.totals.platform_share, d("200"));
}

#[test]
fn test_report_filter_from_submitted_form() {
    let input: ReportFilterInput =
        serde_json::from_str(r#"{"status": "finalized", "minVolume": "not a number"}"#).unwrap();
    let report = service().settlement_report(&input).unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.summary.average_gross, Decimal::zero());
}

#[test]
fn test_malformed_override_does_not_fail_snapshot_load() {
    let json = SNAPSHOT.replace(
        r#"{"amount": "100000"}"#,
        r#"{"amount": "100000", "counterpartyPercent": "abc", "platformPercent": ""}"#,
    );
    let service = service_with(MockSnapshotSource::from_json(&json).unwrap(), Config::default());
    let report = service.settlement_report(&ReportFilterInput::default()).unwrap();
    assert_eq!(report.rows[0].totals.gross, d("500"));
}

#[test]
fn test_simulate_ranks_counterparties() {
    let outcome = service().simulate("100000").unwrap();
    let ranking: Vec<(&str, Decimal)> = outcome
        .ranking()
        .iter()
        .map(|p| (p.counterparty_name.as_str(), p.total_earning))
        .collect();
    assert_eq!(ranking, vec![("Treasury Bank", d("600")), ("Bank X", d("500"))]);
}

#[test]
fn test_simulate_rejects_bad_amount_before_loading() {
    let failing = MockSnapshotSource::new().failing(SourceError::Unavailable("offline".into()));
    let service = service_with(failing, Config::default());
    for raw in ["", "0", "-1", "1O0"] {
        let err = service.simulate(raw).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "{:?}", raw);
    }
    // A valid amount reaches the source and surfaces its failure.
    assert!(matches!(service.simulate("100"), Err(EngineError::Source(_))));
}

#[test]
fn test_simulate_without_rates() {
    let service = service_with(MockSnapshotSource::new(), Config::default());
    assert_eq!(service.simulate("100").unwrap(), SimulationOutcome::NoComputableData);
}

#[test]
fn test_source_errors_propagate() {
    let service = service_with(
        MockSnapshotSource::new().failing(SourceError::Malformed("bad row".into())),
        Config::default(),
    );
    let err = service.settlement_report(&ReportFilterInput::default()).unwrap_err();
    assert_eq!(err.to_string(), "Malformed snapshot: bad row");
}

#[test]
fn test_strict_validation_rejects_unbalanced_split() {
    let lenient = service_with(unbalanced_source(), Config::default());
    let report = lenient.settlement_report(&ReportFilterInput::default()).unwrap();
    assert_eq!(report.rows[0].totals.platform_share, d("150"));

    let strict_config = Config {
        strict_validation: true,
        ..Config::default()
    };
    let strict = service_with(unbalanced_source(), strict_config.clone());
    let err = strict.simulate("100000").unwrap_err();
    assert!(matches!(err, EngineError::InvalidSnapshot(_)));

    // A balanced snapshot passes strict mode.
    let balanced = service_with(MockSnapshotSource::from_json(SNAPSHOT).unwrap(), strict_config);
    assert!(balanced.simulate("100000").is_ok());
}

#[test]
fn test_refresh_record() {
    let service = service();
    let record = service.refresh_record(&RecordId::new("r1")).unwrap();
    let cached = record.cached_totals().unwrap();
    assert_eq!(cached.gross, d("500"));
    assert_eq!(cached.volume, d("100000"));

    // The service never writes back; the source still holds an uncached record.
    let report = service.settlement_report(&ReportFilterInput::default()).unwrap();
    assert_eq!(report.rows[0].source, TotalsSource::Recomputed);
}

#[test]
fn test_breakdown_and_missing_record() {
    let service = service();
    let breakdown = service.settlement_breakdown(&RecordId::new("r1")).unwrap();
    assert_eq!(breakdown.lines.len(), 1);
    assert_eq!(breakdown.lines[0].sequence, "01");

    let err = service.refresh_record(&RecordId::new("missing")).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(matches!(
        service.settlement_breakdown(&RecordId::new("missing")),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_config_from_env_map() {
    let env = [("HAKEDIS_MONEY_SCALE".to_string(), "0".to_string())]
        .into_iter()
        .collect();
    let config = Config::from_env_map(env).unwrap();
    let service = service_with(MockSnapshotSource::from_json(SNAPSHOT).unwrap(), config);
    assert_eq!(service.config().money_scale, 0);
    assert!(service.simulate("100000").is_ok());
}
