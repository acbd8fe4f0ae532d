use chrono::{NaiveDate, TimeZone, Utc};
use hakedis::domain::{
    BuySellRate, CommissionTableGroup, Geography, MaturityRate, PercentRate, TreasuryDetail,
    VolumeEntry, VolumeKey,
};
use hakedis::engine::{LineKind, TotalsSource};
use hakedis::{
    CommissionTable, Counterparty, CounterpartyId, Decimal, GroupId, PricingModel,
    SettlementCalculator, SettlementRecord, Snapshot, TableId, Term,
};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn counterparty() -> Counterparty {
    let revenue = CommissionTable::new(
        "X_rs",
        "POS",
        "Credit",
        Geography::Domestic,
        PricingModel::RevenueShare {
            maturity_rates: vec![
                MaturityRate::new(
                    "+7 days",
                    BuySellRate {
                        buy_rate: d("1.0"),
                        sell_rate: d("1.5"),
                    },
                ),
                MaturityRate::new(
                    "+30 days",
                    BuySellRate {
                        buy_rate: d("1.0"),
                        sell_rate: d("2.0"),
                    },
                )
                .disabled(),
            ],
        },
    )
    .with_split(d("60"), d("40"));

    let fixed = CommissionTable::new(
        "X_fc",
        "POS",
        "Debit",
        Geography::Domestic,
        PricingModel::FixedCommission {
            maturity_rates: vec![MaturityRate::new(
                "same-day",
                PercentRate {
                    percent_rate: d("2.0"),
                },
            )],
        },
    )
    .with_split(d("50"), d("50"))
    .closed_on(date(2025, 3, 15));

    let treasury = CommissionTable::new(
        "X_tr",
        "Treasury",
        "-",
        Geography::Domestic,
        PricingModel::TreasuryIncome {
            treasury_detail: TreasuryDetail {
                reference_amount: d("50000"),
                platform_percent: d("30"),
                earning: d("1000"),
            },
        },
    );

    let supplemental = CommissionTable::new(
        "X_sup",
        "Marketing",
        "-",
        Geography::Domestic,
        PricingModel::FixedCommission { maturity_rates: vec![] },
    )
    .with_split(d("80"), d("20"))
    .supplemental();

    Counterparty::new("X", "Bank X")
        .with_table(revenue)
        .with_table(fixed)
        .with_table(treasury)
        .with_table(supplemental)
        .with_group(
            CommissionTableGroup::new("g1", "2025 Agreement", date(2025, 1, 1))
                .with_member("X_rs")
                .with_member("X_fc")
                .with_member("X_tr")
                .with_member("X_sup"),
        )
}

fn record(id: &str, period: &str) -> SettlementRecord {
    SettlementRecord::open(
        id,
        CounterpartyId::new("X"),
        GroupId::new("g1"),
        "2025 Agreement",
        period.parse().unwrap(),
        Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap(),
    )
}

fn normal(table: &str, term: &str) -> VolumeKey {
    VolumeKey::normal(&TableId::new(table), &Term::new(term))
}

fn by_table(table: &str) -> VolumeKey {
    VolumeKey::table(&TableId::new(table))
}

fn filled(id: &str, period: &str) -> SettlementRecord {
    let mut r = record(id, period);
    r.set_volume(normal("X_rs", "+7 days"), VolumeEntry::new(d("100000")));
    r.set_volume(normal("X_rs", "+30 days"), VolumeEntry::new(d("50000")));
    r.set_volume(normal("X_fc", "same-day"), VolumeEntry::new(d("10000")));
    r.set_volume(by_table("X_tr"), VolumeEntry::new(d("1")));
    r.set_volume(by_table("X_sup"), VolumeEntry::new(d("1000")));
    r
}

fn snapshot(records: Vec<SettlementRecord>) -> Snapshot {
    Snapshot::new(vec![counterparty()], records)
}

#[test]
fn test_live_recompute_sums_every_line() {
    let snap = snapshot(vec![filled("r1", "2025-01")]);
    let calc = SettlementCalculator::new(&snap);

    let resolved = calc.totals_for(&snap.settlements[0]);
    assert_eq!(resolved.source, TotalsSource::Recomputed);
    assert_eq!(resolved.totals.volume, d("111001"));
    assert_eq!(resolved.totals.gross, d("2700"));
    assert_eq!(resolved.totals.counterparty_share, d("1200"));
    assert_eq!(resolved.totals.platform_share, d("800"));

    let breakdown = calc.recompute(&snap.settlements[0]);
    let kinds: Vec<LineKind> = breakdown.lines.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![LineKind::Term, LineKind::Term, LineKind::Treasury, LineKind::Supplemental]
    );
    let sequences: Vec<&str> = breakdown.lines.iter().map(|l| l.sequence.as_str()).collect();
    assert_eq!(sequences, vec!["01", "02", "03", "undefined"]);
    assert_eq!(breakdown.lines[0].term, Some(Term::new("+7 days")));
    assert_eq!(breakdown.lines[2].counterparty_share, Decimal::zero());
}

#[test]
fn test_cached_totals_win_over_changed_rates() {
    let snap = snapshot(vec![filled("r1", "2025-01")]);
    let mut cached = snap.settlements[0].clone();
    SettlementCalculator::new(&snap).refresh_cache(&mut cached);

    let mut changed = counterparty();
    if let PricingModel::RevenueShare { maturity_rates } = &mut changed.tables[0].pricing {
        maturity_rates[0].rate.sell_rate = d("3.0");
    }
    let later = Snapshot::new(vec![changed], vec![cached.clone()]);
    let calc = SettlementCalculator::new(&later);

    let resolved = calc.totals_for(&cached);
    assert_eq!(resolved.source, TotalsSource::Cached);
    assert_eq!(resolved.totals.gross, d("2700"));

    // Live recomputation sees the new rate.
    assert_eq!(calc.recompute(&cached).totals.gross, d("4200"));
}

#[test]
fn test_refresh_is_idempotent() {
    let snap = snapshot(vec![filled("r1", "2025-01")]);
    let calc = SettlementCalculator::new(&snap);

    let mut once = snap.settlements[0].clone();
    let first = calc.refresh_cache(&mut once);
    let mut twice = once.clone();
    let second = calc.refresh_cache(&mut twice);

    assert_eq!(first, second);
    assert_eq!(once, twice);
    assert_eq!(once.cached_totals(), Some(first));
}

#[test]
fn test_volume_change_drops_cache() {
    let snap = snapshot(vec![filled("r1", "2025-01")]);
    let calc = SettlementCalculator::new(&snap);

    let mut r = snap.settlements[0].clone();
    calc.refresh_cache(&mut r);
    assert!(r.cached_totals().is_some());

    r.set_volume(normal("X_rs", "+7 days"), VolumeEntry::new(d("200000")));
    assert!(r.cached_totals().is_none());
    let resolved = calc.totals_for(&r);
    assert_eq!(resolved.source, TotalsSource::Recomputed);
    assert_eq!(resolved.totals.gross, d("3200"));
}

#[test]
fn test_closed_table_counts_only_for_earlier_periods() {
    let snap = snapshot(vec![filled("mar", "2025-03"), filled("apr", "2025-04")]);
    let calc = SettlementCalculator::new(&snap);

    // Closed on 2025-03-15: still part of March, gone from April.
    let march = calc.recompute(&snap.settlements[0]);
    assert!(march.lines.iter().any(|l| l.table_id.as_str() == "X_fc"));
    assert_eq!(march.totals.gross, d("2700"));

    let april = calc.recompute(&snap.settlements[1]);
    assert!(april.lines.iter().all(|l| l.table_id.as_str() != "X_fc"));
    assert_eq!(april.totals.gross, d("2500"));
    assert_eq!(april.totals.volume, d("101001"));
}

#[test]
fn test_supplemental_entry_percentages_override_table_split() {
    let mut r = record("r1", "2025-01");
    r.set_volume(by_table("X_sup"), VolumeEntry::with_split(d("1000"), d("45"), d("55")));
    let snap = snapshot(vec![r]);

    let totals = SettlementCalculator::new(&snap).recompute(&snap.settlements[0]).totals;
    assert_eq!(totals.gross, d("1000"));
    assert_eq!(totals.counterparty_share, d("450"));
    assert_eq!(totals.platform_share, d("550"));
}

#[test]
fn test_dangling_references_contribute_zero() {
    let mut unknown_group = filled("r1", "2025-01");
    unknown_group.group_id = GroupId::new("deleted");
    let mut unknown_counterparty = filled("r2", "2025-01");
    unknown_counterparty.counterparty_id = CounterpartyId::new("gone");

    let mut cp = counterparty();
    cp.groups[0].add_member(TableId::new("X_missing"));
    let mut with_missing_member = filled("r3", "2025-01");
    with_missing_member.set_volume(by_table("X_missing"), VolumeEntry::new(d("5")));

    let snap = Snapshot::new(
        vec![cp],
        vec![unknown_group, unknown_counterparty, with_missing_member],
    );
    let calc = SettlementCalculator::new(&snap);

    for record in &snap.settlements[..2] {
        let breakdown = calc.recompute(record);
        assert!(breakdown.lines.is_empty());
        assert_eq!(breakdown.totals.gross, Decimal::zero());
    }
    assert_eq!(calc.recompute(&snap.settlements[2]).totals.gross, d("2700"));
}

#[test]
fn test_zero_and_negative_volumes_are_skipped() {
    let mut r = record("r1", "2025-01");
    r.set_volume(normal("X_rs", "+7 days"), VolumeEntry::new(Decimal::zero()));
    r.set_volume(normal("X_fc", "same-day"), VolumeEntry::new(d("-100")));
    r.set_volume(by_table("X_tr"), VolumeEntry::new(Decimal::zero()));
    let snap = snapshot(vec![r]);

    let breakdown = SettlementCalculator::new(&snap).recompute(&snap.settlements[0]);
    assert!(breakdown.lines.is_empty());
    assert_eq!(breakdown.totals.volume, Decimal::zero());
}

#[test]
fn test_non_numeric_volume_from_json_counts_as_zero() {
    let json = r#"{
        "id": "r9",
        "counterpartyId": "X",
        "groupId": "g1",
        "groupName": "2025 Agreement",
        "period": "2025-01",
        "volumes": {
            "X_rs-+7 days": {"amount": "lots"},
            "X_fc-same-day": {"amount": "10000"}
        },
        "status": "Draft",
        "createdAt": "2025-02-01T10:00:00Z"
    }"#;
    let r: SettlementRecord = serde_json::from_str(json).unwrap();
    let snap = snapshot(vec![r]);

    let totals = SettlementCalculator::new(&snap).recompute(&snap.settlements[0]).totals;
    assert_eq!(totals.volume, d("10000"));
    assert_eq!(totals.gross, d("200"));
}

#[test]
fn test_stored_totals_without_gross() {
    let json = r#"{
        "id": "legacy",
        "counterpartyId": "X",
        "groupId": "g1",
        "period": "2024-12",
        "status": "Finalized",
        "totals": {
            "state": "cached",
            "totals": {"volume": 100, "counterpartyShare": 3, "platformShare": "2"}
        },
        "createdAt": "2025-01-05T08:30:00Z"
    }"#;
    let r: SettlementRecord = serde_json::from_str(json).unwrap();
    let snap = snapshot(vec![r]);

    let resolved = SettlementCalculator::new(&snap).totals_for(&snap.settlements[0]);
    assert_eq!(resolved.source, TotalsSource::Cached);
    assert_eq!(resolved.totals.gross, d("5"));
    assert_eq!(resolved.totals.volume, d("100"));
}

#[test]
fn test_malformed_entry_percent_falls_back_to_table_split() {
    let json = r#"[
        {
            "id": "r1",
            "counterpartyId": "X",
            "groupId": "g1",
            "period": "2025-01",
            "volumes": {
                "X_sup": {"amount": 1000, "counterpartyPercent": "abc", "platformPercent": 55}
            },
            "status": "Draft",
            "createdAt": "2025-02-01T10:00:00Z"
        },
        {
            "id": "r2",
            "counterpartyId": "X",
            "groupId": "g1",
            "period": "2025-02",
            "status": "Finalized",
            "totals": {
                "state": "cached",
                "totals": {"volume": 10, "counterpartyShare": "?", "platformShare": 4, "gross": ""}
            },
            "createdAt": "2025-03-01T10:00:00Z"
        }
    ]"#;
    let records: Vec<SettlementRecord> = serde_json::from_str(json).unwrap();
    let snap = snapshot(records);
    let calc = SettlementCalculator::new(&snap);

    let totals = calc.recompute(&snap.settlements[0]).totals;
    assert_eq!(totals.gross, d("1000"));
    assert_eq!(totals.counterparty_share, d("800"));
    assert_eq!(totals.platform_share, d("550"));

    let cached = calc.totals_for(&snap.settlements[1]);
    assert_eq!(cached.source, TotalsSource::Cached);
    assert_eq!(cached.totals.counterparty_share, Decimal::zero());
    assert_eq!(cached.totals.gross, d("4"));
}

#[test]
fn test_extreme_volumes_saturate_instead_of_panicking() {
    let mut r = record("r1", "2025-01");
    r.set_volume(normal("X_rs", "+7 days"), VolumeEntry::new(Decimal::MAX));
    r.set_volume(normal("X_fc", "same-day"), VolumeEntry::new(Decimal::MAX));
    r.set_volume(by_table("X_sup"), VolumeEntry::new(Decimal::MAX));
    let snap = snapshot(vec![r]);

    let breakdown = SettlementCalculator::new(&snap).recompute(&snap.settlements[0]);
    assert_eq!(breakdown.lines.len(), 3);
    assert_eq!(breakdown.totals.volume, Decimal::MAX);
    assert_eq!(breakdown.totals.gross, Decimal::MAX);
}
