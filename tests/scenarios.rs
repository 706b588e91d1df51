use risk_sampler::builders::{FrameBuilder, TargetBuilder};
use risk_sampler::report::format_audit;
use risk_sampler::{Cap, Column, Frame, RiskSampler, SamplerConfig, WeightError};
use serde_json::json;

fn toy() -> Frame {
    Frame::new()
        .with_column("vint", Column::Int(vec![202401, 202401, 202402, 202402]))
        .unwrap()
        .with_column("bad", Column::Int(vec![1, 0, 1, 0]))
        .unwrap()
}

fn sampler(strategies: serde_json::Value) -> RiskSampler {
    RiskSampler::from_json(
        &json!({"date_col": "vint", "target_col": "bad", "strategies": strategies}).to_string(),
    )
    .unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
    }
}

fn mean(w: &[f64]) -> f64 {
    w.iter().sum::<f64>() / w.len() as f64
}

#[test]
fn balanced_toy_table_is_uniform() {
    let w = sampler(json!({"balanced": {}})).fit_transform(&toy()).unwrap();
    assert_close(&w, &[1.0; 4]);
}

#[test]
fn equal_vintage_toy_table_is_uniform() {
    let w = sampler(json!({"equal_vintage": {}})).fit_transform(&toy()).unwrap();
    assert_close(&w, &[1.0; 4]);
}

#[test]
fn recency_decay_toy_table() {
    let w = sampler(json!({"recency_decay": {"half_life": 1}}))
        .fit_transform(&toy())
        .unwrap();
    assert_close(&w, &[2.0 / 3.0, 2.0 / 3.0, 4.0 / 3.0, 4.0 / 3.0]);

    let uncapped = RiskSampler::new(
        SamplerConfig::new("vint", "bad")
            .strategy("recency_decay", json!({"half_life": 1}))
            .cap(None),
    )
    .unwrap()
    .fit_transform(&toy())
    .unwrap();
    assert_close(&uncapped, &w);
}

#[test]
fn unknown_strategy_fails_at_construction() {
    let err = RiskSampler::from_json(
        r#"{"date_col": "vint", "target_col": "bad", "strategies": {"foo": {}}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, WeightError::Configuration(_)));
}

#[test]
fn ambiguous_composition_fails_at_construction() {
    let err = RiskSampler::from_json(
        r#"{"date_col": "vint", "target_col": "bad",
            "strategies": {"balanced": {}, "recency_decay": {}}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, WeightError::Configuration(_)));
}

/// One bad among forty rows: `balanced` gives the bad row weight 20.
fn skewed() -> Frame {
    let bad: Vec<i64> = (0..40).map(|i| i64::from(i == 0)).collect();
    Frame::new()
        .with_column("vint", Column::Int(vec![202401; 40]))
        .unwrap()
        .with_column("bad", Column::Int(bad))
        .unwrap()
}

#[test]
fn default_cap_clips_and_renormalizes() {
    let capped = sampler(json!({"balanced": {}})).run(&skewed()).unwrap();
    assert_eq!(capped.normalization.cap_threshold, Some(10.0));
    assert_eq!(capped.normalization.clipped, 1);
    assert!((mean(&capped.weights) - 1.0).abs() < 1e-12);
    // Clipped to 10, then scaled by 40/30: above the nominal cap again.
    assert!((capped.weights[0] - 40.0 / 3.0).abs() < 1e-9);
    assert!(capped.weights[0] > 10.0);

    let uncapped = RiskSampler::new(
        SamplerConfig::new("vint", "bad").strategy("balanced", json!({})).cap(None),
    )
    .unwrap()
    .run(&skewed())
    .unwrap();
    assert_eq!(uncapped.normalization.cap_threshold, None);
    assert!((uncapped.weights[0] - 20.0).abs() < 1e-9);
}

#[test]
fn quantile_cap_from_json() {
    let sampler = RiskSampler::from_json(
        r#"{"date_col": "vint", "target_col": "bad",
            "strategies": {"balanced": {}}, "cap": {"quantile": 0.9}}"#,
    )
    .unwrap();
    assert_eq!(sampler.config().cap, Some(Cap::Quantile { quantile: 0.9 }));
    let run = sampler.run(&skewed()).unwrap();
    assert_eq!(run.normalization.clipped, 1);
    assert!((mean(&run.weights) - 1.0).abs() < 1e-12);
}

#[test]
fn combo_multiplies_in_declared_order() {
    let w = sampler(json!({
        "balanced": {},
        "recency_decay": {"half_life": 1},
        "combo": {"order": ["balanced", "recency_decay"]}
    }))
    .fit_transform(&toy())
    .unwrap();
    assert_close(&w, &[2.0 / 3.0, 2.0 / 3.0, 4.0 / 3.0, 4.0 / 3.0]);
}

#[test]
fn seeded_bootstrap_is_reproducible_and_conserves_mass() {
    let s = sampler(json!({"stratified_bootstrap": {"random_state": 42}}));
    let frame = skewed();
    let a = s.run(&frame).unwrap();
    let b = s.run(&frame).unwrap();

    assert_eq!(a.weights, b.weights);
    assert_eq!(a.steps[0].mean, 1.0);
    assert!(a.weights.iter().all(|w| *w >= 0.0 && w.is_finite()));
}

#[test]
fn repeated_calls_are_bit_identical() {
    let s = sampler(json!({
        "equal_vintage": {},
        "stabilise_er": {"target_er": 0.3},
        "recency_decay": {"lambda": 0.2},
        "combo": {"order": ["equal_vintage", "stabilise_er", "recency_decay"]}
    }));
    let frame = Frame::new()
        .with_column("vint", Column::Str(vec!["2023-11".into(), "2023-12".into(), "2024-01".into(), "2023-12".into(), "2024-01".into()]))
        .unwrap()
        .with_column("bad", Column::Bool(vec![true, false, true, true, false]))
        .unwrap();
    assert_eq!(s.fit_transform(&frame).unwrap(), s.fit_transform(&frame).unwrap());
}

#[test]
fn non_binary_target_is_a_data_error() {
    let frame = Frame::new()
        .with_column("vint", Column::Int(vec![202401, 202402]))
        .unwrap()
        .with_column("bad", Column::Int(vec![0, 3]))
        .unwrap();
    let err = sampler(json!({"balanced": {}})).fit_transform(&frame).unwrap_err();
    assert!(matches!(err, WeightError::Data(_)));
}

#[test]
fn expected_loss_scales_by_exposure() {
    let frame = toy()
        .with_column("ead", Column::Float(vec![100.0, 300.0, 100.0, 300.0]))
        .unwrap();
    let w = sampler(json!({"expected_loss": {"ead_col": "ead"}}))
        .fit_transform(&frame)
        .unwrap();
    assert_close(&w, &[0.5, 1.5, 0.5, 1.5]);
}

#[test]
fn expected_loss_with_scale_to_mean_flag() {
    let frame = toy()
        .with_column("ead", Column::Int(vec![100, 200, 150, 250]))
        .unwrap()
        .with_column("lgd", Column::Float(vec![0.5, 0.6, 0.4, 0.7]))
        .unwrap();
    let raw = [50.0, 120.0, 60.0, 175.0];
    let raw_mean = raw.iter().sum::<f64>() / 4.0;
    let expected: Vec<f64> = raw.iter().map(|r| r / raw_mean).collect();

    for flag in [true, false] {
        let w = sampler(json!({
            "expected_loss": {"ead_col": "ead", "lgd_col": "lgd", "scale_to_mean": flag}
        }))
        .fit_transform(&frame)
        .unwrap();
        assert!((mean(&w) - 1.0).abs() < 1e-12);
        for (a, e) in w.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-9);
        }
    }
}

#[test]
fn recency_decay_accepts_lambda_underscore_key() {
    let w = sampler(json!({"recency_decay": {"lambda_": std::f64::consts::LN_2}}))
        .fit_transform(&toy())
        .unwrap();
    for (a, e) in w.iter().zip([2.0 / 3.0, 2.0 / 3.0, 4.0 / 3.0, 4.0 / 3.0]) {
        assert!((a - e).abs() < 1e-9);
    }
}

#[test]
fn audit_report_reflects_the_weights() {
    let s = sampler(json!({"recency_decay": {"half_life": 1}}));
    let frame = toy();
    let w = s.fit_transform(&frame).unwrap();
    let report = s.audit_report(&frame, &w).unwrap();

    assert_eq!(report.n_rows, 4);
    assert!((report.vintages[0].weight_sum - 4.0 / 3.0).abs() < 1e-12);
    assert!((report.vintages[1].weight_sum - 8.0 / 3.0).abs() < 1e-12);
    assert!((report.weighted_event_rate - 0.5).abs() < 1e-12);
    assert!(report.effective_sample_size < 4.0);

    let text = format_audit(&report);
    assert!(text.contains("2024-02"));
    assert!(report.to_json().unwrap().contains("\"vintages\""));
}

#[test]
fn target_builder_output_feeds_the_sampler() {
    let panel = Frame::new()
        .with_column("id", Column::Int(vec![1, 1, 1, 2, 2, 2]))
        .unwrap()
        .with_column("date", Column::Int(vec![202001, 202002, 202003, 202001, 202002, 202003]))
        .unwrap()
        .with_column("dpd", Column::Int(vec![0, 45, 0, 0, 0, 0]))
        .unwrap();
    let table = TargetBuilder::new("id", "date")
        .targets(["EVER30M2"])
        .unwrap()
        .transform(&panel)
        .unwrap();
    assert_eq!(table.column("EVER30M2"), Some(&Column::Int(vec![1, 1, 0, 0, 0, 0])));

    let w = RiskSampler::new(SamplerConfig::new("date", "EVER30M2").strategy("balanced", json!({})))
        .unwrap()
        .fit_transform(&table)
        .unwrap();
    assert_close(&w, &[1.5, 1.5, 0.75, 0.75, 0.75, 0.75]);
}
