use pulsenet_core::*;
use pulsenet_supervisor::*;

const EPS: f64 = 1e-9;

fn supervisor() -> Supervisor {
    Supervisor::new(SupervisorCfg::default()).unwrap()
}

fn unit_with_trust(initial: f64) -> Unit {
    let trust = TrustCfg { initial, ..TrustCfg::default() };
    Unit::with_cfgs(UnitId::new(), UnitCfg::default(), trust, CorrectionCfg::default()).unwrap()
}

fn rapid_unit(firings: usize) -> Unit {
    let mut u = Unit::new(UnitCfg::default()).unwrap();
    for _ in 0..firings {
        u.receive_input(2.0, Some("burst")).unwrap();
    }
    assert_eq!(u.history().firing_count(), firings);
    u
}

/// Minimal stand-in that records what the supervisor asked of it.
struct FakeUnit {
    id: UnitId,
    firings: usize,
    corrections: Vec<Correction>,
}

impl SupervisedUnit for FakeUnit {
    fn unit_id(&self) -> UnitId {
        self.id
    }
    fn trust_score(&self) -> f64 {
        0.5
    }
    fn parameter(&self, _parameter: Parameter) -> f64 {
        0.0
    }
    fn firing_count(&self) -> usize {
        self.firings
    }
    fn receive_boundary_notification(
        &mut self,
        _parameter: Parameter,
        observed: f64,
        safe_min: f64,
        safe_max: f64,
    ) -> Result<f64, CoreError> {
        Ok(observed.max(safe_min).min(safe_max))
    }
    fn adapt_parameters(&mut self, correction: Correction) {
        self.corrections.push(correction);
    }
    fn receive_pattern_recommendation(&mut self, _pattern: &str, _supervisor: SupervisorId) -> Option<AdoptionStatus> {
        None
    }
}

#[test]
fn trust_is_clamped_for_any_delta_sequence() {
    let mut sup = supervisor();
    let id = UnitId::new();
    assert_eq!(sup.trust_score(id), 0.5);

    for delta in [0.7, 3.0, -0.2, -10.0, 0.05, f64::MAX, -f64::MAX, 0.33] {
        let t = sup.update_trust(id, delta, Some("sweep")).unwrap();
        assert!((0.0..=1.0).contains(&t));
        assert_eq!(sup.trust_score(id), t);
    }
}

#[test]
fn non_finite_trust_delta_is_rejected() {
    let mut sup = supervisor();
    let mut reg = PatternRegistry::default();
    sup.discover_pattern(&mut reg, "stimulusY");
    let id = UnitId::new();
    sup.update_trust(id, 0.1, None).unwrap();
    let journaled = sup.learning_history().len();

    for delta in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            sup.update_trust(id, delta, None),
            Err(SupervisorError::NonFiniteDelta { .. })
        ));
    }
    assert!((sup.trust_score(id) - 0.6).abs() < EPS);
    assert_eq!(sup.pattern_confidence("stimulusY"), Some(0.5));
    assert_eq!(sup.learning_history().len(), journaled);

    let t = sup.update_trust(id, 0.1, None).unwrap();
    assert!((t - 0.7).abs() < EPS);
}

#[test]
fn trust_updates_move_every_pattern_confidence() {
    let mut sup = supervisor();
    let mut reg = PatternRegistry::default();
    sup.discover_pattern(&mut reg, "stimulusY");
    sup.discover_pattern(&mut reg, "stimulusZ");
    assert_eq!(sup.pattern_confidence("stimulusY"), Some(0.5));

    let id = UnitId::new();
    sup.update_trust(id, -0.1, None).unwrap();
    for p in ["stimulusY", "stimulusZ"] {
        assert!((sup.pattern_confidence(p).unwrap() - 0.3).abs() < EPS);
    }

    // Positive but not above the high-water mark: no global change.
    sup.update_trust(id, 0.2, None).unwrap();
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.3).abs() < EPS);

    sup.update_trust(id, 0.5, Some("adapted independently")).unwrap();
    for p in ["stimulusY", "stimulusZ"] {
        assert!((sup.pattern_confidence(p).unwrap() - 0.5).abs() < EPS);
    }
}

#[test]
fn discover_registers_and_seeds_once() {
    let mut sup = supervisor();
    let mut reg = PatternRegistry::default();
    sup.discover_pattern(&mut reg, "stimulusY");
    sup.update_trust(UnitId::new(), -0.1, None).unwrap();
    sup.discover_pattern(&mut reg, "stimulusY");

    assert_eq!(reg.subscribers("stimulusY"), &[sup.id(), sup.id()]);
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.3).abs() < EPS);
}

#[test]
fn recommendation_confidence_follows_post_recommendation_trust() {
    let mut sup = supervisor();
    let mut reg = PatternRegistry::default();
    sup.discover_pattern(&mut reg, "stimulusY");

    let mut trusting = unit_with_trust(0.9);
    assert_eq!(
        sup.recommend_pattern(&mut reg, &mut trusting, "stimulusY"),
        Some(AdoptionStatus::Adopted)
    );
    assert_eq!(reg.status(trusting.id(), "stimulusY"), Some(AdoptionStatus::Adopted));
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.7).abs() < EPS);

    // Trust is read after the unit's own update: 0.8 debates down to 0.79.
    let mut borderline = unit_with_trust(0.8);
    assert_eq!(
        sup.recommend_pattern(&mut reg, &mut borderline, "stimulusY"),
        Some(AdoptionStatus::Debating)
    );
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.7).abs() < EPS);

    let mut skeptic = unit_with_trust(0.2);
    assert_eq!(
        sup.recommend_pattern(&mut reg, &mut skeptic, "stimulusY"),
        Some(AdoptionStatus::Challenging)
    );
    assert_eq!(reg.status(skeptic.id(), "stimulusY"), Some(AdoptionStatus::Challenging));
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.5).abs() < EPS);

    // Already adopted: no status change recorded, confidence still tracks trust.
    assert_eq!(sup.recommend_pattern(&mut reg, &mut trusting, "stimulusY"), None);
    assert!((sup.pattern_confidence("stimulusY").unwrap() - 0.7).abs() < EPS);
}

#[test]
fn monitor_bounds_clamps_only_unsafe_parameters() {
    let mut sup = supervisor();
    let mut u = Unit::new(UnitCfg::default().with_threshold(5.0)).unwrap();

    let notices = sup.monitor_bounds(&mut u).unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].parameter, Parameter::Threshold);
    assert_eq!(notices[0].observed, 5.0);
    assert_eq!(notices[0].unsafe_fraction, 1.0);
    assert_eq!(notices[0].clamped_to, 2.0);
    assert_eq!(u.threshold(), 2.0);

    let last = sup.learning_history().last().unwrap();
    assert_eq!(last.kind, LearningKind::BoundaryNotification);
    assert_eq!(last.unit, Some(u.id()));
    assert_eq!(last.field("parameter").and_then(|v| v.as_str()), Some("threshold"));

    // Second pass: threshold sits on its edge, inside the notification gate.
    assert!(sup.monitor_bounds(&mut u).unwrap().is_empty());
}

#[test]
fn monitor_bounds_triggers_parameters_independently() {
    let mut sup = supervisor();
    let cfg = UnitCfg::default().with_threshold(4.0).with_refractory(3.0, 3);
    let mut u = Unit::new(cfg).unwrap();

    let notices = sup.monitor_bounds(&mut u).unwrap();
    let params: Vec<Parameter> = notices.iter().map(|n| n.parameter).collect();
    assert_eq!(params, vec![Parameter::Threshold, Parameter::RefractoryOffset]);
    assert_eq!(u.refractory_offset(), 1.0);
}

#[test]
fn missing_bound_is_an_error() {
    let mut cfg = SupervisorCfg::default();
    cfg.safe_bounds.remove(&Parameter::DecayFactor);
    let mut sup = Supervisor::new(cfg).unwrap();
    let mut u = Unit::new(UnitCfg::default()).unwrap();

    assert_eq!(
        sup.notify_boundary(&mut u, Parameter::DecayFactor),
        Err(SupervisorError::MissingBound(Parameter::DecayFactor))
    );
    assert!(sup.monitor_bounds(&mut u).unwrap().is_empty());

    let notice = sup.notify_boundary(&mut u, Parameter::Threshold).unwrap();
    assert_eq!(notice.clamped_to, 1.0);
}

#[test]
fn malformed_supervisor_cfg_fails_fast() {
    let mut cfg = SupervisorCfg::default();
    cfg.safe_bounds.insert(Parameter::Threshold, SafeBound { min: 2.0, max: 0.5 });
    assert!(matches!(
        Supervisor::new(cfg),
        Err(SupervisorError::Core(CoreError::InvertedBound { .. }))
    ));

    let cfg = SupervisorCfg { notification_threshold: 0.0, ..SupervisorCfg::default() };
    assert!(Supervisor::new(cfg).is_err());
}

#[test]
fn network_dampening_when_many_units_fire_rapidly() {
    let mut sup = supervisor();
    let mut units: Vec<Unit> = (0..3).map(|_| rapid_unit(3)).collect();
    let before: Vec<f64> = units.iter().map(|u| u.threshold()).collect();

    let report = sup.monitor_neurons(units.iter_mut(), "burst", 3);
    assert_eq!(report.flagged.len(), 3);
    assert!(report.network_dampening);

    for (u, th) in units.iter().zip(before) {
        assert!(u.threshold() > th);
        assert!((u.refractory_offset() - 0.6).abs() < EPS);
        assert!((u.decay_factor() - 0.85).abs() < EPS);
    }
}

#[test]
fn dampening_never_lowers_a_threshold_above_its_cap() {
    let mut sup = supervisor();
    let cfg = UnitCfg::default().with_threshold(1.2).with_refractory(0.9, 3);
    let mut units: Vec<Unit> = (0..3)
        .map(|_| {
            let mut u = Unit::new(cfg.clone()).unwrap();
            for _ in 0..3 {
                u.receive_input(3.0, None).unwrap();
            }
            u
        })
        .collect();
    for u in &units {
        assert!((u.threshold() - 2.1).abs() < EPS);
    }

    let report = sup.monitor_neurons(units.iter_mut(), "burst", 3);
    assert!(report.network_dampening);
    for u in &units {
        assert!((u.threshold() - 2.1).abs() < EPS);
        assert!((u.refractory_offset() - 1.0).abs() < EPS);
    }
}

#[test]
fn single_rapid_unit_gets_no_dampening() {
    let mut sup = supervisor();
    let mut units = vec![rapid_unit(4), rapid_unit(1)];
    let before: Vec<f64> = units.iter().map(|u| u.threshold()).collect();

    let report = sup.monitor_neurons(units.iter_mut(), "burst", 3);
    assert_eq!(report.flagged, vec![units[0].id()]);
    assert!(!report.network_dampening);

    assert_eq!(units[0].threshold(), before[0]);
    assert!((units[0].refractory_offset() - 0.6).abs() < EPS);
    assert_eq!(units[1].refractory_offset(), 0.5);
    assert_eq!(units[1].decay_factor(), 0.9);
}

#[test]
fn monitor_neurons_through_capability_interface() {
    let mut sup = supervisor();
    let mut fakes: Vec<FakeUnit> = [5, 3, 0]
        .into_iter()
        .map(|firings| FakeUnit { id: UnitId::new(), firings, corrections: Vec::new() })
        .collect();

    let report = sup.monitor_neurons(fakes.iter_mut(), "burst", 3);
    assert_eq!(report.flagged.len(), 2);
    assert_eq!(fakes[0].corrections, vec![Correction::RAPID_FIRING, Correction::NETWORK_DAMPENING]);
    assert_eq!(fakes[1].corrections, vec![Correction::RAPID_FIRING, Correction::NETWORK_DAMPENING]);
    assert!(fakes[2].corrections.is_empty());

    let kinds: Vec<LearningKind> = sup.learning_history().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LearningKind::RapidFiring,
            LearningKind::NetworkDampening,
            LearningKind::RapidFiring,
            LearningKind::NetworkDampening,
        ]
    );
}

#[test]
fn revision_alert_escalates_to_subscribers_only() {
    let mut sup = supervisor();
    let outsider = supervisor();
    let mut reg = PatternRegistry::new(2).unwrap();
    sup.discover_pattern(&mut reg, "stimulusY");

    let mut units: Vec<Unit> = (0..2).map(|_| Unit::new(UnitCfg::default()).unwrap()).collect();
    let mut alert = None;
    for u in units.iter_mut() {
        reg.notify_and_record(u, "stimulusY");
        alert = reg.encounter(u, "stimulusY", true).1;
    }
    let alert = alert.unwrap();
    assert!(sup.escalate(&alert));
    assert!(!outsider.escalate(&alert));
}

#[test]
fn missed_drift_raises_learning_rate_to_cap() {
    let mut sup = supervisor();
    let id = UnitId::new();
    assert!((sup.note_missed_drift(id) - 0.15).abs() < EPS);
    for _ in 0..50 {
        sup.note_missed_drift(id);
    }
    assert_eq!(sup.learning_rate(), 1.0);
}

#[test]
fn recent_learning_is_bounded_by_memory_window() {
    let cfg = SupervisorCfg { memory_window: 4, ..SupervisorCfg::default() };
    let mut sup = Supervisor::new(cfg).unwrap();
    let id = UnitId::new();
    for i in 0..10 {
        sup.update_trust(id, 0.01 * i as f64, None).unwrap();
    }
    assert_eq!(sup.learning_history().len(), 10);
    assert_eq!(sup.recent_learning().len(), 4);
    assert_eq!(
        sup.recent_learning()[3].field("delta").and_then(|v| v.as_f64()),
        sup.learning_history()[9].field("delta").and_then(|v| v.as_f64())
    );
}

#[test]
fn snapshot_restore_round_trip() {
    let mut sup = supervisor();
    let mut reg = PatternRegistry::default();
    sup.discover_pattern(&mut reg, "stimulusY");
    let (a, b) = (UnitId::new(), UnitId::new());
    sup.update_trust(a, 0.2, None).unwrap();
    sup.update_trust(b, -0.2, None).unwrap();
    sup.note_missed_drift(a);

    let snap = sup.snapshot();
    let mut sorted = snap.trust_scores.clone();
    sorted.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(snap.trust_scores, sorted);

    let mut fresh = supervisor();
    let stats = fresh.restore(snap.clone());
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.overwritten, 0);
    assert_eq!(fresh.snapshot(), snap);

    let stats = fresh.restore_merge(SupervisorSnapshot {
        trust_scores: vec![(a, 7.0)],
        pattern_confidence: vec![],
        learning_rate: fresh.learning_rate(),
    });
    assert_eq!(stats.overwritten, 1);
    assert_eq!(fresh.trust_score(a), 1.0);
    assert!((fresh.trust_score(b) - 0.3).abs() < EPS);
}

#[test]
fn restore_skips_non_finite_entries() {
    let mut sup = supervisor();
    let (a, b) = (UnitId::new(), UnitId::new());
    sup.update_trust(a, 0.2, None).unwrap();

    let stats = sup.restore_merge(SupervisorSnapshot {
        trust_scores: vec![(a, f64::NAN), (b, f64::NEG_INFINITY)],
        pattern_confidence: vec![("stimulusY".into(), f64::NAN), ("stimulusZ".into(), 0.4)],
        learning_rate: f64::NAN,
    });
    assert_eq!(stats, RestoreStats { applied: 1, overwritten: 0, skipped: 3 });
    assert!((sup.trust_score(a) - 0.7).abs() < EPS);
    assert_eq!(sup.trust_score(b), 0.5);
    assert_eq!(sup.pattern_confidence("stimulusY"), None);
    assert_eq!(sup.pattern_confidence("stimulusZ"), Some(0.4));
    assert_eq!(sup.learning_rate(), 0.1);

    let stats = sup.restore(SupervisorSnapshot {
        trust_scores: vec![(a, f64::INFINITY)],
        pattern_confidence: vec![],
        learning_rate: 0.2,
    });
    assert_eq!(stats.skipped, 1);
    assert_eq!(sup.trust_score(a), 0.5);
    assert_eq!(sup.learning_rate(), 0.2);
}
