//! Two-unit walk through notification, recommendation, trust, encounter,
//! mentoring, and revision.

use pulsenet_core::*;
use pulsenet_supervisor::*;

const EPS: f64 = 1e-9;

#[test]
fn notification_to_revision() {
    let mut reg = PatternRegistry::default();
    let mut sup = Supervisor::new(SupervisorCfg::default()).unwrap();
    let mut a = Unit::new(UnitCfg::default().with_threshold(1.0)).unwrap();
    let mut b = Unit::new(UnitCfg::default().with_threshold(1.2)).unwrap();

    sup.discover_pattern(&mut reg, "stimulusY");
    reg.notify_and_record(&mut a, "stimulusY");
    reg.notify_and_record(&mut b, "stimulusY");
    assert_eq!(reg.status(a.id(), "stimulusY"), Some(AdoptionStatus::Monitoring));

    for u in [&mut a, &mut b] {
        assert_eq!(sup.recommend_pattern(&mut reg, u, "stimulusY"), Some(AdoptionStatus::Debating));
        assert!((u.trust_score() - 0.49).abs() < EPS);
    }
    assert_eq!(sup.pattern_confidence("stimulusY"), Some(0.5));

    sup.update_trust(a.id(), 0.12, Some("accurate firing")).unwrap();
    sup.update_trust(b.id(), 0.07, Some("accurate firing")).unwrap();
    assert!((sup.trust_score(a.id()) - 0.62).abs() < EPS);
    assert_eq!(sup.pattern_confidence("stimulusY"), Some(0.5));

    for u in [&mut a, &mut b] {
        let (status, alert) = reg.encounter(u, "stimulusY", false);
        assert_eq!(status, Some(AdoptionStatus::Independent));
        assert!(alert.is_none());
    }
    assert_eq!(reg.share_pattern(&a, &mut b, "stimulusY"), Some(AdoptionStatus::Monitoring));

    for u in [&mut a, &mut b] {
        let (status, alert) = reg.encounter(u, "stimulusY", true);
        assert_eq!(status, Some(AdoptionStatus::Revised));
        assert!(alert.is_none());
    }
    assert_eq!(reg.revised_count("stimulusY"), 2);

    let mut c = Unit::new(UnitCfg::default()).unwrap();
    reg.notify_and_record(&mut c, "stimulusY");
    let (_, alert) = reg.encounter(&mut c, "stimulusY", true);
    let alert = alert.expect("third revision reaches the threshold");
    assert_eq!(alert.revised_units, 3);
    assert!(sup.escalate(&alert));
}
