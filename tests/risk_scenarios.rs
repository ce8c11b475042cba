//! End-to-end grading scenarios through the public threat API

use chrono::{FixedOffset, TimeZone};
use rstest::rstest;
use typhoon_monitor::models::{ForecastTrack, GeoPoint, ReferencePoint, ReferenceSet, RiskLevel, StormFix};
use typhoon_monitor::threat::{
    KeywordClassifier, KeywordScope, RiskFusionEngine, ThreatBand, ThreatRadii, TimelineAnalyzer,
    distance_km, regional,
};

fn p(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).unwrap()
}

fn engine() -> RiskFusionEngine {
    let taipei = FixedOffset::east_opt(8 * 3600).unwrap();
    RiskFusionEngine::new(taipei.with_ymd_and_hms(2025, 7, 5, 8, 0, 0).unwrap())
}

fn region_x() -> ReferenceSet {
    ReferenceSet::new(vec![ReferencePoint::new("Region X", p(23.0, 120.2))]).unwrap()
}

/// Point due north of `origin` at roughly `km` kilometres
fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    p(origin.latitude + km / 111.195, origin.longitude)
}

#[test]
fn scenario_a_quiet_day_is_low() {
    typhoon_monitor::logging::init_test();

    let basic = KeywordClassifier::default().classify(&[]);
    let fused = engine().fuse(&basic, None, None);

    assert_eq!(basic.level, RiskLevel::Low);
    assert_eq!(fused.level, RiskLevel::Low);
}

#[test]
fn scenario_b_close_storm_outranks_gale_warning() {
    let refs = region_x();
    let origin = refs.get("Region X").unwrap().position;
    let storm = north_of(origin, 150.0);
    let distance = distance_km(&storm, &origin);
    assert!((distance - 150.0).abs() < 1.0, "{distance}");

    let basic = KeywordClassifier::new(KeywordScope::AnyLocation)
        .classify(&["Region X: gale warning issued".to_string()]);
    assert_eq!(basic.level, RiskLevel::Medium);

    let geo = regional::classify(&storm, &refs, &ThreatRadii::default());
    assert_eq!(geo.band, ThreatBand::Direct);

    let fused = engine().fuse(&basic, Some(&geo), None);
    assert_eq!(fused.level, RiskLevel::High);
}

#[test]
fn scenario_c_track_ending_inside_gets_estimated_departure() {
    let target = ReferencePoint::new("Region X", p(23.0, 120.2));
    let track = ForecastTrack::new(vec![
        StormFix::forecast(north_of(target.position, 900.0), 40.0, 24.0),
        StormFix::forecast(north_of(target.position, 500.0), 42.0, 48.0),
        StormFix::forecast(north_of(target.position, 150.0), 45.0, 60.0),
    ]);

    let window = TimelineAnalyzer::default().estimate_window(&track, &target, &ThreatRadii::default());

    assert_eq!(window.approach_lead_hours, Some(60.0));
    assert_eq!(window.depart_lead_hours, Some(72.0));
    assert!(window.depart_is_estimated);
}

#[rstest]
#[case(10.0)]
#[case(45.0)]
#[case(80.0)]
fn scenario_d_distant_storm_never_moves_the_grade(#[case] wind_ms: f64) {
    let refs = region_x();
    let origin = refs.get("Region X").unwrap().position;
    let fix = StormFix::observed(north_of(origin, 650.0), wind_ms);

    let geo = regional::classify(&fix.position, &refs, &ThreatRadii::default());
    assert_eq!(geo.band, ThreatBand::None);

    for basic_level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
        let basic = typhoon_monitor::RiskGrade::new(basic_level);
        let fused = engine().fuse(&basic, Some(&geo), None);
        assert_eq!(fused.level, basic_level);
    }
}

#[test]
fn escalation_needs_both_moderate_band_and_forecast_arrival() {
    let refs = region_x();
    let target = ReferencePoint::new("Region X", p(23.0, 120.2));
    let radii = ThreatRadii::default();

    // Currently 350 km out, forecast to pass 100 km away in 18h
    let current = north_of(target.position, 350.0);
    let track = ForecastTrack::new(vec![
        StormFix::forecast(north_of(target.position, 100.0), 45.0, 18.0),
        StormFix::forecast(north_of(target.position, 700.0), 30.0, 42.0),
    ]);

    let geo = regional::classify(&current, &refs, &radii);
    let window = TimelineAnalyzer::default().estimate_window(&track, &target, &radii);
    assert_eq!(geo.band, ThreatBand::Moderate);
    assert_eq!(window.approach_lead_hours, Some(18.0));
    assert_eq!(window.depart_lead_hours, Some(42.0));
    assert!(!window.depart_is_estimated);

    let fused = engine().fuse(&typhoon_monitor::RiskGrade::new(RiskLevel::Low), Some(&geo), Some(&window));
    assert_eq!(fused.level, RiskLevel::High);
    let trail = fused.details.join("\n");
    assert!(trail.contains("approach 07/06 02:00 (+18h)"), "{trail}");
    assert!(trail.contains("depart 07/07 02:00 (+42h)"), "{trail}");
}
