use fish_flow::config::{AnimationPacing, FishSettings};
use fish_flow::math::CatmullRomCurve;
use fish_flow::{CurveFlow, FrameInfo};

#[cfg(test)]
mod flow_tests {
    use super::*;

    fn fish_flow() -> CurveFlow {
        let curve = CatmullRomCurve::closed(FishSettings::default().curve_points()).unwrap();
        CurveFlow::new(&curve)
    }

    fn simulate(flow: &mut CurveFlow, ticks: u64, increment: f64) {
        for _ in 0..ticks {
            flow.move_along_curve(increment);
        }
    }

    #[test]
    fn test_progress_advances_by_increment_modulo_one() {
        let increment = FishSettings::default().increment;
        let mut flow = fish_flow();

        for ticks in [1u64, 10, 500, 999, 1000, 1001, 2750] {
            let mut flow_n = fish_flow();
            simulate(&mut flow_n, ticks, increment);
            let expected = (ticks as f64 * increment).rem_euclid(1.0);
            let actual = flow_n.offset();
            // either side of the wrap point is the same place on a loop
            let diff = (actual - expected).abs();
            assert!(diff < 1e-9 || (1.0 - diff) < 1e-9, "{} ticks: {} vs {}", ticks, actual, expected);
        }

        flow.move_along_curve(increment);
        assert_eq!(flow.offset(), increment);
    }

    #[test]
    fn test_one_lap_after_ceil_of_loop_over_increment() {
        for increment in [0.001, 0.003, 0.007, 0.25] {
            let mut flow = fish_flow();
            let ticks = (1.0 / increment as f64).ceil() as u64;

            simulate(&mut flow, ticks - 1, increment);
            assert_eq!(flow.laps(), 0, "increment {} lapped early", increment);

            flow.move_along_curve(increment);
            assert!(flow.laps() >= 1, "increment {} never lapped", increment);
        }
    }

    #[test]
    fn test_offset_stays_in_unit_interval() {
        let mut flow = fish_flow();
        for _ in 0..5000 {
            flow.move_along_curve(0.0013);
            assert!((0.0..1.0).contains(&flow.offset()));
        }
        assert_eq!(flow.laps(), 6);
    }

    #[test]
    fn test_real_time_pacing_is_refresh_rate_independent() {
        let settings = FishSettings {
            pacing: AnimationPacing::RealTime,
            ..FishSettings::default()
        };

        let mut at_60 = fish_flow();
        for n in 0..60 {
            let frame = FrameInfo::new(n, n as f32 / 60.0, 1.0 / 60.0);
            at_60.move_along_curve(settings.pacing.step(settings.increment, frame.delta));
        }

        let mut at_144 = fish_flow();
        for n in 0..144 {
            let frame = FrameInfo::new(n, n as f32 / 144.0, 1.0 / 144.0);
            at_144.move_along_curve(settings.pacing.step(settings.increment, frame.delta));
        }

        // one second at either rate covers 0.06 of the loop
        assert!((at_60.offset() - 0.06).abs() < 1e-6);
        assert!((at_144.offset() - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_fish_curve_spine_length() {
        let curve = CatmullRomCurve::closed(FishSettings::default().curve_points()).unwrap();
        let view = CurveFlow::new(&curve).view();
        // a wobbly unit circle: a bit longer than 2π
        assert!(view.spine_length() > std::f32::consts::TAU);
        assert!(view.spine_length() < std::f32::consts::TAU * 1.1);
    }
}
