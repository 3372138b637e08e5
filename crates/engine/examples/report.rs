//! Print the design report of a preset scheme.
//!
//! ```text
//! RUST_LOG=debug cargo run -p engine --example report -- VII
//! ```

use engine::{Analyzer, Preset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let preset: Preset = match std::env::args().nth(1) {
        Some(name) => name.parse()?,
        None => Preset::VII,
    };
    let params = preset.parameters();

    let mut analyzer = Analyzer::default();
    let report = analyzer.analyze(&params);

    println!("Scheme {preset}: H = {} mm, e = {} mm, K = {}", params.h, params.e, params.k);

    let geo = report.geometry.as_ref().map_err(ToString::to_string)?;
    println!(
        "  theta = {:.4} deg, l = {:.3} mm, r = {:.3} mm",
        geo.theta, geo.l, geo.r
    );

    println!("  {:>5} {:>9} {:>10} {:>10} {:>12}", "pos", "phi", "s (m)", "v (m/s)", "a (m/s²)");
    for at in report.kinematics.as_ref().map_err(ToString::to_string)? {
        let state = &at.value;
        println!(
            "  {:>5} {:>9.3} {:>10.5} {:>10.4} {:>12.3}",
            at.position.label,
            at.position.angle,
            state.displacement,
            state.piston_velocity(),
            state.piston_acceleration()
        );
    }

    println!("  {:>5} {:>9} {:>12} {:>12}", "pos", "phi", "|R12| (N)", "Md (N·m)");
    for at in report.forces.as_ref().map_err(ToString::to_string)? {
        println!(
            "  {:>5} {:>9.1} {:>12.2} {:>12.4}",
            at.position.label,
            at.position.angle,
            at.value.r12.norm(),
            at.value.md
        );
    }

    let cycle = &report.cycle.as_ref().map_err(ToString::to_string)?.summary;
    println!(
        "  Mr = {:.3} N·m, dW = {:.3} J, Je = {:.3} kg·m², N = {:.3} hp",
        cycle.mr, cycle.delta_w_max, cycle.je, cycle.power_hp
    );

    let balance = report.balance.as_ref().map_err(ToString::to_string)?;
    println!(
        "  unbalance m·r = {:.5} kg·m, reciprocating mass {:.3} kg, counterweight {:.3} kg at {:.4} m",
        balance.mr, balance.m_recip, balance.m_b, balance.counterweight_radius
    );

    for (name, profile) in report.cams() {
        let profile = profile.as_ref().map_err(ToString::to_string)?;
        println!(
            "  {name} cam: lift {:.1} mm, min curvature radius {:.3} mm",
            profile.max_lift(),
            profile.min_curvature_radius().unwrap_or(f64::INFINITY)
        );
    }

    let timing = report.valve_timing.as_ref().map_err(ToString::to_string)?;
    println!(
        "  exhaust opens {:.2}, closes {:.2}; intake opens {:.2}, closes {:.2} (cam deg)",
        timing.exhaust.opens, timing.exhaust.closes, timing.intake.opens, timing.intake.closes
    );

    Ok(())
}
