use argh::FromArgs;
use std::path::PathBuf;

use pointreg::icp::{
    register_point_sets, synthetic::create_test_data, RegistrationCriteria, RegistrationResult,
};

#[derive(FromArgs)]
/// Search the rotation x translation grid for star pattern registrations
/// that converge within a given number of iterations.
struct Args {
    /// smallest rotation about z, in radians
    #[argh(option, default = "0.3")]
    rotation_min: f64,

    /// upper bound (exclusive) of the rotation grid
    #[argh(option, default = "0.7")]
    rotation_max: f64,

    /// rotation grid step
    #[argh(option, default = "0.05")]
    rotation_step: f64,

    /// smallest translation scale
    #[argh(option, default = "0.3")]
    scale_min: f64,

    /// upper bound (exclusive) of the translation scale grid
    #[argh(option, default = "0.8")]
    scale_max: f64,

    /// translation scale grid step
    #[argh(option, default = "0.1")]
    scale_step: f64,

    /// y translation as a fraction of x translation
    #[argh(option, default = "0.8")]
    aspect: f64,

    /// convergence tolerance on the mean error
    #[argh(option, default = "0.001")]
    tolerance: f64,

    /// iteration budget of each registration
    #[argh(option, default = "20")]
    max_iterations: usize,

    /// fewest iterations a kept run may take
    #[argh(option, default = "4")]
    min_trace: usize,

    /// most iterations a kept run may take
    #[argh(option, default = "6")]
    max_trace: usize,

    /// preferred number of iterations, used to rank the kept runs
    #[argh(option, default = "5")]
    preferred: usize,

    /// write the trace of the best run to this JSON file
    #[argh(option)]
    output: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct Candidate {
    rotation: f64,
    translation: [f64; 3],
    result: RegistrationResult,
}

/// Grid values `min + k * step` below `max`.
fn grid(min: f64, max: f64, step: f64) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    if step.is_nan() || step <= 0.0 {
        return Err(format!("grid step must be positive, got {step}").into());
    }
    let n = ((max - min) / step).ceil().max(0.0) as usize;
    Ok((0..n).map(|k| min + k as f64 * step).collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let criteria = RegistrationCriteria::new(args.max_iterations, args.tolerance);
    criteria.validate()?;

    let rotations = grid(args.rotation_min, args.rotation_max, args.rotation_step)?;
    let scales = grid(args.scale_min, args.scale_max, args.scale_step)?;

    println!(
        "Searching {} x {} grid for runs converging in {}-{} iterations",
        rotations.len(),
        scales.len(),
        args.min_trace,
        args.max_trace
    );

    let mut candidates = Vec::new();
    for &rotation in &rotations {
        for &scale in &scales {
            let translation = [scale, scale * args.aspect, 0.0];
            let pair = create_test_data(rotation, translation);
            let result = register_point_sets(&pair.source, &pair.target, &criteria)?;

            let iterations = result.num_iterations();
            log::debug!(
                "rotation {:.3}, scale {:.2}: converged = {}, iterations = {}",
                rotation,
                scale,
                result.converged(),
                iterations
            );

            if result.converged() && (args.min_trace..=args.max_trace).contains(&iterations) {
                println!(
                    "rotation {:.3} rad ({:.1} deg), translation [{:.2}, {:.2}, {:.2}]: {} iterations, final error {:.6}, final energy {:.6}",
                    rotation,
                    rotation.to_degrees(),
                    translation[0],
                    translation[1],
                    translation[2],
                    iterations,
                    result.final_state().mean_error(),
                    result.final_state().energy()
                );
                candidates.push(Candidate {
                    rotation,
                    translation,
                    result,
                });
            }
        }
    }

    // stable sort keeps grid order among equally ranked runs
    candidates.sort_by_key(|c| c.result.num_iterations().abs_diff(args.preferred));

    let Some(best) = candidates.first() else {
        println!("No suitable parameters found");
        return Ok(());
    };

    println!(
        "Best: rotation {:.3} rad, translation [{:.2}, {:.2}, {:.2}], {} iterations ({} candidates)",
        best.rotation,
        best.translation[0],
        best.translation[1],
        best.translation[2],
        best.result.num_iterations(),
        candidates.len()
    );

    for state in best.result.trace() {
        println!(
            "  iteration {}: mean error {:.6}, energy {:.6}",
            state.iteration(),
            state.mean_error(),
            state.energy()
        );
    }

    if let Some(path) = args.output {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), best)?;
        println!("Wrote trace to {}", path.display());
    }

    Ok(())
}
