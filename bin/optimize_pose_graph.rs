use clap::Parser;
use nalgebra::Vector3;
use planar_slam::factors::{loop_closure_error, OdometryChain};
use planar_slam::manifold::SE2;
use planar_slam::optimizer::Sgd;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "optimize_pose_graph")]
#[command(about = "Optimize a pentagon pose graph with stochastic gradient descent")]
struct Args {
    /// Number of gradient-descent iterations
    #[arg(short, long, default_value = "1500")]
    iterations: usize,

    /// Constant learning rate
    #[arg(short, long, default_value = "1.2")]
    learning_rate: f64,
}

/// Five noisy poses around a pentagon with four unit-turn odometry
/// measurements; closing the loop pulls the last pose back onto the first.
fn pentagon_problem() -> (OdometryChain, Vec<SE2>) {
    let quarter_turn = std::f64::consts::FRAC_PI_2;
    let measurements = vec![
        SE2::from_xy_angle(2.0, 0.0, 0.0),
        SE2::from_xy_angle(2.0, 0.0, quarter_turn),
        SE2::from_xy_angle(2.0, 0.0, quarter_turn),
        SE2::from_xy_angle(2.0, 0.0, quarter_turn),
    ];
    let chain = OdometryChain::new(measurements, Vector3::new(0.3, 0.3, 0.1), 1.0 / 3.0);

    let trajectory = vec![
        SE2::from_xy_angle(0.5, 0.0, 0.2),
        SE2::from_xy_angle(2.3, 0.1, -0.2),
        SE2::from_xy_angle(4.1, 0.1, quarter_turn),
        SE2::from_xy_angle(4.0, 2.0, std::f64::consts::PI),
        SE2::from_xy_angle(2.1, 2.1, -quarter_turn),
    ];
    (chain, trajectory)
}

fn main() -> planar_slam::Result<()> {
    planar_slam::init_logger();
    let args = Args::parse();

    let (chain, mut trajectory) = pentagon_problem();
    let initial_loss = chain.loss(&trajectory)?;
    let initial_closure = loop_closure_error(&trajectory);

    println!("=== PENTAGON POSE GRAPH ===");
    println!("Poses: {}", trajectory.len());
    println!("Initial loss: {:.6e}", initial_loss);
    println!("Initial loop closure error: {:.6}", initial_closure);

    let optimizer = Sgd::new(args.learning_rate);
    let start = Instant::now();
    let final_loss = optimizer.run(&chain, &mut trajectory, args.iterations)?;
    let duration = start.elapsed();

    println!("\n=== RESULTS ===");
    println!("Iterations: {}", args.iterations);
    println!("Learning rate: {}", args.learning_rate);
    println!("Final loss: {:.6e}", final_loss);
    println!(
        "Final loop closure error: {:.6}",
        loop_closure_error(&trajectory)
    );
    println!("Execution time: {:.1}ms", duration.as_millis());

    println!("\nOptimized trajectory:");
    for (i, pose) in trajectory.iter().enumerate() {
        println!(
            "  x{}: ({:>8.4}, {:>8.4}, {:>7.4})",
            i,
            pose.x(),
            pose.y(),
            pose.angle()
        );
    }
    Ok(())
}
