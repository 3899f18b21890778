use blockprec::matrix::{BlockStartIndicator, MatrixBatch, VectorBatch};
use blockprec::preconditioner::{BlockJacobiBuilder, MappingType, prepare_batch};
use blockprec::solver::MonitoredSystemSolver;
use blockprec::parallel::init_thread_pool;
use blockprec::{BuilderOptions, SolverOptions};
use faer::Mat;
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let threads = init_thread_pool(None);
    log::info!("using {threads} worker threads");

    let (n, m) = (16, 12);
    let mut rng = rand::thread_rng();
    // random symmetric matrices with entries in [0, 1]
    let mats: Vec<Mat<f64>> = (0..n)
        .map(|_| {
            let data: Vec<f64> = (0..m * m).map(|_| rng.r#gen()).collect();
            Mat::from_fn(m, m, |i, j| 0.5 * (data[i * m + j] + data[j * m + i]))
        })
        .collect();
    let a = prepare_batch(&MatrixBatch::new(mats)?, MappingType::Flip);
    let rhs: Vec<f64> = (0..n * m).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let b = VectorBatch::from_row_major(n, m, &rhs)?;
    let ind = BlockStartIndicator::from_starts(n, m, &[0, 3, 6, 9])?;

    let p = BlockJacobiBuilder::new(BuilderOptions::default()).build(&a, &ind)?;

    let solver = MonitoredSystemSolver::new(SolverOptions::default().with_rtol(1e-6));
    let plain = solver.solve_batch(&a, &b, None)?;
    let precon = solver.solve_batch(&a, &b, Some(&p))?;

    println!("{}", plain.summary());
    println!("{}", precon.summary());
    Ok(())
}
