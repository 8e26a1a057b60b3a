use rust_ffnn::{Matrix, Network, TrainConfig};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> rust_ffnn::Result<()> {
    // 2 inputs, 1 hidden layer, 2 neurons per layer, 1 output.
    let mut model = Network::new(2, 1, 2)?;

    // XOR truth table.
    let inputs = Matrix::new(4, 2, vec![0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0])?;
    let targets = Matrix::new(4, 1, vec![0.0, 0.0, 1.0, 1.0])?;

    let cfg = TrainConfig::new()
        .learning_rate(0.5)
        .epochs(100_000)
        .log_every(10_000);
    let report = model.fit(&inputs, &targets, &cfg)?;
    println!("final_loss={:.6}", report.final_loss);

    println!("outputs:");
    for i in 0..inputs.rows() {
        let x = inputs.row(i)?;
        let y = model.predict(&x)?;
        print!("x={:?} y={y:.4}", x.as_slice());
    }

    println!("weights:");
    model.print();
    Ok(())
}
