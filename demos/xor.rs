use backprop_net::{LabeledExample, Network, SgdConfig, Shuffle, TrainingExample};
use tracing_subscriber::EnvFilter;

fn main() -> backprop_net::Result<()> {
    // RUST_LOG=backprop_net=debug shows every mini-batch.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    // XOR as a two-class problem: class 1 when exactly one input is set.
    let points = [([0.0, 0.0], 0), ([0.0, 1.0], 1), ([1.0, 0.0], 1), ([1.0, 1.0], 0)];

    let mut train = Vec::new();
    for _ in 0..25 {
        for (x, class) in points {
            train.push(TrainingExample::from_class(x, class, 2)?);
        }
    }
    let test: Vec<LabeledExample> = points
        .iter()
        .map(|&(x, class)| LabeledExample::new(x, class))
        .collect();

    // 2 -> 4 -> 2 network.
    let mut net = Network::new_with_seed(&[2, 4, 2], 7)?;
    let report = net.train(
        &train,
        Some(&test),
        &SgdConfig {
            epochs: 300,
            mini_batch_size: 10,
            learning_rate: 3.0,
            shuffle: Shuffle::Seeded(7),
        },
    )?;

    if let Some(v) = report.final_validation() {
        println!("accuracy={:.2} ({} / {})", v.accuracy(), v.correct, v.total);
    }
    for (x, _) in points {
        let out = net.feedforward(&x)?;
        println!("x={x:?} y={:?} class={}", out.as_slice(), net.classify(&x)?);
    }

    Ok(())
}
