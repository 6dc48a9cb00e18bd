#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> backprop_net::Result<()> {
    use backprop_net::{Network, SgdConfig, Shuffle, TrainingExample};

    tracing_subscriber::fmt().compact().init();

    let train = vec![
        TrainingExample::new([0.0, 0.0], [0.0]),
        TrainingExample::new([0.0, 1.0], [1.0]),
        TrainingExample::new([1.0, 0.0], [1.0]),
        TrainingExample::new([1.0, 1.0], [0.0]),
    ];

    let mut net = Network::new_with_seed(&[2, 4, 1], 0)?;
    net.train(
        &train,
        None,
        &SgdConfig {
            epochs: 200,
            mini_batch_size: 4,
            learning_rate: 3.0,
            shuffle: Shuffle::Seeded(0),
        },
    )?;

    let path = std::env::temp_dir().join("backprop_net_demo.json");
    net.save_json(&path)?;

    let loaded = Network::load_json(&path)?;
    println!(
        "saved and loaded network {:?}: {} (identical: {})",
        loaded.sizes(),
        path.display(),
        loaded == net
    );
    Ok(())
}
