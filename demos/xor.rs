use ffnn::{Activation, Matrix, Network, TrainConfig};

fn main() {
    let mut network = Network::seeded(&[2, 4, 2], Activation::Sigmoid, 7).expect("valid widths");

    let inputs = vec![
        Matrix::column(vec![1.0, 0.0]),
        Matrix::column(vec![1.0, 1.0]),
        Matrix::column(vec![0.0, 1.0]),
        Matrix::column(vec![0.0, 0.0]),
    ];
    // class 1 = "inputs differ"
    let labels = vec![1, 0, 1, 0];

    let config = TrainConfig::new(5000, 4, 2.0).with_seed(7);
    let history = network.train(&inputs, &labels, &config).expect("training");

    for stats in history.iter().filter(|s| s.epoch % 1000 == 0) {
        println!("Epoch {}: loss = {:.6}", stats.epoch, stats.train_loss);
    }

    for input in &inputs {
        let class = network.predict(input).expect("prediction");
        println!("Input: {:?} -> class {}", input.as_slice(), class);
    }

    let accuracy = network.evaluate(&inputs, &labels).expect("evaluation");
    println!("Accuracy: {:.0}%", accuracy);
}
