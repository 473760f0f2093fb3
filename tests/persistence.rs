use std::fs;

use ffnn::{
    load_model, save_model, Activation, Dataset, IdxDataset, ImageShape, Matrix, Network,
    NetworkSpec, NnError,
};

fn sample_inputs() -> Vec<Matrix> {
    vec![
        Matrix::column(vec![0.0, 0.5, 1.0, 0.25]),
        Matrix::column(vec![1.0, 0.0, 0.0, 0.75]),
    ]
}

#[test]
fn saved_model_reproduces_outputs_bit_for_bit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let path = path.to_str().unwrap();

    let mut trained = Network::seeded(&[4, 5, 3], Activation::ReLU, 21).unwrap();
    save_model(&trained, path).unwrap();

    let mut restored = Network::seeded(&[4, 5, 3], Activation::ReLU, 99).unwrap();
    load_model(&mut restored, path).unwrap();

    let inputs = sample_inputs();
    assert_eq!(trained.forward(&inputs).unwrap(), restored.forward(&inputs).unwrap());
}

#[test]
fn file_size_follows_the_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let net = Network::seeded(&[4, 5, 3], Activation::Sigmoid, 1).unwrap();
    save_model(&net, path.to_str().unwrap()).unwrap();

    let expected = (16 + 8 * 20) + (16 + 8 * 5) + (16 + 8 * 15) + (16 + 8 * 3);
    assert_eq!(fs::metadata(&path).unwrap().len(), expected as u64);
}

#[test]
fn loading_into_a_different_architecture_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let path = path.to_str().unwrap();
    save_model(&Network::seeded(&[4, 5, 3], Activation::Sigmoid, 1).unwrap(), path).unwrap();

    let mut other = Network::seeded(&[4, 6, 3], Activation::Sigmoid, 1).unwrap();
    assert!(matches!(load_model(&mut other, path), Err(NnError::Format(_))));

    let mut deeper = Network::seeded(&[4, 5, 3, 2], Activation::Sigmoid, 1).unwrap();
    assert!(matches!(load_model(&mut deeper, path), Err(NnError::Format(_))));
}

#[test]
fn missing_model_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.bin");
    let mut net = Network::seeded(&[2, 2], Activation::Sigmoid, 1).unwrap();
    assert!(matches!(load_model(&mut net, path.to_str().unwrap()), Err(NnError::Io(_))));
}

#[test]
fn spec_sidecar_rebuilds_the_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("digits.bin");
    let model = model.to_str().unwrap();

    let mut spec = NetworkSpec::new("digits", vec![4, 5, 3], Activation::ReLU);
    spec.input_shape = Some(ImageShape { rows: 2, cols: 2 });
    let mut original = spec.build(7).unwrap();
    save_model(&original, model).unwrap();
    spec.save_json(&NetworkSpec::sidecar_path(model)).unwrap();

    let loaded = NetworkSpec::load_json(&NetworkSpec::sidecar_path(model)).unwrap();
    assert_eq!(loaded.widths, vec![4, 5, 3]);
    assert_eq!(loaded.activation, Activation::ReLU);
    let mut rebuilt = loaded.build(0).unwrap();
    load_model(&mut rebuilt, model).unwrap();

    let inputs = sample_inputs();
    assert_eq!(original.forward(&inputs).unwrap(), rebuilt.forward(&inputs).unwrap());
}

fn write_idx(dir: &std::path::Path, rows: u32, cols: u32, images: &[Vec<u8>], labels: &[u8]) -> (String, String) {
    let mut image_bytes = Vec::new();
    image_bytes.extend_from_slice(&2051u32.to_be_bytes());
    image_bytes.extend_from_slice(&(images.len() as u32).to_be_bytes());
    image_bytes.extend_from_slice(&rows.to_be_bytes());
    image_bytes.extend_from_slice(&cols.to_be_bytes());
    for image in images {
        image_bytes.extend_from_slice(image);
    }

    let mut label_bytes = Vec::new();
    label_bytes.extend_from_slice(&2049u32.to_be_bytes());
    label_bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    label_bytes.extend_from_slice(labels);

    let image_path = dir.join("images.idx3-ubyte");
    let label_path = dir.join("labels.idx1-ubyte");
    fs::write(&image_path, image_bytes).unwrap();
    fs::write(&label_path, label_bytes).unwrap();
    (
        image_path.to_str().unwrap().to_owned(),
        label_path.to_str().unwrap().to_owned(),
    )
}

#[test]
fn idx_files_load_and_feed_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = write_idx(
        dir.path(),
        2,
        2,
        &[vec![0, 255, 51, 102], vec![255, 0, 0, 255], vec![10, 20, 30, 40]],
        &[1, 0, 2],
    );

    let dataset = IdxDataset::load(&images, &labels).unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.labels(), &[1, 0, 2]);
    assert_eq!(dataset.image_shape(), ImageShape { rows: 2, cols: 2 });
    assert_eq!(dataset.images()[0].shape(), (2, 2));
    assert_eq!(dataset.images()[0].as_slice(), &[0.0, 1.0, 0.2, 0.4]);

    let mut net = Network::seeded(&[4, 3, 3], Activation::Sigmoid, 2).unwrap();
    let accuracy = net.evaluate(dataset.images(), dataset.labels()).unwrap();
    assert!((0.0..=100.0).contains(&accuracy));
}

#[test]
fn swapped_idx_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = write_idx(dir.path(), 1, 1, &[vec![7]], &[0]);
    assert!(matches!(IdxDataset::load(&labels, &images), Err(NnError::Format(_))));
}
