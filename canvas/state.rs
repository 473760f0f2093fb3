use std::sync::{Arc, Mutex};

use serde::Serialize;

use ffnn::{load_model, Canvas, Network, NetworkSpec, NnError, Result};

pub type SharedState = Arc<Mutex<Predictor>>;

#[derive(Debug, Serialize)]
pub struct Prediction {
    pub class: usize,
    pub outputs: Vec<f64>,
}

/// A loaded model plus the geometry of the canvas that feeds it.
pub struct Predictor {
    spec: NetworkSpec,
    network: Network,
    input_rows: usize,
    input_cols: usize,
    scale: usize,
}

impl Predictor {
    pub fn open(model_path: &str, scale: usize) -> Result<Predictor> {
        let spec = NetworkSpec::load_json(&NetworkSpec::sidecar_path(model_path))?;
        let shape = spec.input_shape.ok_or_else(|| {
            NnError::InvalidArchitecture(format!("model '{}' has no input image shape", spec.name))
        })?;
        let mut network = spec.build(0)?;
        load_model(&mut network, model_path)?;
        Ok(Predictor { spec, network, input_rows: shape.rows, input_cols: shape.cols, scale })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn canvas_rows(&self) -> usize {
        self.input_rows * self.scale
    }

    pub fn canvas_cols(&self) -> usize {
        self.input_cols * self.scale
    }

    /// Stamps `points` (column, row) onto a blank canvas and classifies it.
    pub fn predict(&mut self, points: &[(i64, i64)]) -> Result<Prediction> {
        let mut canvas = Canvas::new(self.canvas_rows(), self.canvas_cols());
        for &(x, y) in points {
            canvas.stroke(y, x);
        }
        let input = canvas.to_input(self.input_rows, self.input_cols)?;
        let output = self.network
            .forward(std::slice::from_ref(&input))?
            .pop()
            .ok_or_else(|| NnError::InvalidArchitecture("network produced no output".into()))?;
        let class = output
            .argmax()
            .ok_or_else(|| NnError::InvalidArchitecture("network has no outputs".into()))?;
        let outputs = output.as_slice().to_vec();
        Ok(Prediction { class, outputs })
    }
}

/// Parses `x,y;x,y;...`. Empty segments are ignored.
pub fn parse_points(body: &str) -> std::result::Result<Vec<(i64, i64)>, String> {
    body.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected 'x,y', got '{}'", pair))?;
            let x = x.trim().parse::<i64>().map_err(|_| format!("bad x coordinate in '{}'", pair))?;
            let y = y.trim().parse::<i64>().map_err(|_| format!("bad y coordinate in '{}'", pair))?;
            Ok((x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffnn::{save_model, Activation, ImageShape, Matrix};

    #[test]
    fn parses_points_and_skips_empty_segments() {
        assert_eq!(parse_points("1,2; 3,4;;").unwrap(), vec![(1, 2), (3, 4)]);
        assert!(parse_points("").unwrap().is_empty());
        assert_eq!(parse_points("-1,0").unwrap(), vec![(-1, 0)]);
    }

    fn tiny_model(dir: &std::path::Path, input_shape: Option<ImageShape>) -> String {
        let model = dir.join("tiny.bin").to_str().unwrap().to_owned();
        let mut spec = NetworkSpec::new("tiny", vec![4, 3, 3], Activation::Sigmoid);
        spec.input_shape = input_shape;
        save_model(&spec.build(5).unwrap(), &model).unwrap();
        spec.save_json(&NetworkSpec::sidecar_path(&model)).unwrap();
        model
    }

    #[test]
    fn predicts_the_argmax_of_the_drawn_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny_model(dir.path(), Some(ImageShape { rows: 2, cols: 2 }));
        let mut predictor = Predictor::open(&model, 5).unwrap();
        assert_eq!((predictor.canvas_rows(), predictor.canvas_cols()), (10, 10));

        let prediction = predictor.predict(&[(1, 1), (2, 2), (8, 3), (i64::MAX, 0)]).unwrap();
        assert_eq!(prediction.outputs.len(), 3);
        let best = Matrix::column(prediction.outputs.clone()).argmax().unwrap();
        assert_eq!(prediction.class, best);

        let again = predictor.predict(&[(1, 1), (2, 2), (8, 3)]).unwrap();
        assert_eq!(again.outputs, prediction.outputs);
    }

    #[test]
    fn model_without_image_shape_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny_model(dir.path(), None);
        assert!(matches!(Predictor::open(&model, 5), Err(NnError::InvalidArchitecture(_))));
    }

    #[test]
    fn rejects_malformed_points() {
        assert!(parse_points("1;2").is_err());
        assert!(parse_points("a,2").is_err());
        assert!(parse_points("1,").is_err());
    }
}
