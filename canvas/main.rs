/// ffnn canvas
///
/// Draw a digit in the browser and have a trained model classify it.
/// Served by a synchronous tiny_http server; the page is plain JavaScript.
///
/// Run with:
///   cargo run --bin canvas --release -- --model mnist.bin
/// Then open http://127.0.0.1:7878
///
/// The model's `.json` architecture file must sit next to the weights and
/// carry an input image shape.

mod routes;
mod state;

use std::sync::{Arc, Mutex};

use clap::Parser;
use log::{error, info};
use tiny_http::Server;

use state::Predictor;

/// Strokes are drawn on a grid this many times larger than the model input.
const CANVAS_SCALE: usize = 5;

#[derive(Parser)]
#[command(name = "canvas")]
#[command(about = "Serve a drawing canvas that classifies digits with a saved model")]
#[command(version)]
struct Args {
    /// Weight file written by `ffnn train`
    #[arg(short, long)]
    model: String,

    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let predictor = match Predictor::open(&args.model, CANVAS_SCALE) {
        Ok(p) => p,
        Err(e) => {
            error!("cannot load {}: {}", args.model, e);
            std::process::exit(1);
        }
    };
    let server = match Server::http(args.addr.as_str()) {
        Ok(s) => s,
        Err(e) => {
            error!("cannot bind {}: {}", args.addr, e);
            std::process::exit(1);
        }
    };

    info!(
        "model {} loaded, canvas {}x{}",
        predictor.name(),
        predictor.canvas_rows(),
        predictor.canvas_cols()
    );
    println!("Open http://{} in your browser", args.addr);

    let shared = Arc::new(Mutex::new(predictor));
    for request in server.incoming_requests() {
        let state = shared.clone();
        std::thread::spawn(move || routes::dispatch(request, state));
    }
}
