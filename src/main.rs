//! Laser Gates entry point
//!
//! Native macroquad shell around the headless simulation: polls input,
//! advances the tunnel on a fixed-step accumulator, draws, repeats.

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use macroquad::input::{KeyCode, is_key_down, is_key_pressed};
use macroquad::time::get_frame_time;
use macroquad::window::{Conf, next_frame};

use laser_gates::consts;
use laser_gates::render;
use laser_gates::{StepInput, Tunnel};

/// Laser Gates - a side-scrolling tunnel shooter
#[derive(Parser)]
#[command(version, about = "Side-scrolling tunnel shooter")]
struct Cli {
    /// Enable debug output for entity and action creation
    #[arg(long)]
    debug_actions: bool,
}

fn window_conf() -> Conf {
    Conf {
        window_title: String::from("Laser Gates"),
        window_width: consts::WINDOW_WIDTH as i32,
        window_height: consts::WINDOW_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
        .unwrap_or(0x6c67)
}

#[macroquad::main(window_conf)]
async fn main() {
    let cli = Cli::parse();
    let filter = if cli.debug_actions { "laser_gates=debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let seed = seed_from_clock();
    log::info!("starting tunnel with seed {seed}");
    let mut tunnel = Tunnel::new(seed);

    let mut accumulator = 0.0f32;
    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        let input = StepInput {
            left: is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::Right),
            up: is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::Down),
            fire: is_key_pressed(KeyCode::LeftControl)
                || is_key_pressed(KeyCode::RightControl),
        };

        accumulator += get_frame_time().min(0.1);
        let mut substeps = 0;
        while accumulator >= consts::STEP_DT && substeps < consts::MAX_SUBSTEPS {
            tunnel.step(&input, consts::STEP_DT);
            accumulator -= consts::STEP_DT;
            substeps += 1;
        }

        render::draw_frame(&tunnel);
        next_frame().await;
    }
}
