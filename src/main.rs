//! Candlewish - blow out the candles, get confetti
//!
//! Runs the cake scene headless: live against the microphone in real time,
//! or offline into numbered PNG frames with `--record`.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use candlewish::cli::Args;
use candlewish::confetti::PixmapSurface;
use candlewish::{BlowTrigger, CakeStage, Flow, FrameScheduler, Pacing, WishError};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let params = args.load_params().context("failed to load parameters")?;
    let recording = args
        .create_recording_config()
        .context("failed to prepare recording directory")?;

    let render = &params.render;
    let mut surface = match &recording {
        Some(_) => Some(PixmapSurface::new(
            render.viewport_width,
            render.viewport_height,
            render.background,
        )?),
        None => None,
    };

    let backend = args.input_backend(render.fps);
    let stage = Rc::new(RefCell::new(CakeStage::new(&params, backend, args.rng())));
    let manual_at = args.manual_press_at(params.stage.candles_ready_at())?;

    info!(
        width = render.viewport_width,
        height = render.viewport_height,
        fps = render.fps,
        recording = recording.is_some(),
        "candlewish starting"
    );

    let failure: Rc<RefCell<Option<WishError>>> = Rc::new(RefCell::new(None));
    let mut scheduler = FrameScheduler::from_fps(render.fps);

    let task_stage = Rc::clone(&stage);
    let task_failure = Rc::clone(&failure);
    let frames = recording.clone();
    scheduler.schedule(move |clock| {
        let mut stage = task_stage.borrow_mut();
        if manual_at.is_some_and(|at| clock.elapsed >= at) && stage.can_blow() {
            info!("no blow heard, pressing the button");
            stage.blow(BlowTrigger::Manual);
        }

        let flow = stage.frame(clock, surface.as_mut());

        if let (Some(surface), Some(frames)) = (surface.as_mut(), &frames) {
            surface.present();
            if let Err(e) = surface.save_png(frames.frame_path(clock.frame)) {
                *task_failure.borrow_mut() = Some(e);
                return Flow::Stop;
            }
        }
        flow
    });

    let (pacing, max_frames) = match &recording {
        Some(config) => (Pacing::Immediate, Some(config.total_frames(render.fps))),
        None => (Pacing::RealTime, None),
    };
    let ran = scheduler.run(pacing, max_frames);

    let mut stage = stage.borrow_mut();
    stage.teardown();

    if let Some(e) = failure.borrow_mut().take() {
        return Err(e).context("failed to write frame");
    }

    info!(
        frames = ran,
        phase = ?stage.phase(),
        blown_by = ?stage.blown_by(),
        "candlewish finished"
    );
    if let Some(config) = &recording {
        info!(dir = %config.frames_dir().display(), "frames written");
    }

    Ok(())
}
