use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{ensure, Context};
use chip8_core::{
    Chip8, Chip8Builder, Chip8Color, Palette, Quirks, Rasterizer, DEFAULT_BACKGROUND_COLOR,
    DEFAULT_FOREGROUND_COLOR, NUM_KEYS, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use clap::Parser;
use log::*;
use sdl2::{
    audio::{AudioCallback, AudioDevice, AudioSpecDesired},
    event::Event,
    keyboard::{Keycode, Scancode},
    pixels::{Color, PixelFormatEnum},
    EventPump,
};

const AUDIO_SAMPLE_RATE: i32 = 44_100;
const TONE_FREQUENCY: f32 = 410.0;
const TONE_VOLUME: i16 = 500;

/// Physical keys for CHIP-8 keys 0x0-0xF.
///
/// ```text
///   Keypad       Keyboard
///   1 2 3 C      1 2 3 4
///   4 5 6 D      Q W E R
///   7 8 9 E      A S D F
///   A 0 B F      Z X C V
/// ```
const KEYMAP: [Scancode; NUM_KEYS] = [
    Scancode::X,    // 0
    Scancode::Num1, // 1
    Scancode::Num2, // 2
    Scancode::Num3, // 3
    Scancode::Q,    // 4
    Scancode::W,    // 5
    Scancode::E,    // 6
    Scancode::A,    // 7
    Scancode::S,    // 8
    Scancode::D,    // 9
    Scancode::Z,    // A
    Scancode::C,    // B
    Scancode::Num4, // C
    Scancode::R,    // D
    Scancode::F,    // E
    Scancode::V,    // F
];

/// CHIP-8 Emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Chip8Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xFFFFFF]
    #[clap(long)]
    foreground: Option<Chip8Color>,

    /// Display scaling factor
    #[clap(short, long, default_value_t = 10)]
    scale: u32,

    /// Instructions per second
    #[clap(short, long, default_value_t = 700)]
    ips: u32,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,

    /// Original COSMAC VIP behaviour for shifts and register load/store
    #[clap(long)]
    cosmac_vip: bool,

    /// Shift VY instead of VX in 8XY6 and 8XYE
    #[clap(long)]
    shift_vy: bool,

    /// Trace every executed instruction
    #[clap(short, long)]
    debug: bool,
}

/// Square wave played while the sound timer runs.
struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: i16,
}

impl AudioCallback for SquareWave {
    type Channel = i16;

    fn callback(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            *sample = if self.phase < 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    ensure!(
        (1..=100).contains(&args.scale),
        "Display scaling factor must be between [1-100]"
    );
    ensure!(
        (1..=1_000_000).contains(&args.ips),
        "Instructions per second must be between [1-1000000]"
    );

    let mut quirks = if args.cosmac_vip {
        Quirks::cosmac_vip()
    } else {
        Quirks::default()
    };
    quirks.shift_reads_vy |= args.shift_vy;

    let mut builder = Chip8Builder::new().with_quirks(quirks);
    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let mut chip = builder.build()?;
    chip.load_file(&args.rom)
        .with_context(|| format!("Failed to load ROM {}", args.rom.display()))?;

    let palette = Palette {
        foreground: args.foreground.unwrap_or(DEFAULT_FOREGROUND_COLOR),
        background: args.background.unwrap_or(DEFAULT_BACKGROUND_COLOR),
    };
    let mut rasterizer = Rasterizer::new(palette);

    let sdl_context = sdl2::init().map_err(anyhow::Error::msg)?;
    let video_subsystem = sdl_context.video().map_err(anyhow::Error::msg)?;

    let window = video_subsystem
        .window(
            "chip8-emulator",
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()
        .context("Couldn't create SDL window")?;

    let mut canvas = window.into_canvas().build()?;

    let background = palette.background;
    canvas.set_draw_color(Color::RGB(background.r, background.g, background.b));
    canvas.clear();
    canvas.present();

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGBX8888,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    )?;

    // Missing audio is not fatal
    let audio = open_audio(&sdl_context)
        .map_err(|err| warn!("Failed to open audio device: {}", err))
        .ok();

    let mut event_pump = sdl_context.event_pump().map_err(anyhow::Error::msg)?;

    let delta_update = Duration::new(0, 1_000_000_000u32 / args.ips);
    let mut next_update = Instant::now();

    'running: loop {
        // Wait until next update
        let now = Instant::now();
        if let Some(delay) = next_update.checked_duration_since(now) {
            ::std::thread::sleep(delay);
        }
        next_update += delta_update;

        // Process events
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                _ => {}
            }
        }

        latch_keys(&event_pump, &mut chip);

        // Execute one CHIP-8 instruction
        if let Err(err) = chip.step() {
            error!("Emulation halted: {}", err);
            return Err(err.into());
        }

        if let Some(device) = &audio {
            if chip.should_beep() {
                device.resume();
            } else {
                device.pause();
            }
        }

        // If display buffer was changed then draw changes on canvas
        if chip.display().dirty() {
            // Copy CHIP-8 display buffer into GPU texture
            texture.update(None, rasterizer.rasterize(chip.display()), Rasterizer::PITCH)?;
            chip.mark_display_clean();

            // Copy texture to Canvas
            canvas.copy(&texture, None, None).map_err(anyhow::Error::msg)?;

            // present canvas on screen
            canvas.present();
        }
    }

    info!("Bye");
    Ok(())
}

fn open_audio(sdl_context: &sdl2::Sdl) -> Result<AudioDevice<SquareWave>, String> {
    let audio_subsystem = sdl_context.audio()?;
    let desired_spec = AudioSpecDesired {
        freq: Some(AUDIO_SAMPLE_RATE),
        channels: Some(1),
        samples: Some(512),
    };

    audio_subsystem.open_playback(None, &desired_spec, |spec| {
        debug!("Audio device opened at {} Hz", spec.freq);
        SquareWave {
            phase_inc: TONE_FREQUENCY / spec.freq as f32,
            phase: 0.0,
            volume: TONE_VOLUME,
        }
    })
}

/// Level sampled, the previous snapshot is not kept.
fn latch_keys(event_pump: &EventPump, chip: &mut Chip8) {
    let keyboard = event_pump.keyboard_state();
    for (latch, &scancode) in chip.keys_mut().iter_mut().zip(KEYMAP.iter()) {
        *latch = keyboard.is_scancode_pressed(scancode);
    }
}
