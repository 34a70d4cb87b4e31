use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use journeyflow::{
    DiagramScene, FrameSnapshot, Journey, LayoutMode, LayoutOpts, ManualHost, SceneOpts, SvgOpts,
    Theme, ThemeMode, prefs,
};

#[derive(Parser, Debug)]
#[command(name = "journeyflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the frame snapshot (bands, paths, markers) as JSON.
    Layout(SceneArgs),
    /// Write the diagram as an SVG document.
    Svg(SvgArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Show or update the saved view preference.
    Prefs(PrefsArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Input journey JSON. Defaults to the built-in e-commerce funnel.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Layout mode: sankey, flow or node_map. Defaults to the saved preference.
    #[arg(long)]
    mode: Option<LayoutMode>,

    #[arg(long, default_value_t = 1000.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Host time in seconds at which markers are sampled.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Speed multiplier. Defaults to the saved preference.
    #[arg(long)]
    speed: Option<f64>,

    /// Freeze markers at `--at`.
    #[arg(long, default_value_t = false)]
    paused: bool,
}

#[derive(Parser, Debug)]
struct SvgArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output SVG path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Theme: dark or light. Defaults to the saved preference.
    #[arg(long)]
    theme: Option<ThemeMode>,

    /// Emit static markers instead of SMIL animations.
    #[arg(long, default_value_t = false)]
    still: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    theme: Option<ThemeMode>,

    /// Pixel scale relative to the canvas size.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

#[derive(Parser, Debug)]
struct PrefsArgs {
    /// Preference file. Defaults to $JOURNEYFLOW_PREFS or ./.journeyflow.json.
    #[arg(long)]
    path: Option<PathBuf>,

    #[arg(long)]
    theme: Option<ThemeMode>,

    #[arg(long)]
    mode: Option<LayoutMode>,

    #[arg(long)]
    speed: Option<f64>,

    /// Flip between dark and light.
    #[arg(long, default_value_t = false)]
    toggle_theme: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Layout(args) => cmd_layout(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Prefs(args) => cmd_prefs(args),
    }
}

fn read_journey(path: Option<&PathBuf>) -> anyhow::Result<Journey> {
    match path {
        Some(p) => Journey::from_path(p).with_context(|| format!("load journey '{}'", p.display())),
        None => Ok(Journey::ecommerce_sample()),
    }
}

fn snapshot(args: &SceneArgs, saved: &prefs::ViewPrefs) -> anyhow::Result<FrameSnapshot> {
    let journey = read_journey(args.in_path.as_ref())?;
    let mut animation = saved.animation_config();
    if let Some(speed) = args.speed {
        animation.speed_multiplier = speed;
    }
    let opts = SceneOpts {
        mode: args.mode.unwrap_or(saved.mode),
        layout: LayoutOpts {
            canvas: journeyflow::Canvas::new(args.width, args.height)?,
            ..LayoutOpts::default()
        },
        animation,
        ..SceneOpts::default()
    };

    let mut scene = DiagramScene::new(journey, opts, ManualHost::new())?;
    scene.frame(0.0);
    if args.paused {
        scene.pause(args.at);
    }
    Ok(scene.frame(args.at))
}

fn write_output(out: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn cmd_layout(args: SceneArgs) -> anyhow::Result<()> {
    let saved = prefs::ViewPrefs::load(&prefs::default_prefs_path());
    let snap = snapshot(&args, &saved)?;
    write_output(None, &snap.to_json_pretty()?)
}

fn cmd_svg(args: SvgArgs) -> anyhow::Result<()> {
    let saved = prefs::ViewPrefs::load(&prefs::default_prefs_path());
    let snap = snapshot(&args.scene, &saved)?;
    let theme = Theme::for_mode(args.theme.unwrap_or(saved.theme));
    let opts = SvgOpts {
        animated: !args.still,
        ..SvgOpts::default()
    };
    let svg = journeyflow::render_svg(&snap, &theme, &opts)?;
    write_output(args.out.as_ref(), &svg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let saved = prefs::ViewPrefs::load(&prefs::default_prefs_path());
    let snap = snapshot(&args.scene, &saved)?;
    let theme = Theme::for_mode(args.theme.unwrap_or(saved.theme));
    let opts = SvgOpts {
        animated: false,
        ..SvgOpts::default()
    };
    let svg = journeyflow::render_svg(&snap, &theme, &opts)?;
    let frame = journeyflow::rasterize_svg(&svg, args.scale)?;
    frame.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_prefs(args: PrefsArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(prefs::default_prefs_path);
    let mut p = prefs::ViewPrefs::load(&path);
    let changed = args.theme.is_some()
        || args.mode.is_some()
        || args.speed.is_some()
        || args.toggle_theme;

    if let Some(theme) = args.theme {
        p.theme = theme;
    }
    if args.toggle_theme {
        p.theme = p.theme.toggled();
    }
    if let Some(mode) = args.mode {
        p.mode = mode;
    }
    if let Some(speed) = args.speed {
        p.speed = journeyflow::nearest_preset(speed);
    }
    if changed {
        p.save(&path)?;
    }
    println!("{}", serde_json::to_string_pretty(&p)?);
    Ok(())
}
