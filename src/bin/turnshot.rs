use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use turnshot::{
    ImageFormat, RenderRequestDef, RenderService, RenderServiceOpts, RenderTask, flatten,
};

#[derive(Parser, Debug)]
#[command(name = "turnshot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a request JSON into an image sequence.
    Render(RenderArgs),
    /// Parse a request JSON and print scene statistics.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the image sequence is written into. Defaults to the path
    /// components of the request's `model` field.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output image format.
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Tga,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Tga => ImageFormat::Tga,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let def = RenderRequestDef::from_path(&args.in_path)?;
    let mut task = RenderTask::from_def(def);

    // Surface scene problems here instead of as worker-side warnings.
    flatten(&task.groups)?;

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
        let name = Path::new(&task.file_base)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| task.file_base.clone());
        task.file_base = dir.join(name).to_string_lossy().into_owned();
    }
    task.callback = Some("cli".to_owned());

    let format: ImageFormat = args.format.into();
    let frames = task.frames;
    let base = task.file_base.clone();

    let (done_tx, done_rx) = mpsc::channel::<String>();
    let done_tx = Mutex::new(done_tx);
    let service = RenderService::with_notifier(
        RenderServiceOpts {
            format,
            ..Default::default()
        },
        move |filename, _token| {
            if let Ok(tx) = done_tx.lock() {
                let _ = tx.send(filename.to_owned());
            }
        },
    );
    service.submit(task);
    done_rx
        .recv_timeout(Duration::from_secs(300))
        .context("render did not complete; see warnings above")?;
    service.shutdown();

    for i in 0..frames {
        println!("{base}{i}.{}", format.extension());
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let def = RenderRequestDef::from_path(&args.in_path)?;
    let task = RenderTask::from_def(def);
    let scene = flatten(&task.groups)?;

    println!("file base:  {}", task.file_base);
    println!("output:     {}x{} pixels, {} frames", task.width, task.height, task.frames);
    println!("groups:     {}", scene.ranges.len());
    println!("vertices:   {}", scene.vertices.len());
    println!("triangles:  {}", scene.triangle_count());
    let center = scene.bounds.center();
    let extents = scene.bounds.extents();
    println!(
        "center:     ({:.3}, {:.3}, {:.3})",
        center.x, center.y, center.z
    );
    println!(
        "extents:    ({:.3}, {:.3}, {:.3})",
        extents.x, extents.y, extents.z
    );
    Ok(())
}
