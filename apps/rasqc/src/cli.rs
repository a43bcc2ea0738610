//! CLI argument parsing via `clap`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rasqc",
    version,
    about = "rasqc: Automated HEC-RAS Model Quality Control Checks",
    long_about = "Run a named suite of quality-control checks against a HEC-RAS model.\n\nConfiguration precedence: CLI > rasqc.toml > defaults.",
    after_help = "Examples:\n  rasqc models/bald-eagle/bald-eagle.prj\n  rasqc models/bald-eagle --checksuite ble --json\n  rasqc model.prj --files --theme arctic\n  rasqc --stac item.json --json\n  rasqc --list"
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(help = "HEC-RAS project file (.prj) or the directory holding it", required_unless_present_any = ["list", "stac"])]
    pub ras_model: Option<String>,
    #[arg(long, help = "Checksuite to run: ffrd|ble (default: ffrd)")]
    pub checksuite: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "files", help = "Output results as JSON")]
    pub json: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Write an HTML log, GeoJSON layers and summary workbook to disk")]
    pub files: bool,
    #[arg(long, help = "HTML log theme: nineties|arcade|adams|arctic")]
    pub theme: Option<String>,
    #[arg(long, help = "Convention schema: bundled, a file path, or an http(s) URL")]
    pub schema: Option<String>,
    #[arg(long, help = "Per-checker timeout in milliseconds (0 disables)")]
    pub timeout_ms: Option<u64>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Evaluate independent checkers concurrently")]
    pub parallel: bool,
    #[arg(long, help = "Directory for --files output (default: <model dir>/rasqc)")]
    pub out_dir: Option<String>,
    #[arg(long, help = "Also write a summary JSON (and .xlsx alongside) to this path")]
    pub summary: Option<String>,
    #[arg(long, conflicts_with_all = ["files", "checksuite", "ras_model"], help = "Run the stac_ffrd naming suite over a STAC item JSON file")]
    pub stac: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "List check suites and exit")]
    pub list: bool,
}
