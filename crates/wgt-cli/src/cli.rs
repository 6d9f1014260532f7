use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "widgetify",
    about = "Widgetify dashboard: inspect and edit new-tab state",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage file to use instead of the configured backend
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Dashboard configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show every mounted domain
    Show,
    /// Show or change the currency selection
    Currencies(CurrenciesArgs),
    /// Show or change the WigiPad clock
    Clock(ClockArgs),
    /// Show or change the wallpaper
    Wallpaper(WallpaperArgs),
    /// List or toggle dashboard widgets
    Widgets(WidgetsArgs),
    /// Convert an amount between two currencies
    Convert(ConvertArgs),
    /// Show or clear the welcome / release-notes notice
    Notice(NoticeArgs),
    /// Publish a raw message on the event bus
    Publish(PublishArgs),
}

#[derive(Args)]
pub struct CurrenciesArgs {
    #[command(subcommand)]
    pub action: Option<CurrenciesAction>,
}

#[derive(Subcommand)]
pub enum CurrenciesAction {
    /// Replace the selection (order is display order)
    Set {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Set the colour mode (NORMAL or X)
    ColorMode { mode: String },
}

#[derive(Args)]
pub struct ClockArgs {
    /// Clock face: digital or analog
    #[arg(long = "type")]
    pub clock_type: Option<String>,
    #[arg(long)]
    pub seconds: Option<bool>,
    #[arg(long)]
    pub timezone: Option<bool>,
    #[arg(long)]
    pub font: Option<bool>,
    /// Ask the widget settings panel to open on the WigiPad tab
    #[arg(long)]
    pub open_settings: bool,
}

#[derive(Args)]
pub struct WallpaperArgs {
    #[command(subcommand)]
    pub action: Option<WallpaperAction>,
}

#[derive(Subcommand)]
pub enum WallpaperAction {
    /// Use an image
    Image(MediaArgs),
    /// Use a looping video
    Video(MediaArgs),
    /// Use a two-stop gradient
    Gradient {
        from: String,
        to: String,
        #[arg(long, default_value = "to-r")]
        direction: String,
    },
}

#[derive(Args)]
pub struct MediaArgs {
    pub src: String,
    /// Catalog id; defaults to the source URL
    #[arg(long)]
    pub id: Option<String>,
    /// Darken the media for readability
    #[arg(long)]
    pub retouch: bool,
}

#[derive(Args)]
pub struct WidgetsArgs {
    #[command(subcommand)]
    pub action: Option<WidgetsAction>,
}

#[derive(Subcommand)]
pub enum WidgetsAction {
    /// List widgets and whether they are visible
    List,
    /// Show or hide a widget
    Toggle { widget: String },
    /// Reorder visible widgets
    Reorder {
        #[arg(required = true)]
        widgets: Vec<String>,
    },
}

#[derive(Args)]
pub struct ConvertArgs {
    pub amount: f64,
    pub from: String,
    pub to: String,
    /// Rial price of a currency, as CODE=PRICE (repeatable)
    #[arg(long = "rate", value_parser = parse_rate)]
    pub rates: Vec<(String, f64)>,
}

#[derive(Args)]
pub struct NoticeArgs {
    /// Do not show the welcome notice again
    #[arg(long, conflicts_with = "ack")]
    pub dismiss: bool,
    /// Mark the current release notes as read
    #[arg(long)]
    pub ack: bool,
}

#[derive(Args)]
pub struct PublishArgs {
    /// Topic name, e.g. wallpaperChanged
    pub topic: String,
    /// JSON payload (defaults to null)
    pub payload: Option<String>,
}

pub fn parse_rate(s: &str) -> Result<(String, f64), String> {
    let (code, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=PRICE, got {s:?}"))?;
    let price: f64 = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid price for {code}: {e}"))?;
    Ok((code.trim().to_string(), price))
}
