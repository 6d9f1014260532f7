use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};

use wgt_bus::BusEvent;
use wgt_dashboard::{Dashboard, DashboardConfig, StorageConfig};
use wgt_state::{format_amount, Notice, StaticRates};
use wgt_types::{
    ClockType, CurrencyCode, CurrencyColorMode, GradientDirection, StoredWallpaper, WallpaperKind,
    WidgetKey,
};

use crate::cli::*;

/// Storage file used when neither `--store` nor `--config` is given.
pub const DEFAULT_STORE: &str = "widgetify.json";

pub fn resolve_config(config: Option<PathBuf>, store: Option<PathBuf>) -> anyhow::Result<DashboardConfig> {
    let mut resolved = match &config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DashboardConfig {
            storage: StorageConfig::File {
                path: PathBuf::from(DEFAULT_STORE),
            },
            ..DashboardConfig::default()
        },
    };
    if let Some(path) = store {
        resolved.storage = StorageConfig::File { path };
    }
    Ok(resolved)
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config, cli.store)?;
    let dashboard = Dashboard::mount(config)?;
    dashboard.ready().await.context("loading dashboard state")?;

    let format = cli.format;
    let result = match cli.command {
        Command::Show => cmd_show(&dashboard, format),
        Command::Currencies(args) => cmd_currencies(&dashboard, args, format).await,
        Command::Clock(args) => cmd_clock(&dashboard, args, format).await,
        Command::Wallpaper(args) => cmd_wallpaper(&dashboard, args, format).await,
        Command::Widgets(args) => cmd_widgets(&dashboard, args, format).await,
        Command::Convert(args) => cmd_convert(&dashboard, args, format).await,
        Command::Notice(args) => cmd_notice(&dashboard, args, format).await,
        Command::Publish(args) => cmd_publish(&dashboard, args),
    };

    let flushed = dashboard.flush().await.context("saving dashboard state");
    dashboard.unmount().await;
    merge_outcome(result, flushed)
}

/// Command error first; a failed save is attached to it rather than lost.
fn merge_outcome(result: anyhow::Result<()>, flushed: anyhow::Result<()>) -> anyhow::Result<()> {
    match (result, flushed) {
        (Err(e), Err(save)) => Err(e.context(format!("state was not saved either: {save:#}"))),
        (result, flushed) => result.and(flushed),
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn on_off(flag: bool) -> colored::ColoredString {
    if flag {
        "on".green()
    } else {
        "off".dimmed()
    }
}

fn parse_codes(codes: &[String]) -> anyhow::Result<Vec<CurrencyCode>> {
    codes
        .iter()
        .map(|c| CurrencyCode::new(c).with_context(|| format!("bad currency code {c:?}")))
        .collect()
}

fn cmd_show(dashboard: &Dashboard, format: OutputFormat) -> anyhow::Result<()> {
    let currency = dashboard.currency().ok();
    let clock = dashboard.clock().ok();
    let wallpaper = dashboard.wallpaper().ok();
    let widgets = dashboard.widgets().ok();
    let notice = dashboard.pending_notice().ok().flatten();

    if format == OutputFormat::Json {
        let mut out = serde_json::Map::new();
        if let Some(currency) = &currency {
            out.insert(
                "currency".into(),
                json!({
                    "currencies": currency.selected_currencies(),
                    "colorMode": currency.color_mode(),
                }),
            );
        }
        if let Some(settings) = clock.as_ref().and_then(|c| c.settings()) {
            out.insert("clock".into(), serde_json::to_value(settings)?);
        }
        if let Some(current) = wallpaper.as_ref().and_then(|w| w.wallpaper()) {
            out.insert("wallpaper".into(), serde_json::to_value(current)?);
        }
        if let Some(widgets) = &widgets {
            out.insert("activeWidgets".into(), serde_json::to_value(widgets.sorted_widgets())?);
        }
        out.insert("notice".into(), notice_json(notice.as_ref()));
        return print_json(&Value::Object(out));
    }

    println!("{} {}", "Widgetify".bold(), dashboard.config().version_name.dimmed());
    if let Some(currency) = &currency {
        let codes: Vec<String> = currency
            .selected_currencies()
            .iter()
            .map(|c| c.as_str().yellow().to_string())
            .collect();
        println!("  Currencies: {}", codes.join(", "));
        if let Some(mode) = currency.color_mode() {
            println!("  Colour mode: {}", mode.as_str().cyan());
        }
    }
    if let Some(settings) = clock.as_ref().and_then(|c| c.settings()) {
        println!(
            "  Clock: {} (seconds {}, time zone {}, selected font {})",
            settings.clock_type.to_string().cyan(),
            on_off(settings.show_seconds),
            on_off(settings.show_time_zone),
            on_off(settings.use_selected_font)
        );
    }
    if let Some(current) = wallpaper.as_ref().and_then(|w| w.wallpaper()) {
        println!("  Wallpaper: {}", describe_wallpaper(&current));
    }
    if let Some(widgets) = &widgets {
        let names: Vec<String> = widgets.sorted_widgets().iter().map(|w| w.to_string()).collect();
        println!("  Widgets: {}", names.join(", "));
    }
    print_notice(notice.as_ref());
    Ok(())
}

fn describe_wallpaper(wallpaper: &StoredWallpaper) -> String {
    match (&wallpaper.kind, &wallpaper.gradient) {
        (WallpaperKind::Gradient, Some(g)) => format!(
            "{} {} → {} ({})",
            "gradient".cyan(),
            g.from,
            g.to,
            g.direction.as_str()
        ),
        (kind, _) => {
            let retouch = if wallpaper.is_retouch_enabled { " retouched" } else { "" };
            format!("{}{} {}", kind.to_string().to_lowercase().cyan(), retouch, wallpaper.src.blue())
        }
    }
}

fn notice_json(notice: Option<&Notice>) -> Value {
    match notice {
        None => Value::Null,
        Some(Notice::Welcome) => json!({"kind": "welcome"}),
        Some(Notice::ReleaseNotes { previous }) => {
            json!({"kind": "releaseNotes", "previous": previous})
        }
    }
}

fn print_notice(notice: Option<&Notice>) {
    match notice {
        None => println!("  Notice: {}", "none".dimmed()),
        Some(Notice::Welcome) => println!("  Notice: {}", "welcome".green()),
        Some(Notice::ReleaseNotes { previous }) => println!(
            "  Notice: {} (last seen {})",
            "release notes".green(),
            previous.as_deref().unwrap_or("never")
        ),
    }
}

async fn cmd_currencies(
    dashboard: &Dashboard,
    args: CurrenciesArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let currency = dashboard.currency()?;
    match args.action {
        Some(CurrenciesAction::Set { codes }) => {
            let codes = parse_codes(&codes)?;
            currency.set_selected_currencies(codes)?.finished().await?;
        }
        Some(CurrenciesAction::ColorMode { mode }) => {
            let mode: CurrencyColorMode = mode.parse()?;
            currency.set_color_mode(mode)?.finished().await?;
        }
        None => {}
    }

    let selected = currency.selected_currencies();
    if format == OutputFormat::Json {
        return print_json(&json!({
            "currencies": selected,
            "colorMode": currency.color_mode(),
        }));
    }
    for (i, code) in selected.iter().enumerate() {
        println!("{:>3}. {}", i + 1, code.as_str().yellow().bold());
    }
    if let Some(mode) = currency.color_mode() {
        println!("Colour mode: {}", mode.as_str().cyan());
    }
    Ok(())
}

async fn cmd_clock(dashboard: &Dashboard, args: ClockArgs, format: OutputFormat) -> anyhow::Result<()> {
    let clock = dashboard.clock()?;
    let mut settings = clock.current();
    if let Some(kind) = &args.clock_type {
        settings.clock_type = kind.parse::<ClockType>()?;
    }
    if let Some(flag) = args.seconds {
        settings.show_seconds = flag;
    }
    if let Some(flag) = args.timezone {
        settings.show_time_zone = flag;
    }
    if let Some(flag) = args.font {
        settings.use_selected_font = flag;
    }
    clock.set_settings(settings.clone())?.finished().await?;

    if args.open_settings {
        clock.request_settings_panel();
    }

    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&settings)?);
    }
    println!("Clock: {}", settings.clock_type.to_string().cyan().bold());
    println!("  Seconds: {}", on_off(settings.show_seconds));
    println!("  Time zone: {}", on_off(settings.show_time_zone));
    println!("  Selected font: {}", on_off(settings.use_selected_font));
    if let Ok(panel) = dashboard.settings_panel() {
        if panel.is_open() {
            let tab = panel.tab().map(|t| t.to_string()).unwrap_or_default();
            println!("{} Settings panel opened on {}", "✓".green(), tab.yellow());
        }
    }
    Ok(())
}

async fn cmd_wallpaper(
    dashboard: &Dashboard,
    args: WallpaperArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let wallpaper = dashboard.wallpaper()?;
    let next = match args.action {
        Some(WallpaperAction::Image(media)) => Some(media_wallpaper(WallpaperKind::Image, media)),
        Some(WallpaperAction::Video(media)) => Some(media_wallpaper(WallpaperKind::Video, media)),
        Some(WallpaperAction::Gradient {
            from,
            to,
            direction,
        }) => {
            let direction: GradientDirection = direction.parse()?;
            Some(StoredWallpaper::gradient(&from, &to, direction))
        }
        None => None,
    };
    if let Some(next) = next {
        wallpaper.set_wallpaper(next)?.finished().await?;
    }

    let current = wallpaper.current();
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&current)?);
    }
    println!("Wallpaper {}: {}", current.id.bold(), describe_wallpaper(&current));
    Ok(())
}

fn media_wallpaper(kind: WallpaperKind, media: MediaArgs) -> StoredWallpaper {
    StoredWallpaper {
        id: media.id.unwrap_or_else(|| media.src.clone()),
        kind,
        src: media.src,
        is_retouch_enabled: media.retouch,
        gradient: None,
    }
}

async fn cmd_widgets(dashboard: &Dashboard, args: WidgetsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let widgets = dashboard.widgets()?;
    match args.action {
        Some(WidgetsAction::Toggle { widget }) => {
            let key: WidgetKey = widget.parse()?;
            widgets.toggle(key)?.finished().await?;
        }
        Some(WidgetsAction::Reorder { widgets: order }) => {
            let order = order
                .iter()
                .map(|w| w.parse::<WidgetKey>())
                .collect::<Result<Vec<_>, _>>()?;
            widgets.reorder(order)?.finished().await?;
        }
        Some(WidgetsAction::List) | None => {}
    }

    let visible = widgets.sorted_widgets();
    if format == OutputFormat::Json {
        return print_json(&json!({
            "visible": visible,
            "home": widgets.home_widgets(),
        }));
    }
    let home = widgets.home_widgets();
    for key in WidgetKey::ALL {
        let marker = if home.contains(&key) {
            "●".green()
        } else if visible.contains(&key) {
            "●".yellow()
        } else {
            "○".dimmed()
        };
        println!("  {} {}", marker, key);
    }
    Ok(())
}

async fn cmd_convert(dashboard: &Dashboard, args: ConvertArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut rates = StaticRates::new();
    for (code, price) in &args.rates {
        rates.insert(CurrencyCode::new(code)?, *price);
    }
    let from = CurrencyCode::new(&args.from)?;
    let to = CurrencyCode::new(&args.to)?;
    let converter = dashboard.converter(Arc::new(rates));
    converter.set_from(from.clone());
    converter.set_to(to.clone());
    converter.set_amount(args.amount);
    converter.refresh().await?;

    let state = converter.state();
    let (Some(_), Some(_)) = (state.from_price, state.to_price) else {
        bail!("missing rate for {} or {}; pass --rate CODE=PRICE", from, to);
    };
    if format == OutputFormat::Json {
        return print_json(&json!({
            "from": from,
            "to": to,
            "amount": state.amount,
            "converted": state.converted,
            "rialEquivalent": converter.rial_equivalent(),
        }));
    }
    println!(
        "{} {} = {} {}",
        format_amount(state.amount, &from),
        from.as_str().yellow(),
        format_amount(state.converted, &to).bold(),
        to.as_str().yellow()
    );
    if let Some(rial) = converter.rial_equivalent() {
        println!("  ≈ {} rial", format!("{rial:.0}").dimmed());
    }
    Ok(())
}

async fn cmd_notice(dashboard: &Dashboard, args: NoticeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let onboarding = dashboard.onboarding()?;
    if args.dismiss {
        onboarding.dismiss_welcome()?.finished().await?;
    }
    if args.ack {
        dashboard.acknowledge_release()?.finished().await?;
    }

    let notice = dashboard.pending_notice()?;
    if format == OutputFormat::Json {
        return print_json(&notice_json(notice.as_ref()));
    }
    print_notice(notice.as_ref());
    Ok(())
}

fn cmd_publish(dashboard: &Dashboard, args: PublishArgs) -> anyhow::Result<()> {
    let payload: Value = match &args.payload {
        Some(raw) => serde_json::from_str(raw).context("payload is not valid JSON")?,
        None => Value::Null,
    };
    let event = BusEvent::decode(&args.topic, payload)?;
    let delivered = dashboard.bus().publish(event);
    println!(
        "{} Published {} to {} subscriber(s)",
        "✓".green().bold(),
        args.topic.yellow(),
        delivered
    );
    Ok(())
}
