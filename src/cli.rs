// ============================================================================
// mask-annotator CLI: replay an input-event feed against one image
// ============================================================================
//
// Usage examples:
//   mask-annotator images/radial1.png masks/radial1.png --events strokes.jsonl
//   record-events | mask-annotator photo.jpg out/mask.png --circle-size 5 --no-clahe
//
// Events are JSON lines, one per line:
//   {"type":"pointer_down","button":"right","x":10.0,"y":12.5}
//   {"type":"pointer_move","x":11.0,"y":13.0}
//   {"type":"pointer_up","button":"right"}
//   {"type":"key_press","key":"z"}
//   {"type":"close"}

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use mask_annotator::config::{AnnotatorConfig, LogLevel};
use mask_annotator::error::ConfigError;
use mask_annotator::event::{InputEvent, Key, PointerButton};
use mask_annotator::{AnnotatorError, Session};

/// Paint instance masks over an image from a recorded input-event feed.
#[derive(Parser, Debug)]
#[command(name = "mask-annotator", version, about)]
pub struct CliArgs {
    /// Source image to annotate.
    pub image: PathBuf,

    /// Where the mask is written (lossless format: png, bmp, tiff, tga, pnm).
    pub mask_out: PathBuf,

    /// Config file. Defaults to the platform config dir when it exists.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON-lines event feed. Reads stdin when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Button that paints: left, middle, right (or 1-3).
    #[arg(long, value_name = "BUTTON")]
    pub paint_button: Option<PointerButton>,

    /// Brush radius in pixels.
    #[arg(long, value_name = "PX")]
    pub circle_size: Option<u32>,

    /// Key that undoes the last stroke.
    #[arg(long, value_name = "KEY")]
    pub undo_key: Option<String>,

    /// Number of undo snapshots kept.
    #[arg(long, value_name = "N")]
    pub max_history: Option<usize>,

    /// Show the image without CLAHE enhancement.
    #[arg(long)]
    pub no_clahe: bool,

    /// Minimum mean channel value (0-255) for instance colors.
    #[arg(long, value_name = "0-255")]
    pub brightness_threshold: Option<u8>,

    /// Seed instance colors for a reproducible mask.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Fill gaps between sparse pointer samples.
    #[arg(long)]
    pub interpolate: bool,

    /// Also write the display overlay (image + mask) to this path.
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,

    /// Log verbosity: error, warn, info, debug, trace.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Where the base configuration came from, reported once logging is up.
#[derive(Debug)]
pub enum ConfigSource {
    /// No config file; built-in defaults
    Defaults,
    /// Loaded from this file
    File(PathBuf),
    /// The default-path file was unusable and defaults were substituted
    Fallback { path: PathBuf, error: ConfigError },
}

impl ConfigSource {
    fn report(&self) {
        match self {
            ConfigSource::Defaults => log::debug!("No config file, using defaults"),
            ConfigSource::File(path) => log::info!("Loaded config from {:?}", path),
            ConfigSource::Fallback { path, error } => {
                log::warn!("Failed to load config {:?}: {}; using defaults", path, error)
            }
        }
    }
}

/// Load the base config. An explicit file must load; a file at the default
/// location may be absent or broken, in which case defaults are used.
fn base_config(
    explicit: Option<&Path>,
    default_path: Option<PathBuf>,
) -> Result<(AnnotatorConfig, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        let config = AnnotatorConfig::load(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }
    let Some(path) = default_path else {
        return Ok((AnnotatorConfig::default(), ConfigSource::Defaults));
    };
    Ok(match AnnotatorConfig::load_if_present(&path) {
        Ok(Some(config)) => (config, ConfigSource::File(path)),
        Ok(None) => (AnnotatorConfig::default(), ConfigSource::Defaults),
        Err(error) => (
            AnnotatorConfig::default(),
            ConfigSource::Fallback { path, error },
        ),
    })
}

impl CliArgs {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<(AnnotatorConfig, ConfigSource), AnnotatorError> {
        self.resolve_config_from(AnnotatorConfig::default_path())
    }

    fn resolve_config_from(
        &self,
        default_path: Option<PathBuf>,
    ) -> Result<(AnnotatorConfig, ConfigSource), AnnotatorError> {
        let (mut config, source) = base_config(self.config.as_deref(), default_path)?;

        if let Some(button) = self.paint_button {
            config.paint_button = button;
        }
        if let Some(size) = self.circle_size {
            config.circle_size = size;
        }
        if let Some(key) = &self.undo_key {
            config.undo_key = Key::new(key.as_str());
        }
        if let Some(max) = self.max_history {
            config.max_history_size = max;
        }
        if self.no_clahe {
            config.apply_clahe = false;
        }
        if let Some(threshold) = self.brightness_threshold {
            config.brightness_threshold = threshold;
        }
        if self.seed.is_some() {
            config.color_seed = self.seed;
        }
        if self.interpolate {
            config.interpolate_strokes = true;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok((config, source))
    }
}

/// Initialize `env_logger` at `level`; `RUST_LOG` still refines it.
pub fn init_logging(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_env("RUST_LOG")
        .format_timestamp_millis()
        .try_init();
}

/// Lazily parse a JSON-lines event feed.
///
/// Blank lines and `#` comments are skipped; malformed lines are logged and
/// skipped. A read error ends the feed. Lines are only read as the session
/// asks for them, so nothing past a `close` event is consumed.
pub fn read_events<R: BufRead>(reader: R) -> impl Iterator<Item = InputEvent> {
    reader
        .lines()
        .enumerate()
        .map_while(|(index, line)| match line {
            Ok(line) => Some((index, line)),
            Err(err) => {
                log::error!("Event feed read failed at line {}: {}", index + 1, err);
                None
            }
        })
        .filter_map(|(index, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            match serde_json::from_str::<InputEvent>(trimmed) {
                Ok(event) => Some(event),
                Err(err) => {
                    log::warn!("Skipping event line {}: {}", index + 1, err);
                    None
                }
            }
        })
}

fn open_feed(path: Option<&Path>) -> std::io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => {
            log::info!("Reading events from {:?}", path);
            Box::new(BufReader::new(std::fs::File::open(path)?))
        }
        None => {
            log::info!("Reading events from stdin");
            Box::new(std::io::stdin().lock())
        }
    })
}

/// Run one session and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let (config, source) = match args.resolve_config() {
        Ok(resolved) => resolved,
        Err(err) => {
            init_logging(args.log_level.unwrap_or_default());
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_level);
    source.report();

    let feed = match open_feed(args.events.as_deref()) {
        Ok(feed) => feed,
        Err(err) => {
            log::error!("Failed to read events: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut session = match Session::open(&args.image, &args.mask_out, config) {
        Ok(session) => session,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = session.run(read_events(feed));

    if let Some(preview) = &args.preview {
        if let Err(err) = session.overlay_frame().save(preview) {
            log::warn!("Failed to write preview {:?}: {}", preview, err);
        }
    }

    match result {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}", err);
            if session.is_dirty() {
                match session.save() {
                    Ok(()) => log::warn!("Saved partial mask to {:?}", session.mask_save_path()),
                    Err(save_err) => log::error!("Mask not saved: {}", save_err),
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mask-annotator-cli-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_read_events_skips_noise() {
        let feed = "\
# stroke one
{\"type\":\"pointer_down\",\"button\":\"right\",\"x\":1.0,\"y\":2.0}

not json
{\"type\":\"pointer_up\",\"button\":\"right\"}
{\"type\":\"close\"}
";
        let events: Vec<_> = read_events(feed.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], InputEvent::Close);
    }

    #[test]
    fn test_read_events_is_lazy() {
        let first = "{\"type\":\"close\"}";
        let feed = format!("{}\n{{\"type\":\"pointer_move\",\"x\":1.0,\"y\":1.0}}\n", first);
        let mut cursor = Cursor::new(feed.into_bytes());
        {
            let mut events = read_events(&mut cursor);
            assert_eq!(events.next(), Some(InputEvent::Close));
        }
        // only the close line has been consumed
        assert_eq!(cursor.position(), first.len() as u64 + 1);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = CliArgs::parse_from([
            "mask-annotator",
            "in.png",
            "out.png",
            "--config",
            "/definitely/missing/config.json",
        ]);
        assert!(matches!(
            args.resolve_config(),
            Err(AnnotatorError::Config(_))
        ));
    }

    #[test]
    fn test_broken_default_config_is_reported() {
        let dir = scratch_dir("broken-default");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "]]").unwrap();

        let args = CliArgs::parse_from(["mask-annotator", "in.png", "out.png", "--circle-size", "4"]);
        let (config, source) = args.resolve_config_from(Some(path.clone())).unwrap();

        assert_eq!(config.circle_size, 4);
        assert_eq!(config.max_history_size, AnnotatorConfig::default().max_history_size);
        match source {
            ConfigSource::Fallback { path: reported, error } => {
                assert_eq!(reported, path);
                assert!(matches!(error, ConfigError::Json(_)));
            }
            other => panic!("expected fallback, got {:?}", other),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_absent_default_config_uses_defaults() {
        let args = CliArgs::parse_from(["mask-annotator", "in.png", "out.png"]);
        let missing = scratch_dir("absent").join("config.json");
        let (config, source) = args.resolve_config_from(Some(missing)).unwrap();
        assert_eq!(config, AnnotatorConfig::default());
        assert!(matches!(source, ConfigSource::Defaults));

        let (_, source) = args.resolve_config_from(None).unwrap();
        assert!(matches!(source, ConfigSource::Defaults));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = scratch_dir("override");
        let path = dir.join("config.json");
        AnnotatorConfig {
            circle_size: 9,
            max_history_size: 4,
            ..AnnotatorConfig::default()
        }
        .save(&path)
        .unwrap();

        let config_arg = path.to_string_lossy().into_owned();
        let args = CliArgs::parse_from([
            "mask-annotator",
            "in.png",
            "out.png",
            "--config",
            config_arg.as_str(),
            "--paint-button",
            "1",
            "--circle-size",
            "6",
            "--undo-key",
            "u",
            "--no-clahe",
            "--seed",
            "5",
        ]);
        let (config, source) = args.resolve_config().unwrap();

        assert!(matches!(source, ConfigSource::File(ref loaded) if loaded == &path));
        assert_eq!(config.paint_button, PointerButton::Left);
        assert_eq!(config.circle_size, 6);
        assert_eq!(config.max_history_size, 4);
        assert_eq!(config.undo_key, Key::new("u"));
        assert!(!config.apply_clahe);
        assert_eq!(config.color_seed, Some(5));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
